use std::env;
use tracing::warn;

pub const DEFAULT_DAILY_CAPACITY: u32 = 20;
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAIL_FROM: &str = "no-reply@careconnect.local";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
    pub contact_inbox: String,
    pub default_daily_capacity: u32,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: String::new(),
            mail_api_url: String::new(),
            mail_api_key: String::new(),
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            contact_inbox: String::new(),
            default_daily_capacity: DEFAULT_DAILY_CAPACITY,
            port: DEFAULT_PORT,
        }
    }
}

fn env_or_empty(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", key);
        String::new()
    })
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env_or_empty("SUPABASE_URL"),
            supabase_anon_key: env_or_empty("SUPABASE_ANON_PUBLIC_KEY"),
            supabase_jwt_secret: env_or_empty("SUPABASE_JWT_SECRET"),
            mail_api_url: env_or_empty("MAIL_API_URL"),
            mail_api_key: env_or_empty("MAIL_API_KEY"),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| {
                    warn!("MAIL_FROM not set, using default");
                    DEFAULT_MAIL_FROM.to_string()
                }),
            contact_inbox: env_or_empty("CONTACT_INBOX"),
            default_daily_capacity: parse_capacity(env::var("DEFAULT_DAILY_CAPACITY").ok()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| {
                    warn!("PORT not set or invalid, using {}", DEFAULT_PORT);
                    DEFAULT_PORT
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        if !config.is_mail_configured() {
            warn!("Mail notifications disabled - MAIL_API_URL, MAIL_API_KEY or CONTACT_INBOX missing");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_mail_configured(&self) -> bool {
        !self.mail_api_url.is_empty()
            && !self.mail_api_key.is_empty()
            && !self.contact_inbox.is_empty()
    }
}

fn parse_capacity(raw: Option<String>) -> u32 {
    match raw.as_deref().map(str::parse::<u32>) {
        Some(Ok(capacity)) if capacity > 0 => capacity,
        Some(_) => {
            warn!("DEFAULT_DAILY_CAPACITY invalid, using {}", DEFAULT_DAILY_CAPACITY);
            DEFAULT_DAILY_CAPACITY
        }
        None => DEFAULT_DAILY_CAPACITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_falls_back_on_zero_or_garbage() {
        assert_eq!(parse_capacity(Some("0".to_string())), DEFAULT_DAILY_CAPACITY);
        assert_eq!(parse_capacity(Some("lots".to_string())), DEFAULT_DAILY_CAPACITY);
        assert_eq!(parse_capacity(None), DEFAULT_DAILY_CAPACITY);
        assert_eq!(parse_capacity(Some("8".to_string())), 8);
    }

    #[test]
    fn mail_requires_url_key_and_inbox() {
        let mut config = AppConfig {
            mail_api_url: "http://mail.local".to_string(),
            mail_api_key: "key".to_string(),
            ..AppConfig::default()
        };
        assert!(!config.is_mail_configured());

        config.contact_inbox = "desk@careconnect.local".to_string();
        assert!(config.is_mail_configured());
    }
}
