use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::{ContactError, MailMessage};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), ContactError>;
}

/// Posts JSON messages to a transactional mail API with a bearer key.
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpMailer {
    pub fn new(api_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Option<Self> {
        config
            .is_mail_configured()
            .then(|| Self::new(&config.mail_api_url, &config.mail_api_key))
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), ContactError> {
        debug!("Sending mail to {} via {}", message.to, self.api_url);

        let response = self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .map_err(|e| ContactError::Mail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Mail API error ({}): {}", status, body);
            return Err(ContactError::Mail(format!("Mail API returned {}", status)));
        }

        Ok(())
    }
}
