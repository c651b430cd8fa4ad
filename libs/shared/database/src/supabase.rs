use anyhow::{Result, anyhow};
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

pub const NOT_FOUND_PREFIX: &str = "Resource not found";

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

/// `Prefer: return=representation`, so PostgREST echoes written rows back.
pub fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

/// Upsert variant of [`return_representation`].
pub fn merge_duplicates() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Prefer",
        HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
    );
    headers
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         auth_token: Option<&str>, body: Option<Value>,
                                         extra_headers: Option<HeaderMap>)
                                         -> Result<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("{}: {}", NOT_FOUND_PREFIX, error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        // PATCH/DELETE without a representation come back with an empty body
        let text = response.text().await?;
        let data = if text.trim().is_empty() {
            serde_json::from_value(Value::Null)?
        } else {
            serde_json::from_str(&text)?
        };
        Ok(data)
    }
}

/// Whether an error from [`SupabaseClient`] was a 404 from the store.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.to_string().starts_with(NOT_FOUND_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let config = AppConfig {
            supabase_url: "http://localhost:54321/".to_string(),
            ..AppConfig::default()
        };
        let client = SupabaseClient::new(&config);
        assert_eq!(client.base_url, "http://localhost:54321");
    }

    #[test]
    fn classifies_not_found_errors() {
        assert!(is_not_found(&anyhow!("{}: missing", NOT_FOUND_PREFIX)));
        assert!(!is_not_found(&anyhow!("API error (500): boom")));
    }
}
