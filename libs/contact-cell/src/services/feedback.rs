use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::{return_representation, SupabaseClient};
use shared_utils::pagination::Pagination;

use crate::models::{ContactError, CreateFeedbackRequest, Feedback, MailMessage};
use crate::services::mailer::{HttpMailer, Mailer};

pub struct FeedbackService {
    supabase: SupabaseClient,
    mailer: Option<Arc<dyn Mailer>>,
    mail_from: String,
    inbox: String,
}

impl FeedbackService {
    pub fn new(config: &AppConfig) -> Self {
        let mailer = HttpMailer::from_config(config).map(|m| Arc::new(m) as Arc<dyn Mailer>);
        Self::with_mailer(config, mailer)
    }

    pub fn with_mailer(config: &AppConfig, mailer: Option<Arc<dyn Mailer>>) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            mailer,
            mail_from: config.mail_from.clone(),
            inbox: config.contact_inbox.clone(),
        }
    }

    /// Store a contact message and forward it to the inbox when mail is set
    /// up. Returns the stored row and whether the notification went out.
    pub async fn submit(
        &self,
        request: CreateFeedbackRequest,
    ) -> Result<(Feedback, bool), ContactError> {
        let request = request.normalized()?;
        debug!("Storing contact message from {}", request.email);

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/feedback",
            None,
            Some(json!({
                "name": request.name,
                "email": request.email,
                "subject": request.subject,
                "message": request.message,
                "created_at": Utc::now().to_rfc3339()
            })),
            Some(return_representation()),
        ).await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| ContactError::Database("Failed to store message".to_string()))?;
        let feedback: Feedback = serde_json::from_value(row)?;

        let notified = match self.mailer {
            Some(ref mailer) => {
                let mail = MailMessage::for_feedback(&feedback, &self.mail_from, &self.inbox);
                match mailer.send(&mail).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Stored feedback {} but notification failed: {}", feedback.id, e);
                        false
                    }
                }
            }
            None => false,
        };

        info!("Feedback {} received (notified: {})", feedback.id, notified);
        Ok((feedback, notified))
    }

    pub async fn list(
        &self,
        page: &Pagination,
        auth_token: &str,
    ) -> Result<Vec<Feedback>, ContactError> {
        let path = format!("/rest/v1/feedback?order=created_at.desc{}", page.query());
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(ContactError::from))
            .collect()
    }
}
