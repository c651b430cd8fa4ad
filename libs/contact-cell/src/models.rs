use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::validation::validate_email;

pub const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeedbackRequest {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

impl CreateFeedbackRequest {
    /// Trim every field and check it, returning the cleaned request.
    pub fn normalized(self) -> Result<Self, ContactError> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        let message = self.message.trim().to_string();
        let subject = self
            .subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if name.is_empty() {
            return Err(ContactError::Validation("Name is required".to_string()));
        }
        if !validate_email(&email) {
            return Err(ContactError::Validation(format!("Invalid email address: {}", email)));
        }
        if message.is_empty() {
            return Err(ContactError::Validation("Message is required".to_string()));
        }
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(ContactError::Validation("Message is too long".to_string()));
        }

        Ok(Self { name, email, subject, message })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

impl MailMessage {
    pub fn for_feedback(feedback: &Feedback, from: &str, to: &str) -> Self {
        let subject = match feedback.subject {
            Some(ref s) => format!("[CareConnect] {}", s),
            None => format!("[CareConnect] Message from {}", feedback.name),
        };

        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject,
            text: format!(
                "From: {} <{}>\nReceived: {}\n\n{}",
                feedback.name,
                feedback.email,
                feedback.created_at.to_rfc3339(),
                feedback.message
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("Contact message not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Mail delivery failed: {0}")]
    Mail(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for ContactError {
    fn from(err: anyhow::Error) -> Self {
        if shared_database::supabase::is_not_found(&err) {
            ContactError::NotFound
        } else {
            ContactError::Database(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ContactError {
    fn from(err: serde_json::Error) -> Self {
        ContactError::Database(format!("Malformed feedback row: {}", err))
    }
}

impl From<ContactError> for AppError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::NotFound => AppError::NotFound(err.to_string()),
            ContactError::Validation(msg) => AppError::ValidationError(msg),
            ContactError::Mail(msg) => AppError::ExternalService(msg),
            ContactError::Database(msg) => AppError::Database(msg),
        }
    }
}
