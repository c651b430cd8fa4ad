pub mod feedback;
pub mod mailer;

pub use feedback::FeedbackService;
pub use mailer::{HttpMailer, Mailer};
