use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Failed to parse event: {0}")]
    InvalidMessage(String),

    #[error("Unexpected event type: {0}")]
    UnexpectedEvent(String),

    #[error("Failed to send invitation mail: {0}")]
    SendFailed(#[from] bmg_shared::mail::MailError),
}
