//! Notifier seam and delivery errors.

use async_trait::async_trait;
use thiserror::Error;

/// Why a message could not be delivered
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),

    #[error("Delivery timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// Sends a plain-text message to a single recipient.
///
/// Implementations must be `Send + Sync` so one instance can be shared by
/// every scheduled firing.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, text: &str) -> Result<(), DeliveryError>;

    /// Short identifier for logs, e.g. "smtp"
    fn name(&self) -> &'static str;
}
