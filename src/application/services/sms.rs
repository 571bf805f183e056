use async_trait::async_trait;
use thiserror::Error;

/// Outbound text-message transport. The dispatcher treats every failure the
/// same way: mark the intent failed, log, continue with the next candidate.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Deliver `body` to `destination` and return the provider message id.
    async fn send(&self, destination: &str, body: &str) -> Result<String, DeliveryError>;
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid destination number: {0}")]
    InvalidDestination(String),
    #[error("provider rejected send ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
}
