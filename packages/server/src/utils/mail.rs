use async_trait::async_trait;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

/// Out-of-band delivery of confirmation codes.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_confirmation_code(
        &self,
        username: &str,
        email: &str,
        code: &str,
    ) -> Result<(), MailError>;
}

/// Writes outgoing mail to the log instead of a transport.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_confirmation_code(
        &self,
        username: &str,
        email: &str,
        code: &str,
    ) -> Result<(), MailError> {
        info!(
            from = %self.from,
            to = %email,
            username,
            "Confirmation code: {code}"
        );
        Ok(())
    }
}
