use futures::future::BoxFuture;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Error)]
#[error("mail delivery failed: {0}")]
pub struct MailError(pub String);

/// Outgoing email transport.
pub trait Mailer: Send + Sync {
    fn send(&self, mail: Mail) -> BoxFuture<'_, Result<(), MailError>>;
}

/// Writes mail to the log instead of sending it.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, mail: Mail) -> BoxFuture<'_, Result<(), MailError>> {
        Box::pin(async move {
            info!(to = %mail.to, subject = %mail.subject, "Outgoing mail");
            debug!(body = %mail.body);
            Ok(())
        })
    }
}
