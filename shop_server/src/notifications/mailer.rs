use futures::future::BoxFuture;
use log::*;
use thiserror::Error;

use super::EmailMessage;

#[derive(Debug, Clone, Error)]
pub enum MailError {
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),
}

/// Hands rendered messages to a mail transport.
///
/// Implementations are shared between event handler tasks, so they must be `Send + Sync`, and the returned future must
/// be `Send`.
pub trait Mailer: Send + Sync {
    fn send(&self, message: EmailMessage) -> BoxFuture<'_, Result<(), MailError>>;
}

/// A `Mailer` that writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: EmailMessage) -> BoxFuture<'_, Result<(), MailError>> {
        Box::pin(async move {
            if !message.to.contains('@') {
                return Err(MailError::InvalidRecipient(message.to));
            }
            info!("📧️ Mail from {} to {}: {}", message.from, message.to, message.subject);
            debug!("📧️ Message body:\n{}", message.html_body);
            Ok(())
        })
    }
}
