//! SMTP notifier built on lettre's async transport.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::{MailConfig, MailSecurity};
use crate::services::notifications::{DeliveryError, Notifier};

/// Delivers mail through a pooled SMTP relay connection
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpNotifier {
    /// Builds the transport from mail settings.
    ///
    /// No connection is opened here; the first send connects.
    pub fn from_config(config: &MailConfig) -> Result<Self, DeliveryError> {
        let sender = parse_mailbox(config.sender())?;

        let mut builder = match config.security {
            MailSecurity::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| DeliveryError::Transport(e.to_string()))?,
            MailSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| DeliveryError::Transport(e.to_string()))?,
            MailSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        tracing::debug!(
            host = %config.host,
            port = config.port,
            security = ?config.security,
            sender = %sender,
            "SMTP notifier configured"
        );

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }

    fn build_message(&self, to: &str, subject: &str, text: &str) -> Result<Message, DeliveryError> {
        Message::builder()
            .from(self.sender.clone())
            .to(parse_mailbox(to)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(text.to_string())
            .map_err(|e| DeliveryError::Build(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| DeliveryError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, to: &str, subject: &str, text: &str) -> Result<(), DeliveryError> {
        let message = self.build_message(to, subject, text)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        tracing::debug!(to = %to, code = %response.code(), "SMTP relay accepted message");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
