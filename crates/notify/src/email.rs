//! Email notification delivery via SMTP.
//!
//! [`EmailChannel`] wraps the `lettre` async SMTP transport. It is
//! constructed once at bootstrap and injected wherever email delivery is
//! needed; when the relay credentials are incomplete the channel still
//! constructs, and every send becomes a logged no-op.

use std::collections::HashSet;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::{info, warn};

use mifugo_core::config::SmtpConfig;
use mifugo_core::contact::is_valid_email;

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The sender or a recipient address could not be parsed.
    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("email build error: {0}")]
    Build(String),
}

/// Delivery seam so the reactor and sweeper can be exercised against a
/// recording fake.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), EmailError>;
}

pub struct EmailChannel {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    sender: Option<String>,
}

impl EmailChannel {
    /// Build the channel from relay configuration. Missing credentials (or
    /// an unreachable relay host name) produce a disabled channel rather
    /// than an error; the skip is reported on each send attempt.
    pub fn new(config: &SmtpConfig) -> Self {
        if !config.is_configured() {
            return Self { transport: None, sender: None };
        }

        // is_configured() guarantees host/user/password presence.
        let host = config.host.as_deref().unwrap_or_default();
        let user = config.user.as_deref().unwrap_or_default();
        let password =
            config.password.as_ref().map(|p| p.expose_secret().to_string()).unwrap_or_default();

        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        };
        let transport = match builder {
            Ok(builder) => Some(
                builder
                    .port(config.port)
                    .credentials(Credentials::new(user.to_string(), password))
                    .build(),
            ),
            Err(error) => {
                warn!(host, error = %error, "smtp relay configuration rejected; email channel disabled");
                None
            }
        };

        // Fall back to the relay user when the configured from address is
        // absent or malformed.
        let sender = config
            .from_address
            .as_deref()
            .filter(|address| is_valid_email(address))
            .unwrap_or(user)
            .to_string();

        Self { transport, sender: Some(sender) }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }
}

#[async_trait]
impl EmailSender for EmailChannel {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), EmailError> {
        let (Some(transport), Some(sender)) = (&self.transport, &self.sender) else {
            warn!("email channel not configured; skipping send");
            return Ok(());
        };

        let valid = dedupe_valid(recipients);
        if valid.is_empty() {
            warn!(subject, "no valid email recipients after filtering; skipping send");
            return Ok(());
        }

        let from: Mailbox = sender.parse()?;
        let mut builder = Message::builder().from(from).subject(subject);
        for recipient in &valid {
            builder = builder.to(recipient.parse()?);
        }
        let message = builder
            .multipart(MultiPart::alternative_plain_html(text.to_string(), html.to_string()))
            .map_err(|e| EmailError::Build(e.to_string()))?;

        transport.send(message).await?;
        info!(recipients = valid.len(), subject, "notification email sent");
        Ok(())
    }
}

/// Deduplicate while preserving order, dropping anything that is not
/// `local@domain` shaped.
fn dedupe_valid(recipients: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    recipients
        .iter()
        .map(|recipient| recipient.trim())
        .filter(|recipient| is_valid_email(recipient))
        .filter(|recipient| seen.insert(recipient.to_ascii_lowercase()))
        .map(str::to_string)
        .collect()
}
