//! SMS notification delivery via the HTTP gateway.
//!
//! [`SmsChannel`] POSTs a JSON payload to the configured gateway. Like the
//! email channel it is best-effort: missing credentials, an empty message,
//! or an empty recipient set all skip the send with a log line instead of
//! failing the caller.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tracing::{info, warn};

use mifugo_core::config::SmsConfig;
use mifugo_core::contact::normalize_phone;

/// HTTP request timeout for a single gateway call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for SMS delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("SMS gateway returned HTTP {0}")]
    HttpStatus(u16),
}

/// Delivery seam so the reactor and sweeper can be exercised against a
/// recording fake.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, recipients: &[String], message: &str) -> Result<(), SmsError>;
}

pub struct SmsChannel {
    client: reqwest::Client,
    config: SmsConfig,
}

impl SmsChannel {
    pub fn new(config: SmsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }
}

#[async_trait]
impl SmsSender for SmsChannel {
    async fn send(&self, recipients: &[String], message: &str) -> Result<(), SmsError> {
        if !self.config.is_configured() {
            warn!("sms channel not configured; skipping send");
            return Ok(());
        }
        if message.trim().is_empty() {
            warn!("empty sms message; skipping send");
            return Ok(());
        }

        let mobiles = normalize_and_dedupe(recipients);
        if mobiles.is_empty() {
            warn!("no valid sms recipients after normalization; skipping send");
            return Ok(());
        }

        // is_configured() guarantees the credential fields are present.
        let gateway_url = self.config.gateway_url.as_deref().unwrap_or_default();
        let api_key = self
            .config
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().to_string())
            .unwrap_or_default();
        let partner_id = self.config.partner_id.as_deref().unwrap_or_default();
        let shortcode = self.config.shortcode.as_deref().unwrap_or_default();

        let payload = serde_json::json!({
            "apikey": api_key,
            "partnerID": partner_id,
            "mobile": mobiles.join(","),
            "message": message,
            "shortcode": shortcode,
        });

        let response = self.client.post(gateway_url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(SmsError::HttpStatus(response.status().as_u16()));
        }

        info!(recipients = mobiles.len(), "notification sms sent");
        Ok(())
    }
}

fn normalize_and_dedupe(recipients: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    recipients
        .iter()
        .filter_map(|raw| normalize_phone(raw))
        .filter(|mobile| seen.insert(mobile.clone()))
        .collect()
}
