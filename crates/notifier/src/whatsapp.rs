use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use signal_core::{Notifier, SignalError};

use crate::registry::SubscriberRegistry;

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v18.0";

/// WhatsApp Cloud API credentials. All optional: without credentials the
/// notifier runs in dry-run mode and only logs outbound messages.
#[derive(Debug, Clone, Default)]
pub struct WhatsAppConfig {
    pub access_token: Option<String>,
    pub phone_number_id: Option<String>,
    /// Numbers subscribed at startup, before any API registrations.
    pub seed_subscribers: Vec<String>,
}

impl WhatsAppConfig {
    pub fn from_env() -> Self {
        let seed_subscribers = std::env::var("WHATSAPP_SUBSCRIBERS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            access_token: std::env::var("WHATSAPP_ACCESS_TOKEN").ok(),
            phone_number_id: std::env::var("WHATSAPP_PHONE_NUMBER_ID").ok(),
            seed_subscribers,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.access_token.is_some() && self.phone_number_id.is_some()
    }
}

/// Sends text messages through the WhatsApp Cloud API to the registry's
/// active subscribers.
pub struct WhatsAppNotifier {
    http: Client,
    config: WhatsAppConfig,
    registry: Arc<SubscriberRegistry>,
}

impl WhatsAppNotifier {
    pub fn new(config: WhatsAppConfig, registry: Arc<SubscriberRegistry>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            config,
            registry,
        }
    }

    pub fn registry(&self) -> Arc<SubscriberRegistry> {
        Arc::clone(&self.registry)
    }
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    async fn send(&self, recipient: &str, message: &str) -> Result<(), SignalError> {
        let (Some(token), Some(phone_id)) =
            (&self.config.access_token, &self.config.phone_number_id)
        else {
            info!(recipient, "WhatsApp dry-run: {message}");
            return Ok(());
        };

        let url = format!("{GRAPH_API_BASE}/{phone_id}/messages");
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&json!({
                "messaging_product": "whatsapp",
                "to": recipient,
                "type": "text",
                "text": { "body": message },
            }))
            .send()
            .await
            .map_err(|e| SignalError::Notification(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SignalError::Notification(format!(
                "WhatsApp API returned HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Per-recipient failures are logged and do not stop the fan-out.
    async fn broadcast(&self, message: &str) -> Result<(), SignalError> {
        for recipient in self.registry.active() {
            if let Err(err) = self.send(&recipient, message).await {
                warn!(recipient, %err, "WhatsApp broadcast delivery failed");
            }
        }
        Ok(())
    }
}
