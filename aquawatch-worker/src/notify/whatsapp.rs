//! WhatsApp messaging channel (Meta Graph API).
//!
//! One `POST` per recipient number. When a template name is
//! configured the channel sends a structured template with four body
//! parameters (parameter label, measured value, limit, timestamp);
//! otherwise it sends a free-text body carrying the same facts.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use aquawatch_core::{BreachAlert, ChannelError};

use crate::config::WhatsAppConfig;
use crate::notify::NotificationChannel;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Graph error code for "recipient phone number not in allowed list",
/// the classic sandbox misconfiguration.
const ERROR_RECIPIENT_NOT_ALLOWED: i64 = 131030;

pub struct WhatsAppChannel {
    client: Client,
    config: WhatsAppConfig,
}

impl WhatsAppChannel {
    pub fn new(config: WhatsAppConfig) -> Self {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn endpoint(&self, phone_number_id: &str) -> String {
        format!(
            "https://graph.facebook.com/{}/{}/messages",
            self.config.api_version, phone_number_id
        )
    }

    async fn send_to(
        &self,
        token: &str,
        phone_number_id: &str,
        recipient: &str,
        alert: &BreachAlert,
    ) -> Result<(), ChannelError> {
        let payload = build_payload(&self.config, recipient, alert);

        let response = self
            .client
            .post(self.endpoint(phone_number_id))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(recipient, status = status.as_u16(), "whatsapp message accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();

        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&body) {
            if parsed["error"]["code"].as_i64() == Some(ERROR_RECIPIENT_NOT_ALLOWED) {
                tracing::warn!(
                    recipient,
                    "number not in the allowed list (sandbox); add it in the Meta console or use a production number"
                );
            }
        }

        Err(ChannelError::Status {
            code: status.as_u16(),
            body,
        })
    }
}

/// Graph wire contract, template or free-text depending on config.
pub fn build_payload(
    config: &WhatsAppConfig,
    recipient: &str,
    alert: &BreachAlert,
) -> serde_json::Value {
    match &config.template_name {
        Some(template) => json!({
            "messaging_product": "whatsapp",
            "to": recipient,
            "type": "template",
            "template": {
                "name": template,
                "language": { "code": config.template_lang },
                "components": [{
                    "type": "body",
                    "parameters": [
                        { "type": "text", "text": alert.label() },
                        { "type": "text", "text": alert.value.to_string() },
                        { "type": "text", "text": alert.limit.to_string() },
                        { "type": "text", "text": alert.formatted_ts() },
                    ],
                }],
            },
        }),
        None => json!({
            "messaging_product": "whatsapp",
            "to": recipient,
            "type": "text",
            "text": {
                "preview_url": false,
                "body": alert.body_text(),
            },
        }),
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppChannel {
    fn name(&self) -> &'static str {
        "whatsapp"
    }

    async fn send(&self, alert: &BreachAlert) -> Result<(), ChannelError> {
        let token = self
            .config
            .token
            .as_deref()
            .ok_or(ChannelError::NotConfigured("WPP_TOKEN"))?;
        let phone_number_id = self
            .config
            .phone_number_id
            .as_deref()
            .ok_or(ChannelError::NotConfigured("WPP_PHONE_NUMBER_ID"))?;

        crate::notify::deliver_all(self.name(), &self.config.recipients, |recipient| {
            self.send_to(token, phone_number_id, recipient, alert)
        })
        .await
    }
}
