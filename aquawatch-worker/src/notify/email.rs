//! Transactional email channel (Brevo-style API).
//!
//! One `POST` per recipient; the channel succeeds when at least one
//! recipient attempt returns 2xx.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use aquawatch_core::{BreachAlert, ChannelError};

use crate::config::EmailConfig;
use crate::notify::NotificationChannel;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct EmailChannel {
    client: Client,
    config: EmailConfig,
}

impl EmailChannel {
    pub fn new(config: EmailConfig) -> Self {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    async fn send_to(&self, api_key: &str, recipient: &str, alert: &BreachAlert) -> Result<(), ChannelError> {
        let payload = build_payload(&self.config, recipient, alert);

        let response = self
            .client
            .post(&self.config.api_url)
            .header("accept", "application/json")
            .header("api-key", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(recipient, status = status.as_u16(), "email accepted");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ChannelError::Status {
                code: status.as_u16(),
                body,
            })
        }
    }
}

/// Brevo-style wire contract: `{sender:{name,email}, to:[{email}],
/// subject, htmlContent}`.
pub fn build_payload(config: &EmailConfig, recipient: &str, alert: &BreachAlert) -> serde_json::Value {
    let html_content = format!(
        "<h1>Alerta de Manutenção</h1>\
         <p>O equipamento <strong>{}</strong> está {}.</p>\
         <p>Valor atual: <strong>{}</strong>. Limite configurado: <strong>{}</strong>.</p>\
         <p>Detalhes: {}</p>\
         <p>Horário da leitura: {}.</p>\
         <p>Por favor, verifique imediatamente o painel da ETA.</p>",
        alert.label(),
        alert.direction_phrase(),
        alert.value,
        alert.limit,
        alert.detail_line(),
        alert.formatted_ts(),
    );

    json!({
        "sender": {
            "name": config.sender_name,
            "email": config.sender_email,
        },
        "to": [{ "email": recipient }],
        "subject": alert.headline(),
        "htmlContent": html_content,
    })
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, alert: &BreachAlert) -> Result<(), ChannelError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ChannelError::NotConfigured("BREVO_API_KEY"))?;

        crate::notify::deliver_all(self.name(), &self.config.recipients, |recipient| {
            self.send_to(api_key, recipient, alert)
        })
        .await
    }
}
