//! Dispatcher seam
//!
//! The engine hands confirmed breaches to an [`AlertDispatcher`]; the
//! worker binary supplies the real fan-out over its HTTP channels,
//! tests supply recording mocks. A dispatch never raises: per-channel
//! failures are captured in the returned [`NotificationOutcome`].

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{BreachAlert, NotificationOutcome};

/// Failure of one notification channel. Isolated per channel and per
/// recipient; logged by the caller, never propagated across siblings.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel not configured: missing {0}")]
    NotConfigured(&'static str),

    #[error("no recipients configured")]
    NoRecipients,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned status {code}: {body}")]
    Status { code: u16, body: String },
}

/// Fans a breach alert out to the configured notification channels.
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    async fn dispatch(&self, alert: &BreachAlert) -> NotificationOutcome;
}
