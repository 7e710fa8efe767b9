//! Notification fan-out
//!
//! Two independent outbound channels (transactional email, WhatsApp
//! messaging) behind a common trait. The dispatcher attempts both for
//! every breach; a failure in one never prevents the other, and no
//! call is ever retried.

pub mod email;
pub mod whatsapp;

use async_trait::async_trait;

use aquawatch_core::{AlertDispatcher, BreachAlert, ChannelError, NotificationOutcome};

pub use email::EmailChannel;
pub use whatsapp::WhatsAppChannel;

/// One outbound channel. `send` succeeds when at least one recipient
/// delivery attempt returned success; per-recipient failures are
/// logged inside the channel and do not abort the others.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, alert: &BreachAlert) -> Result<(), ChannelError>;
}

/// Drive one delivery attempt per recipient. A failed recipient is
/// logged and never aborts the remaining ones; the channel as a whole
/// succeeds when at least one attempt succeeded, and otherwise
/// reports the last per-recipient error.
pub(crate) async fn deliver_all<'a, F, Fut>(
    channel: &'static str,
    recipients: &'a [String],
    attempt: F,
) -> Result<(), ChannelError>
where
    F: Fn(&'a str) -> Fut,
    Fut: std::future::Future<Output = Result<(), ChannelError>>,
{
    if recipients.is_empty() {
        return Err(ChannelError::NoRecipients);
    }

    let mut delivered = 0usize;
    let mut last_error = None;

    for recipient in recipients {
        match attempt(recipient).await {
            Ok(()) => delivered += 1,
            Err(err) => {
                tracing::warn!(channel, recipient = %recipient, error = %err, "recipient delivery failed");
                last_error = Some(err);
            }
        }
    }

    if delivered > 0 {
        Ok(())
    } else {
        Err(last_error.unwrap_or(ChannelError::NoRecipients))
    }
}

/// Fans each alert out to the email and messaging channels,
/// independently, and reports per-channel outcome.
pub struct FanOutDispatcher {
    email: Box<dyn NotificationChannel>,
    messaging: Box<dyn NotificationChannel>,
}

impl FanOutDispatcher {
    pub fn new(
        email: Box<dyn NotificationChannel>,
        messaging: Box<dyn NotificationChannel>,
    ) -> Self {
        Self { email, messaging }
    }

    async fn attempt(channel: &dyn NotificationChannel, alert: &BreachAlert) -> bool {
        match channel.send(alert).await {
            Ok(()) => {
                tracing::info!(channel = channel.name(), signal = %alert.signal, "alert delivered");
                true
            }
            Err(err) => {
                tracing::error!(
                    channel = channel.name(),
                    signal = %alert.signal,
                    error = %err,
                    "alert delivery failed"
                );
                false
            }
        }
    }
}

#[async_trait]
impl AlertDispatcher for FanOutDispatcher {
    async fn dispatch(&self, alert: &BreachAlert) -> NotificationOutcome {
        let email_ok = Self::attempt(self.email.as_ref(), alert).await;
        let messaging_ok = Self::attempt(self.messaging.as_ref(), alert).await;

        NotificationOutcome {
            email_ok,
            messaging_ok,
        }
    }
}
