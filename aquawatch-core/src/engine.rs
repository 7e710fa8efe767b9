//! Per-reading evaluation pipeline
//!
//! Drives one reading through classification, limit resolution,
//! breach evaluation, cooldown check, and dispatch. The engine owns
//! the cooldown state; the poll loop owns the engine and feeds it one
//! reading at a time, so no synchronization is needed.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use crate::breach::is_breach;
use crate::cooldown::CooldownTracker;
use crate::dispatch::AlertDispatcher;
use crate::limits::{resolve, DefaultLimits, DirectionPolicy};
use crate::model::{BreachAlert, NotificationOutcome, SensorReading};
use crate::signal::{classify, SignalType};

/// Engine policy knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum elapsed time between two notifications for the same
    /// signal type.
    pub cooldown_window: Duration,
    /// Whether a dispatch where every channel failed still registers
    /// a cooldown entry. `true` matches the reference behavior and
    /// avoids alert storms during provider outages, at the cost of
    /// silencing further attempts for the window.
    pub register_on_failure: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cooldown_window: Duration::minutes(10),
            register_on_failure: true,
        }
    }
}

/// What happened to one reading, for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingDisposition {
    /// `value` was null; reading is inert.
    MissingValue,
    /// No keyword group recognized the tag.
    Unclassified,
    /// No limit at any resolution tier.
    NoLimit { signal: SignalType },
    /// Value is within its limit.
    WithinLimit { signal: SignalType },
    /// Breach confirmed but suppressed by the cooldown window.
    Suppressed { signal: SignalType },
    /// Breach dispatched to the notification channels.
    Dispatched {
        signal: SignalType,
        outcome: NotificationOutcome,
    },
}

pub struct AlarmEngine {
    defaults: DefaultLimits,
    policy: DirectionPolicy,
    cooldowns: CooldownTracker,
    register_on_failure: bool,
}

impl AlarmEngine {
    pub fn new(config: EngineConfig, defaults: DefaultLimits, policy: DirectionPolicy) -> Self {
        Self {
            defaults,
            policy,
            cooldowns: CooldownTracker::new(config.cooldown_window),
            register_on_failure: config.register_on_failure,
        }
    }

    /// Evaluate one reading against the merged limits and dispatch a
    /// notification when a breach passes the cooldown check.
    ///
    /// `limits` is keyed by lowercase raw tag, as produced by the
    /// worker's limits merge.
    pub async fn process_reading<D: AlertDispatcher + ?Sized>(
        &mut self,
        reading: &SensorReading,
        limits: &BTreeMap<String, f64>,
        dispatcher: &D,
        now: DateTime<Utc>,
    ) -> ReadingDisposition {
        let Some(value) = reading.value else {
            tracing::trace!(sensor_id = reading.sensor_id, tag = %reading.tag, "null value, skipping");
            return ReadingDisposition::MissingValue;
        };

        let Some(signal) = classify(&reading.tag) else {
            tracing::trace!(sensor_id = reading.sensor_id, tag = %reading.tag, "unclassified tag, skipping");
            return ReadingDisposition::Unclassified;
        };

        let Some(resolved) = resolve(&reading.tag, signal, limits, &self.defaults, &self.policy)
        else {
            tracing::trace!(%signal, tag = %reading.tag, "no limit at any tier, skipping");
            return ReadingDisposition::NoLimit { signal };
        };

        if !is_breach(value, resolved.limit, resolved.direction) {
            return ReadingDisposition::WithinLimit { signal };
        }

        if !self.cooldowns.should_trigger(signal, now) {
            tracing::debug!(
                %signal,
                value,
                limit = resolved.limit,
                "breach suppressed by cooldown window"
            );
            return ReadingDisposition::Suppressed { signal };
        }

        let alert = BreachAlert {
            signal,
            tag: reading.tag.clone(),
            value,
            limit: resolved.limit,
            direction: resolved.direction,
            origin: resolved.origin,
            ts: reading.ts,
        };

        tracing::info!(
            %signal,
            value,
            limit = alert.limit,
            origin = ?alert.origin,
            tag = %alert.tag,
            "breach detected, dispatching notifications"
        );

        let outcome = dispatcher.dispatch(&alert).await;

        if outcome.all_failed() {
            if self.register_on_failure {
                tracing::warn!(
                    %signal,
                    "every notification channel failed; registering cooldown anyway"
                );
                self.cooldowns.register(signal, now);
            } else {
                tracing::warn!(
                    %signal,
                    "every notification channel failed; leaving cooldown open for retry next breach"
                );
            }
        } else {
            self.cooldowns.register(signal, now);
        }

        ReadingDisposition::Dispatched { signal, outcome }
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }
}
