//! Poll loop
//!
//! Ticker-driven: every interval the loop runs one evaluation pass
//! over the latest reading per sensor. Iterations never overlap (the
//! next tick is not awaited until the current pass finishes) and any
//! failure inside a pass is logged and discarded; the loop itself
//! only ends with the process.

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use aquawatch_core::{AlarmEngine, GlobalAlarmConfig, LimitEntry, ReadingDisposition};

use crate::database::Database;
use crate::notify::FanOutDispatcher;

pub struct PollLoop {
    db: Database,
    engine: AlarmEngine,
    dispatcher: FanOutDispatcher,
    interval: Duration,
}

impl PollLoop {
    pub fn new(
        db: Database,
        engine: AlarmEngine,
        dispatcher: FanOutDispatcher,
        interval: Duration,
    ) -> Self {
        Self {
            db,
            engine,
            dispatcher,
            interval,
        }
    }

    /// Run forever. Only process termination stops the loop.
    pub async fn run(mut self) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_secs = self.interval.as_secs(), "alarm poll loop started");

        loop {
            ticker.tick().await;
            if let Err(err) = self.run_iteration().await {
                tracing::error!("alarm iteration failed: {:#}; continuing on next tick", err);
            }
        }
    }

    /// One `Evaluating` pass: config gate, limits merge, latest
    /// readings, per-reading pipeline.
    async fn run_iteration(&mut self) -> Result<()> {
        tracing::debug!("checking sensors");

        let config = match gate(self.db.read_global_config().await) {
            Some(config) => config,
            None => return Ok(()),
        };

        if !config.alarms_enabled {
            tracing::debug!("alarms disabled in global config; skipping iteration");
            return Ok(());
        }

        let table_entries = self.db.read_limits().await.context("reading limits table")?;
        let limits = effective_limits(&table_entries, config.overrides.as_ref());
        tracing::trace!(?limits, "limits in effect");

        let readings = self
            .db
            .latest_reading_per_sensor()
            .await
            .context("fetching latest readings")?;

        if readings.is_empty() {
            tracing::debug!("no readings found");
            return Ok(());
        }

        for reading in &readings {
            let disposition = self
                .engine
                .process_reading(reading, &limits, &self.dispatcher, Utc::now())
                .await;

            if let ReadingDisposition::Dispatched { signal, outcome } = disposition {
                tracing::info!(
                    %signal,
                    email_ok = outcome.email_ok,
                    messaging_ok = outcome.messaging_ok,
                    "dispatch attempt completed"
                );
            }
        }

        Ok(())
    }
}

/// Config gate with the fail-closed policy: an absent row or a read
/// failure both mean "alarms disabled, skip this iteration".
fn gate(read: Result<Option<GlobalAlarmConfig>>) -> Option<GlobalAlarmConfig> {
    match read {
        Ok(Some(config)) => Some(config),
        Ok(None) => {
            tracing::warn!("global alarm config row absent; failing closed");
            None
        }
        Err(err) => {
            tracing::warn!("global alarm config unreadable, failing closed: {:#}", err);
            None
        }
    }
}

/// Merge the limits table with the config-row overrides; overrides
/// win. Keys are lowercased so exact-match resolution is
/// case-insensitive, and the `BTreeMap` makes the family-fallback
/// scan deterministic.
fn effective_limits(
    table: &[LimitEntry],
    overrides: Option<&HashMap<String, f64>>,
) -> BTreeMap<String, f64> {
    let mut limits: BTreeMap<String, f64> = table
        .iter()
        .map(|entry| (entry.tag.to_lowercase(), entry.limit))
        .collect();

    if let Some(overrides) = overrides {
        for (tag, limit) in overrides {
            limits.insert(tag.to_lowercase(), *limit);
        }
    }

    limits
}
