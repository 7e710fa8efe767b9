//! Shared data model for the alarm engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::limits::{Direction, LimitOrigin};
use crate::signal::SignalType;

/// One latest-per-sensor reading pulled from the data source.
///
/// A `value` of `None` makes the reading inert; it is skipped without
/// reaching limit resolution or breach evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorReading {
    pub sensor_id: i64,
    pub tag: String,
    pub value: Option<f64>,
    pub ts: DateTime<Utc>,
}

/// One row of the persisted limits table, keyed by exact raw tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitEntry {
    pub tag: String,
    pub limit: f64,
}

/// Singleton on/off switch plus optional per-tag limit overrides.
///
/// Read once per iteration before any evaluation. The overrides map,
/// when present, is merged over the limits table with the config row
/// winning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalAlarmConfig {
    pub alarms_enabled: bool,
    pub overrides: Option<HashMap<String, f64>>,
}

/// A confirmed threshold breach, ready for notification fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BreachAlert {
    pub signal: SignalType,
    pub tag: String,
    pub value: f64,
    pub limit: f64,
    pub direction: Direction,
    pub origin: LimitOrigin,
    pub ts: DateTime<Utc>,
}

impl BreachAlert {
    /// Operator-facing equipment label.
    pub fn label(&self) -> &'static str {
        self.signal.label()
    }

    /// Short subject line for notifications.
    pub fn headline(&self) -> String {
        format!("ALERTA CRÍTICO: {}", self.label())
    }

    /// Direction wording for message bodies.
    pub fn direction_phrase(&self) -> &'static str {
        match self.direction {
            Direction::Above => "acima do limite configurado",
            Direction::Below => "abaixo do limite configurado",
        }
    }

    /// Plain-text description carrying the four facts every channel
    /// must deliver: parameter, measured value, limit, timestamp.
    pub fn body_text(&self) -> String {
        format!(
            "⚠️ ALERTA ETA ⚠️\n\n\
             Equipamento / Parâmetro: {}\n\
             Valor lido: {}\n\
             Limite configurado: {}\n\
             Horário: {}\n\n\
             Verifique o painel da ETA para mais detalhes.",
            self.label(),
            self.value,
            self.limit,
            self.formatted_ts(),
        )
    }

    /// Extra detail line with the raw tag and the comparison.
    pub fn detail_line(&self) -> String {
        format!(
            "Equipamento {} {} ({} vs {}). Tag original: {}",
            self.label(),
            self.direction_phrase(),
            self.value,
            self.limit,
            self.tag,
        )
    }

    pub fn formatted_ts(&self) -> String {
        self.ts.format("%d/%m/%Y %H:%M").to_string()
    }
}

/// Per-channel result of one dispatch attempt. Best-effort only:
/// a `false` here is logged, never retried.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationOutcome {
    pub email_ok: bool,
    pub messaging_ok: bool,
}

impl NotificationOutcome {
    pub fn any_ok(&self) -> bool {
        self.email_ok || self.messaging_ok
    }

    pub fn all_failed(&self) -> bool {
        !self.any_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn alert() -> BreachAlert {
        BreachAlert {
            signal: SignalType::Ph,
            tag: "qualidade/ph".to_string(),
            value: 8.2,
            limit: 7.0,
            direction: Direction::Above,
            origin: LimitOrigin::Exact,
            ts: Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_body_text_carries_four_facts() {
        let body = alert().body_text();
        assert!(body.contains("pH"));
        assert!(body.contains("8.2"));
        assert!(body.contains("7"));
        assert!(body.contains("15/03/2024 14:30"));
    }

    #[test]
    fn test_detail_line_includes_raw_tag() {
        let detail = alert().detail_line();
        assert!(detail.contains("qualidade/ph"));
        assert!(detail.contains("acima do limite"));
    }

    #[test]
    fn test_outcome_any_ok() {
        assert!(NotificationOutcome { email_ok: false, messaging_ok: true }.any_ok());
        assert!(NotificationOutcome { email_ok: true, messaging_ok: false }.any_ok());
        assert!(NotificationOutcome::default().all_failed());
    }
}
