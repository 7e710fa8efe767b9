//! Multi-tier limit resolution
//!
//! Determines the numeric threshold and comparison direction for a
//! classified reading. Resolution is deterministic and total across
//! three tiers: exact tag match, same-family fallback (first matching
//! entry in the map's sorted iteration order), then the static
//! per-type default. Direction always comes from the static policy,
//! independent of which tier produced the value.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::signal::{classify, SignalType};

/// Comparison direction for breach evaluation.
///
/// Every shipped signal type maps to `Above` today; `Below` is a
/// supported policy value for low-side conditions (e.g. reservoir
/// level under a safety floor) and is exercised by tests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Above,
    Below,
}

/// Which resolution tier produced a limit value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LimitOrigin {
    Exact,
    Family,
    Default,
}

/// A fully resolved threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLimit {
    pub limit: f64,
    pub direction: Direction,
    pub origin: LimitOrigin,
}

/// Static `SignalType -> Direction` mapping, fixed at deploy time.
#[derive(Debug, Clone)]
pub struct DirectionPolicy {
    directions: HashMap<SignalType, Direction>,
}

impl Default for DirectionPolicy {
    fn default() -> Self {
        let directions = SignalType::ALL
            .iter()
            .map(|signal| (*signal, Direction::Above))
            .collect();
        Self { directions }
    }
}

impl DirectionPolicy {
    pub fn with_direction(mut self, signal: SignalType, direction: Direction) -> Self {
        self.directions.insert(signal, direction);
        self
    }

    pub fn direction_for(&self, signal: SignalType) -> Direction {
        self.directions
            .get(&signal)
            .copied()
            .unwrap_or(Direction::Above)
    }
}

/// Static per-type default limits, resolution tier 3.
#[derive(Debug, Clone)]
pub struct DefaultLimits {
    limits: HashMap<SignalType, f64>,
}

impl Default for DefaultLimits {
    fn default() -> Self {
        let limits = HashMap::from([
            (SignalType::Ph, 7.0),
            (SignalType::Turbidity, 10.0),
            (SignalType::Flow, 300.0),
            (SignalType::Chlorine, 900.0),
            (SignalType::Pressure, 5.0),
            (SignalType::Level, 22000.0),
        ]);
        Self { limits }
    }
}

impl DefaultLimits {
    /// A policy with no defaults; every resolution must then come
    /// from the limits table.
    pub fn empty() -> Self {
        Self { limits: HashMap::new() }
    }

    pub fn with_limit(mut self, signal: SignalType, limit: f64) -> Self {
        self.limits.insert(signal, limit);
        self
    }

    pub fn without(mut self, signal: SignalType) -> Self {
        self.limits.remove(&signal);
        self
    }

    pub fn limit_for(&self, signal: SignalType) -> Option<f64> {
        self.limits.get(&signal).copied()
    }
}

/// Resolve the threshold that applies to `raw_tag` / `signal`.
///
/// `limits` is keyed by lowercase raw tag; the worker normalizes keys
/// when it merges the limits table with config-row overrides. Using a
/// `BTreeMap` keeps the family-fallback scan deterministic.
///
/// Returns `None` only when all three tiers come up empty, in which
/// case the reading is skipped without alert.
pub fn resolve(
    raw_tag: &str,
    signal: SignalType,
    limits: &BTreeMap<String, f64>,
    defaults: &DefaultLimits,
    policy: &DirectionPolicy,
) -> Option<ResolvedLimit> {
    let direction = policy.direction_for(signal);
    let tag_key = raw_tag.trim().to_lowercase();

    // Tier 1: exact tag match.
    if let Some(limit) = limits.get(&tag_key) {
        return Some(ResolvedLimit {
            limit: *limit,
            direction,
            origin: LimitOrigin::Exact,
        });
    }

    // Tier 2: first entry whose own tag classifies to the same family.
    for (tag, limit) in limits {
        if classify(tag) == Some(signal) {
            return Some(ResolvedLimit {
                limit: *limit,
                direction,
                origin: LimitOrigin::Family,
            });
        }
    }

    // Tier 3: static per-type default.
    defaults.limit_for(signal).map(|limit| ResolvedLimit {
        limit,
        direction,
        origin: LimitOrigin::Default,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits_of(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries
            .iter()
            .map(|(tag, limit)| (tag.to_string(), *limit))
            .collect()
    }

    #[test]
    fn test_exact_match_wins_over_family() {
        let limits = limits_of(&[("qualidade/ph", 7.5), ("outro/ph", 9.0)]);
        let resolved = resolve(
            "qualidade/ph",
            SignalType::Ph,
            &limits,
            &DefaultLimits::default(),
            &DirectionPolicy::default(),
        )
        .unwrap();

        assert_eq!(resolved.limit, 7.5);
        assert_eq!(resolved.origin, LimitOrigin::Exact);
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let limits = limits_of(&[("qualidade/ph", 7.5)]);
        let resolved = resolve(
            "Qualidade/PH",
            SignalType::Ph,
            &limits,
            &DefaultLimits::empty(),
            &DirectionPolicy::default(),
        )
        .unwrap();

        assert_eq!(resolved.origin, LimitOrigin::Exact);
    }

    #[test]
    fn test_family_fallback_uses_first_entry_in_sorted_order() {
        let limits = limits_of(&[
            ("z-pressao/linha9", 4.0),
            ("a-pressao/linha1", 6.0),
            ("qualidade/cloro", 900.0),
        ]);
        let resolved = resolve(
            "pressao/nova-linha",
            SignalType::Pressure,
            &limits,
            &DefaultLimits::empty(),
            &DirectionPolicy::default(),
        )
        .unwrap();

        // BTreeMap iteration is lexicographic, so the "a-" entry wins.
        assert_eq!(resolved.limit, 6.0);
        assert_eq!(resolved.origin, LimitOrigin::Family);
    }

    #[test]
    fn test_default_tier_when_table_has_no_match() {
        let limits = limits_of(&[("qualidade/cloro", 900.0)]);
        let resolved = resolve(
            "decantacao/turbidez",
            SignalType::Turbidity,
            &limits,
            &DefaultLimits::default(),
            &DirectionPolicy::default(),
        )
        .unwrap();

        assert_eq!(resolved.limit, 10.0);
        assert_eq!(resolved.origin, LimitOrigin::Default);
    }

    #[test]
    fn test_no_tier_yields_none() {
        let limits = limits_of(&[("qualidade/cloro", 900.0)]);
        let resolved = resolve(
            "decantacao/turbidez",
            SignalType::Turbidity,
            &limits,
            &DefaultLimits::empty(),
            &DirectionPolicy::default(),
        );

        assert!(resolved.is_none());
    }

    #[test]
    fn test_direction_comes_from_policy_regardless_of_tier() {
        let policy =
            DirectionPolicy::default().with_direction(SignalType::Level, Direction::Below);
        let limits = limits_of(&[("nivel/reservatorio", 1000.0)]);

        let exact = resolve(
            "nivel/reservatorio",
            SignalType::Level,
            &limits,
            &DefaultLimits::default(),
            &policy,
        )
        .unwrap();
        assert_eq!(exact.direction, Direction::Below);

        let default = resolve(
            "nivel/outro",
            SignalType::Level,
            &BTreeMap::new(),
            &DefaultLimits::default(),
            &policy,
        )
        .unwrap();
        assert_eq!(default.direction, Direction::Below);
        assert_eq!(default.origin, LimitOrigin::Default);
    }

    #[test]
    fn test_default_policy_maps_every_type_above() {
        let policy = DirectionPolicy::default();
        for signal in SignalType::ALL {
            assert_eq!(policy.direction_for(signal), Direction::Above);
        }
    }
}
