//! Sensor tag classification
//!
//! Maps raw hierarchical sensor tags (e.g. `"qualidade/ph"`,
//! `"nivel/reservatorio"`) to a canonical signal type via an ordered
//! table of case-insensitive keyword groups. The table is evaluated
//! top to bottom and the first group with any matching keyword wins,
//! so overlap between families is resolved by explicit priority
//! rather than by accident.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical category of a physical measurement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Ph,
    Pressure,
    Turbidity,
    Chlorine,
    Flow,
    Level,
}

impl SignalType {
    /// All signal types, in classification priority order.
    pub const ALL: [SignalType; 6] = [
        SignalType::Ph,
        SignalType::Pressure,
        SignalType::Turbidity,
        SignalType::Chlorine,
        SignalType::Flow,
        SignalType::Level,
    ];

    /// Stable lowercase identifier, used in logs and cooldown keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Ph => "ph",
            SignalType::Pressure => "pressure",
            SignalType::Turbidity => "turbidity",
            SignalType::Chlorine => "chlorine",
            SignalType::Flow => "flow",
            SignalType::Level => "level",
        }
    }

    /// Operator-facing equipment label used in notification text.
    pub fn label(&self) -> &'static str {
        match self {
            SignalType::Ph => "pH",
            SignalType::Pressure => "Pressão",
            SignalType::Turbidity => "Turbidez",
            SignalType::Chlorine => "Cloro",
            SignalType::Flow => "Vazão",
            SignalType::Level => "Nível do Reservatório",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered keyword groups. Earlier rows shadow later ones, so the
/// short `"ph"` keyword is listed first exactly like the plant's PLC
/// tag conventions expect, and the accented spellings sit next to
/// their ASCII forms.
const KEYWORD_TABLE: &[(&[&str], SignalType)] = &[
    (&["ph"], SignalType::Ph),
    (&["press"], SignalType::Pressure),
    (&["turbid"], SignalType::Turbidity),
    (&["cloro", "chlor"], SignalType::Chlorine),
    (&["vazao", "vazão", "flow"], SignalType::Flow),
    (
        &["nivel", "nível", "reservatorio", "reservatório"],
        SignalType::Level,
    ),
];

/// Classify a raw sensor tag into a canonical signal type.
///
/// Matching is case-insensitive substring matching over the ordered
/// keyword table. Returns `None` for tags no group recognizes; such
/// readings are dropped from the pipeline without further processing.
pub fn classify(raw_tag: &str) -> Option<SignalType> {
    let tag = raw_tag.trim().to_lowercase();
    if tag.is_empty() {
        return None;
    }

    for (keywords, signal) in KEYWORD_TABLE {
        if keywords.iter().any(|kw| tag.contains(kw)) {
            return Some(*signal);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_canonical_tags() {
        assert_eq!(classify("qualidade/ph"), Some(SignalType::Ph));
        assert_eq!(classify("pressao/linha1"), Some(SignalType::Pressure));
        assert_eq!(classify("decantacao/turbidez"), Some(SignalType::Turbidity));
        assert_eq!(classify("qualidade/cloro"), Some(SignalType::Chlorine));
        assert_eq!(classify("bombeamento/vazao"), Some(SignalType::Flow));
        assert_eq!(classify("nivel/reservatorio"), Some(SignalType::Level));
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(classify("Qualidade/PH"), Some(SignalType::Ph));
        assert_eq!(classify("PRESSAO/LINHA1"), Some(SignalType::Pressure));
    }

    #[test]
    fn test_accented_spellings_match() {
        assert_eq!(classify("pressão/linha2"), Some(SignalType::Pressure));
        assert_eq!(classify("Vazão de saída"), Some(SignalType::Flow));
        assert_eq!(classify("Nível do tanque"), Some(SignalType::Level));
        assert_eq!(classify("reservatório-2"), Some(SignalType::Level));
    }

    #[test]
    fn test_unknown_tag_yields_none() {
        assert_eq!(classify("unknown/sensor123"), None);
        assert_eq!(classify("temperatura/forno"), None);
        assert_eq!(classify(""), None);
        assert_eq!(classify("   "), None);
    }

    #[test]
    fn test_priority_order_resolves_overlap() {
        // "ph" outranks every other family, so a pressure tag that
        // happens to contain "ph" still classifies as pH.
        assert_eq!(classify("pressao/ph-compensado"), Some(SignalType::Ph));
        // "press" outranks the flow keywords.
        assert_eq!(classify("pressao-vazao/combinado"), Some(SignalType::Pressure));
    }

    #[test]
    fn test_bare_type_names_match() {
        assert_eq!(classify("ph"), Some(SignalType::Ph));
        assert_eq!(classify("vazao"), Some(SignalType::Flow));
        assert_eq!(classify("nivel"), Some(SignalType::Level));
    }
}
