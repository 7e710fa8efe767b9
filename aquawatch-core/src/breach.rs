//! Breach evaluation.

use crate::limits::Direction;

/// Compare a measured value against its resolved limit.
///
/// `Above` means the alarm condition is `value > limit`, `Below`
/// means `value < limit`. NaN never compares true on either side, so
/// malformed values that slip past upstream filtering evaluate as
/// non-breach rather than raising a spurious alert.
pub fn is_breach(value: f64, limit: f64, direction: Direction) -> bool {
    match direction {
        Direction::Above => value > limit,
        Direction::Below => value < limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_above_semantics() {
        assert!(is_breach(8.2, 7.0, Direction::Above));
        assert!(!is_breach(7.0, 7.0, Direction::Above));
        assert!(!is_breach(6.9, 7.0, Direction::Above));
    }

    #[test]
    fn test_below_semantics() {
        assert!(is_breach(6.9, 7.0, Direction::Below));
        assert!(!is_breach(7.0, 7.0, Direction::Below));
        assert!(!is_breach(8.2, 7.0, Direction::Below));
    }

    #[test]
    fn test_nan_is_never_a_breach() {
        assert!(!is_breach(f64::NAN, 7.0, Direction::Above));
        assert!(!is_breach(f64::NAN, 7.0, Direction::Below));
        assert!(!is_breach(8.2, f64::NAN, Direction::Above));
    }

    #[test]
    fn test_infinite_values() {
        assert!(is_breach(f64::INFINITY, 7.0, Direction::Above));
        assert!(is_breach(f64::NEG_INFINITY, 7.0, Direction::Below));
    }
}
