//! Timestamp helpers.
//!
//! The venue reports epoch milliseconds; records carry epoch seconds as
//! `f64` with the sub-second part kept.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as **seconds** since Unix epoch.
///
/// Used as the receipt timestamp passed to callbacks.
#[inline]
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// Convert epoch milliseconds to epoch seconds, keeping the fraction.
#[inline]
pub fn ms_to_secs(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_seconds() {
        assert_eq!(ms_to_secs(1_610_000_000_000), 1_610_000_000.0);
    }

    #[test]
    fn fraction_is_preserved() {
        assert_eq!(ms_to_secs(1_539_145_740_250), 1_539_145_740.25);
    }

    #[test]
    fn clock_is_after_2020() {
        assert!(now_secs() > 1_577_836_800.0);
    }
}
