//! Engine constants. Distances in meters, durations in seconds unless noted.

use std::time::Duration;

/// Mean Earth radius in meters, used by the haversine distance computation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Smallest geofence radius a business may configure.
pub const MIN_RADIUS_M: f64 = 10.0;

/// Largest geofence radius a business may configure.
pub const MAX_RADIUS_M: f64 = 500.0;

/// Geofence radius applied when a business has not configured one.
pub const DEFAULT_RADIUS_M: f64 = 50.0;

/// Maximum verified reviews a single author may submit per calendar day.
pub const MAX_REVIEWS_PER_DAY: u64 = 5;

/// Reported GPS accuracy above this value is rejected outright.
pub const MAX_GPS_ACCURACY_M: f64 = 50.0;

/// Number of client-reported anomaly events at which a submission is rejected.
/// One or two anomalies are flagged but allowed through.
pub const ANOMALY_REJECT_COUNT: usize = 3;

/// Fewer location-history samples than this is flagged as a thin history.
/// Informational only, never blocks.
pub const MIN_LOCATION_SAMPLES: u32 = 5;

/// Same-device review count per day at which device reuse is flagged.
pub const DEVICE_REUSE_THRESHOLD: u64 = 3;

/// Verification duration the client is expected to report.
///
/// A mismatch is logged as advisory telemetry and never rejects.
pub const EXPECTED_VERIFICATION_SECS: u64 = 30;

/// Minimum review rating.
pub const MIN_RATING: u8 = 1;

/// Maximum review rating.
pub const MAX_RATING: u8 = 5;

/// Minimum review comment length in characters.
pub const MIN_COMMENT_CHARS: usize = 10;

/// Maximum review comment length in characters.
pub const MAX_COMMENT_CHARS: usize = 500;

/// How long a review-reward coupon stays valid after minting.
///
/// Fixed at two hours to drive same-visit redemption; deliberately not
/// configurable per issuance.
pub const COUPON_VALIDITY_SECS: i64 = 2 * 60 * 60;

/// Prefix carried by every generated coupon code.
pub const CODE_PREFIX: &str = "HASH-";

/// Length of the random suffix in a coupon code.
pub const CODE_SUFFIX_LEN: usize = 6;

/// The 36-symbol alphabet coupon code suffixes are drawn from.
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Reward percentage applied when a business has no active coupon template.
pub const DEFAULT_REWARD_PERCENT: f64 = 10.0;

/// Capacity of the in-memory suspicious-activity ring buffer.
pub const ACTIVITY_LOG_CAPACITY: usize = 1_000;

/// How often the expiry sweeper runs by default.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_bounds_are_ordered() {
        assert!(MIN_RADIUS_M < DEFAULT_RADIUS_M);
        assert!(DEFAULT_RADIUS_M < MAX_RADIUS_M);
    }

    #[test]
    fn code_alphabet_has_36_symbols() {
        assert_eq!(CODE_ALPHABET.len(), 36);
        // Uppercase letters and digits only.
        assert!(CODE_ALPHABET
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }

    #[test]
    fn coupon_validity_is_two_hours() {
        assert_eq!(COUPON_VALIDITY_SECS, 7_200);
    }
}
