//! Engine configuration.
//!
//! Provides [`EngineConfig`] with production defaults. Tests tighten or
//! relax individual fields; the host application can build one from its
//! own settings source.

use std::time::Duration;

use patron_core::constants::{ACTIVITY_LOG_CAPACITY, MAX_REVIEWS_PER_DAY, SWEEP_INTERVAL};
use patron_fraud::FraudThresholds;

/// Configuration for a [`ReviewEngine`](crate::engine::ReviewEngine)
/// instance.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Verified reviews a single author may submit per UTC day.
    pub max_reviews_per_day: u64,
    /// Fraud rule thresholds.
    pub thresholds: FraudThresholds,
    /// Capacity of the suspicious-activity ring buffer.
    pub activity_capacity: usize,
    /// How often the coupon expiry sweeper runs.
    pub sweep_interval: Duration,
    /// Log level filter string (e.g. "info", "patron_engine=debug").
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_reviews_per_day: MAX_REVIEWS_PER_DAY,
            thresholds: FraudThresholds::default(),
            activity_capacity: ACTIVITY_LOG_CAPACITY,
            sweep_interval: SWEEP_INTERVAL,
            log_level: "info".to_string(),
        }
    }
}
