//! Multi-signal fraud scoring for review submissions.
//!
//! Rules run in a fixed order and split into two classes: hard signals
//! (poor GPS accuracy, mock-location, an anomaly burst) reject the
//! submission outright; soft signals (a reported anomaly or two, thin
//! location history, device reuse) are flagged and allowed through,
//! because legitimate users trigger them too. Every hit — hard or soft —
//! is forwarded to the [`ActivityLog`].
//!
//! Rejection messages stay generic so exact thresholds are not coached to
//! adversaries, but always name the signal category so legitimate users
//! can self-correct.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use patron_core::constants::{
    ANOMALY_REJECT_COUNT, DEVICE_REUSE_THRESHOLD, EXPECTED_VERIFICATION_SECS,
    MAX_GPS_ACCURACY_M, MIN_LOCATION_SAMPLES,
};
use patron_core::error::SubmissionError;
use patron_core::types::SignalKind;

use crate::activity::ActivityLog;

/// Security metadata accompanying a review submission.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SubmissionSignals {
    /// Reported GPS accuracy in meters (lower is better).
    pub gps_accuracy_m: f64,
    /// How long the client's verification step took, in seconds.
    pub verification_secs: u64,
    /// Whether device motion was detected during verification.
    pub motion_detected: bool,
    /// Whether a mock-location provider was reported.
    pub mock_location: bool,
    /// Number of location-history samples the client collected.
    pub location_samples: u32,
    /// Client-reported anomaly events (e.g. "teleport", "speed_spike").
    pub reported_anomalies: Vec<String>,
    /// Opaque device fingerprint.
    pub device_fingerprint: String,
    /// Client platform identifier.
    pub platform: String,
}

/// Tunable thresholds for the fraud rules.
#[derive(Clone, Debug, PartialEq)]
pub struct FraudThresholds {
    /// Reported accuracy above this rejects.
    pub max_gps_accuracy_m: f64,
    /// Anomaly count at which a submission rejects.
    pub anomaly_reject_count: usize,
    /// Location-history sample count below which a submission is flagged.
    pub min_location_samples: u32,
    /// Same-device review count per day at which reuse is flagged.
    pub device_reuse_threshold: u64,
    /// Expected verification duration; mismatches are advisory only.
    pub expected_verification_secs: u64,
}

impl Default for FraudThresholds {
    fn default() -> Self {
        Self {
            max_gps_accuracy_m: MAX_GPS_ACCURACY_M,
            anomaly_reject_count: ANOMALY_REJECT_COUNT,
            min_location_samples: MIN_LOCATION_SAMPLES,
            device_reuse_threshold: DEVICE_REUSE_THRESHOLD,
            expected_verification_secs: EXPECTED_VERIFICATION_SECS,
        }
    }
}

/// Outcome of a fraud evaluation that did not reject.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FraudReport {
    /// Soft signals that fired, in rule order.
    pub flags: Vec<SignalKind>,
}

impl FraudReport {
    /// Whether no signal fired at all.
    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Stateless evaluator applying the fraud rules in fixed order.
pub struct FraudPolicy {
    thresholds: FraudThresholds,
    activity: Arc<ActivityLog>,
}

impl FraudPolicy {
    /// Create a policy with the given thresholds, forwarding hits to
    /// `activity`.
    pub fn new(thresholds: FraudThresholds, activity: Arc<ActivityLog>) -> Self {
        Self { thresholds, activity }
    }

    /// Evaluate a submission's signals.
    ///
    /// `device_reviews_today` is the number of reviews already submitted
    /// from the same device fingerprint today, supplied by the caller from
    /// the review store.
    ///
    /// Returns the soft flags on success; a hard signal short-circuits
    /// with [`SubmissionError::FraudRejected`].
    pub fn evaluate(
        &self,
        user: Uuid,
        signals: &SubmissionSignals,
        device_reviews_today: u64,
    ) -> Result<FraudReport, SubmissionError> {
        let t = &self.thresholds;
        let mut report = FraudReport::default();

        // Rule 1: GPS accuracy ceiling. NaN accuracy fails closed.
        if !(signals.gps_accuracy_m <= t.max_gps_accuracy_m) {
            self.activity.record(
                user,
                SignalKind::PoorGpsAccuracy,
                json!({ "accuracy_m": signals.gps_accuracy_m }),
            );
            warn!(%user, accuracy_m = signals.gps_accuracy_m, "fraud: rejected for poor GPS accuracy");
            return Err(SubmissionError::FraudRejected {
                kind: SignalKind::PoorGpsAccuracy,
                message: "poor GPS accuracy; move to an open area and try again".to_string(),
            });
        }

        // Rule 2: mock-location providers reject unconditionally.
        if signals.mock_location {
            self.activity.record(
                user,
                SignalKind::MockLocation,
                json!({ "platform": signals.platform }),
            );
            warn!(%user, platform = %signals.platform, "fraud: rejected for mock location");
            return Err(SubmissionError::FraudRejected {
                kind: SignalKind::MockLocation,
                message: "location could not be verified on this device".to_string(),
            });
        }

        // Rules 3 & 4: client-reported anomalies. A burst rejects, one or
        // two are flagged and allowed through.
        let anomalies = signals.reported_anomalies.len();
        if anomalies >= t.anomaly_reject_count {
            self.activity.record(
                user,
                SignalKind::AnomalyBurst,
                json!({ "count": anomalies, "events": signals.reported_anomalies }),
            );
            warn!(%user, count = anomalies, "fraud: rejected for multiple security concerns");
            return Err(SubmissionError::FraudRejected {
                kind: SignalKind::AnomalyBurst,
                message: "multiple security concerns were detected".to_string(),
            });
        }
        if anomalies > 0 {
            self.activity.record(
                user,
                SignalKind::AnomalyReported,
                json!({ "count": anomalies, "events": signals.reported_anomalies }),
            );
            info!(%user, count = anomalies, "fraud: anomaly reported, proceeding");
            report.flags.push(SignalKind::AnomalyReported);
        }

        // Rule 5: thin location history. Informational, never blocks.
        if signals.location_samples < t.min_location_samples {
            self.activity.record(
                user,
                SignalKind::ThinLocationHistory,
                json!({ "samples": signals.location_samples }),
            );
            debug!(%user, samples = signals.location_samples, "fraud: thin location history");
            report.flags.push(SignalKind::ThinLocationHistory);
        }

        // Rule 6: device fingerprint reuse across reviews today.
        if device_reviews_today >= t.device_reuse_threshold {
            self.activity.record(
                user,
                SignalKind::DeviceReuse,
                json!({
                    "fingerprint": signals.device_fingerprint,
                    "reviews_today": device_reviews_today,
                }),
            );
            info!(%user, reviews_today = device_reviews_today, "fraud: device reuse flagged");
            report.flags.push(SignalKind::DeviceReuse);
        }

        // Verification pace is advisory telemetry only. The legacy check
        // compared for exact equality and never enforced anything; that
        // behavior is kept as-is.
        if signals.verification_secs != t.expected_verification_secs {
            self.activity.record(
                user,
                SignalKind::VerificationPace,
                json!({
                    "reported_secs": signals.verification_secs,
                    "expected_secs": t.expected_verification_secs,
                }),
            );
            debug!(
                %user,
                reported = signals.verification_secs,
                expected = t.expected_verification_secs,
                "fraud: verification pace mismatch (advisory)"
            );
            report.flags.push(SignalKind::VerificationPace);
        }

        Ok(report)
    }
}
