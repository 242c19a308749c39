//! Error types for the Patron review engine.
//!
//! All errors here are request-scoped and recoverable by resubmission;
//! none is process-fatal. Hard fraud rejections deliberately carry a
//! generic message for spoofing cases so the exact thresholds are not
//! coached to adversaries, but always name the signal category.
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{CouponStatus, SignalKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("duplicate review for this author and business today")] DuplicateReview,
    #[error("not found: {0}")] NotFound(String),
    #[error("conflict: {0}")] Conflict(String),
    #[error("storage: {0}")] Internal(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmissionError {
    #[error("invalid submission: {0}")] Validation(String),
    #[error("daily review limit reached: {count} of {limit} used today")] RateLimitExceeded { count: u64, limit: u64 },
    #[error("you have already reviewed this business today")] DuplicateSubmission,
    #[error("you are {distance_m:.0} m from this business; reviews must be submitted within {radius_m:.0} m")] GeofenceViolation { distance_m: f64, radius_m: f64 },
    #[error("submission rejected: {message}")] FraudRejected { kind: SignalKind, message: String },
    #[error("business not found: {0}")] BusinessNotFound(Uuid),
    #[error("business is not active: {0}")] BusinessInactive(Uuid),
    #[error(transparent)] Store(#[from] StoreError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CouponError {
    #[error("coupon not found: {0}")] NotFound(String),
    #[error("coupon cannot be redeemed: current status is {status}")] NotRedeemable { status: CouponStatus },
    #[error("coupon expired at {valid_until}")] Expired { valid_until: DateTime<Utc> },
    #[error("coupon is not valid until {valid_from}")] NotYetValid { valid_from: DateTime<Utc> },
    #[error(transparent)] Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum PatronError {
    #[error(transparent)] Submission(#[from] SubmissionError),
    #[error(transparent)] Coupon(#[from] CouponError),
    #[error(transparent)] Store(#[from] StoreError),
}
