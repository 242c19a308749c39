//! Trait interfaces for the Patron engine.
//!
//! These traits define the contracts between crates and toward the host
//! application:
//! - [`ReviewStore`], [`BusinessStore`], [`CouponStore`] — persistence
//!   (patron-engine ships an in-memory reference implementation)
//! - [`Notifier`] — outbound notification dispatch (push/email live in the
//!   host application)
//!
//! Store-level guarantees carry the correctness-critical invariants:
//! same-day review uniqueness is enforced by [`ReviewStore::create`], and
//! at-most-once redemption by [`CouponStore::conditional_redeem`]. The
//! application-level guard checks are optimizations over these.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CouponError, StoreError};
use crate::types::{Business, Coupon, CouponTemplate, Review, ReviewStatus};

/// Persistence contract for reviews.
pub trait ReviewStore: Send + Sync {
    /// Persist a new review.
    ///
    /// Must reject with [`StoreError::DuplicateReview`] when the author
    /// already has a review for the same business in the same UTC calendar
    /// day. This is the authoritative duplicate check; the guard's
    /// read-only check only exists to fail fast.
    fn create(&self, review: Review) -> Result<(), StoreError>;

    /// Look up a review by id. Returns `None` if unknown.
    fn find(&self, id: Uuid) -> Result<Option<Review>, StoreError>;

    /// The author's review for a business since `since`, if any.
    fn find_by_author_and_business_since(
        &self,
        author: Uuid,
        business: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Option<Review>, StoreError>;

    /// Number of reviews the author has submitted since `since`.
    fn count_by_author_since(&self, author: Uuid, since: DateTime<Utc>)
        -> Result<u64, StoreError>;

    /// Number of reviews submitted from a device fingerprint since `since`.
    fn count_by_device_since(
        &self,
        fingerprint: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// All reviews for a business, any status. Used by the full-scan rating
    /// recompute.
    fn find_all_by_business(&self, business: Uuid) -> Result<Vec<Review>, StoreError>;

    /// Change a review's moderation status.
    fn set_status(&self, id: Uuid, status: ReviewStatus) -> Result<(), StoreError>;

    /// Register a helpfulness vote. Returns the new vote count.
    fn add_helpful_vote(&self, id: Uuid) -> Result<u32, StoreError>;
}

/// Persistence contract for businesses.
pub trait BusinessStore: Send + Sync {
    /// Look up a business by id. Returns `None` if unknown.
    fn find(&self, id: Uuid) -> Result<Option<Business>, StoreError>;

    /// Overwrite the rating aggregate.
    ///
    /// Callers recompute the mean from the full review set; concurrent
    /// writers race last-write-wins, which is acceptable because each
    /// recompute reads current state.
    fn update_rating(&self, id: Uuid, average: f64, count: u64) -> Result<(), StoreError>;
}

/// Persistence contract for coupons and coupon templates.
pub trait CouponStore: Send + Sync {
    /// The business's active coupon template, if it has one.
    fn find_active_template(&self, business: Uuid)
        -> Result<Option<CouponTemplate>, StoreError>;

    /// Persist a freshly minted coupon.
    fn create(&self, coupon: Coupon) -> Result<(), StoreError>;

    /// Look up a coupon by id. Returns `None` if unknown.
    fn find(&self, id: Uuid) -> Result<Option<Coupon>, StoreError>;

    /// Look up a coupon by its code. Returns `None` if unknown.
    fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, StoreError>;

    /// Whether a coupon code is already taken. Used for collision checks
    /// during code generation.
    fn code_exists(&self, code: &str) -> Result<bool, StoreError>;

    /// Atomically redeem a coupon: transition `Active → Redeemed` guarded
    /// by the current status and validity window, recording redeemer and
    /// time. Must be a single conditional update so that of any number of
    /// concurrent attempts exactly one succeeds.
    fn conditional_redeem(
        &self,
        id: Uuid,
        redeemer: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Coupon, CouponError>;

    /// Cancel an active coupon (owner withdrawal): `Active → Cancelled`.
    fn cancel(&self, id: Uuid) -> Result<Coupon, CouponError>;

    /// Expire every active coupon whose validity window has passed.
    /// Returns how many were transitioned. Idempotent; a coupon redeemed a
    /// moment earlier is skipped by the status guard.
    fn bulk_expire(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Number of redeemed review-reward coupons for a business. Feeds the
    /// template redemption-limit check.
    fn count_redeemed_rewards(&self, business: Uuid) -> Result<u64, StoreError>;

    /// Bump a template's advisory mint counter.
    fn increment_template_usage(&self, template: Uuid) -> Result<(), StoreError>;
}

/// Outbound notification dispatch.
///
/// Fire-and-forget: implementations must not block the caller, and the
/// engine relies on no return value. Timeouts and retries belong entirely
/// to the implementation.
pub trait Notifier: Send + Sync {
    /// Deliver a notification to a user. Failures are the implementation's
    /// concern; the engine never rolls back on delivery problems.
    fn notify_user(&self, user: Uuid, title: &str, body: &str, data: serde_json::Value);
}
