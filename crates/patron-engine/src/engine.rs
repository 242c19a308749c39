//! Review submission orchestration.
//!
//! [`ReviewEngine::submit`] runs one submission through the full pipeline:
//!
//! ```text
//! Received → RateChecked → DuplicateChecked → GeofenceVerified
//!          → FraudEvaluated → Persisted → RatingRecalculated
//!          → RewardEvaluated → Notified → Complete
//! ```
//!
//! Every stage before `Persisted` fails closed: a rejection leaves no
//! partial review behind. Everything after `Persisted` is best-effort —
//! the persisted review is the transaction's durable outcome, and a
//! failed rating recompute, coupon mint, or notification is logged
//! without invalidating it.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use patron_core::constants::{
    MAX_COMMENT_CHARS, MAX_RATING, MIN_COMMENT_CHARS, MIN_RATING,
};
use patron_core::error::{CouponError, StoreError, SubmissionError};
use patron_core::geo;
use patron_core::traits::{BusinessStore, CouponStore, Notifier, ReviewStore};
use patron_core::types::{
    utc_day_start, Business, Coupon, GeoPoint, Review, ReviewStatus, SecurityMetadata,
};
use patron_coupon::issue::CouponIssuer;
use patron_coupon::lifecycle::{ensure_redeemable, sweep_expired};
use patron_fraud::{ActivityLog, FraudPolicy, SubmissionGuard, SubmissionSignals};

use crate::config::EngineConfig;

/// A review submission as received from the client.
#[derive(Clone, Debug)]
pub struct SubmissionRequest {
    /// The submitting customer.
    pub author_id: Uuid,
    /// The reviewed business.
    pub business_id: Uuid,
    /// Star rating, 1 through 5.
    pub rating: u8,
    /// Free-text comment, 10 through 500 characters.
    pub comment: String,
    /// Where the customer reports standing.
    pub location: GeoPoint,
    /// Security metadata from the client's verification step.
    pub signals: SubmissionSignals,
}

/// Result of an accepted submission.
#[derive(Clone, Debug)]
pub struct SubmissionOutcome {
    /// The persisted review.
    pub review: Review,
    /// The reward coupon, when one was minted.
    pub coupon: Option<Coupon>,
}

/// Pipeline stage a submission has reached. Used for structured logging
/// and surfaced in debug output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionStage {
    Received,
    RateChecked,
    DuplicateChecked,
    GeofenceVerified,
    FraudEvaluated,
    Persisted,
    RatingRecalculated,
    RewardEvaluated,
    Notified,
    Complete,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::RateChecked => "rate_checked",
            Self::DuplicateChecked => "duplicate_checked",
            Self::GeofenceVerified => "geofence_verified",
            Self::FraudEvaluated => "fraud_evaluated",
            Self::Persisted => "persisted",
            Self::RatingRecalculated => "rating_recalculated",
            Self::RewardEvaluated => "reward_evaluated",
            Self::Notified => "notified",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Orchestrates review submissions over the store and notifier contracts.
pub struct ReviewEngine {
    config: EngineConfig,
    reviews: Arc<dyn ReviewStore>,
    businesses: Arc<dyn BusinessStore>,
    coupons: Arc<dyn CouponStore>,
    notifier: Arc<dyn Notifier>,
    guard: SubmissionGuard,
    fraud: FraudPolicy,
    issuer: CouponIssuer,
    activity: Arc<ActivityLog>,
}

impl ReviewEngine {
    /// Wire an engine over the given stores and notifier.
    pub fn new(
        config: EngineConfig,
        reviews: Arc<dyn ReviewStore>,
        businesses: Arc<dyn BusinessStore>,
        coupons: Arc<dyn CouponStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let activity = Arc::new(ActivityLog::with_capacity(config.activity_capacity));
        let guard = SubmissionGuard::with_limit(Arc::clone(&reviews), config.max_reviews_per_day);
        let fraud = FraudPolicy::new(config.thresholds.clone(), Arc::clone(&activity));
        let issuer = CouponIssuer::new(Arc::clone(&coupons));

        Self {
            config,
            reviews,
            businesses,
            coupons,
            notifier,
            guard,
            fraud,
            issuer,
            activity,
        }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The suspicious-activity log, for operator queries and clearing.
    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Submit a review at the current time.
    pub fn submit(&self, request: SubmissionRequest) -> Result<SubmissionOutcome, SubmissionError> {
        self.submit_at(request, Utc::now())
    }

    /// Submit a review at an explicit time. Exposed so tests can pin the
    /// clock; production callers use [`submit`](Self::submit).
    pub fn submit_at(
        &self,
        request: SubmissionRequest,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        match self.run_submission(request, now) {
            Ok(outcome) => Ok(outcome),
            // Malformed input surfaces verbatim without log noise; real
            // rejections are worth an info line.
            Err(e @ SubmissionError::Validation(_)) => Err(e),
            Err(e) => {
                info!(error = %e, "submit: rejected");
                Err(e)
            }
        }
    }

    fn run_submission(
        &self,
        request: SubmissionRequest,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let mut stage = SubmissionStage::Received;
        debug!(author = %request.author_id, business = %request.business_id, %stage, "submit: started");

        validate_request(&request)?;

        let business = self
            .businesses
            .find(request.business_id)?
            .ok_or(SubmissionError::BusinessNotFound(request.business_id))?;
        if !business.active {
            return Err(SubmissionError::BusinessInactive(business.id));
        }

        self.guard.check_rate(request.author_id, now)?;
        stage = SubmissionStage::RateChecked;
        debug!(%stage, "submit: advanced");

        self.guard
            .check_duplicate(request.author_id, request.business_id, now)?;
        stage = SubmissionStage::DuplicateChecked;
        debug!(%stage, "submit: advanced");

        let radius_m = business.effective_radius_m();
        let distance_m = geo::distance_between(request.location, business.location);
        if !geo::within_geofence(request.location, business.location, radius_m) {
            return Err(SubmissionError::GeofenceViolation { distance_m, radius_m });
        }
        stage = SubmissionStage::GeofenceVerified;
        debug!(%stage, distance_m, radius_m, "submit: advanced");

        let device_reviews_today = self.reviews.count_by_device_since(
            &request.signals.device_fingerprint,
            utc_day_start(now),
        )?;
        let report = self
            .fraud
            .evaluate(request.author_id, &request.signals, device_reviews_today)?;
        stage = SubmissionStage::FraudEvaluated;
        debug!(%stage, flags = report.flags.len(), "submit: advanced");

        let review = build_review(&request, &business, distance_m, radius_m, now, &self.activity);
        self.reviews.create(review.clone()).map_err(|e| match e {
            // A concurrent submission won the race; surface it as the
            // same duplicate rejection the guard would have produced.
            StoreError::DuplicateReview => SubmissionError::DuplicateSubmission,
            other => SubmissionError::Store(other),
        })?;
        stage = SubmissionStage::Persisted;
        info!(review = %review.id, author = %review.author_id, %stage, "submit: review persisted");

        // From here on the review is durable; failures degrade, never abort.
        if let Err(e) = self.recompute_rating(business.id) {
            warn!(business = %business.id, error = %e, "submit: rating recompute failed");
        }
        stage = SubmissionStage::RatingRecalculated;
        debug!(%stage, "submit: advanced");

        let coupon = match self
            .issuer
            .issue(business.id, request.author_id, review.id, now)
        {
            Ok(coupon) => coupon,
            Err(e) => {
                warn!(review = %review.id, error = %e, "submit: reward issuance failed");
                None
            }
        };
        stage = SubmissionStage::RewardEvaluated;
        debug!(%stage, minted = coupon.is_some(), "submit: advanced");

        self.send_notifications(&review, &business, coupon.as_ref());
        stage = SubmissionStage::Notified;
        debug!(%stage, "submit: advanced");

        stage = SubmissionStage::Complete;
        debug!(review = %review.id, %stage, "submit: finished");
        Ok(SubmissionOutcome { review, coupon })
    }

    /// Recompute a business's rating aggregate by full scan.
    ///
    /// The mean is taken over approved reviews only; a full recompute is
    /// chosen over an incrementally maintained running average so that
    /// concurrent edits, deletes, and moderation can never let the
    /// aggregate drift.
    pub fn recompute_rating(&self, business_id: Uuid) -> Result<(f64, u64), StoreError> {
        let reviews = self.reviews.find_all_by_business(business_id)?;
        let approved: Vec<_> = reviews
            .iter()
            .filter(|r| r.status == ReviewStatus::Approved)
            .collect();

        let count = approved.len() as u64;
        let average = if approved.is_empty() {
            0.0
        } else {
            approved.iter().map(|r| f64::from(r.rating)).sum::<f64>() / count as f64
        };

        self.businesses.update_rating(business_id, average, count)?;
        debug!(business = %business_id, average, count, "rating: recomputed");
        Ok((average, count))
    }

    fn send_notifications(&self, review: &Review, business: &Business, coupon: Option<&Coupon>) {
        match coupon {
            Some(c) => self.notifier.notify_user(
                review.author_id,
                "Reward earned",
                &format!("Thanks for your review! Show code {} before it expires.", c.code),
                json!({
                    "reviewId": review.id,
                    "couponId": c.id,
                    "code": c.code,
                    "validUntil": c.valid_until,
                }),
            ),
            None => self.notifier.notify_user(
                review.author_id,
                "Review published",
                "Thanks for your review!",
                json!({ "reviewId": review.id }),
            ),
        }

        self.notifier.notify_user(
            business.owner_id,
            "New review",
            &format!("Your business received a {}-star review.", review.rating),
            json!({
                "reviewId": review.id,
                "businessId": business.id,
                "rating": review.rating,
            }),
        );
    }

    /// Change a review's moderation status and refresh the business's
    /// rating aggregate.
    pub fn moderate(&self, review_id: Uuid, status: ReviewStatus) -> Result<(), StoreError> {
        let review = self
            .reviews
            .find(review_id)?
            .ok_or_else(|| StoreError::NotFound(format!("review {review_id}")))?;
        self.reviews.set_status(review_id, status)?;
        self.recompute_rating(review.business_id)?;
        info!(review = %review_id, %status, "moderate: status changed");
        Ok(())
    }

    /// Register a helpfulness vote. Returns the new vote count.
    pub fn helpful_vote(&self, review_id: Uuid) -> Result<u32, StoreError> {
        self.reviews.add_helpful_vote(review_id)
    }

    /// Look up a coupon by code and check it is currently redeemable.
    pub fn validate_coupon(&self, code: &str, now: DateTime<Utc>) -> Result<Coupon, CouponError> {
        let coupon = self
            .coupons
            .find_by_code(code)?
            .ok_or_else(|| CouponError::NotFound(code.to_string()))?;
        ensure_redeemable(&coupon, now)?;
        Ok(coupon)
    }

    /// Redeem a coupon by id. At most one concurrent attempt succeeds.
    pub fn redeem_coupon(
        &self,
        id: Uuid,
        redeemer: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Coupon, CouponError> {
        let coupon = self.coupons.conditional_redeem(id, redeemer, now)?;
        info!(coupon = %id, %redeemer, "coupon: redeemed");
        Ok(coupon)
    }

    /// Redeem a coupon by its scanned code.
    pub fn redeem_by_code(
        &self,
        code: &str,
        redeemer: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Coupon, CouponError> {
        let coupon = self
            .coupons
            .find_by_code(code)?
            .ok_or_else(|| CouponError::NotFound(code.to_string()))?;
        self.redeem_coupon(coupon.id, redeemer, now)
    }

    /// Withdraw an active coupon (owner action).
    pub fn cancel_coupon(&self, id: Uuid) -> Result<Coupon, CouponError> {
        let coupon = self.coupons.cancel(id)?;
        info!(coupon = %id, "coupon: cancelled");
        Ok(coupon)
    }

    /// Run an expiry sweep immediately. The background
    /// [`Sweeper`](crate::sweeper::Sweeper) calls the same path on its
    /// interval.
    pub fn sweep_now(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        sweep_expired(self.coupons.as_ref(), now)
    }
}

/// Context-free validation of the request body.
fn validate_request(request: &SubmissionRequest) -> Result<(), SubmissionError> {
    if !(MIN_RATING..=MAX_RATING).contains(&request.rating) {
        return Err(SubmissionError::Validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }

    let chars = request.comment.chars().count();
    if chars < MIN_COMMENT_CHARS {
        return Err(SubmissionError::Validation(format!(
            "comment must be at least {MIN_COMMENT_CHARS} characters"
        )));
    }
    if chars > MAX_COMMENT_CHARS {
        return Err(SubmissionError::Validation(format!(
            "comment must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }

    Ok(())
}

/// Assemble the review row with its security snapshot.
///
/// Distance and radius are captured as historical facts; the
/// suspicious-event count reflects what the activity log holds for the
/// author right after fraud evaluation.
fn build_review(
    request: &SubmissionRequest,
    business: &Business,
    distance_m: f64,
    radius_m: f64,
    now: DateTime<Utc>,
    activity: &ActivityLog,
) -> Review {
    let signals = &request.signals;
    Review {
        id: Uuid::new_v4(),
        author_id: request.author_id,
        business_id: business.id,
        rating: request.rating,
        comment: request.comment.clone(),
        submitted_location: request.location,
        captured_at: now,
        verified: true,
        status: ReviewStatus::Approved,
        helpful_votes: 0,
        security: SecurityMetadata {
            gps_accuracy_m: signals.gps_accuracy_m,
            verification_secs: signals.verification_secs,
            motion_detected: signals.motion_detected,
            mock_location: signals.mock_location,
            location_samples: signals.location_samples,
            suspicious_events: activity.count_for(request.author_id) as u32,
            device_fingerprint: signals.device_fingerprint.clone(),
            platform: signals.platform.clone(),
            distance_m,
            business_radius_m: radius_m,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::notify::NullNotifier;
    use mockall::mock;
    use mockall::predicate::eq;
    use patron_core::types::{CouponStatus, CouponTemplate, RewardType};

    mock! {
        pub Pager {}
        impl Notifier for Pager {
            fn notify_user(&self, user: Uuid, title: &str, body: &str, data: serde_json::Value);
        }
    }

    fn business_at(lat: f64, lon: f64) -> Business {
        Business {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            location: GeoPoint::new(lat, lon),
            radius_m: 50.0,
            rating_avg: 0.0,
            rating_count: 0,
            active: true,
        }
    }

    fn clean_signals(device: &str) -> SubmissionSignals {
        SubmissionSignals {
            gps_accuracy_m: 10.0,
            verification_secs: 30,
            motion_detected: true,
            mock_location: false,
            location_samples: 10,
            reported_anomalies: vec![],
            device_fingerprint: device.to_string(),
            platform: "ios".to_string(),
        }
    }

    fn request_for(business: &Business, device: &str) -> SubmissionRequest {
        SubmissionRequest {
            author_id: Uuid::new_v4(),
            business_id: business.id,
            rating: 5,
            comment: "great espresso and a quiet corner".to_string(),
            location: business.location,
            signals: clean_signals(device),
        }
    }

    fn engine_over(store: Arc<MemoryStore>, notifier: Arc<dyn Notifier>) -> ReviewEngine {
        ReviewEngine::new(
            EngineConfig::default(),
            Arc::clone(&store) as Arc<dyn ReviewStore>,
            Arc::clone(&store) as Arc<dyn BusinessStore>,
            store as Arc<dyn CouponStore>,
            notifier,
        )
    }

    #[test]
    fn clean_submission_persists_and_mints() {
        let store = Arc::new(MemoryStore::new());
        let business = business_at(40.7128, -74.0060);
        store.put_business(business.clone());
        let engine = engine_over(Arc::clone(&store), Arc::new(NullNotifier));

        let now = Utc::now();
        let outcome = engine.submit_at(request_for(&business, "device-1"), now).unwrap();

        assert!(outcome.review.verified);
        assert_eq!(outcome.review.status, ReviewStatus::Approved);
        let coupon = outcome.coupon.expect("a reward should be minted");
        assert_eq!(coupon.status, CouponStatus::Active);
        assert_eq!((coupon.valid_until - now).num_seconds(), 7_200);

        // Rating was recomputed from the single approved review.
        let updated = BusinessStore::find(store.as_ref(), business.id).unwrap().unwrap();
        assert_eq!(updated.rating_avg, 5.0);
        assert_eq!(updated.rating_count, 1);
    }

    #[test]
    fn out_of_range_rating_is_rejected_before_any_lookup() {
        let store = Arc::new(MemoryStore::new());
        let business = business_at(0.0, 0.0);
        store.put_business(business.clone());
        let engine = engine_over(Arc::clone(&store), Arc::new(NullNotifier));

        let mut request = request_for(&business, "d");
        request.rating = 6;
        let err = engine.submit_at(request, Utc::now()).unwrap_err();
        assert!(matches!(err, SubmissionError::Validation(_)));
    }

    #[test]
    fn short_comment_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let business = business_at(0.0, 0.0);
        store.put_business(business.clone());
        let engine = engine_over(Arc::clone(&store), Arc::new(NullNotifier));

        let mut request = request_for(&business, "d");
        request.comment = "too short".to_string();
        let err = engine.submit_at(request, Utc::now()).unwrap_err();
        assert!(matches!(err, SubmissionError::Validation(_)));
    }

    #[test]
    fn unknown_business_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(Arc::clone(&store), Arc::new(NullNotifier));

        let orphan = business_at(0.0, 0.0);
        let err = engine.submit_at(request_for(&orphan, "d"), Utc::now()).unwrap_err();
        assert!(matches!(err, SubmissionError::BusinessNotFound(_)));
    }

    #[test]
    fn inactive_business_rejects() {
        let store = Arc::new(MemoryStore::new());
        let mut business = business_at(0.0, 0.0);
        business.active = false;
        store.put_business(business.clone());
        let engine = engine_over(Arc::clone(&store), Arc::new(NullNotifier));

        let err = engine.submit_at(request_for(&business, "d"), Utc::now()).unwrap_err();
        assert!(matches!(err, SubmissionError::BusinessInactive(_)));
    }

    /// A submission from ~1.1 km away fails the 50 m fence and the error
    /// reports the measured distance.
    #[test]
    fn geofence_violation_reports_distance() {
        let store = Arc::new(MemoryStore::new());
        let business = business_at(40.7128, -74.0060);
        store.put_business(business.clone());
        let engine = engine_over(Arc::clone(&store), Arc::new(NullNotifier));

        let mut request = request_for(&business, "d");
        request.location = GeoPoint::new(40.7228, -74.0060);
        let err = engine.submit_at(request, Utc::now()).unwrap_err();
        match err {
            SubmissionError::GeofenceViolation { distance_m, radius_m } => {
                assert!(distance_m > 1_000.0, "distance was {distance_m}");
                assert_eq!(radius_m, 50.0);
            }
            other => panic!("expected GeofenceViolation, got {other:?}"),
        }
    }

    #[test]
    fn mock_location_rejects_even_inside_the_fence() {
        let store = Arc::new(MemoryStore::new());
        let business = business_at(40.7128, -74.0060);
        store.put_business(business.clone());
        let engine = engine_over(Arc::clone(&store), Arc::new(NullNotifier));

        let mut request = request_for(&business, "d");
        request.signals.mock_location = true;
        let err = engine.submit_at(request, Utc::now()).unwrap_err();
        assert!(matches!(err, SubmissionError::FraudRejected { .. }));
        assert_eq!(engine.activity().len(), 1, "rejection must leave telemetry");
    }

    /// Template with a met redemption limit: the review persists, no
    /// coupon is minted.
    #[test]
    fn met_redemption_limit_skips_mint_but_keeps_review() {
        let store = Arc::new(MemoryStore::new());
        let business = business_at(40.7128, -74.0060);
        store.put_business(business.clone());
        store.put_template(CouponTemplate {
            id: Uuid::new_v4(),
            business_id: business.id,
            reward: RewardType::Percentage,
            reward_value: 15.0,
            min_purchase: 0.0,
            max_discount: None,
            redemption_limit: Some(2),
            redemption_count: 0,
            usage_count: 0,
            active: true,
        });
        let engine = engine_over(Arc::clone(&store), Arc::new(NullNotifier));
        let now = Utc::now();

        // Two earlier rewards, both redeemed.
        for reviewer in 0..2 {
            let mut request = request_for(&business, &format!("device-{reviewer}"));
            request.author_id = Uuid::new_v4();
            let outcome = engine.submit_at(request, now).unwrap();
            let coupon = outcome.coupon.expect("mint under the limit");
            engine.redeem_coupon(coupon.id, business.owner_id, now).unwrap();
        }

        let outcome = engine
            .submit_at(request_for(&business, "device-3"), now)
            .unwrap();
        assert!(outcome.coupon.is_none(), "limit met, no new coupon");
        assert_eq!(
            store
                .count_redeemed_rewards(business.id)
                .unwrap(),
            2
        );
    }

    #[test]
    fn reviewer_and_owner_are_both_notified() {
        let store = Arc::new(MemoryStore::new());
        let business = business_at(40.7128, -74.0060);
        store.put_business(business.clone());
        let request = request_for(&business, "d");

        let mut pager = MockPager::new();
        pager
            .expect_notify_user()
            .with(eq(request.author_id), eq("Reward earned"), mockall::predicate::always(), mockall::predicate::always())
            .times(1)
            .returning(|_, _, _, _| ());
        pager
            .expect_notify_user()
            .with(eq(business.owner_id), eq("New review"), mockall::predicate::always(), mockall::predicate::always())
            .times(1)
            .returning(|_, _, _, _| ());

        let engine = engine_over(Arc::clone(&store), Arc::new(pager));
        engine.submit_at(request, Utc::now()).unwrap();
    }

    #[test]
    fn moderation_recomputes_the_aggregate() {
        let store = Arc::new(MemoryStore::new());
        let business = business_at(40.7128, -74.0060);
        store.put_business(business.clone());
        let engine = engine_over(Arc::clone(&store), Arc::new(NullNotifier));
        let now = Utc::now();

        let five = engine.submit_at(request_for(&business, "a"), now).unwrap();
        let mut low = request_for(&business, "b");
        low.rating = 1;
        engine.submit_at(low, now).unwrap();

        let mid = BusinessStore::find(store.as_ref(), business.id).unwrap().unwrap();
        assert_eq!(mid.rating_avg, 3.0);
        assert_eq!(mid.rating_count, 2);

        engine.moderate(five.review.id, ReviewStatus::Rejected).unwrap();
        let after = BusinessStore::find(store.as_ref(), business.id).unwrap().unwrap();
        assert_eq!(after.rating_avg, 1.0);
        assert_eq!(after.rating_count, 1);
    }

    #[test]
    fn helpful_votes_accumulate() {
        let store = Arc::new(MemoryStore::new());
        let business = business_at(40.7128, -74.0060);
        store.put_business(business.clone());
        let engine = engine_over(Arc::clone(&store), Arc::new(NullNotifier));

        let outcome = engine.submit_at(request_for(&business, "d"), Utc::now()).unwrap();
        assert_eq!(engine.helpful_vote(outcome.review.id).unwrap(), 1);
        assert_eq!(engine.helpful_vote(outcome.review.id).unwrap(), 2);
    }

    #[test]
    fn validate_and_redeem_by_code() {
        let store = Arc::new(MemoryStore::new());
        let business = business_at(40.7128, -74.0060);
        store.put_business(business.clone());
        let engine = engine_over(Arc::clone(&store), Arc::new(NullNotifier));
        let now = Utc::now();

        let outcome = engine.submit_at(request_for(&business, "d"), now).unwrap();
        let coupon = outcome.coupon.unwrap();

        let looked_up = engine.validate_coupon(&coupon.code, now).unwrap();
        assert_eq!(looked_up.id, coupon.id);

        let redeemed = engine.redeem_by_code(&coupon.code, business.owner_id, now).unwrap();
        assert_eq!(redeemed.status, CouponStatus::Redeemed);

        let err = engine.validate_coupon(&coupon.code, now).unwrap_err();
        assert!(matches!(err, CouponError::NotRedeemable { .. }));

        let missing = engine.validate_coupon("HASH-NOPE00", now).unwrap_err();
        assert!(matches!(missing, CouponError::NotFound(_)));
    }

    #[test]
    fn sweep_now_expires_lapsed_coupons() {
        let store = Arc::new(MemoryStore::new());
        let business = business_at(40.7128, -74.0060);
        store.put_business(business.clone());
        let engine = engine_over(Arc::clone(&store), Arc::new(NullNotifier));
        let now = Utc::now();

        let outcome = engine.submit_at(request_for(&business, "d"), now).unwrap();
        let coupon = outcome.coupon.unwrap();

        assert_eq!(engine.sweep_now(now).unwrap(), 0, "fresh coupon survives");
        let later = now + chrono::TimeDelta::hours(3);
        assert_eq!(engine.sweep_now(later).unwrap(), 1);
        assert_eq!(store.coupon(coupon.id).unwrap().status, CouponStatus::Expired);
    }
}
