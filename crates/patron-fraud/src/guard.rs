//! Per-author rate limiting and same-day duplicate detection.
//!
//! Both checks are read-only queries against the review store, bucketed on
//! the UTC calendar day. They exist to fail fast with a precise error;
//! they cannot prevent two concurrent submissions from both passing. The
//! store's `create` enforces same-day uniqueness authoritatively, so a
//! race lost here is still caught at persistence time.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use patron_core::constants::MAX_REVIEWS_PER_DAY;
use patron_core::error::SubmissionError;
use patron_core::traits::ReviewStore;
use patron_core::types::utc_day_start;

/// Read-only daily rate and duplicate checks over the review store.
pub struct SubmissionGuard {
    reviews: Arc<dyn ReviewStore>,
    max_per_day: u64,
}

impl SubmissionGuard {
    /// Create a guard with the default daily limit.
    pub fn new(reviews: Arc<dyn ReviewStore>) -> Self {
        Self::with_limit(reviews, MAX_REVIEWS_PER_DAY)
    }

    /// Create a guard with a custom daily limit.
    pub fn with_limit(reviews: Arc<dyn ReviewStore>, max_per_day: u64) -> Self {
        Self { reviews, max_per_day }
    }

    /// Check the author's daily review count.
    ///
    /// Returns the count so far on success; rejects with
    /// [`SubmissionError::RateLimitExceeded`] once the author has used up
    /// today's allowance.
    pub fn check_rate(&self, author: Uuid, now: DateTime<Utc>) -> Result<u64, SubmissionError> {
        let since = utc_day_start(now);
        let count = self.reviews.count_by_author_since(author, since)?;

        if count >= self.max_per_day {
            debug!(%author, count, limit = self.max_per_day, "guard: daily rate limit hit");
            return Err(SubmissionError::RateLimitExceeded {
                count,
                limit: self.max_per_day,
            });
        }

        debug!(%author, count, limit = self.max_per_day, "guard: rate check passed");
        Ok(count)
    }

    /// Reject if the author already reviewed this business today.
    pub fn check_duplicate(
        &self,
        author: Uuid,
        business: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), SubmissionError> {
        let since = utc_day_start(now);
        if self
            .reviews
            .find_by_author_and_business_since(author, business, since)?
            .is_some()
        {
            debug!(%author, %business, "guard: same-day duplicate detected");
            return Err(SubmissionError::DuplicateSubmission);
        }

        Ok(())
    }

    /// The configured daily limit.
    pub fn max_per_day(&self) -> u64 {
        self.max_per_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::RwLock;
    use patron_core::error::StoreError;
    use patron_core::types::{Review, ReviewStatus};

    /// Minimal in-memory review store for guard tests.
    #[derive(Default)]
    struct StubReviews {
        reviews: RwLock<Vec<Review>>,
    }

    impl StubReviews {
        fn push(&self, author: Uuid, business: Uuid, captured_at: DateTime<Utc>) {
            use patron_core::types::{GeoPoint, SecurityMetadata};
            self.reviews.write().push(Review {
                id: Uuid::new_v4(),
                author_id: author,
                business_id: business,
                rating: 5,
                comment: "a perfectly fine visit".to_string(),
                submitted_location: GeoPoint::new(0.0, 0.0),
                captured_at,
                verified: true,
                status: ReviewStatus::Approved,
                helpful_votes: 0,
                security: SecurityMetadata {
                    gps_accuracy_m: 10.0,
                    verification_secs: 30,
                    motion_detected: true,
                    mock_location: false,
                    location_samples: 10,
                    suspicious_events: 0,
                    device_fingerprint: "d".to_string(),
                    platform: "ios".to_string(),
                    distance_m: 0.0,
                    business_radius_m: 50.0,
                },
            });
        }
    }

    impl ReviewStore for StubReviews {
        fn create(&self, _review: Review) -> Result<(), StoreError> {
            unimplemented!("guard never writes")
        }

        fn find(&self, _id: Uuid) -> Result<Option<Review>, StoreError> {
            Ok(None)
        }

        fn find_by_author_and_business_since(
            &self,
            author: Uuid,
            business: Uuid,
            since: DateTime<Utc>,
        ) -> Result<Option<Review>, StoreError> {
            Ok(self
                .reviews
                .read()
                .iter()
                .find(|r| {
                    r.author_id == author && r.business_id == business && r.captured_at >= since
                })
                .cloned())
        }

        fn count_by_author_since(
            &self,
            author: Uuid,
            since: DateTime<Utc>,
        ) -> Result<u64, StoreError> {
            Ok(self
                .reviews
                .read()
                .iter()
                .filter(|r| r.author_id == author && r.captured_at >= since)
                .count() as u64)
        }

        fn count_by_device_since(
            &self,
            _fingerprint: &str,
            _since: DateTime<Utc>,
        ) -> Result<u64, StoreError> {
            Ok(0)
        }

        fn find_all_by_business(&self, _business: Uuid) -> Result<Vec<Review>, StoreError> {
            Ok(vec![])
        }

        fn set_status(&self, _id: Uuid, _status: ReviewStatus) -> Result<(), StoreError> {
            Ok(())
        }

        fn add_helpful_vote(&self, _id: Uuid) -> Result<u32, StoreError> {
            Ok(0)
        }
    }

    fn guard_over(stub: Arc<StubReviews>) -> SubmissionGuard {
        SubmissionGuard::new(stub)
    }

    #[test]
    fn fresh_author_passes_rate_check() {
        let stub = Arc::new(StubReviews::default());
        let guard = guard_over(Arc::clone(&stub));
        assert_eq!(guard.check_rate(Uuid::new_v4(), Utc::now()).unwrap(), 0);
    }

    /// Four reviews today: the fifth attempt passes. Five: the sixth is
    /// rejected.
    #[test]
    fn rate_limit_boundary() {
        let stub = Arc::new(StubReviews::default());
        let guard = guard_over(Arc::clone(&stub));
        let author = Uuid::new_v4();
        let now = Utc::now();

        for _ in 0..4 {
            stub.push(author, Uuid::new_v4(), now);
        }
        assert_eq!(guard.check_rate(author, now).unwrap(), 4);

        stub.push(author, Uuid::new_v4(), now);
        let err = guard.check_rate(author, now).unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::RateLimitExceeded { count: 5, limit: 5 }
        ));
    }

    /// Reviews from before today's window do not count toward the limit.
    #[test]
    fn yesterday_does_not_count() {
        let stub = Arc::new(StubReviews::default());
        let guard = guard_over(Arc::clone(&stub));
        let author = Uuid::new_v4();
        let now = Utc::now();
        let yesterday = now - chrono::TimeDelta::days(1);

        for _ in 0..5 {
            stub.push(author, Uuid::new_v4(), yesterday);
        }
        assert_eq!(guard.check_rate(author, now).unwrap(), 0);
    }

    #[test]
    fn duplicate_same_day_rejected() {
        let stub = Arc::new(StubReviews::default());
        let guard = guard_over(Arc::clone(&stub));
        let author = Uuid::new_v4();
        let business = Uuid::new_v4();
        let now = Utc::now();

        guard.check_duplicate(author, business, now).unwrap();

        stub.push(author, business, now);
        let err = guard.check_duplicate(author, business, now).unwrap_err();
        assert!(matches!(err, SubmissionError::DuplicateSubmission));

        // A different business is still fine.
        guard.check_duplicate(author, Uuid::new_v4(), now).unwrap();
    }

    #[test]
    fn duplicate_from_yesterday_is_allowed() {
        let stub = Arc::new(StubReviews::default());
        let guard = guard_over(Arc::clone(&stub));
        let author = Uuid::new_v4();
        let business = Uuid::new_v4();
        let now = Utc::now();

        stub.push(author, business, now - chrono::TimeDelta::days(1));
        guard.check_duplicate(author, business, now).unwrap();
    }
}
