//! In-memory reference implementation of the store traits.
//!
//! Single-process, volatile, but with the same atomicity guarantees a
//! production store must provide:
//!
//! - same-day review uniqueness is enforced inside [`ReviewStore::create`]
//!   under one write lock (the guard's read-only checks only fail fast);
//! - redemption is a single conditional update under the coupon's map
//!   entry lock, so concurrent scans cannot double-redeem.
//!
//! Reviews, businesses, and templates sit behind `parking_lot` locks;
//! coupons live in a `DashMap` whose per-entry locking gives the
//! conditional redeem its atomicity.

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

use patron_core::error::{CouponError, StoreError};
use patron_core::traits::{BusinessStore, CouponStore, ReviewStore};
use patron_core::types::{
    Business, Coupon, CouponStatus, CouponTemplate, Review, ReviewStatus,
};
use patron_coupon::lifecycle::ensure_redeemable;

/// Review rows plus the same-day uniqueness index, mutated together under
/// one lock.
#[derive(Default)]
struct ReviewTable {
    by_id: HashMap<Uuid, Review>,
    /// (author, business, UTC day) triples with an existing review.
    day_index: HashSet<(Uuid, Uuid, NaiveDate)>,
}

/// In-memory store implementing all three persistence contracts.
#[derive(Default)]
pub struct MemoryStore {
    reviews: RwLock<ReviewTable>,
    businesses: RwLock<HashMap<Uuid, Business>>,
    templates: RwLock<HashMap<Uuid, CouponTemplate>>,
    coupons: DashMap<Uuid, Coupon>,
    /// code → coupon id, for lookup and collision checks.
    codes: RwLock<HashMap<String, Uuid>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a business.
    pub fn put_business(&self, business: Business) {
        self.businesses.write().insert(business.id, business);
    }

    /// Insert or replace a coupon template.
    pub fn put_template(&self, template: CouponTemplate) {
        self.templates.write().insert(template.id, template);
    }

    /// Snapshot of a template, if present.
    pub fn template(&self, id: Uuid) -> Option<CouponTemplate> {
        self.templates.read().get(&id).cloned()
    }

    /// Snapshot of a coupon, if present.
    pub fn coupon(&self, id: Uuid) -> Option<Coupon> {
        self.coupons.get(&id).map(|c| c.clone())
    }

    /// Number of coupons held.
    pub fn coupon_count(&self) -> usize {
        self.coupons.len()
    }
}

impl ReviewStore for MemoryStore {
    fn create(&self, review: Review) -> Result<(), StoreError> {
        let key = (
            review.author_id,
            review.business_id,
            review.captured_at.date_naive(),
        );

        let mut table = self.reviews.write();
        if table.day_index.contains(&key) {
            return Err(StoreError::DuplicateReview);
        }
        table.day_index.insert(key);
        table.by_id.insert(review.id, review);
        Ok(())
    }

    fn find(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        Ok(self.reviews.read().by_id.get(&id).cloned())
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
            .by_id
            .values()
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
            .by_id
            .values()
            .filter(|r| r.author_id == author && r.captured_at >= since)
            .count() as u64)
    }

    fn count_by_device_since(
        &self,
        fingerprint: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        Ok(self
            .reviews
            .read()
            .by_id
            .values()
            .filter(|r| r.security.device_fingerprint == fingerprint && r.captured_at >= since)
            .count() as u64)
    }

    fn find_all_by_business(&self, business: Uuid) -> Result<Vec<Review>, StoreError> {
        Ok(self
            .reviews
            .read()
            .by_id
            .values()
            .filter(|r| r.business_id == business)
            .cloned()
            .collect())
    }

    fn set_status(&self, id: Uuid, status: ReviewStatus) -> Result<(), StoreError> {
        let mut table = self.reviews.write();
        let review = table
            .by_id
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("review {id}")))?;
        review.status = status;
        Ok(())
    }

    fn add_helpful_vote(&self, id: Uuid) -> Result<u32, StoreError> {
        let mut table = self.reviews.write();
        let review = table
            .by_id
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("review {id}")))?;
        review.helpful_votes = review.helpful_votes.saturating_add(1);
        Ok(review.helpful_votes)
    }
}

impl BusinessStore for MemoryStore {
    fn find(&self, id: Uuid) -> Result<Option<Business>, StoreError> {
        Ok(self.businesses.read().get(&id).cloned())
    }

    fn update_rating(&self, id: Uuid, average: f64, count: u64) -> Result<(), StoreError> {
        let mut businesses = self.businesses.write();
        let business = businesses
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("business {id}")))?;
        business.rating_avg = average;
        business.rating_count = count;
        Ok(())
    }
}

impl CouponStore for MemoryStore {
    fn find_active_template(
        &self,
        business: Uuid,
    ) -> Result<Option<CouponTemplate>, StoreError> {
        Ok(self
            .templates
            .read()
            .values()
            .find(|t| t.business_id == business && t.active)
            .cloned())
    }

    fn create(&self, coupon: Coupon) -> Result<(), StoreError> {
        let mut codes = self.codes.write();
        if codes.contains_key(&coupon.code) {
            return Err(StoreError::Conflict(format!(
                "coupon code already exists: {}",
                coupon.code
            )));
        }
        codes.insert(coupon.code.clone(), coupon.id);
        self.coupons.insert(coupon.id, coupon);
        Ok(())
    }

    fn find(&self, id: Uuid) -> Result<Option<Coupon>, StoreError> {
        Ok(self.coupons.get(&id).map(|c| c.clone()))
    }

    fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, StoreError> {
        let id = match self.codes.read().get(code) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.coupons.get(&id).map(|c| c.clone()))
    }

    fn code_exists(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.codes.read().contains_key(code))
    }

    fn conditional_redeem(
        &self,
        id: Uuid,
        redeemer: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Coupon, CouponError> {
        // The DashMap entry reference holds the shard lock for this key,
        // making check-and-set atomic against concurrent redeem attempts.
        let redeemed = {
            let mut entry = self
                .coupons
                .get_mut(&id)
                .ok_or_else(|| CouponError::NotFound(id.to_string()))?;
            ensure_redeemable(&entry, now)?;
            entry.status = CouponStatus::Redeemed;
            entry.redeemed_at = Some(now);
            entry.redeemed_by = Some(redeemer);
            entry.clone()
        };

        // Bump the owning template's redeemed counter outside the entry
        // lock. Advisory: the coupon row is the source of truth.
        let mut templates = self.templates.write();
        if let Some(template) = templates
            .values_mut()
            .find(|t| t.business_id == redeemed.business_id && t.active)
        {
            template.redemption_count = template.redemption_count.saturating_add(1);
        }
        drop(templates);

        debug!(coupon = %id, %redeemer, "store: coupon redeemed");
        Ok(redeemed)
    }

    fn cancel(&self, id: Uuid) -> Result<Coupon, CouponError> {
        let mut entry = self
            .coupons
            .get_mut(&id)
            .ok_or_else(|| CouponError::NotFound(id.to_string()))?;
        match entry.status {
            CouponStatus::Active => {
                entry.status = CouponStatus::Cancelled;
                Ok(entry.clone())
            }
            status => Err(CouponError::NotRedeemable { status }),
        }
    }

    fn bulk_expire(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut expired = 0;
        for mut entry in self.coupons.iter_mut() {
            let coupon = entry.value_mut();
            if coupon.status == CouponStatus::Active && coupon.valid_until < now {
                coupon.status = CouponStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }

    fn count_redeemed_rewards(&self, business: Uuid) -> Result<u64, StoreError> {
        Ok(self
            .coupons
            .iter()
            .filter(|c| c.business_id == business && c.status == CouponStatus::Redeemed)
            .count() as u64)
    }

    fn increment_template_usage(&self, template: Uuid) -> Result<(), StoreError> {
        let mut templates = self.templates.write();
        let t = templates
            .get_mut(&template)
            .ok_or_else(|| StoreError::NotFound(format!("template {template}")))?;
        t.usage_count = t.usage_count.saturating_add(1);
        Ok(())
    }
}
