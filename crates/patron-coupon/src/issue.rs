//! Reward coupon minting.
//!
//! One coupon per accepted review. The validity window is always exactly
//! two hours from mint time — short on purpose, to drive same-visit
//! redemption — and is not configurable per issuance. Template terms are
//! snapshotted onto the coupon so later template edits don't change
//! already-issued rewards.

use chrono::{DateTime, TimeDelta, Utc};
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use patron_core::constants::{COUPON_VALIDITY_SECS, DEFAULT_REWARD_PERCENT};
use patron_core::error::StoreError;
use patron_core::traits::CouponStore;
use patron_core::types::{Coupon, CouponStatus, CouponTemplate, QrPayload, RewardType};

use crate::code::unique_code;

/// Mints review-reward coupons against a coupon store.
pub struct CouponIssuer {
    store: Arc<dyn CouponStore>,
}

impl CouponIssuer {
    /// Create an issuer over the given store.
    pub fn new(store: Arc<dyn CouponStore>) -> Self {
        Self { store }
    }

    /// Mint a reward coupon for an accepted review, if the business's
    /// template state allows one.
    ///
    /// Looks up the business's active template; when the template caps
    /// redemptions and the cap is already met, no coupon is minted and
    /// `Ok(None)` is returned — the review itself stays accepted. Without
    /// a template, default terms apply (10% off, uncapped).
    ///
    /// The limit check and the mint are not one atomic step; under heavy
    /// concurrency the limit may be overshot slightly. It is documented as
    /// a soft limit.
    pub fn issue(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        review_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Coupon>, StoreError> {
        let template = self.store.find_active_template(business_id)?;

        if let Some(t) = &template {
            if let Some(limit) = t.redemption_limit {
                let redeemed = self.store.count_redeemed_rewards(business_id)?;
                if redeemed >= u64::from(limit) {
                    info!(
                        %business_id,
                        template = %t.id,
                        redeemed,
                        limit,
                        "coupon: redemption limit met, skipping mint"
                    );
                    return Ok(None);
                }
            }
        }

        let code = unique_code(self.store.as_ref(), &mut OsRng)?;
        let coupon = mint(business_id, user_id, review_id, template.as_ref(), code, now);

        self.store.create(coupon.clone())?;
        if let Some(t) = &template {
            self.store.increment_template_usage(t.id)?;
        }

        debug!(
            coupon = %coupon.id,
            code = %coupon.code,
            reward = %coupon.reward,
            valid_until = %coupon.valid_until,
            "coupon: minted"
        );
        Ok(Some(coupon))
    }
}

/// Build a coupon from template terms (or defaults) with the fixed
/// two-hour validity window and its QR payload.
pub fn mint(
    business_id: Uuid,
    user_id: Uuid,
    review_id: Uuid,
    template: Option<&CouponTemplate>,
    code: String,
    now: DateTime<Utc>,
) -> Coupon {
    let (reward, reward_value, max_discount) = match template {
        Some(t) => (t.reward, t.reward_value, t.max_discount),
        None => (RewardType::Percentage, DEFAULT_REWARD_PERCENT, None),
    };

    let id = Uuid::new_v4();
    let valid_until = now + TimeDelta::seconds(COUPON_VALIDITY_SECS);

    Coupon {
        id,
        business_id,
        user_id,
        review_id,
        code: code.clone(),
        reward,
        reward_value,
        max_discount,
        valid_from: now,
        valid_until,
        status: CouponStatus::Active,
        redeemed_at: None,
        redeemed_by: None,
        qr: QrPayload {
            kind: "coupon".to_string(),
            coupon_id: id,
            code,
            business_id,
            user_id,
            review_id,
            timestamp: now,
        },
    }
}
