//! Coupon validity, redemption rules, discount math, and the expiry sweep.
//!
//! Redemption itself is a single atomic conditional update owned by the
//! store ([`CouponStore::conditional_redeem`]); the helpers here define
//! what "redeemable" means so every store implementation applies the same
//! rules, and wrap the periodic sweep.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use patron_core::error::{CouponError, StoreError};
use patron_core::traits::CouponStore;
use patron_core::types::{Coupon, CouponStatus, RewardType};

/// Whether a coupon is currently redeemable: active and inside its
/// validity window.
pub fn is_valid(coupon: &Coupon, now: DateTime<Utc>) -> bool {
    coupon.status == CouponStatus::Active
        && now >= coupon.valid_from
        && now <= coupon.valid_until
}

/// Check redeemability, reporting why a coupon cannot be redeemed.
///
/// Store implementations call this inside their atomic redeem section so
/// the error taxonomy is uniform: a non-active status reports the status,
/// an elapsed window reports expiry.
pub fn ensure_redeemable(coupon: &Coupon, now: DateTime<Utc>) -> Result<(), CouponError> {
    match coupon.status {
        CouponStatus::Active => {}
        status => return Err(CouponError::NotRedeemable { status }),
    }
    if now < coupon.valid_from {
        return Err(CouponError::NotYetValid { valid_from: coupon.valid_from });
    }
    if now > coupon.valid_until {
        return Err(CouponError::Expired { valid_until: coupon.valid_until });
    }
    Ok(())
}

/// Compute the discount a coupon grants on a purchase amount.
///
/// - `Percentage`: `purchase * value / 100`, capped at the coupon's
///   discount cap when one was snapshotted.
/// - `Fixed`: the reward value, never more than the purchase.
/// - `Buy1Get1`: treated as a percentage-equivalent of the purchase.
/// - `FreeDrink` / `FreeItem`: the item's price, never more than the
///   purchase.
pub fn calculate_discount(coupon: &Coupon, purchase: f64) -> f64 {
    match coupon.reward {
        RewardType::Percentage => {
            let discount = purchase * coupon.reward_value / 100.0;
            match coupon.max_discount {
                Some(cap) => discount.min(cap),
                None => discount,
            }
        }
        RewardType::Fixed => coupon.reward_value.min(purchase),
        RewardType::Buy1Get1 => purchase * coupon.reward_value / 100.0,
        RewardType::FreeDrink | RewardType::FreeItem => coupon.reward_value.min(purchase),
    }
}

/// Expire every active coupon whose validity window has passed.
///
/// Intended to run on a fixed interval. Idempotent and safe to run
/// concurrently with redemption attempts: a coupon redeemed a moment
/// before the sweep is simply skipped by the store's status guard.
pub fn sweep_expired(store: &dyn CouponStore, now: DateTime<Utc>) -> Result<usize, StoreError> {
    let expired = store.bulk_expire(now)?;
    if expired > 0 {
        info!(expired, "sweep: coupons expired");
    } else {
        debug!("sweep: nothing to expire");
    }
    Ok(expired)
}
