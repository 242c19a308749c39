//! # patron-coupon — reward coupon issuance and lifecycle.
//!
//! Minting happens once per accepted review: [`CouponIssuer::issue`]
//! consults the business's active template and its redemption-limit state,
//! generates a collision-checked code, and produces a coupon valid for
//! exactly two hours together with its QR payload. [`lifecycle`] covers
//! the rest of the coupon's life: validity checks, atomic redemption,
//! discount computation, and the periodic expiry sweep.

pub mod code;
pub mod issue;
pub mod lifecycle;

pub use code::{generate_code, unique_code};
pub use issue::CouponIssuer;
pub use lifecycle::{calculate_discount, ensure_redeemable, is_valid, sweep_expired};
