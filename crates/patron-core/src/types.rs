//! Core domain types: reviews, businesses, coupons, fraud signals.
//!
//! All timestamps are `DateTime<Utc>`. Monetary amounts are `f64` in the
//! business's display currency; discount math never needs sub-cent precision.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A WGS84 coordinate pair in decimal degrees.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    /// Latitude in decimal degrees, positive north.
    pub lat: f64,
    /// Longitude in decimal degrees, positive east.
    pub lon: f64,
}

impl GeoPoint {
    /// Create a point from latitude and longitude in decimal degrees.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Start of the UTC calendar day containing `now`.
///
/// Daily rate and duplicate windows bucket on this boundary.
pub fn utc_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// A single fraud-signal category.
///
/// Hard signals reject a submission outright; soft signals are recorded and
/// allowed through.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Reported GPS accuracy above the configured ceiling. Hard reject.
    PoorGpsAccuracy,
    /// Client reported a mock-location provider. Hard reject.
    MockLocation,
    /// Three or more client-reported anomaly events. Hard reject.
    AnomalyBurst,
    /// One or two client-reported anomaly events. Soft flag.
    AnomalyReported,
    /// Fewer location-history samples than expected. Soft flag.
    ThinLocationHistory,
    /// Same device fingerprint already used for several reviews today. Soft flag.
    DeviceReuse,
    /// Verification duration differs from the expected pace. Advisory only.
    VerificationPace,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PoorGpsAccuracy => "poor_gps_accuracy",
            Self::MockLocation => "mock_location",
            Self::AnomalyBurst => "anomaly_burst",
            Self::AnomalyReported => "anomaly_reported",
            Self::ThinLocationHistory => "thin_location_history",
            Self::DeviceReuse => "device_reuse",
            Self::VerificationPace => "verification_pace",
        };
        f.write_str(s)
    }
}

/// Moderation state of a review.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Awaiting moderation (not counted in rating aggregates).
    Pending,
    /// Visible and counted in the business rating.
    #[default]
    Approved,
    /// Hidden by moderation.
    Rejected,
    /// Marked for moderator attention, still visible.
    Flagged,
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Flagged => "flagged",
        };
        f.write_str(s)
    }
}

/// Security snapshot captured at submission time.
///
/// Distance and radius are historical facts recorded when the review was
/// verified; they are never recomputed against the business's live location.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SecurityMetadata {
    /// Reported GPS accuracy in meters.
    pub gps_accuracy_m: f64,
    /// How long the client's verification step took, in seconds.
    pub verification_secs: u64,
    /// Whether device motion was detected during verification.
    pub motion_detected: bool,
    /// Whether a mock-location provider was reported.
    pub mock_location: bool,
    /// Number of location-history samples the client collected.
    pub location_samples: u32,
    /// Suspicious-activity entries held for this author at submission time.
    pub suspicious_events: u32,
    /// Opaque device fingerprint supplied by the client.
    pub device_fingerprint: String,
    /// Client platform identifier (e.g. "ios", "android").
    pub platform: String,
    /// Measured distance from the business at submission, in meters.
    pub distance_m: f64,
    /// The business's geofence radius at submission, in meters.
    pub business_radius_m: f64,
}

/// A customer's verified visit evaluation. Immutable after creation except
/// for moderation status and helpfulness votes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Review {
    /// Unique review id.
    pub id: Uuid,
    /// The submitting customer.
    pub author_id: Uuid,
    /// The reviewed business.
    pub business_id: Uuid,
    /// Star rating, 1 through 5.
    pub rating: u8,
    /// Free-text comment, 10 through 500 characters.
    pub comment: String,
    /// Where the customer was standing when they submitted.
    pub submitted_location: GeoPoint,
    /// When the submission was captured.
    pub captured_at: DateTime<Utc>,
    /// Whether the geofence and fraud checks passed.
    pub verified: bool,
    /// Moderation state.
    pub status: ReviewStatus,
    /// Helpfulness votes from other customers.
    pub helpful_votes: u32,
    /// Security snapshot captured at submission time.
    pub security: SecurityMetadata,
}

/// A geofence target and rating aggregate.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Business {
    /// Unique business id.
    pub id: Uuid,
    /// The owning account.
    pub owner_id: Uuid,
    /// Registered coordinates.
    pub location: GeoPoint,
    /// Geofence radius in meters. Valid range 10–500, default 50.
    pub radius_m: f64,
    /// Mean rating over approved reviews.
    pub rating_avg: f64,
    /// Number of reviews behind `rating_avg`.
    pub rating_count: u64,
    /// Whether the listing is live.
    pub active: bool,
}

impl Business {
    /// The geofence radius clamped into the valid range.
    ///
    /// Radius is an invariant of the data model; clamping here keeps the
    /// geofence check correct even if a collaborator stored a bad value.
    pub fn effective_radius_m(&self) -> f64 {
        use crate::constants::{MAX_RADIUS_M, MIN_RADIUS_M};
        self.radius_m.clamp(MIN_RADIUS_M, MAX_RADIUS_M)
    }
}

/// The kind of reward a coupon grants.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    /// Percentage off the purchase amount.
    Percentage,
    /// Fixed amount off the purchase.
    Fixed,
    /// Buy-one-get-one, expressed as a percentage-equivalent discount.
    Buy1Get1,
    /// A free drink; the reward value is the drink's price.
    FreeDrink,
    /// A free menu item; the reward value is the item's price.
    FreeItem,
}

impl fmt::Display for RewardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
            Self::Buy1Get1 => "buy1get1",
            Self::FreeDrink => "free_drink",
            Self::FreeItem => "free_item",
        };
        f.write_str(s)
    }
}

/// Owner-configured rule set parameterizing auto-issued reward coupons.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CouponTemplate {
    /// Unique template id.
    pub id: Uuid,
    /// The business this template belongs to.
    pub business_id: Uuid,
    /// What kind of reward issued coupons grant.
    pub reward: RewardType,
    /// Reward magnitude; meaning depends on `reward`.
    pub reward_value: f64,
    /// Minimum purchase amount for the reward to apply.
    pub min_purchase: f64,
    /// Cap on the computed discount, if any.
    pub max_discount: Option<f64>,
    /// How many reward coupons may ever be redeemed against this template.
    /// `None` means unlimited.
    pub redemption_limit: Option<u32>,
    /// Reward coupons redeemed against this template so far.
    pub redemption_count: u32,
    /// Reward coupons minted from this template so far. Advisory counter;
    /// may slightly overshoot `redemption_limit` under heavy concurrency.
    pub usage_count: u32,
    /// Whether this template currently mints new coupons.
    pub active: bool,
}

/// Lifecycle state of a coupon.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CouponStatus {
    /// Redeemable within its validity window.
    Active,
    /// Redeemed exactly once. Terminal.
    Redeemed,
    /// Validity window elapsed without redemption. Terminal.
    Expired,
    /// Withdrawn by the business owner. Terminal.
    Cancelled,
}

impl fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Redeemed => "redeemed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// The QR payload encoded for the scan endpoint.
///
/// The serialized JSON shape is a wire contract with the mobile client:
/// `{"type":"coupon","couponId":…,"code":…,"businessId":…,"userId":…,
/// "reviewId":…,"timestamp":…}` with an ISO-8601 timestamp.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    /// Always the literal `"coupon"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Coupon id.
    pub coupon_id: Uuid,
    /// Human-enterable coupon code.
    pub code: String,
    /// Issuing business.
    pub business_id: Uuid,
    /// Rewarded customer.
    pub user_id: Uuid,
    /// The review that earned the reward.
    pub review_id: Uuid,
    /// Issuance time.
    pub timestamp: DateTime<Utc>,
}

/// A single-use, time-boxed review reward.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Coupon {
    /// Unique coupon id.
    pub id: Uuid,
    /// Issuing business.
    pub business_id: Uuid,
    /// Rewarded customer.
    pub user_id: Uuid,
    /// The review that earned the reward.
    pub review_id: Uuid,
    /// Unique prefixed code, e.g. `HASH-7QX41A`.
    pub code: String,
    /// Reward kind, copied from the template at mint time.
    pub reward: RewardType,
    /// Reward magnitude, copied from the template at mint time.
    pub reward_value: f64,
    /// Discount cap snapshot from the template, if any.
    pub max_discount: Option<f64>,
    /// Start of the validity window.
    pub valid_from: DateTime<Utc>,
    /// End of the validity window, exactly two hours after `valid_from`.
    pub valid_until: DateTime<Utc>,
    /// Lifecycle state.
    pub status: CouponStatus,
    /// When the coupon was redeemed, if it was.
    pub redeemed_at: Option<DateTime<Utc>>,
    /// Who redeemed the coupon, if it was.
    pub redeemed_by: Option<Uuid>,
    /// Payload for QR rendering by the client.
    pub qr: QrPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_start_truncates_to_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 13, 45, 59).unwrap();
        let start = utc_day_start(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn day_start_is_idempotent() {
        let now = Utc::now();
        let start = utc_day_start(now);
        assert_eq!(utc_day_start(start), start);
    }

    #[test]
    fn effective_radius_clamps_out_of_range_values() {
        let mut b = Business {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            location: GeoPoint::new(0.0, 0.0),
            radius_m: 5_000.0,
            rating_avg: 0.0,
            rating_count: 0,
            active: true,
        };
        assert_eq!(b.effective_radius_m(), 500.0);

        b.radius_m = 1.0;
        assert_eq!(b.effective_radius_m(), 10.0);

        b.radius_m = 50.0;
        assert_eq!(b.effective_radius_m(), 50.0);
    }

    /// The QR payload must serialize to the exact wire shape the mobile
    /// client expects, camelCase keys and a literal `type` field included.
    #[test]
    fn qr_payload_wire_shape() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let qr = QrPayload {
            kind: "coupon".to_string(),
            coupon_id: Uuid::nil(),
            code: "HASH-ABC123".to_string(),
            business_id: Uuid::nil(),
            user_id: Uuid::nil(),
            review_id: Uuid::nil(),
            timestamp: ts,
        };

        let json = serde_json::to_value(&qr).unwrap();
        assert_eq!(json["type"], "coupon");
        assert_eq!(json["code"], "HASH-ABC123");
        assert!(json.get("couponId").is_some(), "couponId key must be camelCase");
        assert!(json.get("businessId").is_some());
        assert!(json.get("userId").is_some());
        assert!(json.get("reviewId").is_some());
        // RFC 3339 timestamp.
        assert!(json["timestamp"].as_str().unwrap().starts_with("2024-06-15T12:00:00"));
    }

    #[test]
    fn status_display_matches_wire_names() {
        assert_eq!(CouponStatus::Active.to_string(), "active");
        assert_eq!(CouponStatus::Redeemed.to_string(), "redeemed");
        assert_eq!(ReviewStatus::Flagged.to_string(), "flagged");
        assert_eq!(RewardType::Buy1Get1.to_string(), "buy1get1");
    }
}
