//! Shared fixtures for the Patron integration tests.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use patron_core::traits::{BusinessStore, CouponStore, Notifier, ReviewStore};
use patron_core::types::{Business, CouponTemplate, GeoPoint, RewardType};
use patron_engine::{
    ChannelNotifier, EngineConfig, MemoryStore, Notification, ReviewEngine, SubmissionRequest,
};
use patron_fraud::SubmissionSignals;

/// An engine wired over a shared in-memory store, with the notification
/// channel's receiving end exposed for assertions.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub engine: Arc<ReviewEngine>,
    pub notifications: UnboundedReceiver<Notification>,
}

/// Build a harness with the default configuration.
pub fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

/// Build a harness with a custom configuration.
pub fn harness_with(config: EngineConfig) -> Harness {
    patron_engine::init_logging(&config.log_level);

    let store = Arc::new(MemoryStore::new());
    let (notifier, notifications) = ChannelNotifier::new();
    let engine = Arc::new(ReviewEngine::new(
        config,
        Arc::clone(&store) as Arc<dyn ReviewStore>,
        Arc::clone(&store) as Arc<dyn BusinessStore>,
        Arc::clone(&store) as Arc<dyn CouponStore>,
        Arc::new(notifier) as Arc<dyn Notifier>,
    ));

    Harness {
        store,
        engine,
        notifications,
    }
}

/// A business at the given coordinates with a 50 m fence.
pub fn business_at(lat: f64, lon: f64) -> Business {
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

/// Security metadata that passes every fraud rule.
pub fn clean_signals(device: &str) -> SubmissionSignals {
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

/// A clean five-star submission standing exactly at the business.
pub fn submission(business: &Business, device: &str) -> SubmissionRequest {
    SubmissionRequest {
        author_id: Uuid::new_v4(),
        business_id: business.id,
        rating: 5,
        comment: "friendly staff and the flat white was excellent".to_string(),
        location: business.location,
        signals: clean_signals(device),
    }
}

/// A coupon template for a business.
pub fn template_for(
    business: &Business,
    reward: RewardType,
    value: f64,
    max_discount: Option<f64>,
    redemption_limit: Option<u32>,
) -> CouponTemplate {
    CouponTemplate {
        id: Uuid::new_v4(),
        business_id: business.id,
        reward,
        reward_value: value,
        min_purchase: 0.0,
        max_discount,
        redemption_limit,
        redemption_count: 0,
        usage_count: 0,
        active: true,
    }
}
