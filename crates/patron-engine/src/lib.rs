//! # patron-engine — review submission orchestration.
//!
//! Wires the guard, geofence, fraud policy, and coupon issuer into the
//! one logical transaction a review submission is: checks fail closed
//! before persistence, everything after persistence is best-effort. Ships
//! the in-memory reference implementation of the store traits, a
//! channel-backed notifier, and the coupon expiry sweeper.

pub mod config;
pub mod engine;
pub mod memory;
pub mod notify;
pub mod sweeper;

pub use config::EngineConfig;
pub use engine::{ReviewEngine, SubmissionOutcome, SubmissionRequest, SubmissionStage};
pub use memory::MemoryStore;
pub use notify::{ChannelNotifier, Notification, NullNotifier};
pub use sweeper::Sweeper;

/// Install a global tracing subscriber filtered by `filter` (e.g. "info",
/// "patron_engine=debug"). Call once at process start; later calls are
/// ignored.
pub fn init_logging(filter: &str) {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}
