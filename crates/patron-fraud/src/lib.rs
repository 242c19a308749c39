//! # patron-fraud — fraud signal evaluation and submission guards.
//!
//! Three pieces sit in front of review persistence:
//! - [`signals::FraudPolicy`] scores a submission's security metadata
//!   against configured thresholds, rejecting on hard signals and flagging
//!   soft ones.
//! - [`activity::ActivityLog`] is the bounded, volatile telemetry buffer
//!   every flag and rejection is forwarded to.
//! - [`guard::SubmissionGuard`] applies the per-author daily rate limit
//!   and the per-author-per-business duplicate check.

pub mod activity;
pub mod guard;
pub mod signals;

pub use activity::{ActivityEntry, ActivityLog};
pub use guard::SubmissionGuard;
pub use signals::{FraudPolicy, FraudReport, FraudThresholds, SubmissionSignals};
