//! Failed-attempt tracking per identifier (normalized email or IP).
//!
//! This component is a mechanism, not a policy: it stores counts and a
//! blocked-until deadline but never decides "too many attempts" itself.
//! The orchestrator reads the count, compares it against its configured
//! threshold, and calls [`RateLimitTracker::set_blocked`].

mod models;
mod repo;

pub use models::RateLimitRecord;
pub use repo::RateLimitTracker;
