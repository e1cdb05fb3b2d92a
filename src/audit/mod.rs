//! Append-only record of security-relevant events.
//!
//! Tamper-evident by convention: the contract has no update or delete
//! operation. Severity is derived from the event type when not supplied,
//! and downstream alerting keys off it.

mod models;
mod repo;

pub use models::{AuditEntry, EventType, NewAuditEvent, Severity};
pub use repo::AuditLog;
