//! # Pordisto (Authentication Session & Abuse-Control Core)
//!
//! `pordisto` is the security core a login flow composes around its
//! credential-verification step: rate limiting of failed attempts, session
//! lifecycle tracking across devices, and append-only audit logging of
//! security-relevant events. The surrounding application (request handlers,
//! admin UI, CRUD endpoints) stays outside; it calls this crate
//! programmatically and owns all user-visible behavior.
//!
//! ## Components
//!
//! - [`store`]: the sole I/O boundary, an explicitly constructed and
//!   explicitly closed `PgPool` wrapper. The database is the single source
//!   of truth; no in-memory cache sits in front of it, so rate limiting and
//!   revocation stay consistent across serving instances.
//! - [`ratelimit`]: per-identifier failed-attempt counters with a
//!   blocked-until deadline. Mechanism only: thresholds and block durations
//!   are policy, decided by the orchestrator.
//! - [`session`]: one durable record per login with device metadata parsed
//!   once from the user agent; multi-device enumeration, one-way
//!   revocation, hard deletion of terminal rows.
//! - [`audit`]: append-only security events with severity derived from a
//!   closed event-type enum; no update or delete in the contract.
//! - [`login`]: the orchestrator tying the three together around a
//!   caller-supplied [`login::VerifyCredentials`] implementation.
//!
//! ## Failure semantics
//!
//! Store failures propagate unchanged to the caller; a rate-limit check
//! that cannot reach the store denies the attempt rather than waving it
//! through. Absence is an expected outcome and modeled as `Ok(None)`.
//! Revoke/reset on missing or already-terminal records are idempotent
//! no-op successes.

pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod login;
pub mod ratelimit;
pub mod session;
pub mod store;

pub use config::CoreConfig;
pub use error::{Error, Result};
pub use store::Store;
