//! Durable registry of issued authentication sessions.
//!
//! One record per login, carrying device metadata parsed once from the
//! user agent at creation. Supports multi-device enumeration ("what
//! devices is this user logged in on"), one-way revocation, and hard
//! deletion of terminal rows.

mod device;
mod models;
mod repo;

pub use device::DeviceInfo;
pub use models::{NewSession, Session};
pub use repo::SessionRegistry;
