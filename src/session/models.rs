//! Typed row shapes for the `sessions` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

/// One record per authenticated login.
#[derive(Clone, Debug, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Opaque credential presented on each request. Unique across all
    /// sessions; two sessions never share a token.
    pub session_token: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Parsed once at creation from `user_agent`; never re-derived.
    pub device_type: String,
    pub browser: String,
    pub os: String,
    /// One-way transition: once true, never reverts.
    pub revoked: bool,
}

impl Session {
    /// A session is usable only while unrevoked and unexpired. Listing
    /// queries apply the same compound predicate in SQL; this is the
    /// in-memory equivalent for a row already fetched via `get_by_token`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }

    pub(crate) fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            session_token: row.try_get("session_token")?,
            created_at: row.try_get("created_at")?,
            last_active: row.try_get("last_active")?,
            expires_at: row.try_get("expires_at")?,
            ip_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
            device_type: row.try_get("device_type")?,
            browser: row.try_get("browser")?,
            os: row.try_get("os")?,
            revoked: row.try_get("revoked")?,
        })
    }
}

/// Parameters for creating a session at successful login.
#[derive(Clone, Debug)]
pub struct NewSession {
    pub user_id: Uuid,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(revoked: bool, expires_at: DateTime<Utc>) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            session_token: "token".to_string(),
            created_at: now,
            last_active: now,
            expires_at,
            ip_address: None,
            user_agent: None,
            device_type: "desktop".to_string(),
            browser: "Firefox".to_string(),
            os: "Linux".to_string(),
            revoked,
        }
    }

    #[test]
    fn active_requires_both_conditions() {
        let now = Utc::now();
        let future = now + Duration::hours(1);
        let past = now - Duration::hours(1);

        assert!(session(false, future).is_active_at(now));
        assert!(!session(true, future).is_active_at(now));
        assert!(!session(false, past).is_active_at(now));
        assert!(!session(true, past).is_active_at(now));
    }
}
