//! Typed row shape for the `rate_limits` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::Row;

/// One row per identifier, created lazily on the first failed attempt.
#[derive(Clone, Debug, Serialize)]
pub struct RateLimitRecord {
    pub identifier: String,
    /// Monotonically incremented on each failed attempt until reset.
    pub attempts: i32,
    pub last_attempt: DateTime<Utc>,
    /// When set and in the future, the identifier is denied regardless
    /// of `attempts`.
    pub blocked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RateLimitRecord {
    /// Whether the blocked-until deadline is still in the future.
    #[must_use]
    pub fn is_blocked_at(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.is_some_and(|until| until > now)
    }

    pub(crate) fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            identifier: row.try_get("identifier")?,
            attempts: row.try_get("attempts")?,
            last_attempt: row.try_get("last_attempt")?,
            blocked_until: row.try_get("blocked_until")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(blocked_until: Option<DateTime<Utc>>) -> RateLimitRecord {
        let now = Utc::now();
        RateLimitRecord {
            identifier: "user@example.com".to_string(),
            attempts: 3,
            last_attempt: now,
            blocked_until,
            created_at: now,
        }
    }

    #[test]
    fn not_blocked_without_deadline() {
        assert!(!record(None).is_blocked_at(Utc::now()));
    }

    #[test]
    fn blocked_while_deadline_in_future() {
        let now = Utc::now();
        assert!(record(Some(now + Duration::minutes(15))).is_blocked_at(now));
    }

    #[test]
    fn not_blocked_after_deadline_passes() {
        let now = Utc::now();
        assert!(!record(Some(now - Duration::seconds(1))).is_blocked_at(now));
    }
}
