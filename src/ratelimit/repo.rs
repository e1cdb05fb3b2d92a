//! Queries against the `rate_limits` table.

use chrono::{DateTime, Utc};
use tracing::Instrument;

use super::models::RateLimitRecord;
use crate::error::Result;
use crate::store::{db_span, Store};

/// Per-identifier failed-attempt counter with a blocked-until deadline.
#[derive(Clone, Debug)]
pub struct RateLimitTracker {
    store: Store,
}

impl RateLimitTracker {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Look up the record for an identifier. Returns `None` if the
    /// identifier has never failed; no side effects.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn get_by_identifier(&self, identifier: &str) -> Result<Option<RateLimitRecord>> {
        let query = r"
            SELECT identifier, attempts, last_attempt, blocked_until, created_at
            FROM rate_limits
            WHERE identifier = $1
        ";
        let row = sqlx::query(query)
            .bind(identifier)
            .fetch_optional(self.store.pool())
            .instrument(db_span("SELECT", query))
            .await?;

        row.map(|row| RateLimitRecord::from_row(&row))
            .transpose()
            .map_err(Into::into)
    }

    /// Record one failed attempt. Creates the row with `attempts = 1` on
    /// first failure; otherwise increments in place. A single upsert
    /// statement so two concurrent failures for the same identifier never
    /// lose an increment.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable (fail closed).
    pub async fn increment_attempts(&self, identifier: &str) -> Result<RateLimitRecord> {
        let query = r"
            INSERT INTO rate_limits (identifier, attempts, last_attempt)
            VALUES ($1, 1, NOW())
            ON CONFLICT (identifier)
            DO UPDATE SET attempts = rate_limits.attempts + 1, last_attempt = NOW()
            RETURNING identifier, attempts, last_attempt, blocked_until, created_at
        ";
        let row = sqlx::query(query)
            .bind(identifier)
            .fetch_one(self.store.pool())
            .instrument(db_span("INSERT", query))
            .await?;

        RateLimitRecord::from_row(&row).map_err(Into::into)
    }

    /// Set the blocked-until deadline on an existing record. Idempotent:
    /// repeating the same deadline is a no-op, and a missing record is
    /// left for `increment_attempts` to create.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn set_blocked(
        &self,
        identifier: &str,
        blocked_until: DateTime<Utc>,
    ) -> Result<()> {
        let query = r"
            UPDATE rate_limits
            SET blocked_until = $2
            WHERE identifier = $1
        ";
        sqlx::query(query)
            .bind(identifier)
            .bind(blocked_until)
            .execute(self.store.pool())
            .instrument(db_span("UPDATE", query))
            .await?;
        Ok(())
    }

    /// Clear the failure history after a successful login. Zeroes
    /// `attempts` and clears `blocked_until` in one statement so a
    /// concurrent increment cannot observe a half-reset row. No-op when
    /// the identifier has no record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable (fail closed).
    pub async fn reset(&self, identifier: &str) -> Result<()> {
        let query = r"
            UPDATE rate_limits
            SET attempts = 0, blocked_until = NULL
            WHERE identifier = $1
        ";
        sqlx::query(query)
            .bind(identifier)
            .execute(self.store.pool())
            .instrument(db_span("UPDATE", query))
            .await?;
        Ok(())
    }

    /// Purge records older than the retention window, regardless of their
    /// blocked state. Intended for periodic background execution.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn cleanup_expired(&self, retention_days: i64) -> Result<u64> {
        let query = r"
            DELETE FROM rate_limits
            WHERE created_at < NOW() - ($1 * INTERVAL '1 day')
        ";
        let result = sqlx::query(query)
            .bind(retention_days)
            .execute(self.store.pool())
            .instrument(db_span("DELETE", query))
            .await?;
        Ok(result.rows_affected())
    }
}
