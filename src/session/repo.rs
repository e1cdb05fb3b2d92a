//! Queries against the `sessions` table.

use sqlx::Row;
use tracing::Instrument;
use uuid::Uuid;

use super::device::DeviceInfo;
use super::models::{NewSession, Session};
use crate::error::{is_unique_violation, Error, Result};
use crate::store::{db_span, Store};

/// Durable record of issued sessions: multi-device visibility, one-way
/// revocation, hard deletion of terminal rows.
#[derive(Clone, Debug)]
pub struct SessionRegistry {
    store: Store,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Persist a new session. The user agent is classified here, once;
    /// reads return the stored fields as-is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateSessionToken`] when the token collides
    /// with an existing session, so the caller can regenerate and retry.
    /// Any other store failure propagates unchanged.
    pub async fn create(&self, new: NewSession) -> Result<Session> {
        let device = DeviceInfo::from_user_agent(new.user_agent.as_deref());

        let query = r"
            INSERT INTO sessions
                (user_id, session_token, expires_at, ip_address, user_agent,
                 device_type, browser, os)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, session_token, created_at, last_active,
                      expires_at, ip_address, user_agent, device_type,
                      browser, os, revoked
        ";
        let row = sqlx::query(query)
            .bind(new.user_id)
            .bind(&new.session_token)
            .bind(new.expires_at)
            .bind(&new.ip_address)
            .bind(&new.user_agent)
            .bind(&device.device_type)
            .bind(&device.browser)
            .bind(&device.os)
            .fetch_one(self.store.pool())
            .instrument(db_span("INSERT", query))
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    Error::DuplicateSessionToken
                } else {
                    Error::Store(err)
                }
            })?;

        Session::from_row(&row).map_err(Into::into)
    }

    /// The canonical "what devices is this user logged in on" view.
    /// Filters on `revoked = FALSE AND expires_at > NOW()` as a single
    /// predicate; returning a revoked-but-unexpired session would be a
    /// contract violation. Most recently active first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn get_active_sessions(&self, user_id: Uuid) -> Result<Vec<Session>> {
        let query = r"
            SELECT id, user_id, session_token, created_at, last_active,
                   expires_at, ip_address, user_agent, device_type,
                   browser, os, revoked
            FROM sessions
            WHERE user_id = $1
              AND revoked = FALSE
              AND expires_at > NOW()
            ORDER BY last_active DESC
        ";
        let rows = sqlx::query(query)
            .bind(user_id)
            .fetch_all(self.store.pool())
            .instrument(db_span("SELECT", query))
            .await?;

        rows.iter()
            .map(|row| Session::from_row(row).map_err(Into::into))
            .collect()
    }

    /// Lookup by the opaque credential. Deliberately does not filter on
    /// liveness: diagnostic and audit callers want an expired session's
    /// metadata too. Liveness checks belong to the caller
    /// ([`Session::is_active_at`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn get_by_token(&self, session_token: &str) -> Result<Option<Session>> {
        let query = r"
            SELECT id, user_id, session_token, created_at, last_active,
                   expires_at, ip_address, user_agent, device_type,
                   browser, os, revoked
            FROM sessions
            WHERE session_token = $1
        ";
        let row = sqlx::query(query)
            .bind(session_token)
            .fetch_optional(self.store.pool())
            .instrument(db_span("SELECT", query))
            .await?;

        row.map(|row| Session::from_row(&row))
            .transpose()
            .map_err(Into::into)
    }

    /// Refresh `last_active` on the hot request path. A dangling token is
    /// a no-op; callers update optimistically on every authenticated
    /// request and a missing row must not break the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn update_last_active(&self, session_token: &str) -> Result<()> {
        let query = r"
            UPDATE sessions
            SET last_active = NOW()
            WHERE session_token = $1
        ";
        sqlx::query(query)
            .bind(session_token)
            .execute(self.store.pool())
            .instrument(db_span("UPDATE", query))
            .await?;
        Ok(())
    }

    /// One-way transition to revoked. No-op when missing or already
    /// revoked: the requested end state is already satisfied.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn revoke(&self, session_id: Uuid) -> Result<()> {
        let query = r"
            UPDATE sessions
            SET revoked = TRUE
            WHERE id = $1
        ";
        sqlx::query(query)
            .bind(session_id)
            .execute(self.store.pool())
            .instrument(db_span("UPDATE", query))
            .await?;
        Ok(())
    }

    /// Revoke every active session for a user, optionally sparing one
    /// ("log out all other devices"). Returns the count actually
    /// transitioned so the caller can report it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        except_session_id: Option<Uuid>,
    ) -> Result<u64> {
        let query = r"
            UPDATE sessions
            SET revoked = TRUE
            WHERE user_id = $1
              AND revoked = FALSE
              AND expires_at > NOW()
              AND ($2::uuid IS NULL OR id <> $2)
        ";
        let result = sqlx::query(query)
            .bind(user_id)
            .bind(except_session_id)
            .execute(self.store.pool())
            .instrument(db_span("UPDATE", query))
            .await?;
        Ok(result.rows_affected())
    }

    /// Hard-delete terminal rows (expired or revoked). Background job,
    /// not per-request.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn cleanup(&self) -> Result<u64> {
        let query = r"
            DELETE FROM sessions
            WHERE expires_at < NOW() OR revoked = TRUE
        ";
        let result = sqlx::query(query)
            .execute(self.store.pool())
            .instrument(db_span("DELETE", query))
            .await?;
        Ok(result.rows_affected())
    }

    /// Count of currently-active sessions, same predicate as
    /// [`Self::get_active_sessions`]. Used to enforce the concurrent-
    /// session cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn get_count(&self, user_id: Uuid) -> Result<i64> {
        let query = r"
            SELECT COUNT(*) AS count
            FROM sessions
            WHERE user_id = $1
              AND revoked = FALSE
              AND expires_at > NOW()
        ";
        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_one(self.store.pool())
            .instrument(db_span("SELECT", query))
            .await?;

        row.try_get("count").map_err(Into::into)
    }
}
