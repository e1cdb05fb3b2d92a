//! Queries against the `audit_logs` table. Append plus three read paths;
//! no update or delete is part of the contract.

use tracing::Instrument;

use super::models::{AuditEntry, EventType, NewAuditEvent};
use crate::error::Result;
use crate::store::{db_span, Store};

const DEFAULT_EMAIL_LIMIT: i64 = 50;
const DEFAULT_FEED_LIMIT: i64 = 100;

/// Append-only security event log.
#[derive(Clone, Debug)]
pub struct AuditLog {
    store: Store,
}

impl AuditLog {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Append one event. When the caller supplies no severity it is
    /// derived from the event type ([`EventType::default_severity`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn create(&self, event: NewAuditEvent) -> Result<AuditEntry> {
        let severity = event
            .severity
            .unwrap_or_else(|| event.event_type.default_severity());

        let query = r"
            INSERT INTO audit_logs
                (user_id, email, event_type, ip_address, user_agent,
                 session_id, metadata, severity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, created_at, user_id, email, event_type,
                      ip_address, user_agent, session_id, metadata, severity
        ";
        let row = sqlx::query(query)
            .bind(event.user_id)
            .bind(&event.email)
            .bind(event.event_type.as_str())
            .bind(&event.ip_address)
            .bind(&event.user_agent)
            .bind(event.session_id)
            .bind(&event.metadata)
            .bind(severity.as_str())
            .fetch_one(self.store.pool())
            .instrument(db_span("INSERT", query))
            .await?;

        AuditEntry::from_row(&row).map_err(Into::into)
    }

    /// Per-account forensic review: last events for an email, newest
    /// first. `limit` defaults to 50 when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn get_recent_by_email(
        &self,
        email: &str,
        limit: Option<i64>,
    ) -> Result<Vec<AuditEntry>> {
        let query = r"
            SELECT id, created_at, user_id, email, event_type,
                   ip_address, user_agent, session_id, metadata, severity
            FROM audit_logs
            WHERE email = $1
            ORDER BY created_at DESC
            LIMIT $2
        ";
        let rows = sqlx::query(query)
            .bind(email)
            .bind(limit.unwrap_or(DEFAULT_EMAIL_LIMIT))
            .fetch_all(self.store.pool())
            .instrument(db_span("SELECT", query))
            .await?;

        rows.iter()
            .map(|row| AuditEntry::from_row(row).map_err(Into::into))
            .collect()
    }

    /// The primary alerting/monitoring feed: critical events only,
    /// newest first. `limit` defaults to 100 when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn get_critical_events(&self, limit: Option<i64>) -> Result<Vec<AuditEntry>> {
        let query = r"
            SELECT id, created_at, user_id, email, event_type,
                   ip_address, user_agent, session_id, metadata, severity
            FROM audit_logs
            WHERE severity = 'critical'
            ORDER BY created_at DESC
            LIMIT $1
        ";
        let rows = sqlx::query(query)
            .bind(limit.unwrap_or(DEFAULT_FEED_LIMIT))
            .fetch_all(self.store.pool())
            .instrument(db_span("SELECT", query))
            .await?;

        rows.iter()
            .map(|row| AuditEntry::from_row(row).map_err(Into::into))
            .collect()
    }

    /// All events of one type, newest first. `limit` defaults to 100
    /// when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn get_events_by_type(
        &self,
        event_type: EventType,
        limit: Option<i64>,
    ) -> Result<Vec<AuditEntry>> {
        let query = r"
            SELECT id, created_at, user_id, email, event_type,
                   ip_address, user_agent, session_id, metadata, severity
            FROM audit_logs
            WHERE event_type = $1
            ORDER BY created_at DESC
            LIMIT $2
        ";
        let rows = sqlx::query(query)
            .bind(event_type.as_str())
            .bind(limit.unwrap_or(DEFAULT_FEED_LIMIT))
            .fetch_all(self.store.pool())
            .instrument(db_span("SELECT", query))
            .await?;

        rows.iter()
            .map(|row| AuditEntry::from_row(row).map_err(Into::into))
            .collect()
    }
}
