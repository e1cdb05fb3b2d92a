//! Event types, severities, and typed row shapes for `audit_logs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Closed enumeration of security events. Adding a variant forces an
/// explicit severity decision in [`EventType::default_severity`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    LoginSuccess,
    LoginFailed,
    LoginBlockedRateLimit,
    LoginBlockedAccountLocked,
    Logout,
    SessionCreated,
    SessionExpired,
    SuspiciousActivity,
    PasswordChanged,
}

impl EventType {
    /// Severity used when the caller does not supply one. Total over the
    /// enum; alerting keys off this mapping, so it must not drift.
    #[must_use]
    pub fn default_severity(self) -> Severity {
        match self {
            Self::LoginBlockedRateLimit | Self::SuspiciousActivity => Severity::Critical,
            Self::LoginFailed | Self::LoginBlockedAccountLocked => Severity::Warning,
            Self::LoginSuccess
            | Self::Logout
            | Self::SessionCreated
            | Self::SessionExpired
            | Self::PasswordChanged => Severity::Info,
        }
    }

    /// Stable wire/storage name (the `event_type` column value).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoginSuccess => "login_success",
            Self::LoginFailed => "login_failed",
            Self::LoginBlockedRateLimit => "login_blocked_rate_limit",
            Self::LoginBlockedAccountLocked => "login_blocked_account_locked",
            Self::Logout => "logout",
            Self::SessionCreated => "session_created",
            Self::SessionExpired => "session_expired",
            Self::SuspiciousActivity => "suspicious_activity",
            Self::PasswordChanged => "password_changed",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown event type: {0}")]
pub struct ParseEventTypeError(String);

impl FromStr for EventType {
    type Err = ParseEventTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "login_success" => Ok(Self::LoginSuccess),
            "login_failed" => Ok(Self::LoginFailed),
            "login_blocked_rate_limit" => Ok(Self::LoginBlockedRateLimit),
            "login_blocked_account_locked" => Ok(Self::LoginBlockedAccountLocked),
            "logout" => Ok(Self::Logout),
            "session_created" => Ok(Self::SessionCreated),
            "session_expired" => Ok(Self::SessionExpired),
            "suspicious_activity" => Ok(Self::SuspiciousActivity),
            "password_changed" => Ok(Self::PasswordChanged),
            other => Err(ParseEventTypeError(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown severity: {0}")]
pub struct ParseSeverityError(String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "critical" => Ok(Self::Critical),
            other => Err(ParseSeverityError(other.to_string())),
        }
    }
}

/// One appended event. Rows are created once and never mutated.
#[derive(Clone, Debug, Serialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Absent when no user resolved (e.g. failed login on unknown email).
    pub user_id: Option<Uuid>,
    /// Preserved even when no user matches, for forensic traceability.
    pub email: Option<String>,
    pub event_type: EventType,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<Uuid>,
    /// Free-form context specific to the event.
    pub metadata: Option<Value>,
    pub severity: Severity,
}

impl AuditEntry {
    pub(crate) fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let event_type: String = row.try_get("event_type")?;
        let event_type = event_type
            .parse::<EventType>()
            .map_err(|err| sqlx::Error::ColumnDecode {
                index: "event_type".to_string(),
                source: Box::new(err),
            })?;
        let severity: String = row.try_get("severity")?;
        let severity = severity
            .parse::<Severity>()
            .map_err(|err| sqlx::Error::ColumnDecode {
                index: "severity".to_string(),
                source: Box::new(err),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            user_id: row.try_get("user_id")?,
            email: row.try_get("email")?,
            event_type,
            ip_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
            session_id: row.try_get("session_id")?,
            metadata: row.try_get("metadata")?,
            severity,
        })
    }
}

/// Event to append. `severity` defaults from the event type when `None`.
#[derive(Clone, Debug)]
pub struct NewAuditEvent {
    pub event_type: EventType,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<Uuid>,
    pub metadata: Option<Value>,
    pub severity: Option<Severity>,
}

impl NewAuditEvent {
    #[must_use]
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            user_id: None,
            email: None,
            ip_address: None,
            user_agent: None,
            session_id: None,
            metadata: None,
            severity: None,
        }
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Attach the request's optional IP and user agent in one step.
    #[must_use]
    pub fn with_request_context(
        mut self,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_EVENTS: [EventType; 9] = [
        EventType::LoginSuccess,
        EventType::LoginFailed,
        EventType::LoginBlockedRateLimit,
        EventType::LoginBlockedAccountLocked,
        EventType::Logout,
        EventType::SessionCreated,
        EventType::SessionExpired,
        EventType::SuspiciousActivity,
        EventType::PasswordChanged,
    ];

    #[test]
    fn severity_mapping_is_fixed() {
        assert_eq!(
            EventType::LoginBlockedRateLimit.default_severity(),
            Severity::Critical
        );
        assert_eq!(
            EventType::SuspiciousActivity.default_severity(),
            Severity::Critical
        );
        assert_eq!(EventType::LoginFailed.default_severity(), Severity::Warning);
        assert_eq!(
            EventType::LoginBlockedAccountLocked.default_severity(),
            Severity::Warning
        );
        assert_eq!(EventType::LoginSuccess.default_severity(), Severity::Info);
        assert_eq!(EventType::Logout.default_severity(), Severity::Info);
        assert_eq!(EventType::SessionCreated.default_severity(), Severity::Info);
        assert_eq!(EventType::SessionExpired.default_severity(), Severity::Info);
        assert_eq!(
            EventType::PasswordChanged.default_severity(),
            Severity::Info
        );
    }

    #[test]
    fn event_type_round_trips_through_storage_name() {
        for event in ALL_EVENTS {
            assert_eq!(event.as_str().parse::<EventType>(), Ok(event));
        }
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        assert!("login_sucess".parse::<EventType>().is_err());
        assert!("".parse::<EventType>().is_err());
    }

    #[test]
    fn severity_round_trips() {
        for severity in [Severity::Info, Severity::Warning, Severity::Critical] {
            assert_eq!(severity.as_str().parse::<Severity>(), Ok(severity));
        }
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn severity_orders_by_urgency() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn builder_fills_context() {
        let event = NewAuditEvent::new(EventType::LoginFailed)
            .with_email("user@example.com")
            .with_ip_address("203.0.113.9")
            .with_metadata(serde_json::json!({ "attempts": 2 }));

        assert_eq!(event.event_type, EventType::LoginFailed);
        assert_eq!(event.email.as_deref(), Some("user@example.com"));
        assert_eq!(event.ip_address.as_deref(), Some("203.0.113.9"));
        assert!(event.severity.is_none());
    }
}
