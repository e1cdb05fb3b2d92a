//! Authentication orchestrator: composes rate limiting, the session
//! registry, and the audit log around a caller-supplied credential
//! verification step.
//!
//! Control flow for a login: consult the rate limiter first; if permitted,
//! verify credentials; on success reset the failure history and create a
//! session; on failure increment the counter and, past the configured
//! threshold, set the blocked-until deadline. Every branch writes an audit
//! record; a blocked attempt never touches credentials.

mod tokens;

pub use tokens::generate_session_token;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditLog, EventType, NewAuditEvent};
use crate::config::CoreConfig;
use crate::error::{Error, Result};
use crate::ratelimit::RateLimitTracker;
use crate::session::{NewSession, Session, SessionRegistry};
use crate::store::Store;

/// How often a colliding session token is regenerated before giving up.
const TOKEN_RETRIES: usize = 3;

/// Credential verification, supplied by the surrounding application.
/// Returns the user id on success, `None` on a wrong email/password pair.
pub trait VerifyCredentials: Send + Sync {
    fn verify(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = anyhow::Result<Option<Uuid>>> + Send;
}

/// One login attempt as received from the request handler.
#[derive(Clone, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Outcome of a login attempt. `Blocked` and `InvalidCredentials` are
/// expected outcomes, not errors; how they surface to the user is the
/// caller's concern.
#[derive(Clone, Debug)]
pub enum LoginOutcome {
    Success(Session),
    /// Wrong credentials; carries the post-increment failure count so the
    /// caller can warn about an approaching block.
    InvalidCredentials { attempts: i32 },
    Blocked { until: DateTime<Utc> },
}

/// Counts reported by the periodic retention jobs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub rate_limits_removed: u64,
    pub sessions_removed: u64,
}

pub struct Authenticator<V> {
    rate_limits: RateLimitTracker,
    sessions: SessionRegistry,
    audit: AuditLog,
    verifier: V,
    config: CoreConfig,
}

impl<V: VerifyCredentials> Authenticator<V> {
    #[must_use]
    pub fn new(store: Store, verifier: V, config: CoreConfig) -> Self {
        Self {
            rate_limits: RateLimitTracker::new(store.clone()),
            sessions: SessionRegistry::new(store.clone()),
            audit: AuditLog::new(store),
            verifier,
            config,
        }
    }

    #[must_use]
    pub fn rate_limits(&self) -> &RateLimitTracker {
        &self.rate_limits
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    #[must_use]
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Run one login attempt end to end.
    ///
    /// # Errors
    ///
    /// Store and verifier failures propagate (fail closed); a blocked
    /// attempt or wrong credentials are `Ok` outcomes.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome> {
        let email = normalize_email(&request.email);
        let now = Utc::now();

        // Blocked identifiers are denied before credentials are touched.
        if let Some(record) = self.rate_limits.get_by_identifier(&email).await? {
            if record.is_blocked_at(now) {
                let until = record.blocked_until.unwrap_or(now);
                warn!(identifier = %email, %until, "login denied: identifier blocked");
                self.audit
                    .create(
                        NewAuditEvent::new(EventType::LoginBlockedRateLimit)
                            .with_email(email.clone())
                            .with_metadata(json!({
                                "attempts": record.attempts,
                                "blocked_until": until,
                            }))
                            .with_request_context(
                                request.ip_address.clone(),
                                request.user_agent.clone(),
                            ),
                    )
                    .await?;
                return Ok(LoginOutcome::Blocked { until });
            }
        }

        let user_id = self
            .verifier
            .verify(&email, &request.password)
            .await
            .map_err(Error::Verify)?;

        let Some(user_id) = user_id else {
            return self.handle_failure(&email, &request).await;
        };

        self.handle_success(user_id, &email, &request).await
    }

    async fn handle_failure(&self, email: &str, request: &LoginRequest) -> Result<LoginOutcome> {
        // The atomic increment returns the post-increment count, so the
        // threshold comparison does not race a separate read.
        let record = self.rate_limits.increment_attempts(email).await?;

        let crossed = record.attempts >= self.config.max_failed_attempts();
        if crossed {
            let until = Utc::now() + self.config.block_duration();
            self.rate_limits.set_blocked(email, until).await?;
            warn!(identifier = %email, attempts = record.attempts, %until, "identifier blocked");
        }

        self.audit
            .create(
                NewAuditEvent::new(EventType::LoginFailed)
                    .with_email(email.to_string())
                    .with_metadata(json!({
                        "attempts": record.attempts,
                        "blocked": crossed,
                    }))
                    .with_request_context(
                        request.ip_address.clone(),
                        request.user_agent.clone(),
                    ),
            )
            .await?;

        Ok(LoginOutcome::InvalidCredentials {
            attempts: record.attempts,
        })
    }

    async fn handle_success(
        &self,
        user_id: Uuid,
        email: &str,
        request: &LoginRequest,
    ) -> Result<LoginOutcome> {
        self.rate_limits.reset(email).await?;
        self.enforce_session_cap(user_id).await?;

        let session = self.create_session(user_id, request).await?;

        self.audit
            .create(
                NewAuditEvent::new(EventType::LoginSuccess)
                    .with_user_id(user_id)
                    .with_email(email.to_string())
                    .with_session_id(session.id)
                    .with_request_context(
                        request.ip_address.clone(),
                        request.user_agent.clone(),
                    ),
            )
            .await?;
        self.audit
            .create(
                NewAuditEvent::new(EventType::SessionCreated)
                    .with_user_id(user_id)
                    .with_email(email.to_string())
                    .with_session_id(session.id)
                    .with_metadata(json!({
                        "device_type": session.device_type,
                        "browser": session.browser,
                        "os": session.os,
                    }))
                    .with_request_context(
                        request.ip_address.clone(),
                        request.user_agent.clone(),
                    ),
            )
            .await?;

        info!(%user_id, session_id = %session.id, "login succeeded");
        Ok(LoginOutcome::Success(session))
    }

    /// At the concurrent-session cap, the least-recently-active session
    /// makes room for the new one.
    async fn enforce_session_cap(&self, user_id: Uuid) -> Result<()> {
        let count = self.sessions.get_count(user_id).await?;
        if count < self.config.max_sessions_per_user() {
            return Ok(());
        }

        let active = self.sessions.get_active_sessions(user_id).await?;
        if let Some(oldest) = active.last() {
            warn!(%user_id, session_id = %oldest.id, "session cap reached, revoking oldest");
            self.sessions.revoke(oldest.id).await?;
        }
        Ok(())
    }

    /// Generate a token and insert the session, regenerating on the rare
    /// collision instead of treating it as a generic store error.
    async fn create_session(&self, user_id: Uuid, request: &LoginRequest) -> Result<Session> {
        let expires_at = Utc::now() + self.config.session_ttl();

        for _ in 0..TOKEN_RETRIES {
            let token = generate_session_token().map_err(Error::TokenGeneration)?;
            let result = self
                .sessions
                .create(NewSession {
                    user_id,
                    session_token: token,
                    expires_at,
                    ip_address: request.ip_address.clone(),
                    user_agent: request.user_agent.clone(),
                })
                .await;

            match result {
                Ok(session) => return Ok(session),
                Err(Error::DuplicateSessionToken) => {}
                Err(err) => return Err(err),
            }
        }

        Err(Error::DuplicateSessionToken)
    }

    /// Resolve a presented token into a live session, refreshing its
    /// activity timestamp. Returns `None` for unknown, revoked, or
    /// expired tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn authenticate(&self, session_token: &str) -> Result<Option<Session>> {
        let Some(session) = self.sessions.get_by_token(session_token).await? else {
            return Ok(None);
        };
        if !session.is_active_at(Utc::now()) {
            return Ok(None);
        }
        self.sessions.update_last_active(session_token).await?;
        Ok(Some(session))
    }

    /// Revoke the session behind a token. Idempotent: an unknown or
    /// already-revoked token is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn logout(&self, session_token: &str) -> Result<()> {
        let Some(session) = self.sessions.get_by_token(session_token).await? else {
            return Ok(());
        };

        self.sessions.revoke(session.id).await?;
        self.audit
            .create(
                NewAuditEvent::new(EventType::Logout)
                    .with_user_id(session.user_id)
                    .with_session_id(session.id),
            )
            .await?;
        Ok(())
    }

    /// Log out every other device, keeping the named session. Returns
    /// the number of sessions revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn logout_other_devices(&self, user_id: Uuid, keep: Uuid) -> Result<u64> {
        let revoked = self.sessions.revoke_all_for_user(user_id, Some(keep)).await?;
        if revoked > 0 {
            self.audit
                .create(
                    NewAuditEvent::new(EventType::Logout)
                        .with_user_id(user_id)
                        .with_metadata(json!({ "revoked": revoked, "kept": keep })),
                )
                .await?;
        }
        Ok(revoked)
    }

    /// Both retention jobs, for an external scheduler to trigger
    /// periodically. Not a per-request path.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn run_cleanup(&self) -> Result<CleanupReport> {
        let rate_limits_removed = self
            .rate_limits
            .cleanup_expired(self.config.rate_limit_retention_days())
            .await?;
        let sessions_removed = self.sessions.cleanup().await?;

        info!(rate_limits_removed, sessions_removed, "retention cleanup finished");
        Ok(CleanupReport {
            rate_limits_removed,
            sessions_removed,
        })
    }
}

/// Normalize an email for rate limiting and audit correlation.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    regex::Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .is_ok_and(|regex| regex.is_match(email_normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn cleanup_report_defaults_to_zero() {
        assert_eq!(CleanupReport::default().rate_limits_removed, 0);
        assert_eq!(CleanupReport::default().sessions_removed, 0);
    }

    #[test]
    fn outcome_variants_carry_context() {
        let outcome = LoginOutcome::InvalidCredentials { attempts: 4 };
        assert!(matches!(
            outcome,
            LoginOutcome::InvalidCredentials { attempts: 4 }
        ));

        let until = Utc::now();
        let outcome = LoginOutcome::Blocked { until };
        assert!(matches!(outcome, LoginOutcome::Blocked { until: u } if u == until));
    }
}
