//! Policy configuration for the orchestrator and retention jobs.

use chrono::Duration;

const DEFAULT_MAX_FAILED_ATTEMPTS: i32 = 5;
const DEFAULT_BLOCK_SECONDS: i64 = 15 * 60;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 12 * 60 * 60;
const DEFAULT_MAX_SESSIONS_PER_USER: i64 = 10;
const DEFAULT_RATE_LIMIT_RETENTION_DAYS: i64 = 30;

/// Thresholds and durations the mechanism components do not decide for
/// themselves: when to block, for how long, session lifetime, the
/// concurrent-session cap, and rate-limit retention.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    max_failed_attempts: i32,
    block_seconds: i64,
    session_ttl_seconds: i64,
    max_sessions_per_user: i64,
    rate_limit_retention_days: i64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            block_seconds: DEFAULT_BLOCK_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            max_sessions_per_user: DEFAULT_MAX_SESSIONS_PER_USER,
            rate_limit_retention_days: DEFAULT_RATE_LIMIT_RETENTION_DAYS,
        }
    }
}

impl CoreConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_failed_attempts(mut self, attempts: i32) -> Self {
        self.max_failed_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_block_seconds(mut self, seconds: i64) -> Self {
        self.block_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_max_sessions_per_user(mut self, sessions: i64) -> Self {
        self.max_sessions_per_user = sessions;
        self
    }

    #[must_use]
    pub fn with_rate_limit_retention_days(mut self, days: i64) -> Self {
        self.rate_limit_retention_days = days;
        self
    }

    #[must_use]
    pub fn max_failed_attempts(&self) -> i32 {
        self.max_failed_attempts
    }

    #[must_use]
    pub fn block_duration(&self) -> Duration {
        Duration::seconds(self.block_seconds)
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_seconds)
    }

    #[must_use]
    pub fn max_sessions_per_user(&self) -> i64 {
        self.max_sessions_per_user
    }

    #[must_use]
    pub fn rate_limit_retention_days(&self) -> i64 {
        self.rate_limit_retention_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CoreConfig::new();

        assert_eq!(config.max_failed_attempts(), DEFAULT_MAX_FAILED_ATTEMPTS);
        assert_eq!(config.block_duration(), Duration::minutes(15));
        assert_eq!(config.session_ttl(), Duration::hours(12));
        assert_eq!(
            config.max_sessions_per_user(),
            DEFAULT_MAX_SESSIONS_PER_USER
        );
        assert_eq!(
            config.rate_limit_retention_days(),
            DEFAULT_RATE_LIMIT_RETENTION_DAYS
        );
    }

    #[test]
    fn overrides() {
        let config = CoreConfig::new()
            .with_max_failed_attempts(3)
            .with_block_seconds(60)
            .with_session_ttl_seconds(3600)
            .with_max_sessions_per_user(2)
            .with_rate_limit_retention_days(7);

        assert_eq!(config.max_failed_attempts(), 3);
        assert_eq!(config.block_duration(), Duration::minutes(1));
        assert_eq!(config.session_ttl(), Duration::hours(1));
        assert_eq!(config.max_sessions_per_user(), 2);
        assert_eq!(config.rate_limit_retention_days(), 7);
    }
}
