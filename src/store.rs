//! Persistent store adapter: the sole I/O boundary for the core.

use crate::error::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::Span;

/// Handle to the relational store. Explicitly constructed from a DSN and
/// explicitly closed at shutdown; the pool is the single source of truth
/// across serving instances, so no caching layer sits in front of it.
#[derive(Clone, Debug)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Connect to the database. The DSN comes from the host application;
    /// a missing DSN is a startup error there, not here.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be established.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by the integration suite).
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the pool, draining in-flight connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Span attached to every statement the core executes.
pub(crate) fn db_span(operation: &str, statement: &str) -> Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_span_is_named() {
        let span = db_span("SELECT", "SELECT 1");
        assert_eq!(span.metadata().map(|meta| meta.name()), Some("db.query"));
    }
}
