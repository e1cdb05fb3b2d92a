use anyhow::{Context, Result};
use tracing::info;

use crate::ratelimit::RateLimitTracker;
use crate::session::SessionRegistry;
use crate::store::Store;

#[derive(Debug)]
pub struct Args {
    pub dsn: String,
    pub retention_days: i64,
}

/// Execute the retention jobs once and exit. Meant to be triggered by an
/// external scheduler (cron or equivalent), not to run per-request.
/// # Errors
/// Returns an error if the database is unreachable or a job fails.
pub async fn execute(args: Args) -> Result<()> {
    let store = Store::connect(&args.dsn)
        .await
        .context("Failed to connect to database")?;

    let rate_limits = RateLimitTracker::new(store.clone());
    let sessions = SessionRegistry::new(store.clone());

    let rate_limits_removed = rate_limits
        .cleanup_expired(args.retention_days)
        .await
        .context("rate limit cleanup failed")?;
    let sessions_removed = sessions.cleanup().await.context("session cleanup failed")?;

    info!(
        rate_limits_removed,
        sessions_removed, "retention cleanup finished"
    );

    store.close().await;
    Ok(())
}
