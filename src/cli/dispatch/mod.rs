use crate::cli::actions::{cleanup, Action};
use anyhow::{Context, Result};

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;
    let retention_days = matches
        .get_one::<i64>("retention-days")
        .copied()
        .unwrap_or(30);

    match matches.subcommand_name() {
        Some("cleanup") | None => Ok(Action::Cleanup(cleanup::Args {
            dsn,
            retention_days,
        })),
        Some(other) => Err(anyhow::anyhow!("unknown subcommand: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn handler_builds_cleanup_action() {
        let matches = commands::new().get_matches_from(vec![
            "pordisto",
            "--dsn",
            "postgres://localhost/pordisto",
            "cleanup",
        ]);
        let action = handler(&matches).expect("action");

        let Action::Cleanup(args) = action;
        assert_eq!(args.dsn, "postgres://localhost/pordisto");
        assert_eq!(args.retention_days, 30);
    }
}
