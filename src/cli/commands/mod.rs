pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("pordisto")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("PORDISTO_DSN")
                .required(true),
        )
        .arg(
            Arg::new("retention-days")
                .long("retention-days")
                .help("Rate-limit record retention window in days")
                .default_value("30")
                .env("PORDISTO_RETENTION_DAYS")
                .value_parser(clap::value_parser!(i64)),
        )
        .subcommand_required(true)
        .subcommand(Command::new("cleanup").about(
            "Run the retention jobs: purge stale rate-limit records and \
             expired or revoked sessions",
        ));

    logging::with_args(command)
}
