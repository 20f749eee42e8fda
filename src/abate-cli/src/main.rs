//! Abatedouro console CLI - main entry point.

use clap::Parser;

use abate_cli::AppContext;
use abate_cli::cli::{Cli, ColorMode, LogLevel, dispatch_command};
use abate_cli::styled_output::print_error;
use abate_export::ExportError;

/// Environment variable selecting the log level.
const LOG_LEVEL_ENV: &str = "ABATE_LOG_LEVEL";

fn init_logging(cli: &Cli) {
    let log_level = if cli.trace {
        LogLevel::Trace
    } else if cli.verbose {
        LogLevel::Debug
    } else if let Ok(env_level) = std::env::var(LOG_LEVEL_ENV) {
        LogLevel::from_str_loose(&env_level).unwrap_or(cli.log_level)
    } else {
        cli.log_level
    };

    let filter_str = if std::env::var("RUST_LOG").is_ok() {
        let level = log_level.as_filter_str();
        format!(
            "error,abate_cli={level},abate_session={level},abate_export={level},abate_common={level}"
        )
    } else {
        log_level.as_filter_str().to_string()
    };

    tracing_subscriber::fmt()
        .with_env_filter(&filter_str)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // SAFETY: Environment variable mutations happen early before threads spawn
    match cli.color {
        ColorMode::Never => unsafe { std::env::set_var("NO_COLOR", "1") },
        ColorMode::Always => unsafe { std::env::remove_var("NO_COLOR") },
        ColorMode::Auto => {}
    }

    init_logging(&cli);

    let result = match AppContext::load() {
        Ok(ctx) => dispatch_command(cli.command, &ctx).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        // export failures were already shown by the notifier
        if e.downcast_ref::<ExportError>().is_none() {
            print_error(&format!("{e:#}"));
        }
        std::process::exit(1);
    }
}
