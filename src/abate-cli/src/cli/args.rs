//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use abate_export::ColumnSpec;

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Color output mode for CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorMode {
    /// Automatically detect if output is a terminal
    #[default]
    Auto,
    /// Always output with colors
    Always,
    /// Never output with colors
    Never,
}

/// Abatedouro console: session and report export from the terminal.
#[derive(Parser, Debug)]
#[command(name = "abate", author, version)]
#[command(about = "Abatedouro console", long_about = None)]
pub struct Cli {
    /// Enable verbose output (same as --log-level debug)
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Enable trace-level logging for debugging
    #[arg(long = "trace", global = true)]
    pub trace: bool,

    /// Log level when neither --verbose nor --trace is given
    #[arg(long = "log-level", global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Control color output: auto (default), always, or never
    #[arg(long = "color", global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show who is logged in
    Whoami,

    /// Log in to the backend
    Login(LoginArgs),

    /// Create an account (does not log in)
    Register(RegisterArgs),

    /// End the current session
    Logout,

    /// Navigate to a console path and report where the guard lands
    Navigate(NavigateArgs),

    /// List the console routes
    Routes,

    /// Export a JSON dataset as CSV or as a printable document
    #[command(subcommand)]
    Export(ExportCommand),

    /// Show the effective configuration
    Config,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    pub username: String,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    pub username: String,

    /// Full name
    #[arg(long = "nome")]
    pub nome_completo: String,

    #[arg(long)]
    pub email: String,

    /// Read password and confirmation (one per line) from stdin
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Args, Debug)]
pub struct NavigateArgs {
    /// Console path, e.g. /home/lotes
    pub path: String,
}

#[derive(Subcommand, Debug)]
pub enum ExportCommand {
    /// Save the dataset as `<name>-<date>.csv`
    Csv(ExportArgs),

    /// Render the dataset as a printable `<name>-<date>.html`
    Document(ExportArgs),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// JSON file holding an array of records
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Column as `key`, `key:Label` or `key:Label:formatter`
    /// (formatters: currency, number, number=N, weight, date, datetime)
    #[arg(long = "column", short = 'c', required = true)]
    pub columns: Vec<ColumnSpec>,

    /// Filename stem
    #[arg(long)]
    pub name: Option<String>,

    /// Document title
    #[arg(long)]
    pub title: Option<String>,

    /// Document subtitle
    #[arg(long)]
    pub subtitle: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str_loose("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str_loose("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_str_loose("loud"), None);
        assert_eq!(LogLevel::Debug.as_filter_str(), "debug");
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from([
            "abate",
            "export",
            "csv",
            "-i",
            "produtos.json",
            "-c",
            "nome:Nome",
            "-c",
            "preco_kg:Preço:currency",
            "--name",
            "produtos",
        ])
        .unwrap();
        let Commands::Export(ExportCommand::Csv(args)) = cli.command else {
            panic!("expected export csv");
        };
        assert_eq!(args.columns.len(), 2);
        assert_eq!(args.columns[1].label, "Preço");
        assert_eq!(args.name.as_deref(), Some("produtos"));
    }

    #[test]
    fn test_export_requires_columns() {
        assert!(Cli::try_parse_from(["abate", "export", "csv", "-i", "x.json"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["abate", "navigate", "/home", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Navigate(ref a) if a.path == "/home"));
    }
}
