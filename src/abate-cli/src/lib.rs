//! `abate`: the Abatedouro console on the command line.
//!
//! - `cli/` - argument parsing and dispatch
//! - `context` - the application context built at start-up
//! - `dataset` - JSON datasets for export
//! - `styled_output` - stderr messages and the export notifier

pub mod cli;
pub mod context;
pub mod dataset;
pub mod styled_output;

pub use context::AppContext;
