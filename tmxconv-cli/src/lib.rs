//! CLI library for testing purposes

pub mod batch;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod path_glob;
pub mod report;

pub use batch::{BatchSummary, Conversion, FileReport, Outcome};
pub use cli::{Cli, Command};
pub use config::Config;
