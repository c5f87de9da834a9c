//! pathparity CLI - configuration, logging and subcommands
//!
//! The binary is a thin shell over this library:
//! - [`Settings`]: defaults, TOML file, `PATHPARITY_*` environment, flags
//! - [`App`]: adapters, result store and cancellation for one invocation
//! - [`cli::command`] / [`cli::execute`]: the clap command tree and dispatch

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use commands::{corpus_listing, resolve_listing, App, CleanupSummary, ReportOutput};
pub use config::{BackendConfig, ConfigError, Settings};
pub use logging::LogFormat;
