//! Command-line interface for Juice Trace.
//!
//! # Key Abstractions
//!
//! - [`CliArgs`]: parsed command line
//! - [`TraceConfig`]: layered file and environment configuration
//! - [`JuiceTraceCli`]: command dispatch, logging and store wiring

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod trace_handlers;

pub use app::JuiceTraceCli;
pub use cli::{CliArgs, Command, ConfigAction, ConfigCommand};
pub use config::{DatabaseConfig, ServerConfig, TraceConfig};
