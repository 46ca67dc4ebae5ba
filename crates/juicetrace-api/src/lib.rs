//! HTTP surface for Juice Trace.
//!
//! [`router`] builds the `axum` application around a shared
//! [`TraceEngine`](juicetrace_core::TraceEngine); [`serve`] binds and runs it
//! until a shutdown signal fires.

#![doc = include_str!("../README.md")]

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{TraceParams, router};
pub use server::{serve, serve_listener};
