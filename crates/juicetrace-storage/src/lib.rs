//! Persistence for Juice Trace.
//!
//! [`SqliteStore`] implements both collaborator traits from
//! `juicetrace-core` over a shared `sqlx` pool. [`RetryWrapper`] adds
//! backoff on transient failures around any store.

#![doc = include_str!("../README.md")]

pub mod error;
pub mod retry;
pub mod sqlite;

pub use error::store_error;
pub use retry::RetryWrapper;
pub use sqlite::{SqliteStore, StoreOptions};
