//! Juice Trace core: package code to ingredient provenance.
//!
//! This crate holds everything with real decision logic. It has no
//! persistence or transport dependencies; those plug in through
//! [`ProductCatalog`] and [`ProvenanceSource`].
//!
//! # Modules
//!
//! - [`code`]: package code parser
//! - [`shelf_life`]: expiration date to production date
//! - [`provenance`]: batch provenance lookup
//! - [`engine`]: the trace resolution engine
//! - [`model`]: domain types
//! - [`error`]: error taxonomy and Result aliases
//! - [`traits`]: collaborator traits
//! - [`memory`]: in-memory store for tests

#![doc = include_str!("../README.md")]

pub mod code;
pub mod engine;
pub mod error;
pub mod memory;
pub mod model;
pub mod provenance;
pub mod shelf_life;
pub mod traits;

// Re-export key types at crate root for convenience
pub use code::ParseError;
pub use engine::TraceEngine;
pub use error::{Error, Result, StoreError, StoreResult, TraceError};
pub use memory::InMemoryStore;
pub use model::{
    BatchKey, IngredientInput, ParsedCode, Product, ProductionBatch, ProvenanceRecord,
    TraceRequest,
};
pub use shelf_life::{Resolution, ResolveError};
pub use traits::{ProductCatalog, ProvenanceSource};
