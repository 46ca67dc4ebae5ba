//! Domain types shared by the engine and its collaborators.
//!
//! [`Product`], [`ProductionBatch`] and [`IngredientInput`] mirror rows the
//! persistence layer owns; the engine only ever reads them. [`ParsedCode`],
//! [`BatchKey`] and [`ProvenanceRecord`] live for a single trace request.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TraceError;

// ============================================================================
// Persisted entities
// ============================================================================

/// A product (SKU), identified by its unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Numeric identifier assigned by the store.
    pub id: i64,

    /// Unique product name, matched exactly and case-sensitively.
    pub name: String,

    /// Package size label, e.g. "52 oz".
    pub package_size: Option<String>,

    /// Whole days between production and the printed expiration date.
    pub shelf_life_days: u32,
}

/// One tank run on a production line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionBatch {
    /// Numeric identifier assigned by the store.
    pub id: i64,

    /// The product this batch produced.
    pub product_id: i64,

    /// Calendar date of the run.
    pub production_date: NaiveDate,

    /// Production line number.
    pub line: u32,

    /// Tank number on that line.
    pub tank: u32,
}

/// One ingredient contributed to a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientInput {
    /// Ingredient name, e.g. "Valencia oranges".
    pub ingredient: String,

    /// Supplier that shipped the ingredient.
    pub supplier_name: String,

    /// Supplier's lot identifier.
    pub supplier_lot: String,

    /// Where the ingredient came from, e.g. a grove.
    pub source_location: Option<String>,
}

// ============================================================================
// Per-request values
// ============================================================================

/// The structural components of a package code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedCode {
    /// Production line number.
    pub line: u32,

    /// Tank number.
    pub tank: u32,

    /// Printed expiration date.
    pub expiration_date: NaiveDate,
}

/// The exact key handed to a [`ProvenanceSource`](crate::ProvenanceSource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchKey {
    /// Identifier of the resolved product.
    pub product_id: i64,

    /// Name of the resolved product.
    pub product_name: String,

    /// Production date derived from the expiration date.
    pub production_date: NaiveDate,

    /// Production line number.
    pub line: u32,

    /// Tank number.
    pub tank: u32,
}

impl BatchKey {
    /// Whether a record belongs to the batch this key identifies.
    pub fn matches(&self, record: &ProvenanceRecord) -> bool {
        record.product_name == self.product_name
            && record.production_date == self.production_date
            && record.line == self.line
            && record.tank == self.tank
    }
}

/// One ingredient-supplier-location tuple of a traced batch.
///
/// Serializes to the public response shape:
/// `{product, production_date, line, tank_number, ingredient,
/// supplier_name, supplier_lot, grove_location}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// Product name.
    #[serde(rename = "product")]
    pub product_name: String,

    /// Production date, serialized as `YYYY-MM-DD`.
    pub production_date: NaiveDate,

    /// Production line number.
    pub line: u32,

    /// Tank number.
    #[serde(rename = "tank_number")]
    pub tank: u32,

    /// Ingredient name.
    pub ingredient: String,

    /// Supplier name.
    pub supplier_name: String,

    /// Supplier lot identifier.
    pub supplier_lot: String,

    /// Source location label.
    #[serde(rename = "grove_location")]
    pub source_location: Option<String>,
}

impl ProvenanceRecord {
    /// Build a record for `key` from one ingredient input.
    pub fn from_input(key: &BatchKey, input: &IngredientInput) -> Self {
        Self {
            product_name: key.product_name.clone(),
            production_date: key.production_date,
            line: key.line,
            tank: key.tank,
            ingredient: input.ingredient.clone(),
            supplier_name: input.supplier_name.clone(),
            supplier_lot: input.supplier_lot.clone(),
            source_location: input.source_location.clone(),
        }
    }
}

// ============================================================================
// TraceRequest
// ============================================================================

/// A validated trace request.
///
/// Built at the transport boundary so the engine only sees non-blank
/// strings. The product name is kept verbatim because catalog lookups are
/// exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRequest {
    product: String,
    code: String,
}

impl TraceRequest {
    /// Validate and build a request.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::InvalidInput`] when either value is empty or
    /// only whitespace.
    pub fn new(product: impl Into<String>, code: impl Into<String>) -> Result<Self, TraceError> {
        let product = product.into();
        let code = code.into();

        if product.trim().is_empty() {
            return Err(TraceError::invalid_input("Missing product"));
        }
        if code.trim().is_empty() {
            return Err(TraceError::invalid_input("Missing code"));
        }

        Ok(Self { product, code })
    }

    /// Product name, exactly as supplied.
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Raw package code.
    pub fn code(&self) -> &str {
        &self.code
    }
}
