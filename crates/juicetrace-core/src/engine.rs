//! The trace resolution engine.
//!
//! [`TraceEngine`] chains the three steps of a trace:
//!
//! 1. parse the package code ([`code::parse`](crate::code::parse))
//! 2. resolve the production date
//!    ([`shelf_life::resolve_production_date`](crate::shelf_life::resolve_production_date))
//! 3. fetch the batch's ingredient inputs
//!    ([`provenance::find_provenance`](crate::provenance::find_provenance))
//!
//! and stops at the first failure. It keeps no state between requests and
//! never retries; callers that want retries wrap the collaborators.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use juicetrace_core::{InMemoryStore, TraceEngine, TraceError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(InMemoryStore::new());
//! store.insert_product("Orange Juice", None, 10);
//! let engine = TraceEngine::from_store(store);
//!
//! let records = engine.trace("Orange Juice", "L1T5 2/26/26").await.unwrap();
//! assert!(records.is_empty());
//!
//! let err = engine.trace("Grape Juice", "L1T5 2/26/26").await.unwrap_err();
//! assert!(matches!(err, TraceError::ProductNotFound(_)));
//! # }
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::code;
use crate::error::{StoreResult, TraceError};
use crate::model::{BatchKey, ProvenanceRecord, TraceRequest};
use crate::provenance;
use crate::shelf_life;
use crate::traits::{ProductCatalog, ProvenanceSource};

/// Resolves package codes to provenance records.
///
/// Cloning is cheap (two `Arc` clones) and every clone shares the same
/// collaborators, so one engine built at startup can serve any number of
/// concurrent requests.
#[derive(Clone)]
pub struct TraceEngine {
    catalog: Arc<dyn ProductCatalog>,
    provenance: Arc<dyn ProvenanceSource>,
}

impl TraceEngine {
    /// Create an engine from separate collaborators.
    pub fn new(catalog: Arc<dyn ProductCatalog>, provenance: Arc<dyn ProvenanceSource>) -> Self {
        Self {
            catalog,
            provenance,
        }
    }

    /// Create an engine from one store that implements both traits.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ProductCatalog + ProvenanceSource + 'static,
    {
        Self {
            catalog: store.clone(),
            provenance: store,
        }
    }

    /// Trace a package code for `product_name`.
    ///
    /// Returns the batch's provenance records, possibly none.
    ///
    /// # Errors
    ///
    /// - [`TraceError::InvalidInput`] for a blank product or code, or an
    ///   unparseable code
    /// - [`TraceError::ProductNotFound`] when the product does not exist
    /// - [`TraceError::QueryFailed`] when a collaborator fails
    pub async fn trace(
        &self,
        product_name: &str,
        raw_code: &str,
    ) -> Result<Vec<ProvenanceRecord>, TraceError> {
        let request = TraceRequest::new(product_name, raw_code)?;
        self.trace_request(&request).await
    }

    /// Trace an already validated request.
    pub async fn trace_request(
        &self,
        request: &TraceRequest,
    ) -> Result<Vec<ProvenanceRecord>, TraceError> {
        let parsed = code::parse(request.code())?;
        debug!(
            product = request.product(),
            line = parsed.line,
            tank = parsed.tank,
            expiration = %parsed.expiration_date,
            "parsed package code"
        );

        let resolution = shelf_life::resolve_production_date(
            self.catalog.as_ref(),
            request.product(),
            parsed.expiration_date,
        )
        .await?;

        let key = BatchKey {
            product_id: resolution.product.id,
            product_name: resolution.product.name,
            production_date: resolution.production_date,
            line: parsed.line,
            tank: parsed.tank,
        };

        Ok(provenance::find_provenance(self.provenance.as_ref(), &key).await?)
    }

    /// All product names known to the catalog.
    pub async fn list_products(&self) -> Result<Vec<String>, TraceError> {
        Ok(self.catalog.list_product_names().await?)
    }

    /// Check that the catalog backend is reachable.
    pub async fn ping(&self) -> StoreResult<()> {
        self.catalog.ping().await
    }
}

impl std::fmt::Debug for TraceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceEngine").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::memory::InMemoryStore;
    use crate::model::IngredientInput;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(ingredient: &str, lot: &str, grove: &str) -> IngredientInput {
        IngredientInput {
            ingredient: ingredient.into(),
            supplier_name: "Sunrise Citrus".into(),
            supplier_lot: lot.into(),
            source_location: Some(grove.into()),
        }
    }

    fn orange_juice_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        let product = store.insert_product("Orange Juice", Some("52 oz"), 10);
        let batch = store.insert_batch(product, date(2026, 2, 16), 1, 5);
        store.insert_input(batch, input("Valencia oranges", "SC-2291", "Grove 7"));
        store.insert_input(batch, input("Hamlin oranges", "SC-2292", "Grove 3"));
        store
    }

    // ------------------------------------------------------------------------
    // Success paths
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_trace_orange_juice() {
        let store = orange_juice_store();
        let engine = TraceEngine::from_store(store.clone());

        let records = engine.trace("Orange Juice", "L1T5 2/26/26").await.unwrap();

        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.product_name, "Orange Juice");
            assert_eq!(record.production_date, date(2026, 2, 16));
            assert_eq!(record.line, 1);
            assert_eq!(record.tank, 5);
        }
        assert_eq!(records[0].supplier_lot, "SC-2291");
        assert_eq!(records[1].source_location.as_deref(), Some("Grove 3"));
        assert_eq!(store.product_lookups(), 1);
        assert_eq!(store.provenance_lookups(), 1);
    }

    #[tokio::test]
    async fn test_trace_known_product_no_batch_is_empty() {
        let engine = TraceEngine::from_store(orange_juice_store());
        let records = engine.trace("Orange Juice", "L1T6 2/26/26").await.unwrap();
        assert!(records.is_empty());
    }

    /// Records the key it was asked for.
    #[derive(Default)]
    struct KeyRecorder(Mutex<Option<BatchKey>>);

    #[async_trait]
    impl ProvenanceSource for KeyRecorder {
        async fn find_provenance(&self, key: &BatchKey) -> StoreResult<Vec<ProvenanceRecord>> {
            *self.0.lock().unwrap() = Some(key.clone());
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_trace_builds_expected_key() {
        let store = orange_juice_store();
        let recorder = Arc::new(KeyRecorder::default());
        let engine = TraceEngine::new(store, recorder.clone());

        engine.trace("Orange Juice", "L1T5 2/26/26").await.unwrap();

        let key = recorder.0.lock().unwrap().clone().unwrap();
        assert_eq!(
            key,
            BatchKey {
                product_id: 1,
                product_name: "Orange Juice".into(),
                production_date: date(2026, 2, 16),
                line: 1,
                tank: 5,
            }
        );
    }

    // ------------------------------------------------------------------------
    // Failure paths
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_trace_missing_date_token() {
        let engine = TraceEngine::from_store(orange_juice_store());
        let err = engine.trace("Orange Juice", "L1T5").await.unwrap_err();
        assert!(matches!(err, TraceError::InvalidInput(ref m) if m == "Invalid code format"));
    }

    #[tokio::test]
    async fn test_trace_bad_line_prefix() {
        let engine = TraceEngine::from_store(orange_juice_store());
        let err = engine.trace("Orange Juice", "X1T5 2/26/26").await.unwrap_err();
        match err {
            TraceError::InvalidInput(msg) => assert!(msg.contains("line/tank")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_trace_blank_inputs() {
        let store = orange_juice_store();
        let engine = TraceEngine::from_store(store.clone());

        let err = engine.trace("", "L1T5 2/26/26").await.unwrap_err();
        assert!(matches!(err, TraceError::InvalidInput(_)));
        let err = engine.trace("Orange Juice", "").await.unwrap_err();
        assert!(matches!(err, TraceError::InvalidInput(_)));

        // Validation happens before any lookup.
        assert_eq!(store.product_lookups(), 0);
    }

    #[tokio::test]
    async fn test_trace_unknown_product() {
        let store = orange_juice_store();
        let engine = TraceEngine::from_store(store.clone());

        let err = engine.trace("Grape Juice", "L1T5 2/26/26").await.unwrap_err();
        assert!(matches!(err, TraceError::ProductNotFound(ref n) if n == "Grape Juice"));
        assert_eq!(store.provenance_lookups(), 0);
    }

    #[tokio::test]
    async fn test_trace_unknown_product_with_any_valid_code() {
        let engine = TraceEngine::from_store(orange_juice_store());
        for code in ["L1T5 2/26/26", "L9T9 12/31/99", "L0T0 1/1/00"] {
            let err = engine.trace("Grape Juice", code).await.unwrap_err();
            assert!(matches!(err, TraceError::ProductNotFound(_)), "code {code}");
        }
    }

    #[tokio::test]
    async fn test_trace_invalid_code_wins_over_unknown_product() {
        let store = orange_juice_store();
        let engine = TraceEngine::from_store(store.clone());
        let err = engine.trace("Grape Juice", "L1T5 13/1/26").await.unwrap_err();
        assert!(matches!(err, TraceError::InvalidInput(_)));
        assert_eq!(store.product_lookups(), 0);
    }

    #[tokio::test]
    async fn test_trace_catalog_failure() {
        let store = orange_juice_store();
        store.fail_next(StoreError::connection("refused"));
        let engine = TraceEngine::from_store(store);

        let err = engine.trace("Orange Juice", "L1T5 2/26/26").await.unwrap_err();
        assert!(matches!(err, TraceError::QueryFailed(StoreError::Connection(_))));
        assert_eq!(err.to_string(), "Trace query failed");
    }

    #[tokio::test]
    async fn test_trace_provenance_failure() {
        let store = orange_juice_store();
        // Healthy catalog, broken provenance source.
        let failing = Arc::new(InMemoryStore::new());
        failing.fail_always(StoreError::timeout("acquire"));
        let engine = TraceEngine::new(store, failing);

        let err = engine.trace("Orange Juice", "L1T5 2/26/26").await.unwrap_err();
        assert!(matches!(err, TraceError::QueryFailed(StoreError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_trace_does_not_retry() {
        let store = orange_juice_store();
        store.fail_next(StoreError::timeout("acquire"));
        let engine = TraceEngine::from_store(store.clone());

        assert!(engine.trace("Orange Juice", "L1T5 2/26/26").await.is_err());
        assert_eq!(store.product_lookups(), 1);
    }

    // ------------------------------------------------------------------------
    // Auxiliary operations
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_list_products() {
        let store = orange_juice_store();
        store.insert_product("Apple Juice", None, 14);
        let engine = TraceEngine::from_store(store);
        assert_eq!(
            engine.list_products().await.unwrap(),
            vec!["Apple Juice".to_string(), "Orange Juice".to_string()]
        );
    }

    #[tokio::test]
    async fn test_list_products_failure() {
        let store = orange_juice_store();
        store.fail_always(StoreError::unavailable("closed"));
        let engine = TraceEngine::from_store(store);
        assert!(matches!(
            engine.list_products().await.unwrap_err(),
            TraceError::QueryFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_ping_reports_catalog_health() {
        let store = orange_juice_store();
        let engine = TraceEngine::from_store(store.clone());
        assert!(engine.ping().await.is_ok());

        store.fail_always(StoreError::unavailable("closed"));
        assert!(matches!(
            engine.ping().await.unwrap_err(),
            StoreError::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_engine_concurrent_traces() {
        let engine = TraceEngine::from_store(orange_juice_store());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    let tank = if i % 2 == 0 { 5 } else { 6 };
                    engine
                        .trace("Orange Juice", &format!("L1T{tank} 2/26/26"))
                        .await
                        .map(|r| r.len())
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let count = handle.await.unwrap().unwrap();
            assert_eq!(count, if i % 2 == 0 { 2 } else { 0 });
        }
    }

    #[test]
    fn test_engine_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TraceEngine>();
    }
}
