//! In-memory store for tests and local experiments.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{StoreError, StoreResult};
use crate::model::{BatchKey, IngredientInput, Product, ProductionBatch, ProvenanceRecord};
use crate::traits::{ProductCatalog, ProvenanceSource};

/// In-memory implementation of both collaborator traits.
///
/// Clones share the same data. Failures can be injected either once per
/// call ([`fail_next`](Self::fail_next)) or permanently
/// ([`fail_always`](Self::fail_always)) to exercise error paths.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use juicetrace_core::{IngredientInput, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// let product = store.insert_product("Orange Juice", Some("52 oz"), 10);
/// let batch = store.insert_batch(
///     product,
///     NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
///     1,
///     5,
/// );
/// store.insert_input(batch, IngredientInput {
///     ingredient: "Valencia oranges".into(),
///     supplier_name: "Sunrise Citrus".into(),
///     supplier_lot: "SC-2291".into(),
///     source_location: Some("Grove 7".into()),
/// });
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    data: Arc<RwLock<Data>>,
    counters: Arc<Counters>,
}

#[derive(Default)]
struct Data {
    products: Vec<Product>,
    batches: Vec<ProductionBatch>,
    inputs: Vec<(i64, IngredientInput)>,
    queued_failures: VecDeque<StoreError>,
    permanent_failure: Option<StoreError>,
}

#[derive(Default)]
struct Counters {
    product_lookups: AtomicUsize,
    provenance_lookups: AtomicUsize,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product and return its identifier.
    pub fn insert_product(
        &self,
        name: impl Into<String>,
        package_size: Option<&str>,
        shelf_life_days: u32,
    ) -> i64 {
        let mut data = self.write();
        let id = next_id(data.products.len());
        data.products.push(Product {
            id,
            name: name.into(),
            package_size: package_size.map(str::to_string),
            shelf_life_days,
        });
        id
    }

    /// Add a production batch and return its identifier.
    pub fn insert_batch(
        &self,
        product_id: i64,
        production_date: NaiveDate,
        line: u32,
        tank: u32,
    ) -> i64 {
        let mut data = self.write();
        let id = next_id(data.batches.len());
        data.batches.push(ProductionBatch {
            id,
            product_id,
            production_date,
            line,
            tank,
        });
        id
    }

    /// Add an ingredient input to a batch and return its identifier.
    pub fn insert_input(&self, batch_id: i64, input: IngredientInput) -> i64 {
        let mut data = self.write();
        data.inputs.push((batch_id, input));
        next_id(data.inputs.len() - 1)
    }

    /// Make the next collaborator call fail with `err`.
    ///
    /// Calls queue up: `fail_next` twice fails the next two calls.
    pub fn fail_next(&self, err: StoreError) {
        self.write().queued_failures.push_back(err);
    }

    /// Make every collaborator call fail with `err` until [`recover`](Self::recover).
    pub fn fail_always(&self, err: StoreError) {
        self.write().permanent_failure = Some(err);
    }

    /// Clear all injected failures.
    pub fn recover(&self) {
        let mut data = self.write();
        data.queued_failures.clear();
        data.permanent_failure = None;
    }

    /// Number of `find_product` calls served or failed so far.
    pub fn product_lookups(&self) -> usize {
        self.counters.product_lookups.load(Ordering::SeqCst)
    }

    /// Number of `find_provenance` calls served or failed so far.
    pub fn provenance_lookups(&self) -> usize {
        self.counters.provenance_lookups.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> StoreResult<()> {
        let mut data = self.write();
        if let Some(err) = data.queued_failures.pop_front() {
            return Err(err);
        }
        match &data.permanent_failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Data> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Data> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn next_id(len: usize) -> i64 {
    i64::try_from(len).map_or(i64::MAX, |n| n + 1)
}

#[async_trait]
impl ProductCatalog for InMemoryStore {
    async fn find_product(&self, name: &str) -> StoreResult<Option<Product>> {
        self.counters.product_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.read().products.iter().find(|p| p.name == name).cloned())
    }

    async fn list_product_names(&self) -> StoreResult<Vec<String>> {
        self.check_failure()?;
        let mut names: Vec<String> = self.read().products.iter().map(|p| p.name.clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_failure()
    }
}

#[async_trait]
impl ProvenanceSource for InMemoryStore {
    async fn find_provenance(&self, key: &BatchKey) -> StoreResult<Vec<ProvenanceRecord>> {
        self.counters.provenance_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let data = self.read();
        let Some(product) = data.products.iter().find(|p| p.id == key.product_id) else {
            return Ok(Vec::new());
        };
        let batch_ids: Vec<i64> = data
            .batches
            .iter()
            .filter(|b| {
                b.product_id == key.product_id
                    && b.production_date == key.production_date
                    && b.line == key.line
                    && b.tank == key.tank
            })
            .map(|b| b.id)
            .collect();

        let row_key = BatchKey {
            product_name: product.name.clone(),
            ..key.clone()
        };
        Ok(data
            .inputs
            .iter()
            .filter(|(batch_id, _)| batch_ids.contains(batch_id))
            .map(|(_, input)| ProvenanceRecord::from_input(&row_key, input))
            .collect())
    }
}
