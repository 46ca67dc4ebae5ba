//! SQLite-backed catalog and provenance source.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use juicetrace_core::{
    BatchKey, Product, ProductCatalog, ProvenanceRecord, ProvenanceSource, StoreError,
    StoreResult,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

use crate::error::store_error;

// ============================================================================
// Queries
// ============================================================================

const FIND_PRODUCT: &str =
    "SELECT id, name, package_size, shelf_life_days FROM product WHERE name = ?";

const LIST_PRODUCT_NAMES: &str = "SELECT name FROM product ORDER BY name";

const FIND_PROVENANCE: &str = "\
SELECT product.name, production_batch.production_date, production_batch.line, \
production_batch.tank_number, ingredient_input.ingredient, ingredient_input.supplier_name, \
ingredient_input.supplier_lot, ingredient_input.grove_location \
FROM product \
JOIN production_batch ON production_batch.product_id = product.id \
JOIN ingredient_input ON ingredient_input.batch_id = production_batch.id \
WHERE product.id = ? AND production_batch.production_date = ? \
AND production_batch.line = ? AND production_batch.tank_number = ? \
ORDER BY ingredient_input.id";

const PING: &str = "SELECT 1";

/// Storage format of `production_batch.production_date`.
const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Options
// ============================================================================

/// Connection pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// SQLite URL, e.g. `sqlite://juicetrace.db`.
    pub url: String,

    /// Upper bound on pooled connections.
    pub max_connections: u32,

    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,

    /// How long a single query may run.
    pub query_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            url: "sqlite://juicetrace.db".to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
            query_timeout: Duration::from_secs(10),
        }
    }
}

// ============================================================================
// Rows
// ============================================================================

#[derive(FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    package_size: Option<String>,
    shelf_life_days: i64,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> StoreResult<Self> {
        let shelf_life_days = u32::try_from(row.shelf_life_days).map_err(|_| {
            StoreError::decode(format!(
                "product '{}' has invalid shelf_life_days {}",
                row.name, row.shelf_life_days
            ))
        })?;
        Ok(Product {
            id: row.id,
            name: row.name,
            package_size: row.package_size,
            shelf_life_days,
        })
    }
}

#[derive(FromRow)]
struct ProvenanceRow {
    name: String,
    production_date: String,
    line: i64,
    tank_number: i64,
    ingredient: String,
    supplier_name: String,
    supplier_lot: String,
    grove_location: Option<String>,
}

impl TryFrom<ProvenanceRow> for ProvenanceRecord {
    type Error = StoreError;

    fn try_from(row: ProvenanceRow) -> StoreResult<Self> {
        let production_date = NaiveDate::parse_from_str(&row.production_date, DATE_FORMAT)
            .map_err(|e| {
                StoreError::decode(format!(
                    "invalid production_date '{}': {e}",
                    row.production_date
                ))
            })?;
        let line = u32::try_from(row.line)
            .map_err(|_| StoreError::decode(format!("invalid line {}", row.line)))?;
        let tank = u32::try_from(row.tank_number)
            .map_err(|_| StoreError::decode(format!("invalid tank_number {}", row.tank_number)))?;

        Ok(ProvenanceRecord {
            product_name: row.name,
            production_date,
            line,
            tank,
            ingredient: row.ingredient,
            supplier_name: row.supplier_name,
            supplier_lot: row.supplier_lot,
            source_location: row.grove_location,
        })
    }
}

// ============================================================================
// SqliteStore
// ============================================================================

/// Read-only SQLite store shared by every request.
///
/// Wraps one [`SqlitePool`]; cloning shares the pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl SqliteStore {
    /// Open a pool against an existing database.
    ///
    /// The database file is never created: an absent file is a
    /// configuration error, not an empty store.
    pub async fn connect(options: &StoreOptions) -> StoreResult<Self> {
        let connect = SqliteConnectOptions::from_str(&options.url)
            .map_err(store_error)?
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect_with(connect)
            .await
            .map_err(store_error)?;

        info!(
            url = %options.url,
            max_connections = options.max_connections,
            "connected to provenance store"
        );

        Ok(Self::from_pool(pool).with_query_timeout(options.query_timeout))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            query_timeout: StoreOptions::default().query_timeout,
        }
    }

    /// Override the per-query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run a query future under the per-query timeout.
    async fn timed<T>(
        &self,
        what: &str,
        fut: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> StoreResult<T> {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result.map_err(store_error),
            Err(_) => Err(StoreError::timeout(format!(
                "{what} exceeded {:?}",
                self.query_timeout
            ))),
        }
    }
}

#[async_trait]
impl ProductCatalog for SqliteStore {
    async fn find_product(&self, name: &str) -> StoreResult<Option<Product>> {
        let row = self
            .timed(
                "product lookup",
                sqlx::query_as::<_, ProductRow>(FIND_PRODUCT)
                    .bind(name)
                    .fetch_optional(&self.pool),
            )
            .await?;
        debug!(product = name, found = row.is_some(), "product lookup");
        row.map(Product::try_from).transpose()
    }

    async fn list_product_names(&self) -> StoreResult<Vec<String>> {
        self.timed(
            "product listing",
            sqlx::query_scalar::<_, String>(LIST_PRODUCT_NAMES).fetch_all(&self.pool),
        )
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.timed("ping", sqlx::query(PING).execute(&self.pool))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ProvenanceSource for SqliteStore {
    async fn find_provenance(&self, key: &BatchKey) -> StoreResult<Vec<ProvenanceRecord>> {
        let rows = self
            .timed(
                "provenance lookup",
                sqlx::query_as::<_, ProvenanceRow>(FIND_PROVENANCE)
                    .bind(key.product_id)
                    .bind(key.production_date.format(DATE_FORMAT).to_string())
                    .bind(i64::from(key.line))
                    .bind(i64::from(key.tank))
                    .fetch_all(&self.pool),
            )
            .await?;
        rows.into_iter().map(ProvenanceRecord::try_from).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
