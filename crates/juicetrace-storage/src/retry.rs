//! Retry wrapper for stores.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use juicetrace_core::{
    BatchKey, Product, ProductCatalog, ProvenanceRecord, ProvenanceSource, StoreError,
    StoreResult,
};
use tracing::warn;

/// Wraps a store with exponential-backoff retries on transient errors.
///
/// Only errors for which [`StoreError::is_retryable`] holds are retried;
/// query and decode failures surface on the first attempt.
#[derive(Debug, Clone)]
pub struct RetryWrapper<S> {
    inner: S,
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl<S> RetryWrapper<S> {
    /// Creates a new retry wrapper with default settings.
    ///
    /// Default settings:
    /// - Max retries: 3
    /// - Initial delay: 100 milliseconds
    /// - Max delay: 2 seconds
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }

    /// Sets the number of retries after the first attempt.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the initial delay between retries.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries as usize)
    }
}

fn notify(operation: &'static str) -> impl FnMut(&StoreError, Duration) {
    move |err, delay| {
        warn!(operation, error = %err, ?delay, "retrying store call");
    }
}

#[async_trait]
impl<S: ProductCatalog> ProductCatalog for RetryWrapper<S> {
    async fn find_product(&self, name: &str) -> StoreResult<Option<Product>> {
        (|| self.inner.find_product(name))
            .retry(self.backoff())
            .when(StoreError::is_retryable)
            .notify(notify("find_product"))
            .await
    }

    async fn list_product_names(&self) -> StoreResult<Vec<String>> {
        (|| self.inner.list_product_names())
            .retry(self.backoff())
            .when(StoreError::is_retryable)
            .notify(notify("list_product_names"))
            .await
    }

    // Health checks report the current state; no retries.
    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

#[async_trait]
impl<S: ProvenanceSource> ProvenanceSource for RetryWrapper<S> {
    async fn find_provenance(&self, key: &BatchKey) -> StoreResult<Vec<ProvenanceRecord>> {
        (|| self.inner.find_provenance(key))
            .retry(self.backoff())
            .when(StoreError::is_retryable)
            .notify(notify("find_provenance"))
            .await
    }
}
