//! Shelf-life resolution: expiration date to production date.
//!
//! Dates are [`NaiveDate`] values: year, month and day with no time zone,
//! so subtracting a shelf life can never shift the result by a day.

use chrono::{Days, NaiveDate};
use thiserror::Error;
use tracing::debug;

use crate::error::StoreError;
use crate::model::Product;
use crate::traits::ProductCatalog;

/// Why a production date could not be resolved.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No product has this exact name.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Backing the expiration date off by the shelf life leaves the
    /// representable calendar.
    #[error("Expiration date {expiration} minus {shelf_life_days} days is out of range")]
    DateOutOfRange {
        /// Printed expiration date.
        expiration: NaiveDate,
        /// Product shelf life.
        shelf_life_days: u32,
    },

    /// The catalog lookup failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A product together with the production date computed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The product found in the catalog.
    pub product: Product,

    /// Expiration date minus the product's shelf life.
    pub production_date: NaiveDate,
}

/// Calendar-day subtraction of a shelf life from an expiration date.
///
/// Returns `None` only when the result falls outside the range
/// [`NaiveDate`] can represent.
pub fn production_date(expiration: NaiveDate, shelf_life_days: u32) -> Option<NaiveDate> {
    expiration.checked_sub_days(Days::new(u64::from(shelf_life_days)))
}

/// Inverse of [`production_date`].
pub fn expiration_date(production: NaiveDate, shelf_life_days: u32) -> Option<NaiveDate> {
    production.checked_add_days(Days::new(u64::from(shelf_life_days)))
}

/// Look up `product_name` and compute its production date.
///
/// Performs exactly one catalog lookup.
///
/// # Errors
///
/// - [`ResolveError::ProductNotFound`] when the catalog has no such product
/// - [`ResolveError::DateOutOfRange`] when the subtraction overflows
/// - [`ResolveError::Store`] when the catalog fails
pub async fn resolve_production_date(
    catalog: &dyn ProductCatalog,
    product_name: &str,
    expiration: NaiveDate,
) -> Result<Resolution, ResolveError> {
    let product = catalog
        .find_product(product_name)
        .await?
        .ok_or_else(|| ResolveError::ProductNotFound(product_name.to_string()))?;

    let production_date = production_date(expiration, product.shelf_life_days).ok_or(
        ResolveError::DateOutOfRange {
            expiration,
            shelf_life_days: product.shelf_life_days,
        },
    )?;

    debug!(
        product = %product.name,
        shelf_life_days = product.shelf_life_days,
        %expiration,
        %production_date,
        "resolved production date"
    );

    Ok(Resolution {
        product,
        production_date,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_production_date_same_month() {
        assert_eq!(production_date(date(2026, 2, 26), 10), Some(date(2026, 2, 16)));
    }

    #[test]
    fn test_production_date_crosses_month() {
        assert_eq!(production_date(date(2026, 2, 26), 30), Some(date(2026, 1, 27)));
    }

    #[test]
    fn test_production_date_crosses_year() {
        assert_eq!(production_date(date(2026, 1, 5), 10), Some(date(2025, 12, 26)));
    }

    #[test]
    fn test_production_date_leap_year() {
        assert_eq!(production_date(date(2028, 3, 1), 1), Some(date(2028, 2, 29)));
        assert_eq!(production_date(date(2027, 3, 1), 1), Some(date(2027, 2, 28)));
    }

    #[test]
    fn test_production_date_zero_shelf_life() {
        assert_eq!(production_date(date(2026, 2, 26), 0), Some(date(2026, 2, 26)));
    }

    #[test]
    fn test_production_date_out_of_range() {
        assert_eq!(production_date(NaiveDate::MIN, 1), None);
    }

    #[tokio::test]
    async fn test_resolve_known_product() {
        let store = InMemoryStore::new();
        let id = store.insert_product("Orange Juice", Some("52 oz"), 10);

        let resolution = resolve_production_date(&store, "Orange Juice", date(2026, 2, 26))
            .await
            .unwrap();

        assert_eq!(resolution.product.id, id);
        assert_eq!(resolution.production_date, date(2026, 2, 16));
        assert_eq!(store.product_lookups(), 1);
    }

    #[tokio::test]
    async fn test_resolve_unknown_product() {
        let store = InMemoryStore::new();
        store.insert_product("Orange Juice", None, 10);

        let err = resolve_production_date(&store, "Grape Juice", date(2026, 2, 26))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ProductNotFound(ref n) if n == "Grape Juice"));
    }

    #[tokio::test]
    async fn test_resolve_is_case_sensitive() {
        let store = InMemoryStore::new();
        store.insert_product("Orange Juice", None, 10);

        let err = resolve_production_date(&store, "orange juice", date(2026, 2, 26))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_store_failure() {
        let store = InMemoryStore::new();
        store.fail_always(StoreError::connection("refused"));

        let err = resolve_production_date(&store, "Orange Juice", date(2026, 2, 26))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Store(StoreError::Connection(_))));
    }

    #[tokio::test]
    async fn test_resolve_out_of_range() {
        let store = InMemoryStore::new();
        store.insert_product("Orange Juice", None, 10);

        let err = resolve_production_date(&store, "Orange Juice", NaiveDate::MIN)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::DateOutOfRange { shelf_life_days: 10, .. }));
    }

    proptest! {
        #[test]
        fn prop_round_trip(days_since_2000 in 0i64..40_000, shelf_life in 0u32..5_000) {
            let expiration = date(2000, 1, 1) + chrono::Duration::days(days_since_2000);
            let production = production_date(expiration, shelf_life).unwrap();
            prop_assert_eq!(expiration_date(production, shelf_life), Some(expiration));
            prop_assert_eq!((expiration - production).num_days(), i64::from(shelf_life));
        }
    }
}
