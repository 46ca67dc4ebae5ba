//! Provenance lookup for a resolved batch key.

use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::model::{BatchKey, ProvenanceRecord};
use crate::traits::ProvenanceSource;

/// Fetch every ingredient input of the batch identified by `key`.
///
/// An empty list means the product exists but no batch matched; it is a
/// valid outcome, not an error. Records are returned in the source's order.
/// Records that do not match all four key fields are dropped.
///
/// # Errors
///
/// Propagates the source's [`StoreError`](crate::StoreError).
pub async fn find_provenance(
    source: &dyn ProvenanceSource,
    key: &BatchKey,
) -> StoreResult<Vec<ProvenanceRecord>> {
    let records = source.find_provenance(key).await?;
    let total = records.len();

    let matching: Vec<ProvenanceRecord> = records.into_iter().filter(|r| key.matches(r)).collect();
    if matching.len() != total {
        warn!(
            product = %key.product_name,
            production_date = %key.production_date,
            line = key.line,
            tank = key.tank,
            dropped = total - matching.len(),
            "provenance source returned records outside the requested batch"
        );
    }

    debug!(
        product = %key.product_name,
        production_date = %key.production_date,
        line = key.line,
        tank = key.tank,
        records = matching.len(),
        "provenance lookup complete"
    );

    Ok(matching)
}
