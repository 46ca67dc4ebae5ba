//! Route table and handlers.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use juicetrace_core::{ProvenanceRecord, TraceEngine, TraceRequest};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::ApiError;

/// Query parameters of `GET /trace`.
///
/// Both are optional at the extractor so that a missing parameter is
/// reported in the standard error body.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TraceParams {
    /// Exact product name.
    pub product: Option<String>,
    /// Package code, e.g. `L1T5 2/26/26`.
    pub code: Option<String>,
}

impl TraceParams {
    /// Validate into a [`TraceRequest`].
    pub fn into_request(self) -> Result<TraceRequest, ApiError> {
        TraceRequest::new(
            self.product.unwrap_or_default(),
            self.code.unwrap_or_default(),
        )
        .map_err(ApiError::from)
    }
}

/// Build the Juice Trace router.
pub fn router(engine: TraceEngine) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/trace", get(trace))
        .route("/products", get(products))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

async fn root() -> &'static str {
    "Juice Trace API Running"
}

async fn health(State(engine): State<TraceEngine>) -> Response {
    match engine.ping().await {
        Ok(()) => Json(serde_json::json!({ "status": "ok" })).into_response(),
        Err(err) => {
            warn!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "unavailable" })),
            )
                .into_response()
        }
    }
}

async fn trace(
    State(engine): State<TraceEngine>,
    params: Result<Query<TraceParams>, QueryRejection>,
) -> Result<Json<Vec<ProvenanceRecord>>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let request = params.into_request()?;
    let records = engine.trace_request(&request).await?;
    Ok(Json(records))
}

async fn products(State(engine): State<TraceEngine>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(engine.list_products().await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::NaiveDate;
    use juicetrace_core::{InMemoryStore, IngredientInput, StoreError};
    use serde_json::Value;
    use tower::ServiceExt;

    fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        let orange = store.insert_product("Orange Juice", Some("52 oz"), 10);
        store.insert_product("Apple Juice", Some("64 oz"), 45);
        let batch = store.insert_batch(orange, NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(), 1, 5);
        store.insert_input(
            batch,
            IngredientInput {
                ingredient: "Valencia oranges".into(),
                supplier_name: "Sunrise Citrus".into(),
                supplier_lot: "SC-2291".into(),
                source_location: Some("Grove 7".into()),
            },
        );
        store.insert_input(
            batch,
            IngredientInput {
                ingredient: "Pulp".into(),
                supplier_name: "Sunrise Citrus".into(),
                supplier_lot: "SC-P-19".into(),
                source_location: None,
            },
        );
        store
    }

    fn app(store: InMemoryStore) -> Router {
        router(TraceEngine::from_store(Arc::new(store)))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = get(app, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn error_body(code: u16, message: &str) -> Value {
        serde_json::json!({ "error": { "code": code, "message": message } })
    }

    // ------------------------------------------------------------------------
    // /trace
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_trace_ok() {
        let (status, body) =
            get_json(app(seeded()), "/trace?product=Orange%20Juice&code=L1T5%202/26/26").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body[0],
            serde_json::json!({
                "product": "Orange Juice",
                "production_date": "2026-02-16",
                "line": 1,
                "tank_number": 5,
                "ingredient": "Valencia oranges",
                "supplier_name": "Sunrise Citrus",
                "supplier_lot": "SC-2291",
                "grove_location": "Grove 7",
            })
        );
        assert_eq!(body[1]["supplier_lot"], "SC-P-19");
        assert_eq!(body[1]["grove_location"], Value::Null);
    }

    #[tokio::test]
    async fn test_trace_plus_encoded_space() {
        let (status, body) =
            get_json(app(seeded()), "/trace?product=Orange+Juice&code=L1T5+2/26/26").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_trace_no_matching_batch_is_empty_array() {
        let (status, body) =
            get_json(app(seeded()), "/trace?product=Orange%20Juice&code=L1T6%202/26/26").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_trace_invalid_code() {
        let (status, body) =
            get_json(app(seeded()), "/trace?product=Orange%20Juice&code=L1T5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, error_body(400, "Invalid code format"));
    }

    #[tokio::test]
    async fn test_trace_bad_line_tank() {
        let (status, body) =
            get_json(app(seeded()), "/trace?product=Orange%20Juice&code=X1T5%202/26/26").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("line/tank"));
    }

    #[tokio::test]
    async fn test_trace_missing_params() {
        let (status, body) = get_json(app(seeded()), "/trace?code=L1T5%202/26/26").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, error_body(400, "Missing product"));

        let (status, body) = get_json(app(seeded()), "/trace?product=Orange%20Juice").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, error_body(400, "Missing code"));

        let (status, _) = get_json(app(seeded()), "/trace").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_trace_unknown_product() {
        let (status, body) =
            get_json(app(seeded()), "/trace?product=Grape%20Juice&code=L1T5%202/26/26").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, error_body(404, "Product not found: Grape Juice"));
    }

    #[tokio::test]
    async fn test_trace_store_failure_is_generic_500() {
        let store = seeded();
        store.fail_always(StoreError::connection("connection refused"));

        let (status, body) =
            get_json(app(store), "/trace?product=Orange%20Juice&code=L1T5%202/26/26").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, error_body(500, "Trace query failed"));
    }

    // ------------------------------------------------------------------------
    // Other routes
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_root() {
        let (status, body) = get(app(seeded()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Juice Trace API Running");
    }

    #[tokio::test]
    async fn test_products_sorted() {
        let (status, body) = get_json(app(seeded()), "/products").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!(["Apple Juice", "Orange Juice"]));
    }

    #[tokio::test]
    async fn test_products_store_failure() {
        let store = seeded();
        store.fail_next(StoreError::timeout("pool"));
        let (status, body) = get_json(app(store), "/products").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], 500);
    }

    #[tokio::test]
    async fn test_health() {
        let store = seeded();
        let (status, body) = get_json(app(store.clone()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "status": "ok" }));

        store.fail_always(StoreError::unavailable("closed"));
        let (status, body) = get_json(app(store), "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, serde_json::json!({ "status": "unavailable" }));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _) = get(app(seeded()), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
