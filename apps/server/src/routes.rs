//! # HTTP Routes
//!
//! The REST surface:
//!
//! | Method | Path            | Purpose                          |
//! |--------|-----------------|----------------------------------|
//! | POST   | /api/sales      | Create a sale (atomic)           |
//! | GET    | /api/sales      | List sales (paginated, filtered) |
//! | GET    | /api/sales/:id  | Fetch one sale with items        |
//! | GET    | /health         | Liveness + database ping         |
//!
//! Handlers stay thin: deserialize, validate, delegate to a repository,
//! map the result. All business rules live below this layer.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::dto::{CreateSaleRequest, ListSalesQuery, SaleResponse, SalesPageResponse};
use crate::error::ApiError;
use crate::state::AppState;
use mostrador_core::validation::validate_sale_items;
use mostrador_core::SaleFilter;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sales", post(create_sale).get(list_sales))
        .route("/api/sales/:id", get(get_sale))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `POST /api/sales`
///
/// Validates the request shape up front, then hands the items to the sale
/// transaction. A 201 means the header, every line item, and every stock
/// decrement committed together.
async fn create_sale(
    State(state): State<AppState>,
    Json(request): Json<CreateSaleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let items = request.into_items()?;

    validate_sale_items(&items).map_err(|e| ApiError::validation(e.to_string()))?;

    let sale = state.db.sales().create_sale(&items).await?;

    info!(
        sale_id = sale.sale.id,
        sale_number = %sale.sale.sale_number,
        items = sale.items.len(),
        "Sale created"
    );

    Ok((StatusCode::CREATED, Json(SaleResponse::from(sale))))
}

/// `GET /api/sales`
async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<ListSalesQuery>,
) -> Result<Json<SalesPageResponse>, ApiError> {
    let filter: SaleFilter = query.into();
    let page = state.db.sales().list(&filter).await?;

    Ok(Json(SalesPageResponse::from(page)))
}

/// `GET /api/sales/:id`
async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SaleResponse>, ApiError> {
    let sale = state
        .db
        .sales()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", id))?;

    Ok(Json(SaleResponse::from(sale)))
}

/// `GET /health`
async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    if !state.db.health_check().await {
        return Err(ApiError::Internal);
    }

    Ok(Json(json!({ "status": "ok" })))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use mostrador_db::{Database, DbConfig};
    use tower::ServiceExt;

    use chrono::Utc;
    use mostrador_core::Product;

    async fn test_state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppState { db }
    }

    async fn seed_product(state: &AppState, id: &str, name: &str, quantity: i64) {
        let now = Utc::now();
        state
            .db
            .products()
            .insert(&Product {
                id: id.to_string(),
                name: name.to_string(),
                category: "Filtros".to_string(),
                quantity,
                unit_cost_cents: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    fn post_sale(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/sales")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_sale_returns_201_with_sale() {
        let state = test_state().await;
        seed_product(&state, "P1", "Filter", 10).await;
        let app = router(state);

        let response = app
            .oneshot(post_sale(json!({
                "items": [{ "product_id": "P1", "quantity": 3, "unit_price": 25.00 }]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["sale_number"], "VENT-000001");
        assert_eq!(body["total_items"], 3);
        // Decimal serializes as a string, keeping the two decimal places
        assert_eq!(body["items"][0]["total_price"], json!("75.00"));
    }

    #[tokio::test]
    async fn test_create_sale_empty_items_is_400() {
        let state = test_state().await;
        let app = router(state);

        let response = app
            .oneshot(post_sale(json!({ "items": [] })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_create_sale_non_positive_quantity_is_400() {
        let state = test_state().await;
        seed_product(&state, "P1", "Filter", 10).await;
        let app = router(state);

        let response = app
            .oneshot(post_sale(json!({
                "items": [{ "product_id": "P1", "quantity": 0 }]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_sale_insufficient_stock_is_400_with_detail() {
        let state = test_state().await;
        seed_product(&state, "P2", "Bujía", 0).await;
        let app = router(state);

        let response = app
            .oneshot(post_sale(json!({
                "items": [{ "product_id": "P2", "quantity": 1 }]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("Bujía"));
        assert!(message.contains("available 0"));
        assert!(message.contains("requested 1"));
    }

    #[tokio::test]
    async fn test_create_sale_unknown_product_is_500_generic() {
        let state = test_state().await;
        let app = router(state);

        let response = app
            .oneshot(post_sale(json!({
                "items": [{ "product_id": "DOES-NOT-EXIST", "quantity": 1 }]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_get_sale_roundtrip_and_404() {
        let state = test_state().await;
        seed_product(&state, "P3", "Correa", 5).await;
        let app = router(state);

        let created = app
            .clone()
            .oneshot(post_sale(json!({
                "items": [{ "product_id": "P3", "quantity": 1, "unit_price": 8.00 }]
            })))
            .await
            .unwrap();
        let created_body = body_json(created).await;
        let id = created_body["id"].as_i64().unwrap();

        let fetched = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/sales/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(fetched.status(), StatusCode::OK);

        let missing = app
            .oneshot(
                Request::builder()
                    .uri("/api/sales/99999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_sales_paginates() {
        let state = test_state().await;
        seed_product(&state, "P4", "Tornillo", 50).await;
        let app = router(state);

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(post_sale(json!({
                    "items": [{ "product_id": "P4", "quantity": 1, "unit_price": 1.00 }]
                })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/sales?page=1&limit=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["total_pages"], 2);
        assert_eq!(body["sales"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state().await;
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
