//! Product route handlers.
//!
//! Handlers only translate between HTTP and [`ProductService`]; every
//! decision lives in the service.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::http::response::{ApiError, ApiResponse, Operation};
use crate::http::server::AppState;
use crate::product::{Product, ProductPayload};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub async fn list_products(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    let products = state
        .products
        .list()
        .await
        .map_err(|e| ApiError::from_service(Operation::List, e))?;

    let count = products.len();
    Ok(Json(ApiResponse::ok(Operation::List.success_message(), products).with_count(count)))
}

pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    let Json(payload) = payload.map_err(malformed_body)?;
    let product = state
        .products
        .create(payload)
        .await
        .map_err(|e| ApiError::from_service(Operation::Create, e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(Operation::Create.success_message(), product)),
    ))
}

pub async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Product> {
    let product = state
        .products
        .get(&id)
        .await
        .map_err(|e| ApiError::from_service(Operation::Get, e))?;

    Ok(Json(ApiResponse::ok(Operation::Get.success_message(), product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductPayload>, JsonRejection>,
) -> ApiResult<Product> {
    let Json(payload) = payload.map_err(malformed_body)?;
    let product = state
        .products
        .update(&id, payload)
        .await
        .map_err(|e| ApiError::from_service(Operation::Update, e))?;

    Ok(Json(ApiResponse::ok(Operation::Update.success_message(), product)))
}

pub async fn delete_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Product> {
    let product = state
        .products
        .delete(&id)
        .await
        .map_err(|e| ApiError::from_service(Operation::Delete, e))?;

    Ok(Json(ApiResponse::ok(Operation::Delete.success_message(), product)))
}

/// Readiness: 200 when the datastore answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    match state.products.health().await {
        Ok(()) => Json(ApiResponse::ok("Service healthy", json!({ "datastore": "up" }))).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            let body = ApiResponse {
                success: false,
                message: "Datastore unavailable".to_string(),
                data: Some(json!({ "datastore": "down" })),
                count: None,
                error: Some(e.to_string()),
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Route not found")
}

fn malformed_body(rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection, "Rejected request body");
    ApiError::new(
        StatusCode::BAD_REQUEST,
        format!("Invalid JSON body: {}", rejection.body_text()),
    )
}
