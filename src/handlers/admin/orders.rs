use crate::handlers::common::{map_service_error, no_content_response, success_response};
use crate::{errors::ApiError, AppState};
use axum::extract::{Path, State};
use uuid::Uuid;

/// All orders for admin review, newest first.
pub async fn list(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .list_all()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}

/// Approve an order (pending → completed). Idempotent.
pub async fn approve(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .approve(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Delete an order and its items.
pub async fn remove(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .orders
        .delete(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
