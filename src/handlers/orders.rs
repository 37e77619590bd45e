use crate::handlers::common::{map_service_error, success_response};
use crate::{auth::AuthUser, errors::ApiError, AppState};
use axum::extract::{Path, State};
use uuid::Uuid;

/// The requesting user's order history, most recent first.
pub async fn order_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .list_for_user(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}

/// A single order with its items; only the owner may see it.
pub async fn order_detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_for_user(user.user_id, order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}
