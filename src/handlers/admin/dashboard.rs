use crate::handlers::common::{map_service_error, success_response};
use crate::{errors::ApiError, AppState};
use axum::extract::State;

/// Revenue dashboard: today/month revenue over completed orders and the
/// top-5 best sellers.
pub async fn stats(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let stats = state
        .services
        .dashboard
        .stats()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(stats))
}
