use crate::handlers::common::{created_response, map_service_error, validate_input};
use crate::{
    auth::AuthUser,
    entities::PaymentMethod,
    errors::ApiError,
    services::checkout::CheckoutInput,
    AppState,
};
use axum::extract::{Json, State};
use serde::Deserialize;
use validator::Validate;

/// Place an order from the current cart.
///
/// Validation failures redisplay as field-level errors without touching the
/// store; an empty cart is a business-rule error.
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .checkout
        .place_order(
            user.user_id,
            CheckoutInput {
                full_name: payload.full_name,
                email: payload.email,
                phone: payload.phone,
                address: payload.address,
                payment_method: payload.payment_method,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(created_response(order))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 7, max = 32))]
    pub phone: String,
    #[validate(length(min = 1, max = 1000))]
    pub address: String,
    pub payment_method: PaymentMethod,
}
