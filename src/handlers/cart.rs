use crate::handlers::common::{map_service_error, no_content_response, success_response, validate_input};
use crate::{auth::AuthUser, errors::ApiError, services::cart::AddToCartInput, AppState};
use axum::extract::{Json, Path, State};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// The current user's cart with its computed subtotal.
pub async fn view_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .get_cart(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Add a book to the cart (increments an existing line).
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let cart = state
        .services
        .cart
        .add_item(
            user.user_id,
            AddToCartInput {
                book_id: payload.book_id,
                quantity: payload.quantity,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Set a cart line's quantity; zero removes the line.
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let cart = state
        .services
        .cart
        .update_item_quantity(user.user_id, item_id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Remove a cart line.
pub async fn remove_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .cart
        .remove_item(user.user_id, item_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

// Request DTOs

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub book_id: Uuid,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 0))]
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_item_quantity_defaults_to_one() {
        let json = r#"{"book_id": "550e8400-e29b-41d4-a716-446655440000"}"#;
        let request: AddItemRequest = serde_json::from_str(json).expect("valid request");
        assert_eq!(request.quantity, 1);
    }
}
