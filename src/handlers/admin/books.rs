use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    errors::ApiError,
    services::catalog::{CreateBookInput, UpdateBookInput},
    AppState,
};
use axum::extract::{Json, Path, State};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Every book, inactive ones included, newest first.
pub async fn list(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let books = state
        .services
        .catalog
        .list_all_books()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(books))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let book = state
        .services
        .catalog
        .create_book(CreateBookInput {
            title: payload.title,
            author: payload.author,
            price: payload.price,
            stock: payload.stock,
            category_id: payload.category_id,
            image_url: payload.image_url,
            description: payload.description,
            is_active: payload.is_active,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(book))
}

/// Partial update; an absent image keeps the stored one.
pub async fn update(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<UpdateBookRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let book = state
        .services
        .catalog
        .update_book(
            book_id,
            UpdateBookInput {
                title: payload.title,
                author: payload.author,
                price: payload.price,
                stock: payload.stock,
                category_id: payload.category_id,
                image_url: payload.image_url,
                description: payload.description,
                is_active: payload.is_active,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(book))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .catalog
        .delete_book(book_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

// Request DTOs

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 255))]
    pub author: String,
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub stock: i32,
    pub category_id: Option<Uuid>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBookRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub author: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub category_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}
