use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    errors::ApiError,
    services::categories::{CreateCategoryInput, UpdateCategoryInput},
    AppState,
};
use axum::extract::{Json, Path, State};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub async fn list(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let categories = state
        .services
        .categories
        .list()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(categories))
}

/// Create a category; the slug is derived from the name when omitted.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let category = state
        .services
        .categories
        .create(CreateCategoryInput {
            name: payload.name,
            slug: payload.slug,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(category))
}

pub async fn update(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let category = state
        .services
        .categories
        .update(
            category_id,
            UpdateCategoryInput {
                name: payload.name,
                slug: payload.slug,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(category))
}

/// Delete a category; its books are detached, not deleted.
pub async fn remove(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .categories
        .delete(category_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub slug: Option<String>,
}
