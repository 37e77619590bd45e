use crate::handlers::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    services::catalog::BookSearchQuery,
    services::reviews::SubmitReviewInput,
    AppState,
};
use axum::extract::{Json, Path, Query, State};
use serde::Deserialize;
use validator::Validate;

/// Storefront listing: active books, optionally filtered by category slug
/// and/or search text.
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookSearchQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let result = state
        .services
        .catalog
        .list_active_books(query)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(result))
}

/// Storefront detail: one active book with its reviews.
pub async fn get_book(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let book = state
        .services
        .catalog
        .get_book_by_slug(&slug)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(book))
}

/// Submit a review for a book.
pub async fn submit_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let review = state
        .services
        .reviews
        .submit(
            user.user_id,
            &slug,
            SubmitReviewInput {
                rating: payload.rating,
                comment: payload.comment,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(created_response(review))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(max = 2000))]
    pub comment: String,
}
