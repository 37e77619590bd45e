//! Bookstore API Library
//!
//! This crate provides the core functionality for the bookstore backend:
//! storefront catalog, carts, checkout, order history, reviews, and the
//! staff-only management area.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod slug;
pub mod tracing;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::AuthRouterExt;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Builds the versioned API router: storefront, cart/checkout/orders behind
/// auth, and the management area behind the staff gate.
pub fn api_routes() -> Router<AppState> {
    let storefront = Router::new()
        .route("/books", get(handlers::catalog::list_books))
        .route("/books/{slug}", get(handlers::catalog::get_book));

    let reviews = Router::new()
        .route(
            "/books/{slug}/reviews",
            post(handlers::catalog::submit_review),
        )
        .with_auth();

    let cart = Router::new()
        .route("/cart", get(handlers::cart::view_cart))
        .route("/cart/items", post(handlers::cart::add_to_cart))
        .route("/cart/items/{item_id}", put(handlers::cart::update_cart_item))
        .route(
            "/cart/items/{item_id}",
            delete(handlers::cart::remove_cart_item),
        )
        .with_auth();

    let orders = Router::new()
        .route("/checkout", post(handlers::checkout::checkout))
        .route("/orders", get(handlers::orders::order_history))
        .route("/orders/{id}", get(handlers::orders::order_detail))
        .with_auth();

    // Management area: every route fails closed for non-staff callers.
    let manage = Router::new()
        .route("/dashboard", get(handlers::admin::dashboard::stats))
        .route(
            "/books",
            get(handlers::admin::books::list).post(handlers::admin::books::create),
        )
        .route(
            "/books/{id}",
            put(handlers::admin::books::update).delete(handlers::admin::books::remove),
        )
        .route(
            "/categories",
            get(handlers::admin::categories::list).post(handlers::admin::categories::create),
        )
        .route(
            "/categories/{id}",
            put(handlers::admin::categories::update)
                .delete(handlers::admin::categories::remove),
        )
        .route("/orders", get(handlers::admin::orders::list))
        .route("/orders/{id}/approve", post(handlers::admin::orders::approve))
        .route("/orders/{id}", delete(handlers::admin::orders::remove))
        .with_staff();

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(storefront)
        .merge(reviews)
        .merge(cart)
        .merge(orders)
        .nest("/manage", manage)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "status": "ok",
        "service": "bookstore-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::<()>::error("oops".into())
            })
            .await;

        assert!(!response.success);
        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
    }
}
