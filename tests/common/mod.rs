#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::mpsc;
use uuid::Uuid;

use bookstore_api::{
    auth::{self, AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::{book, category, order, order_item, user, OrderStatus, PaymentMethod},
    events::{self, EventSender},
    handlers::AppServices,
    slug::slugify,
    AppState,
};

/// Helper harness backed by an in-memory SQLite database with the real
/// migrations applied.
pub struct TestApp {
    pub state: AppState,
    pub auth_service: Arc<AuthService>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:",
            "test_secret_key_for_testing_purposes_only",
            3600,
            "127.0.0.1",
            0,
            "test",
        );
        // A single pooled connection keeps the in-memory database alive for
        // the whole test.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(
            AuthConfig::new(cfg.jwt_secret.clone(), Duration::from_secs(3600)),
            db_arc.clone(),
        ));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        Self {
            state,
            auth_service,
            _event_task: event_task,
        }
    }

    /// Full HTTP router wired the same way as the binary (without the
    /// network listener), for request-level tests.
    pub fn router(&self) -> Router {
        Router::new()
            .nest("/api/v1", bookstore_api::api_routes())
            .nest(
                "/auth",
                auth::auth_routes().with_state(self.auth_service.clone()),
            )
            .layer(axum::middleware::from_fn_with_state(
                self.auth_service.clone(),
                inject_auth_service,
            ))
            .with_state(self.state.clone())
    }

    /// Bearer token for an existing account.
    pub fn token_for(&self, account: &user::Model) -> String {
        self.auth_service
            .generate_token(account)
            .expect("failed to generate token")
    }

    pub async fn create_user(&self, username: &str, is_staff: bool) -> user::Model {
        let now = Utc::now();
        let account = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(format!("{}@example.com", username)),
            password_hash: Set(auth::hash_password("reading-is-fun").unwrap()),
            full_name: Set(None),
            phone: Set(None),
            address: Set(None),
            is_staff: Set(is_staff),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        account
            .insert(&*self.state.db)
            .await
            .expect("failed to create test user")
    }

    pub async fn create_book(&self, title: &str, price: Decimal, stock: i32) -> book::Model {
        self.create_book_in_category(title, price, stock, None).await
    }

    pub async fn create_book_in_category(
        &self,
        title: &str,
        price: Decimal,
        stock: i32,
        category_id: Option<Uuid>,
    ) -> book::Model {
        let now = Utc::now();
        let book = book::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            slug: Set(slugify(title)),
            author: Set("Test Author".to_string()),
            price: Set(price),
            stock: Set(stock),
            category_id: Set(category_id),
            image_url: Set(None),
            description: Set(String::new()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        book.insert(&*self.state.db)
            .await
            .expect("failed to create test book")
    }

    pub async fn create_category(&self, name: &str) -> category::Model {
        let category = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(slugify(name)),
        };

        category
            .insert(&*self.state.db)
            .await
            .expect("failed to create test category")
    }

    /// Inserts an order directly, bypassing checkout, for history and
    /// dashboard fixtures that need explicit timestamps.
    pub async fn create_order(
        &self,
        user_id: Uuid,
        status: OrderStatus,
        total_price: Decimal,
        created_at: DateTime<Utc>,
    ) -> order::Model {
        let order = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            full_name: Set("Test Customer".to_string()),
            email: Set("customer@example.com".to_string()),
            phone: Set("0912345678".to_string()),
            address: Set("1 Test Street".to_string()),
            payment_method: Set(PaymentMethod::CashOnDelivery),
            status: Set(status),
            total_price: Set(total_price),
            created_at: Set(created_at),
            updated_at: Set(created_at),
        };

        order
            .insert(&*self.state.db)
            .await
            .expect("failed to create test order")
    }

    pub async fn create_order_item(
        &self,
        order_id: Uuid,
        book_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
    ) -> order_item::Model {
        let item = order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            book_id: Set(book_id),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            created_at: Set(Utc::now()),
        };

        item.insert(&*self.state.db)
            .await
            .expect("failed to create test order item")
    }
}

async fn inject_auth_service(
    State(auth): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Response {
    req.extensions_mut().insert(auth);
    next.run(req).await
}
