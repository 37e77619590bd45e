pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod common;
pub mod orders;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<crate::services::CatalogService>,
    pub categories: Arc<crate::services::CategoryService>,
    pub cart: Arc<crate::services::CartService>,
    pub checkout: Arc<crate::services::CheckoutService>,
    pub orders: Arc<crate::services::OrderService>,
    pub reviews: Arc<crate::services::ReviewService>,
    pub dashboard: Arc<crate::services::DashboardService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let catalog = Arc::new(crate::services::CatalogService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let categories = Arc::new(crate::services::CategoryService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let cart = Arc::new(crate::services::CartService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let checkout = Arc::new(crate::services::CheckoutService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let orders = Arc::new(crate::services::OrderService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let reviews = Arc::new(crate::services::ReviewService::new(
            db_pool.clone(),
            event_sender,
        ));
        let dashboard = Arc::new(crate::services::DashboardService::new(db_pool));

        Self {
            catalog,
            categories,
            cart,
            checkout,
            orders,
            reviews,
            dashboard,
        }
    }
}
