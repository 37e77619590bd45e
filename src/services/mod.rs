//! Business logic, one service per workflow.

pub mod cart;
pub mod catalog;
pub mod categories;
pub mod checkout;
pub mod dashboard;
pub mod orders;
pub mod reviews;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use categories::CategoryService;
pub use checkout::CheckoutService;
pub use dashboard::DashboardService;
pub use orders::OrderService;
pub use reviews::ReviewService;
