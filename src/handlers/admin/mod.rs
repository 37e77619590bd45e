//! Staff-gated management handlers. The staff check itself is composed at
//! route registration (see `api_routes`), not inside the handlers.

pub mod books;
pub mod categories;
pub mod dashboard;
pub mod orders;
