use crate::{
    entities::{book, order, order_item, Book, Order, OrderItem, OrderStatus},
    errors::ServiceError,
};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

const TOP_BOOKS_LIMIT: usize = 5;

/// Read-only revenue dashboard for the admin back office.
///
/// Only completed orders count. The aggregation loads the completed orders
/// and folds in code; a store with zero completed orders yields zero
/// revenue and an empty best-seller list.
#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DatabaseConnection>,
}

impl DashboardService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Dashboard figures as of now.
    pub async fn stats(&self) -> Result<DashboardStats, ServiceError> {
        self.stats_at(Utc::now()).await
    }

    /// Dashboard figures relative to the given instant: revenue for that
    /// day, revenue for that calendar month, and the top sellers.
    #[instrument(skip(self))]
    pub async fn stats_at(&self, now: DateTime<Utc>) -> Result<DashboardStats, ServiceError> {
        let completed = Order::find()
            .filter(order::Column::Status.eq(OrderStatus::Completed))
            .all(&*self.db)
            .await?;

        let today = now.date_naive();
        let today_revenue: Decimal = completed
            .iter()
            .filter(|o| o.created_at.date_naive() == today)
            .map(|o| o.total_price)
            .sum();
        let month_revenue: Decimal = completed
            .iter()
            .filter(|o| o.created_at.year() == now.year() && o.created_at.month() == now.month())
            .map(|o| o.total_price)
            .sum();

        let top_books = self.top_books(&completed).await?;

        Ok(DashboardStats {
            today_revenue,
            month_revenue,
            top_books,
        })
    }

    async fn top_books(
        &self,
        completed: &[order::Model],
    ) -> Result<Vec<TopBook>, ServiceError> {
        if completed.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<Uuid> = completed.iter().map(|o| o.id).collect();
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        // Fold quantities per book, remembering first-seen order so ties
        // rank by insertion.
        let mut quantity_sold: HashMap<Uuid, i64> = HashMap::new();
        let mut first_seen: Vec<Uuid> = Vec::new();
        for item in &items {
            if !quantity_sold.contains_key(&item.book_id) {
                first_seen.push(item.book_id);
            }
            *quantity_sold.entry(item.book_id).or_insert(0) += i64::from(item.quantity);
        }

        let mut ranked: Vec<(Uuid, i64)> = first_seen
            .into_iter()
            .map(|book_id| (book_id, quantity_sold[&book_id]))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(TOP_BOOKS_LIMIT);

        let book_ids: Vec<Uuid> = ranked.iter().map(|(id, _)| *id).collect();
        let books: HashMap<Uuid, book::Model> = Book::find()
            .filter(book::Column::Id.is_in(book_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        Ok(ranked
            .into_iter()
            .filter_map(|(book_id, quantity)| {
                books.get(&book_id).map(|b| TopBook {
                    book_id,
                    title: b.title.clone(),
                    author: b.author.clone(),
                    quantity_sold: quantity,
                })
            })
            .collect())
    }
}

/// One best-seller row
#[derive(Debug, Serialize, Deserialize)]
pub struct TopBook {
    pub book_id: Uuid,
    pub title: String,
    pub author: String,
    pub quantity_sold: i64,
}

/// Aggregated dashboard figures
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardStats {
    pub today_revenue: Decimal,
    pub month_revenue: Decimal,
    pub top_books: Vec<TopBook>,
}
