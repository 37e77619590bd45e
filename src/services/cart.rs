use crate::{
    entities::{book, cart_item, Book, BookModel, CartItem, CartItemModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Shopping cart service.
///
/// A cart is the set of cart lines owned by a user; there is at most one
/// line per (user, book). Adding an already-carted book increments the
/// existing line. Quantities are checked against current stock on every
/// mutation; the checkout service re-checks inside its own transaction,
/// which is the authoritative gate.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Adds a book to the user's cart, or increments the existing line.
    ///
    /// Rejects unknown or inactive books and quantities that would push the
    /// line above the book's current stock.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        input: AddToCartInput,
    ) -> Result<CartView, ServiceError> {
        if input.quantity <= 0 {
            return Err(ServiceError::InvalidInput(
                "quantity must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let book = Book::find_by_id(input.book_id)
            .filter(book::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book {} not found", input.book_id)))?;

        let existing_item = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::BookId.eq(input.book_id))
            .one(&txn)
            .await?;

        let requested = existing_item
            .as_ref()
            .map(|item| item.quantity)
            .unwrap_or(0)
            + input.quantity;

        if requested > book.stock {
            return Err(ServiceError::InsufficientStock(format!(
                "only {} copies of '{}' in stock",
                book.stock, book.title
            )));
        }

        if let Some(item) = existing_item {
            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(requested);
            item.updated_at = Set(Utc::now());
            item.update(&txn).await?;
        } else {
            let item = cart_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                book_id: Set(input.book_id),
                quantity: Set(input.quantity),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
            };
            item.insert(&txn).await?;
        }

        let view = self.load_view(&txn, user_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                user_id,
                book_id: input.book_id,
            })
            .await;

        info!(
            "Added to cart for {}: book {} x{}",
            user_id, input.book_id, input.quantity
        );
        Ok(view)
    }

    /// Sets the quantity of a cart line. A quantity of zero or less removes
    /// the line. The line must belong to the given user.
    #[instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;

        let item = CartItem::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        if item.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "cart item belongs to another user".to_string(),
            ));
        }

        if quantity <= 0 {
            item.delete(&txn).await?;

            let view = self.load_view(&txn, user_id).await?;
            txn.commit().await?;

            self.event_sender
                .send_or_log(Event::CartItemRemoved { user_id, item_id })
                .await;

            return Ok(view);
        }

        let book = Book::find_by_id(item.book_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book {} not found", item.book_id)))?;

        if quantity > book.stock {
            return Err(ServiceError::InsufficientStock(format!(
                "only {} copies of '{}' in stock",
                book.stock, book.title
            )));
        }

        let mut item: cart_item::ActiveModel = item.into();
        item.quantity = Set(quantity);
        item.updated_at = Set(Utc::now());
        item.update(&txn).await?;

        let view = self.load_view(&txn, user_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemUpdated { user_id, item_id })
            .await;

        Ok(view)
    }

    /// Removes a cart line (ownership enforced).
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<CartView, ServiceError> {
        self.update_item_quantity(user_id, item_id, 0).await
    }

    /// Returns the user's cart lines with their books and the computed
    /// subtotal.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartView, ServiceError> {
        self.load_view(&*self.db, user_id).await
    }

    async fn load_view(
        &self,
        conn: &impl ConnectionTrait,
        user_id: Uuid,
    ) -> Result<CartView, ServiceError> {
        let rows = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .find_also_related(Book)
            .all(conn)
            .await?;

        let mut lines = Vec::with_capacity(rows.len());
        let mut subtotal = Decimal::ZERO;

        for (item, book) in rows {
            // Book deletion cascades to cart lines, so the join always hits.
            let book = book.ok_or_else(|| {
                ServiceError::InternalError(format!("cart item {} lost its book", item.id))
            })?;

            let line_total = book.price * Decimal::from(item.quantity);
            subtotal += line_total;
            lines.push(CartLine {
                item,
                book,
                line_total,
            });
        }

        Ok(CartView { lines, subtotal })
    }
}

/// Input for adding a book to the cart
#[derive(Debug, Deserialize)]
pub struct AddToCartInput {
    pub book_id: Uuid,
    pub quantity: i32,
}

/// One cart line joined with its book
#[derive(Debug, Serialize)]
pub struct CartLine {
    pub item: CartItemModel,
    pub book: BookModel,
    pub line_total: Decimal,
}

/// The user's cart: lines plus the computed subtotal
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn add_to_cart_input_deserialization() {
        let json = r#"{
            "book_id": "550e8400-e29b-41d4-a716-446655440000",
            "quantity": 3
        }"#;

        let input: AddToCartInput = serde_json::from_str(json).expect("valid input");
        assert_eq!(input.quantity, 3);
        assert_eq!(
            input.book_id.to_string(),
            "550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn line_total_math() {
        let unit_price = dec!(10.00);
        let quantity = 2;
        assert_eq!(unit_price * Decimal::from(quantity), dec!(20.00));
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let line_totals = [dec!(20.00), dec!(5.00)];
        let subtotal: Decimal = line_totals.iter().copied().sum();
        assert_eq!(subtotal, dec!(25.00));
    }
}
