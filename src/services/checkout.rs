use crate::{
    entities::{
        book, cart_item, order, order_item, Book, CartItem, OrderModel, OrderStatus, PaymentMethod,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Checkout service: converts a user's cart into an order.
///
/// The whole conversion runs in one transaction: read the cart, verify
/// stock, create the order and its items with captured unit prices,
/// decrement stock, clear the cart. A concurrent cart edit or duplicate
/// checkout can therefore never observe a half-created order or
/// double-decremented stock.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Places an order from the user's current cart lines.
    ///
    /// Fails with `InvalidOperation` when the cart is empty and with
    /// `InsufficientStock` when any line exceeds the book's current stock;
    /// neither case mutates anything.
    #[instrument(skip(self, input))]
    pub async fn place_order(
        &self,
        user_id: Uuid,
        input: CheckoutInput,
    ) -> Result<OrderModel, ServiceError> {
        let txn = self.db.begin().await?;

        let lines = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .find_also_related(Book)
            .all(&txn)
            .await?;

        if lines.is_empty() {
            return Err(ServiceError::InvalidOperation("cart is empty".to_string()));
        }

        let mut checked = Vec::with_capacity(lines.len());
        for (item, book) in lines {
            let book = book.ok_or_else(|| {
                ServiceError::InternalError(format!("cart item {} lost its book", item.id))
            })?;

            if !book.is_active {
                return Err(ServiceError::InvalidOperation(format!(
                    "'{}' is no longer available",
                    book.title
                )));
            }
            if item.quantity > book.stock {
                return Err(ServiceError::InsufficientStock(format!(
                    "only {} copies of '{}' in stock",
                    book.stock, book.title
                )));
            }

            checked.push((item, book));
        }

        let total_price: Decimal = checked
            .iter()
            .map(|(item, book)| book.price * Decimal::from(item.quantity))
            .sum();

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let order = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            full_name: Set(input.full_name),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(input.address),
            payment_method: Set(input.payment_method),
            status: Set(OrderStatus::Pending),
            total_price: Set(total_price),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let order = order.insert(&txn).await?;

        for (item, book) in &checked {
            let order_item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                book_id: Set(book.id),
                quantity: Set(item.quantity),
                // Unit price is captured here; later catalog changes must
                // not follow into the order.
                unit_price: Set(book.price),
                created_at: Set(now),
            };
            order_item.insert(&txn).await?;

            let new_stock = book.stock - item.quantity;
            let mut book_update: book::ActiveModel = book.clone().into();
            book_update.stock = Set(new_stock);
            book_update.updated_at = Set(now);
            book_update.update(&txn).await?;
        }

        CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderPlaced { order_id, user_id })
            .await;

        info!(
            "Placed order {} for user {}: {} line(s), total {}",
            order_id,
            user_id,
            checked.len(),
            total_price
        );
        Ok(order)
    }
}

/// Shipping and payment details submitted at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutInput {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub payment_method: PaymentMethod,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn checkout_input_deserialization() {
        let json = r#"{
            "full_name": "An Nguyen",
            "email": "an@example.com",
            "phone": "0912345678",
            "address": "12 Tran Hung Dao, Hanoi",
            "payment_method": "cash_on_delivery"
        }"#;

        let input: CheckoutInput = serde_json::from_str(json).expect("valid input");
        assert_eq!(input.full_name, "An Nguyen");
        assert_eq!(input.payment_method, PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn payment_method_wire_format() {
        let json = serde_json::to_string(&PaymentMethod::BankTransfer).unwrap();
        assert_eq!(json, "\"bank_transfer\"");
    }

    #[test]
    fn order_total_is_sum_of_line_totals() {
        let lines = [(dec!(10.00), 2), (dec!(5.00), 1)];
        let total: Decimal = lines
            .iter()
            .map(|(price, qty)| *price * Decimal::from(*qty))
            .sum();
        assert_eq!(total, dec!(25.00));
    }
}
