use crate::{
    entities::{order, order_item, Order, OrderItem, OrderModel, OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Order service: customer order history and the admin moderation workflow.
///
/// Status machine: `pending → completed` via approve (idempotent), and
/// deletion (from either status) removes the order and its items, which is
/// terminal.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// The requesting user's orders, most recent first.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderModel>, ServiceError> {
        Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// A single order with its items. Ownership is enforced here: a
    /// non-owner gets `Forbidden`, never the order contents.
    #[instrument(skip(self))]
    pub async fn get_for_user(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderWithItems, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "order belongs to another user".to_string(),
            ));
        }

        let items = order.find_related(OrderItem).all(&*self.db).await?;
        Ok(OrderWithItems { order, items })
    }

    /// All orders for admin review, newest first.
    pub async fn list_all(&self) -> Result<Vec<OrderModel>, ServiceError> {
        Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Approves an order (pending to completed). Idempotent: re-approving a
    /// completed order is a no-op that returns the unchanged order.
    #[instrument(skip(self))]
    pub async fn approve(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.status == OrderStatus::Completed {
            info!("Order {} already completed; approve is a no-op", order_id);
            return Ok(order);
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Completed);
        active.updated_at = Set(Utc::now());
        let order = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderApproved(order_id))
            .await;

        info!("Approved order {}", order_id);
        Ok(order)
    }

    /// Deletes an order and all of its items. Terminal: there is no
    /// transition out of deletion, and stock is not restored.
    #[instrument(skip(self))]
    pub async fn delete(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        OrderItem::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;
        order.delete(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderDeleted(order_id))
            .await;

        info!("Deleted order {}", order_id);
        Ok(())
    }
}

/// Order with its items
#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    pub order: OrderModel,
    pub items: Vec<order_item::Model>,
}
