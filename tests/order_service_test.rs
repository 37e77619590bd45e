mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use bookstore_api::{
    entities::{order_item, OrderItem, OrderStatus},
    errors::ServiceError,
};

#[tokio::test]
async fn history_is_most_recent_first_and_scoped_to_user() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice", false).await;
    let bob = app.create_user("bob", false).await;

    let now = Utc::now();
    let older = app
        .create_order(alice.id, OrderStatus::Pending, dec!(10.00), now - Duration::hours(2))
        .await;
    let newer = app
        .create_order(alice.id, OrderStatus::Pending, dec!(20.00), now - Duration::hours(1))
        .await;
    app.create_order(bob.id, OrderStatus::Pending, dec!(30.00), now)
        .await;

    let history = app
        .state
        .services
        .orders
        .list_for_user(alice.id)
        .await
        .unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, newer.id);
    assert_eq!(history[1].id, older.id);
}

#[tokio::test]
async fn order_detail_enforces_ownership() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice", false).await;
    let mallory = app.create_user("mallory", false).await;

    let order = app
        .create_order(alice.id, OrderStatus::Pending, dec!(10.00), Utc::now())
        .await;

    let detail = app
        .state
        .services
        .orders
        .get_for_user(alice.id, order.id)
        .await
        .expect("owner can read the order");
    assert_eq!(detail.order.id, order.id);

    let result = app
        .state
        .services
        .orders
        .get_for_user(mallory.id, order.id)
        .await;
    assert!(matches!(result, Err(ServiceError::Forbidden(_))));

    let result = app
        .state
        .services
        .orders
        .get_for_user(alice.id, uuid::Uuid::new_v4())
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn approve_completes_a_pending_order() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice", false).await;
    let order = app
        .create_order(alice.id, OrderStatus::Pending, dec!(10.00), Utc::now())
        .await;

    let approved = app.state.services.orders.approve(order.id).await.unwrap();
    assert_eq!(approved.status, OrderStatus::Completed);
}

#[tokio::test]
async fn approve_is_idempotent() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice", false).await;
    let order = app
        .create_order(alice.id, OrderStatus::Pending, dec!(10.00), Utc::now())
        .await;

    let first = app.state.services.orders.approve(order.id).await.unwrap();
    let second = app.state.services.orders.approve(order.id).await.unwrap();

    assert_eq!(first.status, OrderStatus::Completed);
    assert_eq!(second.status, OrderStatus::Completed);
    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn delete_removes_order_and_items() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice", false).await;
    let book = app.create_book("Dune", dec!(10.00), 10).await;

    let order = app
        .create_order(alice.id, OrderStatus::Pending, dec!(20.00), Utc::now())
        .await;
    app.create_order_item(order.id, book.id, 2, dec!(10.00)).await;

    app.state
        .services
        .orders
        .delete(order.id)
        .await
        .expect("delete should succeed");

    let orphans = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert!(orphans.is_empty());

    let result = app.state.services.orders.approve(order.id).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn admin_listing_shows_all_orders_newest_first() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice", false).await;
    let bob = app.create_user("bob", false).await;

    let now = Utc::now();
    app.create_order(alice.id, OrderStatus::Pending, dec!(10.00), now - Duration::hours(1))
        .await;
    let newest = app
        .create_order(bob.id, OrderStatus::Completed, dec!(20.00), now)
        .await;

    let all = app.state.services.orders.list_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, newest.id);
}
