mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use bookstore_api::entities::OrderStatus;

#[tokio::test]
async fn empty_store_reports_zero_revenue() {
    let app = TestApp::new().await;

    let stats = app.state.services.dashboard.stats().await.unwrap();

    assert_eq!(stats.today_revenue, Decimal::ZERO);
    assert_eq!(stats.month_revenue, Decimal::ZERO);
    assert!(stats.top_books.is_empty());
}

#[tokio::test]
async fn pending_orders_do_not_count() {
    let app = TestApp::new().await;
    let user = app.create_user("alice", false).await;

    app.create_order(user.id, OrderStatus::Pending, dec!(100.00), Utc::now())
        .await;

    let stats = app.state.services.dashboard.stats().await.unwrap();
    assert_eq!(stats.today_revenue, Decimal::ZERO);
    assert_eq!(stats.month_revenue, Decimal::ZERO);
    assert!(stats.top_books.is_empty());
}

#[tokio::test]
async fn completed_orders_split_into_today_and_month() {
    let app = TestApp::new().await;
    let user = app.create_user("alice", false).await;
    let now = Utc::now();

    // Today, completed.
    app.create_order(user.id, OrderStatus::Completed, dec!(25.00), now)
        .await;
    // Out of the current calendar month (and day), completed.
    app.create_order(
        user.id,
        OrderStatus::Completed,
        dec!(40.00),
        now - Duration::days(45),
    )
    .await;
    // Today but still pending.
    app.create_order(user.id, OrderStatus::Pending, dec!(99.00), now)
        .await;

    let stats = app.state.services.dashboard.stats_at(now).await.unwrap();

    assert_eq!(stats.today_revenue, dec!(25.00));
    assert_eq!(stats.month_revenue, dec!(25.00));
}

#[tokio::test]
async fn top_books_ranked_by_quantity_and_capped_at_five() {
    let app = TestApp::new().await;
    let user = app.create_user("alice", false).await;
    let now = Utc::now();

    let completed = app
        .create_order(user.id, OrderStatus::Completed, dec!(0.00), now)
        .await;
    let ignored = app
        .create_order(user.id, OrderStatus::Pending, dec!(0.00), now)
        .await;

    let mut books = Vec::new();
    for i in 0..6 {
        let book = app
            .create_book(&format!("Ranked Book {}", i), dec!(5.00), 100)
            .await;
        // Quantities 1..=6 so the last book sells best.
        app.create_order_item(completed.id, book.id, i + 1, dec!(5.00))
            .await;
        books.push(book);
    }

    // Sales on a pending order must not count.
    app.create_order_item(ignored.id, books[0].id, 50, dec!(5.00))
        .await;

    let stats = app.state.services.dashboard.stats_at(now).await.unwrap();

    assert_eq!(stats.top_books.len(), 5);
    assert_eq!(stats.top_books[0].title, "Ranked Book 5");
    assert_eq!(stats.top_books[0].quantity_sold, 6);
    // The one-copy seller fell off the top five.
    assert!(stats
        .top_books
        .iter()
        .all(|top| top.title != "Ranked Book 0"));
}

#[tokio::test]
async fn quantities_aggregate_across_orders() {
    let app = TestApp::new().await;
    let user = app.create_user("alice", false).await;
    let now = Utc::now();

    let book = app.create_book("Aggregated Book", dec!(5.00), 100).await;
    for _ in 0..2 {
        let order = app
            .create_order(user.id, OrderStatus::Completed, dec!(15.00), now)
            .await;
        app.create_order_item(order.id, book.id, 3, dec!(5.00)).await;
    }

    let stats = app.state.services.dashboard.stats_at(now).await.unwrap();
    assert_eq!(stats.top_books.len(), 1);
    assert_eq!(stats.top_books[0].quantity_sold, 6);
    assert_eq!(stats.today_revenue, dec!(30.00));
}
