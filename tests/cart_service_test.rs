mod common;

use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use bookstore_api::{errors::ServiceError, services::cart::AddToCartInput};

#[tokio::test]
async fn add_item_creates_cart_line() {
    let app = TestApp::new().await;
    let user = app.create_user("alice", false).await;
    let book = app.create_book("Dune", dec!(12.50), 10).await;

    let cart = app
        .state
        .services
        .cart
        .add_item(
            user.id,
            AddToCartInput {
                book_id: book.id,
                quantity: 2,
            },
        )
        .await
        .expect("add should succeed");

    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].item.quantity, 2);
    assert_eq!(cart.lines[0].line_total, dec!(25.00));
    assert_eq!(cart.subtotal, dec!(25.00));
}

#[tokio::test]
async fn adding_same_book_increments_existing_line() {
    let app = TestApp::new().await;
    let user = app.create_user("alice", false).await;
    let book = app.create_book("Dune", dec!(10.00), 10).await;

    app.state
        .services
        .cart
        .add_item(
            user.id,
            AddToCartInput {
                book_id: book.id,
                quantity: 2,
            },
        )
        .await
        .unwrap();

    let cart = app
        .state
        .services
        .cart
        .add_item(
            user.id,
            AddToCartInput {
                book_id: book.id,
                quantity: 3,
            },
        )
        .await
        .unwrap();

    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].item.quantity, 5);
    assert_eq!(cart.subtotal, dec!(50.00));
}

#[tokio::test]
async fn add_beyond_stock_is_rejected() {
    let app = TestApp::new().await;
    let user = app.create_user("alice", false).await;
    let book = app.create_book("Dune", dec!(10.00), 3).await;

    let result = app
        .state
        .services
        .cart
        .add_item(
            user.id,
            AddToCartInput {
                book_id: book.id,
                quantity: 4,
            },
        )
        .await;

    assert!(matches!(result, Err(ServiceError::InsufficientStock(_))));

    // Incrementing past stock is rejected too.
    app.state
        .services
        .cart
        .add_item(
            user.id,
            AddToCartInput {
                book_id: book.id,
                quantity: 2,
            },
        )
        .await
        .unwrap();

    let result = app
        .state
        .services
        .cart
        .add_item(
            user.id,
            AddToCartInput {
                book_id: book.id,
                quantity: 2,
            },
        )
        .await;

    assert!(matches!(result, Err(ServiceError::InsufficientStock(_))));
}

#[tokio::test]
async fn add_unknown_book_is_not_found() {
    let app = TestApp::new().await;
    let user = app.create_user("alice", false).await;

    let result = app
        .state
        .services
        .cart
        .add_item(
            user.id,
            AddToCartInput {
                book_id: Uuid::new_v4(),
                quantity: 1,
            },
        )
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn update_quantity_recomputes_subtotal() {
    let app = TestApp::new().await;
    let user = app.create_user("alice", false).await;
    let book = app.create_book("Dune", dec!(25.00), 10).await;

    let cart = app
        .state
        .services
        .cart
        .add_item(
            user.id,
            AddToCartInput {
                book_id: book.id,
                quantity: 2,
            },
        )
        .await
        .unwrap();
    let item_id = cart.lines[0].item.id;

    let cart = app
        .state
        .services
        .cart
        .update_item_quantity(user.id, item_id, 5)
        .await
        .expect("update should succeed");

    assert_eq!(cart.lines[0].item.quantity, 5);
    assert_eq!(cart.subtotal, dec!(125.00));
}

#[tokio::test]
async fn update_quantity_to_zero_removes_line() {
    let app = TestApp::new().await;
    let user = app.create_user("alice", false).await;
    let book = app.create_book("Dune", dec!(15.00), 10).await;

    let cart = app
        .state
        .services
        .cart
        .add_item(
            user.id,
            AddToCartInput {
                book_id: book.id,
                quantity: 2,
            },
        )
        .await
        .unwrap();
    let item_id = cart.lines[0].item.id;

    let cart = app
        .state
        .services
        .cart
        .update_item_quantity(user.id, item_id, 0)
        .await
        .expect("removal should succeed");

    assert!(cart.lines.is_empty());
    assert_eq!(cart.subtotal, Decimal::ZERO);
}

#[tokio::test]
async fn cart_line_of_another_user_is_forbidden() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice", false).await;
    let mallory = app.create_user("mallory", false).await;
    let book = app.create_book("Dune", dec!(10.00), 10).await;

    let cart = app
        .state
        .services
        .cart
        .add_item(
            alice.id,
            AddToCartInput {
                book_id: book.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();
    let item_id = cart.lines[0].item.id;

    let result = app
        .state
        .services
        .cart
        .update_item_quantity(mallory.id, item_id, 3)
        .await;
    assert!(matches!(result, Err(ServiceError::Forbidden(_))));

    let result = app.state.services.cart.remove_item(mallory.id, item_id).await;
    assert!(matches!(result, Err(ServiceError::Forbidden(_))));
}

#[tokio::test]
async fn cart_view_sums_multiple_books() {
    let app = TestApp::new().await;
    let user = app.create_user("alice", false).await;
    let first = app.create_book("Dune", dec!(10.50), 10).await;
    let second = app.create_book("Hyperion", dec!(25.75), 10).await;

    app.state
        .services
        .cart
        .add_item(
            user.id,
            AddToCartInput {
                book_id: first.id,
                quantity: 2,
            },
        )
        .await
        .unwrap();
    app.state
        .services
        .cart
        .add_item(
            user.id,
            AddToCartInput {
                book_id: second.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();

    let cart = app.state.services.cart.get_cart(user.id).await.unwrap();

    assert_eq!(cart.lines.len(), 2);
    // (10.50 * 2) + 25.75 = 46.75
    assert_eq!(cart.subtotal, dec!(46.75));
}
