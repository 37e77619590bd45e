use crate::{
    entities::{
        book, cart_item, category, order_item, review, Book, BookModel, CartItem, Category,
        OrderItem, Review,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    slug::slugify,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

/// Catalog service: storefront browsing plus the admin book surface.
///
/// Storefront queries only ever see active books; the admin listing shows
/// everything. Slugs are derived from the title at creation time and stay
/// stable across updates so book URLs never break.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Storefront listing: active books, optionally narrowed to a category
    /// slug and/or a title/author search term. An unknown category slug
    /// yields an empty result rather than an error.
    #[instrument(skip(self))]
    pub async fn list_active_books(
        &self,
        query: BookSearchQuery,
    ) -> Result<BookListResult, ServiceError> {
        let mut db_query = Book::find().filter(book::Column::IsActive.eq(true));

        if let Some(category_slug) = &query.category {
            let category = Category::find()
                .filter(category::Column::Slug.eq(category_slug.clone()))
                .one(&*self.db)
                .await?;

            match category {
                Some(category) => {
                    db_query = db_query.filter(book::Column::CategoryId.eq(category.id));
                }
                None => {
                    return Ok(BookListResult {
                        books: Vec::new(),
                        total: 0,
                    });
                }
            }
        }

        if let Some(search) = &query.search {
            db_query = db_query.filter(
                book::Column::Title
                    .contains(search)
                    .or(book::Column::Author.contains(search)),
            );
        }

        let total = db_query.clone().count(&*self.db).await?;

        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = query.offset.unwrap_or(0);

        let books = db_query
            .order_by_asc(book::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;

        Ok(BookListResult { books, total })
    }

    /// Storefront detail: a single active book with its reviews, newest
    /// first.
    #[instrument(skip(self))]
    pub async fn get_book_by_slug(&self, slug: &str) -> Result<BookWithReviews, ServiceError> {
        let book = Book::find()
            .filter(book::Column::Slug.eq(slug))
            .filter(book::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book '{}' not found", slug)))?;

        let reviews = book
            .find_related(Review)
            .order_by_desc(review::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(BookWithReviews { book, reviews })
    }

    /// Admin listing: every book, newest first, inactive ones included.
    pub async fn list_all_books(&self) -> Result<Vec<BookModel>, ServiceError> {
        Book::find()
            .order_by_desc(book::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Fetch a book by id regardless of visibility (admin surface).
    pub async fn get_book(&self, book_id: Uuid) -> Result<BookModel, ServiceError> {
        Book::find_by_id(book_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book {} not found", book_id)))
    }

    /// Creates a book, deriving a unique slug from the title.
    #[instrument(skip(self))]
    pub async fn create_book(&self, input: CreateBookInput) -> Result<BookModel, ServiceError> {
        if input.price < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "price must not be negative".to_string(),
            ));
        }
        if input.stock < 0 {
            return Err(ServiceError::InvalidInput(
                "stock must not be negative".to_string(),
            ));
        }
        if let Some(category_id) = input.category_id {
            self.ensure_category_exists(category_id).await?;
        }

        let slug = self.ensure_unique_slug(&input.title, None).await?;
        let now = Utc::now();
        let book_id = Uuid::new_v4();

        let book = book::ActiveModel {
            id: Set(book_id),
            title: Set(input.title),
            slug: Set(slug),
            author: Set(input.author),
            price: Set(input.price),
            stock: Set(input.stock),
            category_id: Set(input.category_id),
            image_url: Set(input.image_url),
            description: Set(input.description),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let book = book.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::BookCreated(book_id))
            .await;

        info!("Created book: {}", book_id);
        Ok(book)
    }

    /// Updates a book. Absent fields keep their current value; in
    /// particular, omitting `image_url` preserves the existing image and the
    /// slug never changes.
    #[instrument(skip(self))]
    pub async fn update_book(
        &self,
        book_id: Uuid,
        input: UpdateBookInput,
    ) -> Result<BookModel, ServiceError> {
        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(
                    "price must not be negative".to_string(),
                ));
            }
        }
        if let Some(stock) = input.stock {
            if stock < 0 {
                return Err(ServiceError::InvalidInput(
                    "stock must not be negative".to_string(),
                ));
            }
        }
        if let Some(category_id) = input.category_id {
            self.ensure_category_exists(category_id).await?;
        }

        let book = self.get_book(book_id).await?;
        let mut active: book::ActiveModel = book.into();

        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(author) = input.author {
            active.author = Set(author);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(stock) = input.stock {
            active.stock = Set(stock);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let book = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::BookUpdated(book_id))
            .await;

        info!("Updated book: {}", book_id);
        Ok(book)
    }

    /// Deletes a book together with its cart lines and reviews. Books with
    /// order history are protected: order items must keep their captured
    /// prices, so the book can only be deactivated.
    #[instrument(skip(self))]
    pub async fn delete_book(&self, book_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let book = Book::find_by_id(book_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book {} not found", book_id)))?;

        let ordered = OrderItem::find()
            .filter(order_item::Column::BookId.eq(book_id))
            .count(&txn)
            .await?;
        if ordered > 0 {
            return Err(ServiceError::Conflict(format!(
                "Book '{}' has order history; deactivate it instead of deleting",
                book.title
            )));
        }

        CartItem::delete_many()
            .filter(cart_item::Column::BookId.eq(book_id))
            .exec(&txn)
            .await?;
        Review::delete_many()
            .filter(review::Column::BookId.eq(book_id))
            .exec(&txn)
            .await?;
        book.delete(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::BookDeleted(book_id))
            .await;

        info!("Deleted book: {}", book_id);
        Ok(())
    }

    async fn ensure_category_exists(&self, category_id: Uuid) -> Result<(), ServiceError> {
        Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))
    }

    /// Derives a slug from the title, appending `-2`, `-3`, ... until it is
    /// unique among books.
    async fn ensure_unique_slug(
        &self,
        title: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<String, ServiceError> {
        let base = slugify(title);
        if base.is_empty() {
            return Err(ServiceError::InvalidInput(
                "title must contain at least one alphanumeric character".to_string(),
            ));
        }

        let mut candidate = base.clone();
        let mut suffix = 2u32;
        loop {
            let mut query = Book::find().filter(book::Column::Slug.eq(candidate.clone()));
            if let Some(id) = exclude_id {
                query = query.filter(book::Column::Id.ne(id));
            }
            if query.one(&*self.db).await?.is_none() {
                return Ok(candidate);
            }
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
    }
}

/// Input for creating a book
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateBookInput {
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub description: String,
    pub is_active: bool,
}

/// Input for updating a book; absent fields are preserved
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateBookInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Storefront search parameters
#[derive(Debug, Clone, Deserialize)]
pub struct BookSearchQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Storefront listing result
#[derive(Debug, Serialize)]
pub struct BookListResult {
    pub books: Vec<BookModel>,
    pub total: u64,
}

/// Book detail with attached reviews
#[derive(Debug, Serialize)]
pub struct BookWithReviews {
    pub book: BookModel,
    pub reviews: Vec<review::Model>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn create_book_input_deserialization() {
        let json = r#"{
            "title": "The Left Hand of Darkness",
            "author": "Ursula K. Le Guin",
            "price": "9.99",
            "stock": 12,
            "description": "A novel",
            "is_active": true
        }"#;

        let input: CreateBookInput = serde_json::from_str(json).expect("valid input");
        assert_eq!(input.title, "The Left Hand of Darkness");
        assert_eq!(input.price, dec!(9.99));
        assert_eq!(input.stock, 12);
        assert!(input.category_id.is_none());
        assert!(input.image_url.is_none());
    }

    #[test]
    fn update_book_input_defaults_to_no_changes() {
        let input = UpdateBookInput::default();
        assert!(input.title.is_none());
        assert!(input.price.is_none());
        assert!(input.image_url.is_none());
        assert!(input.is_active.is_none());
    }

    #[test]
    fn search_query_limit_capping() {
        let requested: u64 = 500;
        assert_eq!(requested.min(MAX_LIMIT), 100);
        assert_eq!(DEFAULT_LIMIT, 20);
    }
}
