use crate::{
    entities::{book, review, Book, ReviewModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Review submission. Ratings are bounded to 1..=5; a user may review the
/// same book repeatedly (no uniqueness on the pair).
#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Attaches a review to the active book with the given slug.
    #[instrument(skip(self, input))]
    pub async fn submit(
        &self,
        user_id: Uuid,
        book_slug: &str,
        input: SubmitReviewInput,
    ) -> Result<ReviewModel, ServiceError> {
        if !(MIN_RATING..=MAX_RATING).contains(&input.rating) {
            return Err(ServiceError::InvalidInput(format!(
                "rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        let book = Book::find()
            .filter(book::Column::Slug.eq(book_slug))
            .filter(book::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book '{}' not found", book_slug)))?;

        let review = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            book_id: Set(book.id),
            user_id: Set(user_id),
            rating: Set(input.rating),
            comment: Set(input.comment),
            created_at: Set(Utc::now()),
        };

        let review = review.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ReviewSubmitted {
                book_id: book.id,
                review_id: review.id,
            })
            .await;

        info!("Review {} submitted for book {}", review.id, book.id);
        Ok(review)
    }
}

/// Review submission input
#[derive(Debug, Deserialize)]
pub struct SubmitReviewInput {
    pub rating: i32,
    pub comment: String,
}
