use crate::{
    entities::{book, category, Book, Category, CategoryModel},
    errors::ServiceError,
    events::{Event, EventSender},
    slug::slugify,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Category service for the admin back office.
///
/// Slugs are derived from the name when not supplied; collisions resolve
/// deterministically with numeric suffixes. Deleting a category detaches its
/// books (their `category_id` becomes NULL) rather than deleting them.
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    pub async fn list(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    pub async fn get(&self, category_id: Uuid) -> Result<CategoryModel, ServiceError> {
        Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateCategoryInput) -> Result<CategoryModel, ServiceError> {
        self.ensure_unique_name(&input.name, None).await?;

        let slug_source = input.slug.as_deref().unwrap_or(&input.name);
        let slug = self.ensure_unique_slug(slug_source, None).await?;

        let category = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(slug),
        };

        let category = category.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(category.id))
            .await;

        info!("Created category: {} ({})", category.id, category.slug);
        Ok(category)
    }

    /// Updates name and/or slug. An absent slug keeps the stored one; a
    /// supplied slug is normalized and made unique just like a derived one.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        let category = self.get(category_id).await?;

        if let Some(name) = &input.name {
            self.ensure_unique_name(name, Some(category_id)).await?;
        }

        let mut active: category::ActiveModel = category.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(slug) = input.slug {
            let slug = self.ensure_unique_slug(&slug, Some(category_id)).await?;
            active.slug = Set(slug);
        }

        let category = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryUpdated(category_id))
            .await;

        info!("Updated category: {}", category_id);
        Ok(category)
    }

    /// Deletes a category, detaching dependent books in the same
    /// transaction.
    #[instrument(skip(self))]
    pub async fn delete(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let category = Category::find_by_id(category_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))?;

        Book::update_many()
            .set(book::ActiveModel {
                category_id: Set(None),
                ..Default::default()
            })
            .filter(book::Column::CategoryId.eq(category_id))
            .exec(&txn)
            .await?;

        category.delete(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CategoryDeleted(category_id))
            .await;

        info!("Deleted category: {}", category_id);
        Ok(())
    }

    async fn ensure_unique_name(
        &self,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = Category::find().filter(category::Column::Name.eq(name));
        if let Some(id) = exclude_id {
            query = query.filter(category::Column::Id.ne(id));
        }

        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }

        Ok(())
    }

    async fn ensure_unique_slug(
        &self,
        source: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<String, ServiceError> {
        let base = slugify(source);
        if base.is_empty() {
            return Err(ServiceError::InvalidInput(
                "name must contain at least one alphanumeric character".to_string(),
            ));
        }

        let mut candidate = base.clone();
        let mut suffix = 2u32;
        loop {
            let mut query = Category::find().filter(category::Column::Slug.eq(candidate.clone()));
            if let Some(id) = exclude_id {
                query = query.filter(category::Column::Id.ne(id));
            }
            if query.one(&*self.db).await?.is_none() {
                return Ok(candidate);
            }
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
    }
}

/// Input for creating a category; the slug is derived from the name when
/// omitted.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub slug: Option<String>,
}

/// Input for updating a category
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub slug: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_input_without_slug() {
        let json = r#"{"name": "Sci-Fi & Fantasy"}"#;
        let input: CreateCategoryInput = serde_json::from_str(json).expect("valid input");
        assert_eq!(input.name, "Sci-Fi & Fantasy");
        assert!(input.slug.is_none());
    }

    #[test]
    fn suffix_candidates_are_deterministic() {
        let base = slugify("Sci-Fi & Fantasy");
        assert_eq!(base, "sci-fi-fantasy");
        assert_eq!(format!("{}-{}", base, 2), "sci-fi-fantasy-2");
        assert_eq!(format!("{}-{}", base, 3), "sci-fi-fantasy-3");
    }
}
