use catalog_common::retry::RetryPolicy;
use catalog_common::slugify;
use sea_orm::*;
use tracing::info;

use crate::entity::category;
use crate::error::AppError;
use crate::models::category::CreateCategoryRequest;

use super::identity::{CATEGORY_IDENTITY_KEYS, IdentityService, retry_identity_collision};

pub struct CategoryService<'a, C: ConnectionTrait + TransactionTrait> {
    pub conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> CategoryService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Insert a category under a slug checked to be free.
    ///
    /// Each attempt runs in its own savepoint so a lost race on the slug
    /// leaves the surrounding transaction usable for the next attempt.
    pub async fn create(
        &self,
        req: CreateCategoryRequest,
        policy: RetryPolicy,
    ) -> Result<category::Model, AppError> {
        let name = req.name.trim().to_string();
        let base = slugify(&name)?;

        if let Some(parent_id) = req.parent_id {
            category::Entity::find_by_id(parent_id)
                .one(self.conn)
                .await?
                .ok_or_else(|| AppError::NotFound("Parent category not found".into()))?;
        }

        let mut budget = policy.start();
        loop {
            let slug = IdentityService::new(self.conn).category_slug(&base).await?;
            let model = category::ActiveModel {
                name: Set(name.clone()),
                slug: Set(slug),
                description: Set(req.description.clone().unwrap_or_default()),
                image: Set(req.image.clone()),
                parent_id: Set(req.parent_id),
                is_active: Set(true),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            };

            let sp = self.conn.begin().await?;
            match model.insert(&sp).await {
                Ok(created) => {
                    sp.commit().await?;
                    info!(id = created.id, slug = %created.slug, "Category created");
                    return Ok(created);
                }
                Err(e) => {
                    sp.rollback().await?;
                    retry_identity_collision(
                        &mut budget,
                        e,
                        CATEGORY_IDENTITY_KEYS,
                        "A category with this name already exists",
                    )
                    .await?;
                }
            }
        }
    }

    pub async fn list_active(&self) -> Result<Vec<category::Model>, DbErr> {
        category::Entity::find()
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::Name)
            .all(self.conn)
            .await
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<category::Model, AppError> {
        category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".into()))
    }

    /// Show or hide a category. Hidden categories drop out of browsing and
    /// accept no new products; their existing products are left as they are.
    pub async fn set_active(
        &self,
        category: category::Model,
        is_active: bool,
    ) -> Result<category::Model, AppError> {
        if category.is_active == is_active {
            return Ok(category);
        }
        let mut active: category::ActiveModel = category.into();
        active.is_active = Set(is_active);
        let updated = active.update(self.conn).await?;

        info!(id = updated.id, slug = %updated.slug, is_active, "Category activation changed");
        Ok(updated)
    }

    pub async fn find_active_by_slug(&self, slug: &str) -> Result<category::Model, AppError> {
        category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .filter(category::Column::IsActive.eq(true))
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".into()))
    }
}
