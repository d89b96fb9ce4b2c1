use std::collections::BTreeMap;

use catalog_common::{Rating, RatingSummary};
use chrono::Utc;
use sea_orm::*;
use tracing::info;

use crate::entity::{product, review, user};
use crate::error::{AppError, conflict_on_unique};
use crate::models::review::{CreateReviewRequest, UpdateReviewRequest};

use super::orders::OrderLedger;

const DUPLICATE_REVIEW: &str = "You have already reviewed this product";

/// Review lifecycle and the aggregates computed over approved reviews.
pub struct ReviewService<'a, C: ConnectionTrait> {
    pub conn: &'a C,
}

impl<'a, C: ConnectionTrait> ReviewService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    fn approved(product_id: i32) -> Select<review::Entity> {
        review::Entity::find()
            .filter(review::Column::ProductId.eq(product_id))
            .filter(review::Column::IsApproved.eq(true))
    }

    /// Average, totals and distribution over the product's approved reviews.
    pub async fn summary(&self, product_id: i32) -> Result<RatingSummary, DbErr> {
        let rows: Vec<(i32, bool)> = Self::approved(product_id)
            .select_only()
            .column(review::Column::Rating)
            .column(review::Column::IsVerified)
            .into_tuple()
            .all(self.conn)
            .await?;
        Ok(RatingSummary::from_reviews(rows))
    }

    /// Mean approved rating rounded to one decimal; 0 with no reviews.
    pub async fn average_rating(&self, product_id: i32) -> Result<f64, DbErr> {
        Ok(self.summary(product_id).await?.average_rating)
    }

    pub async fn total_reviews(&self, product_id: i32) -> Result<u64, DbErr> {
        Self::approved(product_id).count(self.conn).await
    }

    pub async fn verified_reviews_count(&self, product_id: i32) -> Result<u64, DbErr> {
        Self::approved(product_id)
            .filter(review::Column::IsVerified.eq(true))
            .count(self.conn)
            .await
    }

    /// Count of approved reviews per rating; keys 1 through 5 always present.
    pub async fn rating_distribution(&self, product_id: i32) -> Result<BTreeMap<u8, u64>, DbErr> {
        Ok(self.summary(product_id).await?.rating_distribution)
    }

    /// Approved reviews, optionally restricted to one rating, newest first.
    pub async fn list_approved(
        &self,
        product_id: i32,
        rating: Option<Rating>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<review::Model>, u64), DbErr> {
        let mut select = Self::approved(product_id);
        if let Some(rating) = rating {
            select = select.filter(review::Column::Rating.eq(i32::from(rating)));
        }

        let total = select.clone().count(self.conn).await?;
        let data = select
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id)
            .offset(Some((page - 1) * per_page))
            .limit(Some(per_page))
            .all(self.conn)
            .await?;
        Ok((data, total))
    }

    /// Every approved review with `rating`, newest first.
    pub async fn reviews_by_rating(
        &self,
        product_id: i32,
        rating: Rating,
    ) -> Result<Vec<review::Model>, DbErr> {
        Self::approved(product_id)
            .filter(review::Column::Rating.eq(i32::from(rating)))
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id)
            .all(self.conn)
            .await
    }

    /// Post a review. `is_verified` is decided here, once, from the
    /// reviewer's delivered or completed orders.
    pub async fn create(
        &self,
        author: &user::Model,
        product: &product::Model,
        req: CreateReviewRequest,
    ) -> Result<review::Model, AppError> {
        let rating = Rating::new(req.rating)?;
        if !product.is_active {
            return Err(AppError::NotFound("Product not found".into()));
        }

        if self.find_by_author(author.id, product.id).await?.is_some() {
            return Err(AppError::Conflict(DUPLICATE_REVIEW.into()));
        }

        let is_verified = OrderLedger::new(self.conn)
            .has_purchased(author.id, product.id)
            .await?;

        let now = Utc::now();
        let created = review::ActiveModel {
            user_id: Set(author.id),
            product_id: Set(product.id),
            rating: Set(rating.into()),
            title: Set(req.title.trim().to_string()),
            comment: Set(req.comment),
            is_verified: Set(is_verified),
            is_approved: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.conn)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_REVIEW))?;

        info!(
            id = created.id,
            product_id = product.id,
            rating = created.rating,
            is_verified,
            "Review created"
        );
        Ok(created)
    }

    /// The review `user_id` wrote for `product_id`, approved or hidden.
    pub async fn find_by_author(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<Option<review::Model>, DbErr> {
        review::Entity::find()
            .filter(review::Column::UserId.eq(user_id))
            .filter(review::Column::ProductId.eq(product_id))
            .one(self.conn)
            .await
    }

    pub async fn find(&self, id: i32) -> Result<review::Model, AppError> {
        review::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".into()))
    }

    /// Author-only edit. The verification stamp is left as it was.
    pub async fn update(
        &self,
        review: review::Model,
        author_id: i32,
        req: UpdateReviewRequest,
    ) -> Result<review::Model, AppError> {
        require_author(&review, author_id)?;
        let rating = req.rating.map(Rating::new).transpose()?;
        if req == UpdateReviewRequest::default() {
            return Ok(review);
        }

        let mut active: review::ActiveModel = review.into();
        if let Some(rating) = rating {
            active.rating = Set(rating.into());
        }
        if let Some(title) = req.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(comment) = req.comment {
            active.comment = Set(comment);
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.conn).await?)
    }

    pub async fn delete(&self, review: review::Model, author_id: i32) -> Result<(), AppError> {
        require_author(&review, author_id)?;
        review::Entity::delete_by_id(review.id)
            .exec(self.conn)
            .await?;
        info!(id = review.id, "Review deleted");
        Ok(())
    }

    /// Moderation toggle; hidden reviews drop out of every aggregate.
    pub async fn set_approval(
        &self,
        review: review::Model,
        is_approved: bool,
    ) -> Result<review::Model, AppError> {
        if review.is_approved == is_approved {
            return Ok(review);
        }
        let mut active: review::ActiveModel = review.into();
        active.is_approved = Set(is_approved);
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.conn).await?)
    }
}

fn require_author(review: &review::Model, user_id: i32) -> Result<(), AppError> {
    if review.user_id != user_id {
        return Err(AppError::PermissionDenied(
            "Only the author can change this review".into(),
        ));
    }
    Ok(())
}
