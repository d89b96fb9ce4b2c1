use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::review;
use crate::error::AppError;

use super::shared::{Pagination, validate_max_len, validate_required};

/// Request body for reviewing a product.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateReviewRequest {
    /// Star rating, 1 to 5.
    #[schema(example = 5)]
    pub rating: i32,
    #[schema(example = "Great mug")]
    pub title: String,
    pub comment: String,
}

/// PATCH body for a review. Verification status is never recomputed.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub comment: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReviewApprovalRequest {
    pub is_approved: bool,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ReviewListQuery {
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 20)]
    pub per_page: Option<u64>,
    /// Only reviews with this rating (1-5).
    #[param(example = 5)]
    pub rating: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewResponse {
    pub id: i32,
    pub user_id: i32,
    pub product_id: i32,
    #[schema(example = 5)]
    pub rating: i32,
    pub title: String,
    pub comment: String,
    /// Reviewer had a delivered or completed order for the product when posting.
    pub is_verified: bool,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<review::Model> for ReviewResponse {
    fn from(m: review::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            product_id: m.product_id,
            rating: m.rating,
            title: m.title,
            comment: m.comment,
            is_verified: m.is_verified,
            is_approved: m.is_approved,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewListResponse {
    pub data: Vec<ReviewResponse>,
    pub pagination: Pagination,
}

pub fn validate_create_review(req: &CreateReviewRequest) -> Result<(), AppError> {
    validate_required(&req.title, "Title", 200)?;
    if req.comment.trim().is_empty() {
        return Err(AppError::Validation("Comment must not be empty".into()));
    }
    validate_max_len(&req.comment, "Comment", 5000)
}

pub fn validate_update_review(req: &UpdateReviewRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_required(title, "Title", 200)?;
    }
    if let Some(ref comment) = req.comment {
        if comment.trim().is_empty() {
            return Err(AppError::Validation("Comment must not be empty".into()));
        }
        validate_max_len(comment, "Comment", 5000)?;
    }
    Ok(())
}
