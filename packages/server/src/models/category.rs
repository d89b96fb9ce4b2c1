use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::category;
use crate::error::AppError;

use super::product::ProductListItem;
use super::shared::{validate_max_len, validate_required};

/// Request body for creating a category.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCategoryRequest {
    #[schema(example = "Home & Garden")]
    pub name: String,
    pub description: Option<String>,
    /// Image path or URL.
    pub image: Option<String>,
    /// Parent category ID for nested categories.
    pub parent_id: Option<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CategoryActivationRequest {
    pub is_active: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Home & Garden")]
    pub name: String,
    #[schema(example = "home-garden")]
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
    pub parent_id: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A category together with its active products.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryDetailResponse {
    pub category: CategoryResponse,
    pub products: Vec<ProductListItem>,
}

impl From<category::Model> for CategoryResponse {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            description: m.description,
            image: m.image,
            parent_id: m.parent_id,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}

pub fn validate_create_category(req: &CreateCategoryRequest) -> Result<(), AppError> {
    validate_required(&req.name, "Name", 100)?;
    if let Some(ref image) = req.image {
        validate_max_len(image, "Image", 255)?;
    }
    Ok(())
}
