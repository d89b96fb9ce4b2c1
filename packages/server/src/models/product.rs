use catalog_common::RatingSummary;
use catalog_common::pricing::{discount_percentage, is_in_stock};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{product, product_image, product_variant};
use crate::error::AppError;

use super::review::ReviewResponse;
use super::shared::{
    Pagination, double_option, validate_amount, validate_max_len, validate_non_negative,
    validate_required,
};

/// Images that may be attached in the create request; the first is primary.
pub const MAX_CREATE_IMAGES: usize = 3;
/// Related products shown on the detail page.
pub const RELATED_LIMIT: u64 = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductCondition {
    #[default]
    New,
    Used,
    Refurbished,
}

impl ProductCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Used => "used",
            Self::Refurbished => "refurbished",
        }
    }
}

/// An image attached when creating a product.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct NewProductImage {
    /// Storage path or URL.
    #[schema(example = "products/blue-mug.jpg")]
    pub image: String,
    pub alt_text: Option<String>,
}

/// Request body for creating a product in the caller's store.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateProductRequest {
    #[schema(example = 3)]
    pub category_id: i32,
    #[schema(example = "Blue Mug")]
    pub name: String,
    pub description: String,
    pub short_description: Option<String>,
    #[schema(value_type = String, example = "12.50")]
    pub price: Decimal,
    #[schema(value_type = Option<String>, example = "15.00")]
    pub compare_price: Option<Decimal>,
    pub condition: Option<ProductCondition>,
    pub stock_quantity: Option<i32>,
    pub track_inventory: Option<bool>,
    #[schema(value_type = Option<String>, example = "0.45")]
    pub weight: Option<Decimal>,
    pub dimensions: Option<String>,
    pub is_digital: Option<bool>,
    pub is_featured: Option<bool>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    /// Up to 3 images; the first becomes the primary image.
    #[serde(default)]
    pub images: Vec<NewProductImage>,
}

/// PATCH body for a product. Slug and SKU are never changed.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateProductRequest {
    pub category_id: Option<i32>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub compare_price: Option<Option<Decimal>>,
    pub condition: Option<ProductCondition>,
    pub stock_quantity: Option<i32>,
    pub track_inventory: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub weight: Option<Option<Decimal>>,
    pub dimensions: Option<String>,
    pub is_digital: Option<bool>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddProductImageRequest {
    pub image: String,
    pub alt_text: Option<String>,
    /// Make this the primary image, demoting the current one.
    #[serde(default)]
    pub is_primary: bool,
    pub position: Option<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateVariantRequest {
    #[schema(example = "Size")]
    pub name: String,
    #[schema(example = "Large")]
    pub value: String,
    #[schema(value_type = Option<String>, example = "2.00")]
    pub price_adjustment: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub sku_suffix: Option<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ProductListQuery {
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 20)]
    pub per_page: Option<u64>,
    /// Category slug.
    #[param(example = "home-garden")]
    pub category: Option<String>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct OwnProductListQuery {
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub vendor_id: i32,
    pub category_id: i32,
    pub name: String,
    #[schema(example = "blue-mug-clay-co")]
    pub slug: String,
    pub description: String,
    pub short_description: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[schema(value_type = Option<String>)]
    pub compare_price: Option<Decimal>,
    /// Whole percent off `compare_price`; 0 when there is no discount.
    pub discount_percentage: u32,
    pub condition: String,
    #[schema(example = "007-1718000000-1a2b3c4d")]
    pub sku: String,
    pub stock_quantity: i32,
    pub track_inventory: bool,
    pub is_in_stock: bool,
    #[schema(value_type = Option<String>)]
    pub weight: Option<Decimal>,
    pub dimensions: String,
    pub is_digital: bool,
    pub is_active: bool,
    pub is_featured: bool,
    pub meta_title: String,
    pub meta_description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<product::Model> for ProductResponse {
    fn from(m: product::Model) -> Self {
        Self {
            discount_percentage: discount_percentage(m.price, m.compare_price),
            is_in_stock: is_in_stock(m.track_inventory, m.stock_quantity),
            id: m.id,
            vendor_id: m.vendor_id,
            category_id: m.category_id,
            name: m.name,
            slug: m.slug,
            description: m.description,
            short_description: m.short_description,
            price: m.price,
            compare_price: m.compare_price,
            condition: m.condition,
            sku: m.sku,
            stock_quantity: m.stock_quantity,
            track_inventory: m.track_inventory,
            weight: m.weight,
            dimensions: m.dimensions,
            is_digital: m.is_digital,
            is_active: m.is_active,
            is_featured: m.is_featured,
            meta_title: m.meta_title,
            meta_description: m.meta_description,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Product card for list views.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductListItem {
    pub id: i32,
    pub vendor_id: i32,
    pub category_id: i32,
    pub name: String,
    pub slug: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[schema(value_type = Option<String>)]
    pub compare_price: Option<Decimal>,
    pub discount_percentage: u32,
    pub is_in_stock: bool,
    pub is_featured: bool,
    pub primary_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ProductListItem {
    pub fn new(m: product::Model, primary_image: Option<String>) -> Self {
        Self {
            discount_percentage: discount_percentage(m.price, m.compare_price),
            is_in_stock: is_in_stock(m.track_inventory, m.stock_quantity),
            id: m.id,
            vendor_id: m.vendor_id,
            category_id: m.category_id,
            name: m.name,
            slug: m.slug,
            price: m.price,
            compare_price: m.compare_price,
            is_featured: m.is_featured,
            primary_image,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductListResponse {
    pub data: Vec<ProductListItem>,
    pub pagination: Pagination,
}

/// The caller's own products, inactive ones included.
#[derive(Serialize, utoipa::ToSchema)]
pub struct OwnProductListResponse {
    pub data: Vec<ProductResponse>,
    pub pagination: Pagination,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductImageResponse {
    pub id: i32,
    pub image: String,
    pub alt_text: String,
    pub is_primary: bool,
    pub position: i32,
}

impl From<product_image::Model> for ProductImageResponse {
    fn from(m: product_image::Model) -> Self {
        Self {
            id: m.id,
            image: m.image,
            alt_text: m.alt_text,
            is_primary: m.is_primary,
            position: m.position,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductVariantResponse {
    pub id: i32,
    pub name: String,
    pub value: String,
    #[schema(value_type = String)]
    pub price_adjustment: Decimal,
    pub stock_quantity: i32,
    pub sku_suffix: String,
}

impl From<product_variant::Model> for ProductVariantResponse {
    fn from(m: product_variant::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            value: m.value,
            price_adjustment: m.price_adjustment,
            stock_quantity: m.stock_quantity,
            sku_suffix: m.sku_suffix,
        }
    }
}

/// Store a product belongs to, as shown on the product page.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductVendorSummary {
    pub id: i32,
    pub store_name: String,
    pub is_verified: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductCategorySummary {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

/// How the calling user stands towards a product.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductViewerState {
    /// The caller's own review, including a hidden one.
    pub user_review: Option<ReviewResponse>,
    /// True while the caller has not reviewed the product.
    pub can_review: bool,
    /// The caller has a delivered or completed order containing the product,
    /// so a review posted now would be verified.
    pub user_has_purchased: bool,
}

/// Everything the product page needs in one response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductDetailResponse {
    pub product: ProductResponse,
    pub vendor: ProductVendorSummary,
    pub category: ProductCategorySummary,
    pub images: Vec<ProductImageResponse>,
    pub variants: Vec<ProductVariantResponse>,
    pub reviews: RatingSummary,
    /// Up to 4 other active products from the same category.
    pub related: Vec<ProductListItem>,
    /// Present when the request identifies the caller.
    pub viewer: Option<ProductViewerState>,
}

/// Response for a freshly created product.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CreatedProductResponse {
    pub product: ProductResponse,
    pub images: Vec<ProductImageResponse>,
}

fn validate_money_fields(
    price: Option<Decimal>,
    compare_price: Option<Decimal>,
    weight: Option<Decimal>,
) -> Result<(), AppError> {
    if let Some(price) = price {
        validate_amount(price, "Price")?;
    }
    if let Some(cp) = compare_price {
        validate_amount(cp, "Compare price")?;
    }
    if let Some(w) = weight {
        validate_amount(w, "Weight")?;
    }
    Ok(())
}

pub fn validate_create_product(req: &CreateProductRequest) -> Result<(), AppError> {
    validate_required(&req.name, "Name", 200)?;
    if req.description.trim().is_empty() {
        return Err(AppError::Validation("Description must not be empty".into()));
    }
    if let Some(ref s) = req.short_description {
        validate_max_len(s, "Short description", 300)?;
    }
    validate_money_fields(Some(req.price), req.compare_price, req.weight)?;
    if let Some(qty) = req.stock_quantity {
        validate_non_negative(qty, "Stock quantity")?;
    }
    if let Some(ref t) = req.meta_title {
        validate_max_len(t, "Meta title", 60)?;
    }
    if let Some(ref d) = req.meta_description {
        validate_max_len(d, "Meta description", 160)?;
    }
    if req.images.len() > MAX_CREATE_IMAGES {
        return Err(AppError::Validation(format!(
            "At most {MAX_CREATE_IMAGES} images can be attached on creation"
        )));
    }
    for img in &req.images {
        validate_required(&img.image, "Image", 255)?;
    }
    Ok(())
}

pub fn validate_update_product(req: &UpdateProductRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_required(name, "Name", 200)?;
    }
    if let Some(ref d) = req.description
        && d.trim().is_empty()
    {
        return Err(AppError::Validation("Description must not be empty".into()));
    }
    if let Some(ref s) = req.short_description {
        validate_max_len(s, "Short description", 300)?;
    }
    validate_money_fields(req.price, req.compare_price.flatten(), req.weight.flatten())?;
    if let Some(qty) = req.stock_quantity {
        validate_non_negative(qty, "Stock quantity")?;
    }
    if let Some(ref t) = req.meta_title {
        validate_max_len(t, "Meta title", 60)?;
    }
    if let Some(ref d) = req.meta_description {
        validate_max_len(d, "Meta description", 160)?;
    }
    Ok(())
}

pub fn validate_add_image(req: &AddProductImageRequest) -> Result<(), AppError> {
    validate_required(&req.image, "Image", 255)?;
    if let Some(pos) = req.position {
        validate_non_negative(pos, "Position")?;
    }
    Ok(())
}

pub fn validate_create_variant(req: &CreateVariantRequest) -> Result<(), AppError> {
    validate_required(&req.name, "Variant name", 50)?;
    validate_required(&req.value, "Variant value", 50)?;
    if let Some(qty) = req.stock_quantity {
        validate_non_negative(qty, "Stock quantity")?;
    }
    if let Some(ref suffix) = req.sku_suffix {
        validate_max_len(suffix, "SKU suffix", 20)?;
    }
    Ok(())
}
