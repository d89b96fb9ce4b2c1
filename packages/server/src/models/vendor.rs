use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{vendor, vendor_profile};
use crate::error::AppError;

use super::product::ProductListItem;
use super::shared::{Pagination, validate_max_len, validate_required};

/// Request body for opening a store for the calling user.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterVendorRequest {
    #[schema(example = "Clay & Co")]
    pub store_name: String,
    pub store_description: String,
    pub store_logo: Option<String>,
    #[schema(example = "+1 555 0100")]
    pub phone: String,
    pub address: String,
    /// Twitter/X handle, with or without the leading `@`.
    pub twitter_handle: Option<String>,
    pub response_time: Option<String>,
    pub shipping_policy: Option<String>,
    pub return_policy: Option<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateVendorProfileRequest {
    pub website: Option<String>,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    pub business_license: Option<String>,
    pub tax_id: Option<String>,
    pub bank_account: Option<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateVendorRequest {
    pub store_name: Option<String>,
    pub store_description: Option<String>,
    pub store_logo: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub twitter_handle: Option<String>,
    pub response_time: Option<String>,
    pub shipping_policy: Option<String>,
    pub return_policy: Option<String>,
    pub profile: Option<UpdateVendorProfileRequest>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct VendorVerificationRequest {
    pub is_verified: bool,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct VendorListQuery {
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VendorProfileResponse {
    pub website: String,
    pub facebook_url: String,
    pub instagram_url: String,
    pub business_license: String,
    pub tax_id: String,
}

impl From<vendor_profile::Model> for VendorProfileResponse {
    fn from(m: vendor_profile::Model) -> Self {
        Self {
            website: m.website,
            facebook_url: m.facebook_url,
            instagram_url: m.instagram_url,
            business_license: m.business_license,
            tax_id: m.tax_id,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VendorResponse {
    pub id: i32,
    pub user_id: i32,
    pub store_name: String,
    pub store_description: String,
    pub store_logo: Option<String>,
    pub phone: String,
    pub address: String,
    pub twitter_handle: String,
    pub response_time: String,
    pub shipping_policy: String,
    pub return_policy: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<vendor::Model> for VendorResponse {
    fn from(m: vendor::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            store_name: m.store_name,
            store_description: m.store_description,
            store_logo: m.store_logo,
            phone: m.phone,
            address: m.address,
            twitter_handle: m.twitter_handle,
            response_time: m.response_time,
            shipping_policy: m.shipping_policy,
            return_policy: m.return_policy,
            is_verified: m.is_verified,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// The caller's own store, including the private profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct OwnVendorResponse {
    pub vendor: VendorResponse,
    pub profile: Option<VendorProfileResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VendorListResponse {
    pub data: Vec<VendorResponse>,
    pub pagination: Pagination,
}

/// Active products shown on the store page.
pub const STORE_PAGE_PRODUCTS: u64 = 12;

/// Active product count of a store within one category.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryProductCount {
    pub category_id: i32,
    pub name: String,
    pub slug: String,
    pub product_count: u64,
}

/// Public store page.
#[derive(Serialize, utoipa::ToSchema)]
pub struct VendorDetailResponse {
    pub vendor: VendorResponse,
    pub active_products: u64,
    /// The 12 newest active products.
    pub products: Vec<ProductListItem>,
    /// Active products per category, largest first.
    pub categories: Vec<CategoryProductCount>,
    /// Approved reviews across all of the store's products.
    pub reviews_count: u64,
    /// Unrounded mean of approved review ratings; 0 when there are none.
    #[schema(example = 4.5)]
    pub average_rating: f64,
}

/// An order line for one of the store's products.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DashboardOrderLine {
    pub order_id: i32,
    pub order_status: String,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    pub ordered_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VendorDashboardResponse {
    pub vendor: VendorResponse,
    pub total_products: u64,
    pub active_products: u64,
    /// Sum of order lines in delivered or completed orders.
    #[schema(value_type = String, example = "150.00")]
    pub total_revenue: Decimal,
    pub average_rating: f64,
    /// The 10 most recent order lines, any status.
    pub recent_orders: Vec<DashboardOrderLine>,
}

pub fn validate_register_vendor(req: &RegisterVendorRequest) -> Result<(), AppError> {
    validate_required(&req.store_name, "Store name", 200)?;
    if req.store_description.trim().is_empty() {
        return Err(AppError::Validation(
            "Store description must not be empty".into(),
        ));
    }
    validate_required(&req.phone, "Phone", 20)?;
    if req.address.trim().is_empty() {
        return Err(AppError::Validation("Address must not be empty".into()));
    }
    if let Some(ref handle) = req.twitter_handle {
        validate_max_len(handle, "Twitter handle", 50)?;
    }
    if let Some(ref rt) = req.response_time {
        validate_max_len(rt, "Response time", 100)?;
    }
    Ok(())
}

pub fn validate_update_vendor(req: &UpdateVendorRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.store_name {
        validate_required(name, "Store name", 200)?;
    }
    if let Some(ref phone) = req.phone {
        validate_required(phone, "Phone", 20)?;
    }
    if let Some(ref handle) = req.twitter_handle {
        validate_max_len(handle, "Twitter handle", 50)?;
    }
    if let Some(ref rt) = req.response_time {
        validate_max_len(rt, "Response time", 100)?;
    }
    Ok(())
}

/// Stored form of a Twitter handle: trimmed, without the leading `@`.
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_string()
}
