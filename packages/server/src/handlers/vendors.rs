use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::catalog::notifier::{dispatch, new_vendor_message};
use crate::catalog::products::ProductService;
use crate::catalog::vendors::VendorService;
use crate::entity::vendor;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::CurrentUser;
use crate::extractors::json::AppJson;
use crate::models::product::{OwnProductListQuery, OwnProductListResponse};
use crate::models::shared::{Pagination, page_bounds};
use crate::models::vendor::*;
use crate::state::AppState;

fn require_owner(caller: &CurrentUser, vendor: &vendor::Model) -> Result<(), AppError> {
    if vendor.user_id != caller.id() {
        return Err(AppError::PermissionDenied(
            "Only the store owner can do this".into(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Vendors",
    operation_id = "listVendors",
    summary = "List stores",
    description = "Returns stores, newest first.",
    params(VendorListQuery),
    responses(
        (status = 200, description = "Stores", body = VendorListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_vendors(
    State(state): State<AppState>,
    Query(query): Query<VendorListQuery>,
) -> Result<Json<VendorListResponse>, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);
    let (vendors, total) = VendorService::new(&state.db).list(page, per_page).await?;
    Ok(Json(VendorListResponse {
        data: vendors.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Vendors",
    operation_id = "registerVendor",
    summary = "Open a store for the caller",
    description = "Creates the caller's store and an empty store profile, and switches the caller from buyer to vendor. A user can own at most one store. Announces the new store on the notification channel.",
    request_body = RegisterVendorRequest,
    responses(
        (status = 201, description = "Store created", body = VendorResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 409, description = "Caller already has a store (CONFLICT)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller, payload), fields(user_id = caller.id(), store = %payload.store_name))]
pub async fn register_vendor(
    caller: CurrentUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterVendorRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_vendor(&payload)?;

    let vendor = VendorService::new(&state.db)
        .register(&caller.user, payload)
        .await?;

    dispatch(state.notifier.clone(), new_vendor_message(&vendor.store_name, &vendor.twitter_handle));

    Ok((StatusCode::CREATED, Json(VendorResponse::from(vendor))))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Vendors",
    operation_id = "getOwnVendor",
    summary = "The caller's store",
    description = "Returns the caller's store with its profile, or 404 when the caller has not opened one.",
    responses(
        (status = 200, description = "Store", body = OwnVendorResponse),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 404, description = "Caller has no store (NOT_FOUND)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller), fields(user_id = caller.id()))]
pub async fn get_own_vendor(
    caller: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<OwnVendorResponse>, AppError> {
    let vendors = VendorService::new(&state.db);
    let vendor = vendors
        .find_vendor_for_user(caller.id())
        .await?
        .ok_or_else(|| AppError::NotFound("You do not have a vendor store".into()))?;
    let profile = vendors.profile(vendor.id).await?;

    Ok(Json(OwnVendorResponse {
        vendor: vendor.into(),
        profile: profile.map(Into::into),
    }))
}

#[utoipa::path(
    get,
    path = "/me/dashboard",
    tag = "Vendors",
    operation_id = "getVendorDashboard",
    summary = "Sales dashboard of the caller's store",
    description = "Total revenue from delivered or completed orders, average approved rating across the store's products, product counts and the 10 most recent order lines.",
    responses(
        (status = 200, description = "Dashboard", body = VendorDashboardResponse),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Caller has no store (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller), fields(user_id = caller.id()))]
pub async fn get_dashboard(
    caller: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<VendorDashboardResponse>, AppError> {
    let vendors = VendorService::new(&state.db);
    let vendor = vendors.require_vendor(caller.id()).await?;

    let (total_products, active_products) = vendors.product_counts(vendor.id).await?;
    let total_revenue = vendors.total_revenue(vendor.id).await?;
    let average_rating = vendors.average_rating(vendor.id).await?;
    let recent_orders = vendors.recent_orders(vendor.id).await?;

    Ok(Json(VendorDashboardResponse {
        vendor: vendor.into(),
        total_products,
        active_products,
        total_revenue,
        average_rating,
        recent_orders,
    }))
}

#[utoipa::path(
    get,
    path = "/me/products",
    tag = "Vendors",
    operation_id = "listOwnProducts",
    summary = "Products of the caller's store",
    description = "Every product of the caller's store, inactive ones included, newest first.",
    params(OwnProductListQuery),
    responses(
        (status = 200, description = "Products", body = OwnProductListResponse),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Caller has no store (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller, query), fields(user_id = caller.id()))]
pub async fn list_own_products(
    caller: CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<OwnProductListQuery>,
) -> Result<Json<OwnProductListResponse>, AppError> {
    let vendor = VendorService::new(&state.db)
        .require_vendor(caller.id())
        .await?;
    let (page, per_page) = page_bounds(query.page, query.per_page);
    let (products, total) = ProductService::new(&state.db)
        .list_by_vendor(vendor.id, false, page, per_page)
        .await?;

    Ok(Json(OwnProductListResponse {
        data: products.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Vendors",
    operation_id = "getVendor",
    summary = "Public store page",
    description = "Returns a store with its 12 newest active products, active product count, active products per category (largest first), approved review count and average rating.",
    params(("id" = i32, Path, description = "Vendor ID")),
    responses(
        (status = 200, description = "Store details", body = VendorDetailResponse),
        (status = 404, description = "Vendor not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_vendor(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<VendorDetailResponse>, AppError> {
    let vendors = VendorService::new(&state.db);
    let vendor = vendors.find(id).await?;

    let (_, active_products) = vendors.product_counts(vendor.id).await?;
    let products = ProductService::new(&state.db);
    let (latest, _) = products
        .list_by_vendor(vendor.id, true, 1, STORE_PAGE_PRODUCTS)
        .await?;
    let latest = products.list_items(latest).await?;
    let categories = vendors.category_counts(vendor.id).await?;
    let reviews_count = vendors.approved_review_count(vendor.id).await?;
    let average_rating = vendors.average_rating(vendor.id).await?;

    Ok(Json(VendorDetailResponse {
        vendor: vendor.into(),
        active_products,
        products: latest,
        categories,
        reviews_count,
        average_rating,
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Vendors",
    operation_id = "updateVendor",
    summary = "Update a store",
    description = "Partially updates the store and, with `profile`, its profile. Owner only.",
    params(("id" = i32, Path, description = "Vendor ID")),
    request_body = UpdateVendorRequest,
    responses(
        (status = 200, description = "Store updated", body = VendorResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Vendor not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller, payload), fields(id))]
pub async fn update_vendor(
    caller: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateVendorRequest>,
) -> Result<Json<VendorResponse>, AppError> {
    validate_update_vendor(&payload)?;
    let vendors = VendorService::new(&state.db);
    let vendor = vendors.find(id).await?;
    require_owner(&caller, &vendor)?;

    let updated = vendors.update(vendor, payload).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Vendors",
    operation_id = "deleteVendor",
    summary = "Close a store",
    description = "Deletes the store with its profile and catalog, and switches the owner back to buyer. Owner only. Returns 409 CONFLICT if any of the store's products appear in an order.",
    params(("id" = i32, Path, description = "Vendor ID")),
    responses(
        (status = 204, description = "Store deleted"),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Vendor not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Store has orders (CONFLICT)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller), fields(id))]
pub async fn delete_vendor(
    caller: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let vendors = VendorService::new(&state.db);
    let vendor = vendors.find(id).await?;
    require_owner(&caller, &vendor)?;

    vendors.delete(&vendor).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{id}/verification",
    tag = "Vendors",
    operation_id = "setVendorVerification",
    summary = "Grant or revoke the verified badge",
    description = "Sets the store's verified flag, shown on its store and product pages. Staff only.",
    params(("id" = i32, Path, description = "Vendor ID")),
    request_body = VendorVerificationRequest,
    responses(
        (status = 200, description = "Store updated", body = VendorResponse),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not staff (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Vendor not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller, payload), fields(id, is_verified = payload.is_verified))]
pub async fn set_vendor_verification(
    caller: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<VendorVerificationRequest>,
) -> Result<Json<VendorResponse>, AppError> {
    caller.require_staff()?;
    let vendors = VendorService::new(&state.db);
    let vendor = vendors.find(id).await?;
    let updated = vendors.set_verification(vendor, payload.is_verified).await?;
    Ok(Json(updated.into()))
}
