use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::catalog::categories::CategoryService;
use crate::catalog::products::{ProductFilter, ProductService};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::CurrentUser;
use crate::extractors::json::AppJson;
use crate::models::category::*;
use crate::models::shared::MAX_PER_PAGE;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List active categories",
    description = "Returns every active category ordered by name.",
    responses(
        (status = 200, description = "Categories", body = Vec<CategoryResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = CategoryService::new(&state.db).list_active().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    description = "Creates a category with a slug derived from its name. When the slug is taken the first free `-N` suffix is used. Staff only.",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not staff (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Parent category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already used (CONFLICT)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller, payload), fields(name = %payload.name))]
pub async fn create_category(
    caller: CurrentUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_staff()?;
    validate_create_category(&payload)?;

    let created = CategoryService::new(&state.db)
        .create(payload, state.config.catalog.identity_retry())
        .await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/{slug}",
    tag = "Categories",
    operation_id = "getCategory",
    summary = "Get a category and its products",
    description = "Returns an active category with its active products, newest first (at most 100).",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category with products", body = CategoryDetailResponse),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug = %slug))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryDetailResponse>, AppError> {
    let category = CategoryService::new(&state.db)
        .find_active_by_slug(&slug)
        .await?;

    let products = ProductService::new(&state.db);
    let filter = ProductFilter {
        category_id: Some(category.id),
        ..Default::default()
    };
    let (models, _) = products.list_active(&filter, 1, MAX_PER_PAGE).await?;
    let items = products.list_items(models).await?;

    Ok(Json(CategoryDetailResponse {
        category: category.into(),
        products: items,
    }))
}

#[utoipa::path(
    put,
    path = "/{slug}/activation",
    tag = "Categories",
    operation_id = "setCategoryActivation",
    summary = "Show or hide a category",
    description = "Hidden categories are left out of category browsing and the product category filter, and new products cannot be filed under them. Staff only.",
    params(("slug" = String, Path, description = "Category slug")),
    request_body = CategoryActivationRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not staff (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller, payload), fields(slug = %slug, is_active = payload.is_active))]
pub async fn set_category_activation(
    caller: CurrentUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<CategoryActivationRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    caller.require_staff()?;
    let categories = CategoryService::new(&state.db);
    let category = categories.find_by_slug(&slug).await?;
    let updated = categories.set_active(category, payload.is_active).await?;
    Ok(Json(updated.into()))
}
