use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::EntityTrait;
use tracing::instrument;

use crate::catalog::categories::CategoryService;
use crate::catalog::notifier::{dispatch, new_product_message};
use crate::catalog::orders::OrderLedger;
use crate::catalog::products::{ProductFilter, ProductService};
use crate::catalog::reviews::ReviewService;
use crate::catalog::vendors::VendorService;
use crate::entity::{category, product, vendor};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::CurrentUser;
use crate::extractors::json::AppJson;
use crate::models::product::*;
use crate::models::shared::{Pagination, page_bounds};
use crate::state::AppState;

/// Look up a product by slug and check the caller owns the store selling it.
async fn find_owned_product(
    state: &AppState,
    caller: &CurrentUser,
    slug: &str,
) -> Result<product::Model, AppError> {
    let product = ProductService::new(&state.db).find_by_slug(slug).await?;
    let vendor = VendorService::new(&state.db)
        .require_vendor(caller.id())
        .await?;
    if product.vendor_id != vendor.id {
        return Err(AppError::PermissionDenied(
            "Only the store owner can change this product".into(),
        ));
    }
    Ok(product)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Products",
    operation_id = "listProducts",
    summary = "List active products",
    description = "Returns active products, newest first. Filter by category slug and by a case-insensitive search over name and description.",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products", body = ProductListResponse),
        (status = 404, description = "Unknown category (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductListResponse>, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let category_id = match query.category.as_deref().map(str::trim) {
        Some(slug) if !slug.is_empty() => Some(
            CategoryService::new(&state.db)
                .find_active_by_slug(slug)
                .await?
                .id,
        ),
        _ => None,
    };
    let filter = ProductFilter {
        category_id,
        search: query.search,
    };

    let products = ProductService::new(&state.db);
    let (models, total) = products.list_active(&filter, page, per_page).await?;
    let data = products.list_items(models).await?;

    Ok(Json(ProductListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Products",
    operation_id = "createProduct",
    summary = "Create a product in the caller's store",
    description = "Creates a product with a slug built from the product and store names and a generated SKU. Up to 3 images may be attached; the first is primary. Announces the product on the notification channel.",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = CreatedProductResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Caller has no store (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown or hidden category (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Could not allocate a unique slug/SKU (CONFLICT)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller, payload), fields(user_id = caller.id(), name = %payload.name))]
pub async fn create_product(
    caller: CurrentUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    let vendor = VendorService::new(&state.db)
        .require_vendor(caller.id())
        .await?;
    validate_create_product(&payload)?;

    let (product, images) = ProductService::new(&state.db)
        .create(&vendor, payload, state.config.catalog.identity_retry())
        .await?;

    dispatch(
        state.notifier.clone(),
        new_product_message(&product.name, &vendor.store_name, product.price),
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedProductResponse {
            product: product.into(),
            images: images.into_iter().map(Into::into).collect(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/{slug}",
    tag = "Products",
    operation_id = "getProduct",
    summary = "Get the product page",
    description = "Returns an active product with its store, category, images, variants, review summary and up to 4 related products from the same category. When the caller is identified, `viewer` carries their own review, whether they may still review the product and whether they have bought it.",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product details", body = ProductDetailResponse),
        (status = 401, description = "Unknown caller in the user header (UNAUTHENTICATED)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller), fields(slug = %slug))]
pub async fn get_product(
    caller: Option<CurrentUser>,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetailResponse>, AppError> {
    let products = ProductService::new(&state.db);
    let product = products.find_active_by_slug(&slug).await?;

    let vendor = vendor::Entity::find_by_id(product.vendor_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("product {} has no vendor", product.id)))?;
    let category = category::Entity::find_by_id(product.category_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("product {} has no category", product.id)))?;

    let images = products.images(product.id).await?;
    let variants = products.variants(product.id).await?;
    let review_service = ReviewService::new(&state.db);
    let reviews = review_service.summary(product.id).await?;
    let related = products.related(&product, RELATED_LIMIT).await?;
    let related = products.list_items(related).await?;

    let viewer = match caller {
        Some(caller) => {
            let user_review = review_service
                .find_by_author(caller.id(), product.id)
                .await?;
            let user_has_purchased = OrderLedger::new(&state.db)
                .has_purchased(caller.id(), product.id)
                .await?;
            Some(ProductViewerState {
                can_review: user_review.is_none(),
                user_review: user_review.map(Into::into),
                user_has_purchased,
            })
        }
        None => None,
    };

    Ok(Json(ProductDetailResponse {
        product: product.into(),
        vendor: ProductVendorSummary {
            id: vendor.id,
            store_name: vendor.store_name,
            is_verified: vendor.is_verified,
        },
        category: ProductCategorySummary {
            id: category.id,
            name: category.name,
            slug: category.slug,
        },
        images: images.into_iter().map(Into::into).collect(),
        variants: variants.into_iter().map(Into::into).collect(),
        reviews,
        related,
        viewer,
    }))
}

#[utoipa::path(
    patch,
    path = "/{slug}",
    tag = "Products",
    operation_id = "updateProduct",
    summary = "Update a product",
    description = "Partially updates a product. Only the owning store may edit it. The slug and SKU never change.",
    params(("slug" = String, Path, description = "Product slug")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Product or new category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller, payload), fields(slug = %slug))]
pub async fn update_product(
    caller: CurrentUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    validate_update_product(&payload)?;
    let product = find_owned_product(&state, &caller, &slug).await?;

    let updated = ProductService::new(&state.db)
        .update(product, payload)
        .await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/{slug}",
    tag = "Products",
    operation_id = "deleteProduct",
    summary = "Delete a product",
    description = "Deletes a product with its images, variants and reviews. Only the owning store may delete it. Returns 409 CONFLICT if the product appears in any order.",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Product has orders (CONFLICT)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller), fields(slug = %slug))]
pub async fn delete_product(
    caller: CurrentUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = find_owned_product(&state, &caller, &slug).await?;
    ProductService::new(&state.db).delete(&product).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{slug}/images",
    tag = "Products",
    operation_id = "addProductImage",
    summary = "Attach an image to a product",
    description = "Adds an image. The first image of a product, or one sent with `is_primary`, becomes the primary image.",
    params(("slug" = String, Path, description = "Product slug")),
    request_body = AddProductImageRequest,
    responses(
        (status = 201, description = "Image added", body = ProductImageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller, payload), fields(slug = %slug))]
pub async fn add_product_image(
    caller: CurrentUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<AddProductImageRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_add_image(&payload)?;
    let product = find_owned_product(&state, &caller, &slug).await?;

    let image = ProductService::new(&state.db)
        .add_image(&product, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ProductImageResponse::from(image))))
}

#[utoipa::path(
    get,
    path = "/{slug}/variants",
    tag = "Products",
    operation_id = "listProductVariants",
    summary = "List the variants of a product",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Variants", body = Vec<ProductVariantResponse>),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug = %slug))]
pub async fn list_variants(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<ProductVariantResponse>>, AppError> {
    let products = ProductService::new(&state.db);
    let product = products.find_active_by_slug(&slug).await?;
    let variants = products.variants(product.id).await?;
    Ok(Json(variants.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/{slug}/variants",
    tag = "Products",
    operation_id = "createProductVariant",
    summary = "Add a variant to a product",
    description = "Adds a variant such as Size/Large. A product cannot have two variants with the same name and value.",
    params(("slug" = String, Path, description = "Product slug")),
    request_body = CreateVariantRequest,
    responses(
        (status = 201, description = "Variant added", body = ProductVariantResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Duplicate variant (CONFLICT)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller, payload), fields(slug = %slug))]
pub async fn create_variant(
    caller: CurrentUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<CreateVariantRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_variant(&payload)?;
    let product = find_owned_product(&state, &caller, &slug).await?;

    let variant = ProductService::new(&state.db)
        .add_variant(&product, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ProductVariantResponse::from(variant))))
}
