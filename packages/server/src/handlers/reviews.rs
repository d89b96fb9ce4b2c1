use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use catalog_common::{Rating, RatingSummary};
use tracing::instrument;

use crate::catalog::products::ProductService;
use crate::catalog::reviews::ReviewService;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::CurrentUser;
use crate::extractors::json::AppJson;
use crate::models::review::*;
use crate::models::shared::{Pagination, page_bounds};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{slug}/reviews",
    tag = "Reviews",
    operation_id = "listProductReviews",
    summary = "List approved reviews of a product",
    description = "Returns approved reviews, newest first. With `rating`, only reviews with that star rating.",
    params(("slug" = String, Path, description = "Product slug"), ReviewListQuery),
    responses(
        (status = 200, description = "Reviews", body = ReviewListResponse),
        (status = 400, description = "Rating filter out of range (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(slug = %slug))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ReviewListQuery>,
) -> Result<Json<ReviewListResponse>, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);
    let rating = query.rating.map(Rating::new).transpose()?;

    let product = ProductService::new(&state.db)
        .find_active_by_slug(&slug)
        .await?;
    let (reviews, total) = ReviewService::new(&state.db)
        .list_approved(product.id, rating, page, per_page)
        .await?;

    Ok(Json(ReviewListResponse {
        data: reviews.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{slug}/reviews/summary",
    tag = "Reviews",
    operation_id = "getProductReviewSummary",
    summary = "Rating summary of a product",
    description = "Average rating (one decimal), total and verified review counts and the per-rating distribution, over approved reviews only.",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Summary", body = RatingSummary),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug = %slug))]
pub async fn review_summary(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<RatingSummary>, AppError> {
    let product = ProductService::new(&state.db)
        .find_active_by_slug(&slug)
        .await?;
    let summary = ReviewService::new(&state.db).summary(product.id).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    post,
    path = "/{slug}/reviews",
    tag = "Reviews",
    operation_id = "createReview",
    summary = "Review a product",
    description = "Posts the caller's review. Each user may review a product once. The review is marked verified when the caller has a delivered or completed order containing the product.",
    params(("slug" = String, Path, description = "Product slug")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already reviewed (CONFLICT)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller, payload), fields(slug = %slug, user_id = caller.id()))]
pub async fn create_review(
    caller: CurrentUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_review(&payload)?;
    let product = ProductService::new(&state.db)
        .find_active_by_slug(&slug)
        .await?;

    let review = ReviewService::new(&state.db)
        .create(&caller.user, &product, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Reviews",
    operation_id = "updateReview",
    summary = "Edit a review",
    description = "Partially updates the caller's own review. The verified flag keeps the value it got when the review was posted.",
    params(("id" = i32, Path, description = "Review ID")),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = ReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller, payload), fields(id))]
pub async fn update_review(
    caller: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    validate_update_review(&payload)?;
    let reviews = ReviewService::new(&state.db);
    let review = reviews.find(id).await?;
    let updated = reviews.update(review, caller.id(), payload).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Reviews",
    operation_id = "deleteReview",
    summary = "Delete a review",
    params(("id" = i32, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller), fields(id))]
pub async fn delete_review(
    caller: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let reviews = ReviewService::new(&state.db);
    let review = reviews.find(id).await?;
    reviews.delete(review, caller.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{id}/approval",
    tag = "Reviews",
    operation_id = "setReviewApproval",
    summary = "Approve or hide a review",
    description = "Moderation switch. Hidden reviews are excluded from listings and every rating aggregate. Staff only.",
    params(("id" = i32, Path, description = "Review ID")),
    request_body = ReviewApprovalRequest,
    responses(
        (status = 200, description = "Review updated", body = ReviewResponse),
        (status = 401, description = "Unidentified caller (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not staff (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("user_id" = [])),
)]
#[instrument(skip(state, caller, payload), fields(id, is_approved = payload.is_approved))]
pub async fn set_review_approval(
    caller: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ReviewApprovalRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    caller.require_staff()?;
    let reviews = ReviewService::new(&state.db);
    let review = reviews.find(id).await?;
    let updated = reviews.set_approval(review, payload.is_approved).await?;
    Ok(Json(updated.into()))
}
