use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::review;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Caller;
use crate::extractors::json::AppJson;
use crate::models::review::*;
use crate::policy::{Action, Capabilities};
use crate::state::AppState;
use crate::utils::content::{
    delete_reviews_cascade, find_review_for_title, find_title, usernames_by_id,
};

fn to_response(model: review::Model, author: String) -> ReviewResponse {
    ReviewResponse {
        id: model.id,
        text: model.text,
        author,
        score: model.score,
        pub_date: model.pub_date,
    }
}

async fn with_author<C: ConnectionTrait>(
    db: &C,
    model: review::Model,
) -> Result<ReviewResponse, AppError> {
    let author = usernames_by_id(db, [model.author_id])
        .await?
        .remove(&model.author_id)
        .unwrap_or_default();
    Ok(to_response(model, author))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Reviews",
    operation_id = "listReviews",
    summary = "List reviews of a title",
    description = "Newest first.",
    params(("title_id" = i32, Path, description = "Title ID")),
    responses(
        (status = 200, description = "List of reviews", body = Vec<ReviewResponse>),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(title_id))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    find_title(&state.db, title_id).await?;

    let reviews = review::Entity::find()
        .filter(review::Column::TitleId.eq(title_id))
        .order_by_desc(review::Column::PubDate)
        .order_by_desc(review::Column::Id)
        .all(&state.db)
        .await?;

    let authors = usernames_by_id(&state.db, reviews.iter().map(|r| r.author_id)).await?;

    Ok(Json(
        reviews
            .into_iter()
            .map(|r| {
                let author = authors.get(&r.author_id).cloned().unwrap_or_default();
                to_response(r, author)
            })
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Reviews",
    operation_id = "createReview",
    summary = "Review a title",
    description = "Any authenticated user may review a title once.",
    params(("title_id" = i32, Path, description = "Title ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Title already reviewed by the caller (ALREADY_REVIEWED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(title_id))]
pub async fn create_review(
    caller: Caller,
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let auth_user = caller.authorize_user(Action::Contribute)?;

    find_title(&state.db, title_id).await?;
    validate_create_review(&payload)?;

    let already = review::Entity::find()
        .filter(review::Column::TitleId.eq(title_id))
        .filter(review::Column::AuthorId.eq(auth_user.user_id))
        .count(&state.db)
        .await?;
    if already > 0 {
        return Err(AppError::AlreadyReviewed);
    }

    let new_review = review::ActiveModel {
        text: Set(payload.text),
        score: Set(payload.score),
        title_id: Set(title_id),
        author_id: Set(auth_user.user_id),
        pub_date: Set(chrono::Utc::now()),
        ..Default::default()
    };
    // A concurrent insert for the same pair trips `uq_review_author_title`.
    let model = new_review
        .insert(&state.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::AlreadyReviewed,
            _ => AppError::from(e),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(to_response(model, auth_user.username)),
    ))
}

#[utoipa::path(
    get,
    path = "/{review_id}",
    tag = "Reviews",
    operation_id = "getReview",
    summary = "Get a review",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 200, description = "Review", body = ReviewResponse),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(title_id, review_id))]
pub async fn get_review(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
) -> Result<Json<ReviewResponse>, AppError> {
    find_title(&state.db, title_id).await?;
    let model = find_review_for_title(&state.db, title_id, review_id).await?;
    Ok(Json(with_author(&state.db, model).await?))
}

#[utoipa::path(
    patch,
    path = "/{review_id}",
    tag = "Reviews",
    operation_id = "updateReview",
    summary = "Update a review",
    description = "Allowed for the author, moderators and admins.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = ReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(title_id, review_id))]
pub async fn update_review(
    caller: Caller,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let txn = state.db.begin().await?;

    find_title(&txn, title_id).await?;
    let existing = find_review_for_title(&txn, title_id, review_id).await?;
    caller.require(Action::EditContent {
        author_id: existing.author_id,
    })?;

    validate_update_review(&payload)?;

    let mut active: review::ActiveModel = existing.clone().into();
    if let Some(text) = payload.text {
        active.text = Set(text);
    }
    if let Some(score) = payload.score {
        active.score = Set(score);
    }

    let model = if active.is_changed() {
        active.update(&txn).await?
    } else {
        existing
    };

    let response = with_author(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/{review_id}",
    tag = "Reviews",
    operation_id = "deleteReview",
    summary = "Delete a review",
    description = "Allowed for the author, moderators and admins. Comments on the review are deleted with it.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(title_id, review_id))]
pub async fn delete_review(
    caller: Caller,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    find_title(&txn, title_id).await?;
    let existing = find_review_for_title(&txn, title_id, review_id).await?;
    caller.require(Action::EditContent {
        author_id: existing.author_id,
    })?;

    delete_reviews_cascade(&txn, vec![existing.id]).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
