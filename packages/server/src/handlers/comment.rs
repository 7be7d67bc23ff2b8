use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::comment;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Caller;
use crate::extractors::json::AppJson;
use crate::models::review::*;
use crate::policy::{Action, Capabilities};
use crate::state::AppState;
use crate::utils::content::{find_comment_for_review, find_review_for_title, usernames_by_id};

fn to_response(model: comment::Model, author: String) -> CommentResponse {
    CommentResponse {
        id: model.id,
        text: model.text,
        author,
        pub_date: model.pub_date,
    }
}

async fn with_author<C: ConnectionTrait>(
    db: &C,
    model: comment::Model,
) -> Result<CommentResponse, AppError> {
    let author = usernames_by_id(db, [model.author_id])
        .await?
        .remove(&model.author_id)
        .unwrap_or_default();
    Ok(to_response(model, author))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Comments",
    operation_id = "listComments",
    summary = "List comments on a review",
    description = "Newest first.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 200, description = "List of comments", body = Vec<CommentResponse>),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(title_id, review_id))]
pub async fn list_comments(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    find_review_for_title(&state.db, title_id, review_id).await?;

    let comments = comment::Entity::find()
        .filter(comment::Column::ReviewId.eq(review_id))
        .order_by_desc(comment::Column::PubDate)
        .order_by_desc(comment::Column::Id)
        .all(&state.db)
        .await?;

    let authors = usernames_by_id(&state.db, comments.iter().map(|c| c.author_id)).await?;

    Ok(Json(
        comments
            .into_iter()
            .map(|c| {
                let author = authors.get(&c.author_id).cloned().unwrap_or_default();
                to_response(c, author)
            })
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Comments",
    operation_id = "createComment",
    summary = "Comment on a review",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(title_id, review_id))]
pub async fn create_comment(
    caller: Caller,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let auth_user = caller.authorize_user(Action::Contribute)?;

    find_review_for_title(&state.db, title_id, review_id).await?;
    validate_create_comment(&payload)?;

    let new_comment = comment::ActiveModel {
        text: Set(payload.text),
        review_id: Set(review_id),
        author_id: Set(auth_user.user_id),
        pub_date: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let model = new_comment.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(to_response(model, auth_user.username)),
    ))
}

#[utoipa::path(
    get,
    path = "/{comment_id}",
    tag = "Comments",
    operation_id = "getComment",
    summary = "Get a comment",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 200, description = "Comment", body = CommentResponse),
        (status = 404, description = "Title, review or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(title_id, review_id, comment_id))]
pub async fn get_comment(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
) -> Result<Json<CommentResponse>, AppError> {
    let model = find_comment_for_review(&state.db, title_id, review_id, comment_id).await?;
    Ok(Json(with_author(&state.db, model).await?))
}

#[utoipa::path(
    patch,
    path = "/{comment_id}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Update a comment",
    description = "Allowed for the author, moderators and admins.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title, review or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(title_id, review_id, comment_id))]
pub async fn update_comment(
    caller: Caller,
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let txn = state.db.begin().await?;

    let existing = find_comment_for_review(&txn, title_id, review_id, comment_id).await?;
    caller.require(Action::EditContent {
        author_id: existing.author_id,
    })?;

    validate_update_comment(&payload)?;

    let model = match payload.text {
        Some(text) => {
            let mut active: comment::ActiveModel = existing.into();
            active.text = Set(text);
            active.update(&txn).await?
        }
        None => existing,
    };

    let response = with_author(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/{comment_id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
    description = "Allowed for the author, moderators and admins.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title, review or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(title_id, review_id, comment_id))]
pub async fn delete_comment(
    caller: Caller,
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_comment_for_review(&state.db, title_id, review_id, comment_id).await?;
    caller.require(Action::EditContent {
        author_id: existing.author_id,
    })?;

    comment::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
