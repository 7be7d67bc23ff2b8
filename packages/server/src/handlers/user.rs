use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, Caller};
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::shared::normalize_email;
use crate::models::user::*;
use crate::policy::{Action, Capabilities};
use crate::state::AppState;
use crate::utils::account::{delete_user_cascade, ensure_identity_free, user_write_error};
use crate::utils::catalog::name_contains;

async fn find_user_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<user::Model, AppError> {
    user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Apply a PATCH to `existing`, checking identity uniqueness first.
///
/// Returns the unchanged row when the payload touches nothing.
async fn apply_user_update<C: ConnectionTrait>(
    db: &C,
    existing: user::Model,
    payload: UpdateUserRequest,
) -> Result<user::Model, AppError> {
    validate_update_user(&payload)?;

    let username = payload.username.map(|u| u.trim().to_string());
    let email = payload.email.as_deref().map(normalize_email);

    ensure_identity_free(
        db,
        username.as_deref().filter(|u| *u != existing.username),
        email.as_deref().filter(|e| *e != existing.email),
        Some(existing.id),
    )
    .await?;

    let mut active: user::ActiveModel = existing.clone().into();
    if let Some(username) = username {
        active.username = Set(username);
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name.trim().to_string());
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(last_name.trim().to_string());
    }
    if let Some(bio) = payload.bio {
        active.bio = Set(bio);
    }
    if let Some(role) = payload.role {
        active.role = Set(role);
    }

    if !active.is_changed() {
        return Ok(existing);
    }

    active.update(db).await.map_err(user_write_error)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users",
    description = "Returns all accounts ordered by ID, optionally filtered by a case-insensitive username substring. Admin only.",
    params(UserListQuery),
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, query))]
pub async fn list_users(
    caller: Caller,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    caller.require(Action::ManageUsers)?;

    let mut select = user::Entity::find();
    if let Some(cond) = query
        .search
        .as_deref()
        .and_then(|s| name_contains(user::Column::Username, s))
    {
        select = select.filter(cond);
    }

    let users = select.order_by_asc(user::Column::Id).all(&state.db).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create a user",
    description = "Creates an account directly with the given role. The account still needs a confirmation code to obtain a token. Admin only.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Username or email taken (USERNAME_TAKEN, EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(username = %payload.username))]
pub async fn create_user(
    caller: Caller,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Action::ManageUsers)?;
    validate_create_user(&payload)?;

    let username = payload.username.trim().to_string();
    let email = normalize_email(&payload.email);

    ensure_identity_free(&state.db, Some(&username), Some(&email), None).await?;

    let new_user = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        first_name: Set(payload.first_name.trim().to_string()),
        last_name: Set(payload.last_name.trim().to_string()),
        bio: Set(payload.bio),
        role: Set(payload.role),
        is_superuser: Set(false),
        is_confirmed: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let model = new_user
        .insert(&state.db)
        .await
        .map_err(user_write_error)?;

    tracing::info!(user_id = model.id, role = %model.role, "User created");

    Ok((StatusCode::CREATED, Json(UserResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{username}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user by username",
    description = "Admin only.",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(username))]
pub async fn get_user(
    caller: Caller,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    caller.require(Action::ManageUsers)?;

    let model = find_user_by_username(&state.db, &username).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{username}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user",
    description = "Partial update of any account, including its role. Admin only.",
    params(("username" = String, Path, description = "Username")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Username or email taken (USERNAME_TAKEN, EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(username))]
pub async fn update_user(
    caller: Caller,
    State(state): State<AppState>,
    Path(username): Path<String>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    caller.require(Action::ManageUsers)?;

    let txn = state.db.begin().await?;
    let existing = find_user_by_username(&txn, &username).await?;
    let model = apply_user_update(&txn, existing, payload).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{username}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete a user",
    description = "Deletes the account together with its reviews, comments on those reviews, its own comments and its confirmation codes. Admin only.",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(username))]
pub async fn delete_user(
    caller: Caller,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Action::ManageUsers)?;

    let txn = state.db.begin().await?;
    let existing = find_user_by_username(&txn, &username).await?;
    delete_user_cascade(&txn, existing.id).await?;
    txn.commit().await?;

    tracing::info!(user_id = existing.id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    operation_id = "getMe",
    summary = "Get own profile",
    responses(
        (status = 200, description = "Own profile", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let model = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "Users",
    operation_id = "updateMe",
    summary = "Update own profile",
    description = "Partial update of the caller's own account. The role cannot be changed here; a `role` field in the body is ignored.",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Username or email taken (USERNAME_TAKEN, EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateMeRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let txn = state.db.begin().await?;
    let existing = user::Entity::find_by_id(auth_user.user_id)
        .one(&txn)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    let model = apply_user_update(&txn, existing, payload.into()).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}
