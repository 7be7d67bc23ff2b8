use axum::{Json, extract::State};
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::auth::{
    SignupRequest, SignupResponse, TokenRequest, TokenResponse, validate_signup_request,
    validate_token_request,
};
use crate::models::shared::normalize_email;
use crate::policy::Role;
use crate::state::AppState;
use crate::utils::account::ensure_identity_free;
use crate::utils::{confirmation, jwt};

#[utoipa::path(
    post,
    path = "/signup",
    tag = "Auth",
    operation_id = "signup",
    summary = "Sign up and receive a confirmation code by email",
    description = "Creates an unconfirmed account, or reuses the account whose username and email both match, then emails a fresh confirmation code. Earlier codes for the account stop working.",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Confirmation code sent", body = SignupResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username or email belongs to another account (USERNAME_TAKEN, EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<Json<SignupResponse>, AppError> {
    validate_signup_request(&payload)?;

    let username = payload.username.trim();
    let email = normalize_email(&payload.email);
    let ttl = state.config.auth.confirmation_code_ttl_minutes;

    // A concurrent sign-up may insert the same username or email between the
    // lookup and our insert. The retry sees the committed row and either
    // reuses it or reports which identity is taken.
    let (account, code) = match register(&state.db, username, &email, ttl).await? {
        Some(issued) => issued,
        None => register(&state.db, username, &email, ttl)
            .await?
            .ok_or(AppError::UsernameTaken)?,
    };

    if let Err(e) = state
        .mailer
        .send_confirmation_code(&account.username, &account.email, &code)
        .await
    {
        tracing::warn!(user_id = account.id, "Confirmation code not delivered: {e}");
    }

    Ok(Json(SignupResponse {
        username: account.username,
        email: account.email,
    }))
}

/// Find or create the account for a sign-up and issue it a fresh code, in one
/// transaction. `None` means the insert lost a race on a unique column and
/// the transaction was rolled back.
async fn register(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    code_ttl_minutes: i64,
) -> Result<Option<(user::Model, String)>, AppError> {
    let txn = db.begin().await?;

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(&txn)
        .await?;

    let account = match existing {
        Some(account) if account.email == email => account,
        Some(_) => return Err(AppError::UsernameTaken),
        None => {
            ensure_identity_free(&txn, None, Some(email), None).await?;

            let new_user = user::ActiveModel {
                username: Set(username.to_string()),
                email: Set(email.to_string()),
                first_name: Set(String::new()),
                last_name: Set(String::new()),
                bio: Set(String::new()),
                role: Set(Role::User),
                is_superuser: Set(false),
                is_confirmed: Set(false),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            };
            match new_user.insert(&txn).await {
                Ok(model) => model,
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    tracing::debug!("Sign-up insert raced with another request, retrying");
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    let code = confirmation::issue(&txn, account.id, code_ttl_minutes).await?;
    txn.commit().await?;

    Ok(Some((account, code)))
}

#[utoipa::path(
    post,
    path = "/token",
    tag = "Auth",
    operation_id = "obtainToken",
    summary = "Exchange a confirmation code for an access token",
    description = "Accepts only the most recently issued code, once, before it expires.",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Access token issued", body = TokenResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong, expired or used code (INVALID_CONFIRMATION_CODE)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    validate_token_request(&payload)?;

    let account = user::Entity::find()
        .filter(user::Column::Username.eq(payload.username.trim()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let txn = state.db.begin().await?;

    confirmation::consume(&txn, account.id, &payload.confirmation_code).await?;

    if !account.is_confirmed {
        user::Entity::update_many()
            .col_expr(user::Column::IsConfirmed, Expr::value(true))
            .filter(user::Column::Id.eq(account.id))
            .exec(&txn)
            .await?;
    }

    let token = jwt::sign(
        account.id,
        &account.username,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    txn.commit().await?;

    Ok(Json(TokenResponse { token }))
}
