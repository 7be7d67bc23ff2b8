use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::EntityTrait;

use crate::entity::user;
use crate::error::AppError;
use crate::policy::{Action, Capabilities, Role};
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user resolved from the `Authorization: Bearer <token>` header.
///
/// The token only identifies the user; role and superuser status are read
/// from the database on every request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    pub is_superuser: bool,
}

impl Capabilities for AuthUser {
    fn user_id(&self) -> Option<i32> {
        Some(self.user_id)
    }

    fn is_admin(&self) -> bool {
        self.role == Role::Admin || self.is_superuser
    }

    fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}

/// Whoever sent the request: an authenticated user or the anonymous caller.
///
/// Add this as a handler parameter on endpoints anonymous callers may reach;
/// the policy decides in the handler body via `caller.require(..)`.
#[derive(Debug, Clone)]
pub enum Caller {
    Anonymous,
    User(AuthUser),
}

impl Caller {
    /// The authenticated user, or `TokenMissing` for the anonymous caller.
    pub fn into_user(self) -> Result<AuthUser, AppError> {
        match self {
            Caller::User(user) => Ok(user),
            Caller::Anonymous => Err(AppError::TokenMissing),
        }
    }

    /// Check `action` against the policy and return the user performing it.
    pub fn authorize_user(self, action: Action) -> Result<AuthUser, AppError> {
        self.require(action)?;
        self.into_user()
    }
}

impl Capabilities for Caller {
    fn user_id(&self) -> Option<i32> {
        match self {
            Caller::User(user) => user.user_id(),
            Caller::Anonymous => None,
        }
    }

    fn is_admin(&self) -> bool {
        matches!(self, Caller::User(user) if user.is_admin())
    }

    fn is_moderator(&self) -> bool {
        matches!(self, Caller::User(user) if user.is_moderator())
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get("Authorization") else {
            return Ok(Caller::Anonymous);
        };

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        let user = user::Entity::find_by_id(claims.uid)
            .one(&state.db)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        Ok(Caller::User(AuthUser {
            user_id: user.id,
            username: user.username,
            role: user.role,
            is_superuser: user.is_superuser,
        }))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Caller::from_request_parts(parts, state).await?.into_user()
    }
}
