use serde::{Deserialize, Serialize};

use super::shared::{validate_email, validate_username};
use crate::error::AppError;

/// Request body for sign-up.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    /// Unique username (1-30 chars: letters, digits, `@.+-_`; `me` is reserved).
    #[schema(example = "alice_reviews", max_length = 30)]
    pub username: String,
    /// Unique email address that receives the confirmation code.
    #[schema(example = "alice@example.com")]
    pub email: String,
}

pub fn validate_signup_request(payload: &SignupRequest) -> Result<(), AppError> {
    validate_username(&payload.username)?;
    validate_email(&payload.email)?;
    Ok(())
}

/// Successful sign-up response. The confirmation code is delivered by email.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SignupResponse {
    #[schema(example = "alice_reviews")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
}

/// Request body for exchanging a confirmation code for an access token.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct TokenRequest {
    #[schema(example = "alice_reviews")]
    pub username: String,
    /// Code received by email after sign-up.
    #[schema(example = "4ZsPq9Lk2TbW7xYc")]
    pub confirmation_code: String,
}

pub fn validate_token_request(payload: &TokenRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if payload.confirmation_code.trim().is_empty() {
        return Err(AppError::Validation(
            "Confirmation code must not be empty".into(),
        ));
    }
    Ok(())
}

/// Successful token exchange response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    /// JWT bearer access token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
}
