use serde::{Deserialize, Serialize};

use super::shared::{MAX_TEXT_LENGTH, validate_email, validate_username};
use crate::entity::user;
use crate::error::AppError;
use crate::policy::Role;

/// Public representation of a user account.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = "alice_reviews")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            username: m.username,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            bio: m.bio,
            role: m.role,
        }
    }
}

/// Admin request to create a user directly.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    #[schema(max_length = 30)]
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub bio: String,
    /// Defaults to `user`.
    #[serde(default)]
    pub role: Role,
}

/// Admin PATCH on any user.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
}

/// Self PATCH via `/users/me`. A `role` field in the body is ignored.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateMeRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

impl From<UpdateMeRequest> for UpdateUserRequest {
    fn from(r: UpdateMeRequest) -> Self {
        Self {
            username: r.username,
            email: r.email,
            first_name: r.first_name,
            last_name: r.last_name,
            bio: r.bio,
            role: None,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Case-insensitive username substring.
    pub search: Option<String>,
}

fn validate_person_name(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().chars().count() > 150 {
        return Err(AppError::Validation(format!(
            "{field} must be at most 150 characters"
        )));
    }
    Ok(())
}

fn validate_bio(bio: &str) -> Result<(), AppError> {
    if bio.chars().count() > MAX_TEXT_LENGTH {
        return Err(AppError::Validation(format!(
            "Bio must be at most {MAX_TEXT_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_create_user(req: &CreateUserRequest) -> Result<(), AppError> {
    validate_username(&req.username)?;
    validate_email(&req.email)?;
    validate_person_name(&req.first_name, "First name")?;
    validate_person_name(&req.last_name, "Last name")?;
    validate_bio(&req.bio)?;
    Ok(())
}

pub fn validate_update_user(req: &UpdateUserRequest) -> Result<(), AppError> {
    if let Some(ref username) = req.username {
        validate_username(username)?;
    }
    if let Some(ref email) = req.email {
        validate_email(email)?;
    }
    if let Some(ref first_name) = req.first_name {
        validate_person_name(first_name, "First name")?;
    }
    if let Some(ref last_name) = req.last_name {
        validate_person_name(last_name, "Last name")?;
    }
    if let Some(ref bio) = req.bio {
        validate_bio(bio)?;
    }
    Ok(())
}
