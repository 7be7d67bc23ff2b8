use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::validate_text;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateReviewRequest {
    pub text: String,
    /// Integer score from 1 to 10.
    #[schema(example = 8)]
    pub score: i32,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateReviewRequest {
    pub text: Option<String>,
    pub score: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewResponse {
    pub id: i32,
    pub text: String,
    /// Author's username.
    pub author: String,
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCommentRequest {
    pub text: String,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateCommentRequest {
    pub text: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub text: String,
    /// Author's username.
    pub author: String,
    pub pub_date: DateTime<Utc>,
}

fn validate_score(score: i32) -> Result<(), AppError> {
    if !(1..=10).contains(&score) {
        return Err(AppError::Validation("Score must be 1-10".into()));
    }
    Ok(())
}

pub fn validate_create_review(req: &CreateReviewRequest) -> Result<(), AppError> {
    validate_text(&req.text, "Text")?;
    validate_score(req.score)?;
    Ok(())
}

pub fn validate_update_review(req: &UpdateReviewRequest) -> Result<(), AppError> {
    if let Some(ref text) = req.text {
        validate_text(text, "Text")?;
    }
    if let Some(score) = req.score {
        validate_score(score)?;
    }
    Ok(())
}

pub fn validate_create_comment(req: &CreateCommentRequest) -> Result<(), AppError> {
    validate_text(&req.text, "Text")
}

pub fn validate_update_comment(req: &UpdateCommentRequest) -> Result<(), AppError> {
    if let Some(ref text) = req.text {
        validate_text(text, "Text")?;
    }
    Ok(())
}
