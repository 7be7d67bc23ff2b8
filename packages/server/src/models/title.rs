use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{CatalogEntryResponse, validate_slug};
use super::shared::{MAX_TEXT_LENGTH, double_option, validate_name};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTitleRequest {
    #[schema(example = "Solaris", max_length = 200)]
    pub name: String,
    /// Release year; must not be in the future.
    #[schema(example = 1961)]
    pub year: i32,
    #[serde(default)]
    pub description: String,
    /// Slug of an existing category.
    #[schema(example = "book")]
    pub category: String,
    /// Slugs of existing genres (at least one).
    #[schema(example = json!(["sci-fi"]))]
    pub genre: Vec<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateTitleRequest {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    /// Omit to keep, `null` to clear, slug to replace.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub category: Option<Option<String>>,
    /// Replaces the full genre set when present.
    pub genre: Option<Vec<String>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TitleResponse {
    pub id: i32,
    pub name: String,
    pub year: i32,
    /// Rounded average review score, `null` without reviews.
    #[schema(example = 8)]
    pub rating: Option<i32>,
    pub description: String,
    pub genre: Vec<CatalogEntryResponse>,
    pub category: Option<CatalogEntryResponse>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TitleListQuery {
    /// Category slug.
    pub category: Option<String>,
    /// Genre slug.
    pub genre: Option<String>,
    /// Case-insensitive name substring.
    pub name: Option<String>,
    /// Exact release year.
    pub year: Option<i32>,
}

fn validate_year(year: i32) -> Result<(), AppError> {
    let current = Utc::now().year();
    if year > current {
        return Err(AppError::Validation(format!(
            "Year must not be later than {current}"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), AppError> {
    if description.chars().count() > MAX_TEXT_LENGTH {
        return Err(AppError::Validation(format!(
            "Description must be at most {MAX_TEXT_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_genre_slugs(slugs: &[String]) -> Result<(), AppError> {
    if slugs.is_empty() {
        return Err(AppError::Validation(
            "At least one genre is required".into(),
        ));
    }
    for slug in slugs {
        validate_slug(slug)?;
    }
    Ok(())
}

pub fn validate_create_title(req: &CreateTitleRequest) -> Result<(), AppError> {
    validate_name(&req.name)?;
    validate_year(req.year)?;
    validate_description(&req.description)?;
    validate_slug(&req.category)?;
    validate_genre_slugs(&req.genre)?;
    Ok(())
}

pub fn validate_update_title(req: &UpdateTitleRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_name(name)?;
    }
    if let Some(year) = req.year {
        validate_year(year)?;
    }
    if let Some(ref description) = req.description {
        validate_description(description)?;
    }
    if let Some(Some(ref category)) = req.category {
        validate_slug(category)?;
    }
    if let Some(ref genre) = req.genre {
        validate_genre_slugs(genre)?;
    }
    Ok(())
}
