use serde::{Deserialize, Serialize};

use super::shared::validate_name;
use crate::entity::{category, genre};
use crate::error::AppError;

/// Request body for creating a category or a genre.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCatalogEntryRequest {
    #[schema(example = "Science fiction", max_length = 200)]
    pub name: String,
    /// Unique URL-safe identifier (1-50 chars: letters, digits, `-`, `_`).
    #[schema(example = "sci-fi")]
    pub slug: String,
}

/// Category or genre as exposed by the API.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct CatalogEntryResponse {
    #[schema(example = "Science fiction")]
    pub name: String,
    #[schema(example = "sci-fi")]
    pub slug: String,
}

impl From<category::Model> for CatalogEntryResponse {
    fn from(m: category::Model) -> Self {
        Self {
            name: m.name,
            slug: m.slug,
        }
    }
}

impl From<genre::Model> for CatalogEntryResponse {
    fn from(m: genre::Model) -> Self {
        Self {
            name: m.name,
            slug: m.slug,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogListQuery {
    /// Case-insensitive name substring.
    pub search: Option<String>,
}

pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.len() > 50 {
        return Err(AppError::Validation("Slug must be 1-50 characters".into()));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::Validation(
            "Slug may contain only ASCII letters, digits, hyphens and underscores".into(),
        ));
    }
    Ok(())
}

pub fn validate_catalog_entry(req: &CreateCatalogEntryRequest) -> Result<(), AppError> {
    validate_name(&req.name)?;
    validate_slug(&req.slug)?;
    Ok(())
}
