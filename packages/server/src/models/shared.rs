use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// Maximum length of free-text fields (review/comment text, bio).
pub const MAX_TEXT_LENGTH: usize = 10_000;
/// Maximum length of a username.
pub const MAX_USERNAME_LENGTH: usize = 30;
/// Maximum length of a category, genre or title name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate a trimmed display name (1-200 Unicode characters).
pub fn validate_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Name must be 1-{MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a username: 1-30 characters from letters, digits and `@.+-_`,
/// and never `me` in any letter case (reserved for the self-profile route).
pub fn validate_username(username: &str) -> Result<(), AppError> {
    let username = username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Username must be 1-{MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        return Err(AppError::Validation(
            "Username may contain only letters, digits and @/./+/-/_".into(),
        ));
    }
    if username.eq_ignore_ascii_case("me") {
        return Err(AppError::Validation(format!(
            "'{username}' is not a valid username"
        )));
    }
    Ok(())
}

/// Validate an email address shape. Uniqueness is checked against the database.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let invalid = || AppError::Validation("Enter a valid email address".into());

    if email.is_empty() || email.len() > 254 || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(())
}

/// Canonical stored form of an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a non-empty free-text body.
pub fn validate_text(text: &str, field: &str) -> Result<(), AppError> {
    if text.trim().is_empty() || text.chars().count() > MAX_TEXT_LENGTH {
        return Err(AppError::Validation(format!(
            "{field} must be non-empty and at most {MAX_TEXT_LENGTH} characters"
        )));
    }
    Ok(())
}
