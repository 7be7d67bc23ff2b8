use sea_orm::*;

use crate::entity::{comment, confirmation_code, review, user};
use crate::error::AppError;
use crate::utils::content::delete_reviews_cascade;

/// Map a unique-constraint violation on the `user` table to the matching
/// conflict error. Other errors pass through as internal errors.
pub fn user_write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!("User unique constraint caught on write: {detail}");
            if detail.contains("email") {
                AppError::EmailTaken
            } else {
                AppError::UsernameTaken
            }
        }
        _ => AppError::from(err),
    }
}

/// Fail with `UsernameTaken`/`EmailTaken` if another account already uses
/// `username` or `email`. `except_id` excludes the account being edited.
pub async fn ensure_identity_free<C: ConnectionTrait>(
    db: &C,
    username: Option<&str>,
    email: Option<&str>,
    except_id: Option<i32>,
) -> Result<(), AppError> {
    if let Some(username) = username {
        let mut query = user::Entity::find().filter(user::Column::Username.eq(username));
        if let Some(id) = except_id {
            query = query.filter(user::Column::Id.ne(id));
        }
        if query.count(db).await? > 0 {
            return Err(AppError::UsernameTaken);
        }
    }
    if let Some(email) = email {
        let mut query = user::Entity::find().filter(user::Column::Email.eq(email));
        if let Some(id) = except_id {
            query = query.filter(user::Column::Id.ne(id));
        }
        if query.count(db).await? > 0 {
            return Err(AppError::EmailTaken);
        }
    }
    Ok(())
}

/// Delete a user with everything they authored and their confirmation codes.
pub async fn delete_user_cascade<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<(), AppError> {
    let review_ids: Vec<i32> = review::Entity::find()
        .filter(review::Column::AuthorId.eq(user_id))
        .select_only()
        .column(review::Column::Id)
        .into_tuple()
        .all(db)
        .await?;
    delete_reviews_cascade(db, review_ids).await?;

    comment::Entity::delete_many()
        .filter(comment::Column::AuthorId.eq(user_id))
        .exec(db)
        .await?;
    confirmation_code::Entity::delete_many()
        .filter(confirmation_code::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    user::Entity::delete_by_id(user_id).exec(db).await?;

    Ok(())
}
