use std::collections::HashMap;

use sea_orm::*;

use crate::entity::{comment, review, title, user};
use crate::error::AppError;

/// Look up a title by ID, returning 404 if not found.
pub async fn find_title<C: ConnectionTrait>(db: &C, id: i32) -> Result<title::Model, AppError> {
    title::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Title not found".into()))
}

/// Look up a review that belongs to the given title, returning 404 otherwise.
pub async fn find_review_for_title<C: ConnectionTrait>(
    db: &C,
    title_id: i32,
    review_id: i32,
) -> Result<review::Model, AppError> {
    let review = review::Entity::find_by_id(review_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".into()))?;

    if review.title_id != title_id {
        return Err(AppError::NotFound("Review not found".into()));
    }

    Ok(review)
}

/// Look up a comment under `/titles/{title_id}/reviews/{review_id}`,
/// returning 404 if any link in the chain does not match.
pub async fn find_comment_for_review<C: ConnectionTrait>(
    db: &C,
    title_id: i32,
    review_id: i32,
    comment_id: i32,
) -> Result<comment::Model, AppError> {
    find_review_for_title(db, title_id, review_id).await?;

    let comment = comment::Entity::find_by_id(comment_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;

    if comment.review_id != review_id {
        return Err(AppError::NotFound("Comment not found".into()));
    }

    Ok(comment)
}

/// Map author IDs to usernames in a single query.
pub async fn usernames_by_id<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, String>, AppError> {
    let mut ids: Vec<i32> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, String)> = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Username)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows.into_iter().collect())
}

/// Delete a set of reviews together with their comments.
pub async fn delete_reviews_cascade<C: ConnectionTrait>(
    db: &C,
    review_ids: Vec<i32>,
) -> Result<(), AppError> {
    if review_ids.is_empty() {
        return Ok(());
    }

    comment::Entity::delete_many()
        .filter(comment::Column::ReviewId.is_in(review_ids.clone()))
        .exec(db)
        .await?;
    review::Entity::delete_many()
        .filter(review::Column::Id.is_in(review_ids))
        .exec(db)
        .await?;

    Ok(())
}
