use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;

use crate::error::AppError;
use crate::models::shared::escape_like;

/// Case-insensitive substring match on `column`. `None` when the trimmed
/// search term is empty.
pub fn name_contains<C: ColumnTrait>(column: C, search: &str) -> Option<Expr> {
    let term = escape_like(search.trim());
    if term.is_empty() {
        return None;
    }
    Some(
        Expr::expr(Func::lower(column.into_expr()))
            .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
    )
}

/// List the rows of a slugged catalog table ordered by ID, optionally
/// filtered by a name substring.
pub async fn list_entries<E, C>(
    db: &C,
    name_column: E::Column,
    id_column: E::Column,
    search: Option<&str>,
) -> Result<Vec<E::Model>, AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut select = E::find();
    if let Some(cond) = search.and_then(|s| name_contains(name_column, s)) {
        select = select.filter(cond);
    }
    Ok(select.order_by_asc(id_column).all(db).await?)
}

/// Fail with `409 CONFLICT` if `slug` is already used in the table.
pub async fn ensure_slug_free<E, C>(
    db: &C,
    slug_column: E::Column,
    kind: &str,
    slug: &str,
) -> Result<(), AppError>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let exists = E::find().filter(slug_column.eq(slug)).count(db).await?;
    if exists > 0 {
        return Err(slug_taken(kind, slug));
    }
    Ok(())
}

/// Look up a row by slug, returning 404 if not found.
pub async fn find_by_slug<E, C>(
    db: &C,
    slug_column: E::Column,
    kind: &str,
    slug: &str,
) -> Result<E::Model, AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    E::find()
        .filter(slug_column.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{kind} not found")))
}

/// Map an insert error, turning a unique violation into `409 CONFLICT`.
pub fn slug_write_error(err: DbErr, kind: &str, slug: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => slug_taken(kind, slug),
        _ => AppError::from(err),
    }
}

fn slug_taken(kind: &str, slug: &str) -> AppError {
    AppError::Conflict(format!("{kind} '{slug}' already exists"))
}
