use chrono::{Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use sea_orm::prelude::Expr;
use sea_orm::*;
use sha2::{Digest, Sha256};

use crate::entity::confirmation_code;
use crate::error::AppError;

pub const CODE_LENGTH: usize = 16;

/// Generate a random alphanumeric confirmation code.
pub fn generate_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_LENGTH)
        .map(char::from)
        .collect()
}

/// Hex-encoded SHA-256 of a code, as stored in `confirmation_code.code_hash`.
pub fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.trim().as_bytes()))
}

/// Issue a fresh code for `user_id`, revoking every earlier unconsumed one.
///
/// Returns the plaintext code; only its hash is persisted.
pub async fn issue<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    ttl_minutes: i64,
) -> Result<String, AppError> {
    let now = Utc::now();

    confirmation_code::Entity::update_many()
        .col_expr(confirmation_code::Column::ConsumedAt, Expr::value(now))
        .filter(confirmation_code::Column::UserId.eq(user_id))
        .filter(confirmation_code::Column::ConsumedAt.is_null())
        .exec(db)
        .await?;

    let code = generate_code();
    let record = confirmation_code::ActiveModel {
        user_id: Set(user_id),
        code_hash: Set(hash_code(&code)),
        issued_at: Set(now),
        expires_at: Set(now + Duration::minutes(ttl_minutes)),
        consumed_at: Set(None),
        ..Default::default()
    };
    record.insert(db).await?;

    Ok(code)
}

/// Consume the user's live code if it matches `code`.
///
/// Only the most recently issued, unconsumed, unexpired code is accepted.
/// The consuming update is conditional on `consumed_at IS NULL`, so two
/// concurrent exchanges of the same code cannot both succeed.
pub async fn consume<C: ConnectionTrait>(db: &C, user_id: i32, code: &str) -> Result<(), AppError> {
    let now = Utc::now();

    let live = confirmation_code::Entity::find()
        .filter(confirmation_code::Column::UserId.eq(user_id))
        .filter(confirmation_code::Column::ConsumedAt.is_null())
        .order_by_desc(confirmation_code::Column::IssuedAt)
        .order_by_desc(confirmation_code::Column::Id)
        .one(db)
        .await?
        .ok_or(AppError::InvalidConfirmationCode)?;

    if live.expires_at <= now || live.code_hash != hash_code(code) {
        return Err(AppError::InvalidConfirmationCode);
    }

    let result = confirmation_code::Entity::update_many()
        .col_expr(confirmation_code::Column::ConsumedAt, Expr::value(now))
        .filter(confirmation_code::Column::Id.eq(live.id))
        .filter(confirmation_code::Column::ConsumedAt.is_null())
        .exec(db)
        .await?;

    if result.rows_affected != 1 {
        return Err(AppError::InvalidConfirmationCode);
    }

    Ok(())
}
