use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single-use credential sent out-of-band at sign-up and exchanged for an
/// access token. Only the SHA-256 digest of the code is stored.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "confirmation_code")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    /// Hex-encoded SHA-256 of the plaintext code.
    pub code_hash: String,

    pub issued_at: DateTimeUtc,
    pub expires_at: DateTimeUtc,
    /// Set when the code is exchanged or superseded by a newer one.
    pub consumed_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
