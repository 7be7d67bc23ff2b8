use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::policy::Role;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    /// Stored lower-cased.
    #[sea_orm(unique)]
    pub email: String,

    pub first_name: String,
    pub last_name: String,
    #[sea_orm(column_type = "Text")]
    pub bio: String,

    pub role: Role,
    /// Admin-equivalent regardless of `role`.
    #[sea_orm(default_value = false)]
    pub is_superuser: bool,
    /// Set once the user has exchanged a confirmation code for a token.
    #[sea_orm(default_value = false)]
    pub is_confirmed: bool,

    #[sea_orm(has_many)]
    pub confirmation_codes: HasMany<super::confirmation_code::Entity>,

    #[sea_orm(has_many)]
    pub reviews: HasMany<super::review::Entity>,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
