use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A reviewable work. The rating is derived from reviews on read.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "title")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(indexed)]
    pub year: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// NULL once the category is deleted.
    pub category_id: Option<i32>,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: Option<super::category::Entity>,

    #[sea_orm(has_many, via = "title_genre")]
    pub genres: HasMany<super::genre::Entity>,

    #[sea_orm(has_many)]
    pub reviews: HasMany<super::review::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
