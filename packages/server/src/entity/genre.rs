use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "genre")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,

    #[sea_orm(has_many, via = "title_genre")]
    pub titles: HasMany<super::title::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
