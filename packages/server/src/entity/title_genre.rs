use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "title_genre")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub title_id: i32,
    #[sea_orm(primary_key)]
    pub genre_id: i32,
    #[sea_orm(belongs_to, from = "title_id", to = "id")]
    pub title: Option<super::title::Entity>,
    #[sea_orm(belongs_to, from = "genre_id", to = "id")]
    pub genre: Option<super::genre::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
