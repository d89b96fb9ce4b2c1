use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order header owned by the order subsystem. Read-only for the catalog.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    /// See [`catalog_common::OrderStatus`].
    pub status: String,

    #[sea_orm(has_many)]
    pub items: HasMany<super::order_item::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
