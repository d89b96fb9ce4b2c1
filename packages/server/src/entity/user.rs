use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Marketplace account. Credentials and sessions live with the auth layer;
/// the catalog only needs identity and role.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    /// `buyer` or `vendor`, see [`catalog_common::UserRole`].
    pub user_type: String,
    pub is_staff: bool,

    #[sea_orm(has_one)]
    pub vendor: HasOne<super::vendor::Entity>,

    #[sea_orm(has_many)]
    pub groups: HasMany<super::user_group::Entity>,

    #[sea_orm(has_many)]
    pub reviews: HasMany<super::review::Entity>,

    #[sea_orm(has_many)]
    pub orders: HasMany<super::order::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
