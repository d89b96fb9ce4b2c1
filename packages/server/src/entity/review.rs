use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Unique on `(user_id, product_id)`, see `seed::ensure_indexes`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub product_id: i32,
    #[sea_orm(belongs_to, from = "product_id", to = "id")]
    pub product: HasOne<super::product::Entity>,

    /// 1 to 5.
    pub rating: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub comment: String,
    /// Stamped once at creation from the buyer's order history.
    pub is_verified: bool,
    /// Moderation flag; only approved reviews are shown and aggregated.
    pub is_approved: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
