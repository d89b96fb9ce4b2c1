use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RESPONSE_TIME: &str = "Usually responds within 24 hours";
pub const DEFAULT_SHIPPING_POLICY: &str = "Standard shipping rates apply";
pub const DEFAULT_RETURN_POLICY: &str = "30-day return policy";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vendor")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// One store per user.
    #[sea_orm(unique)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub store_name: String,
    #[sea_orm(column_type = "Text")]
    pub store_description: String,
    pub store_logo: Option<String>,
    pub phone: String,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    /// Without the leading `@`.
    pub twitter_handle: String,
    pub response_time: String,
    #[sea_orm(column_type = "Text")]
    pub shipping_policy: String,
    #[sea_orm(column_type = "Text")]
    pub return_policy: String,
    /// Set by staff only.
    pub is_verified: bool,

    #[sea_orm(has_many)]
    pub products: HasMany<super::product::Entity>,

    #[sea_orm(has_one)]
    pub profile: HasOne<super::vendor_profile::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
