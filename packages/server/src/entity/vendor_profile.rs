use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vendor_profile")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub vendor_id: i32,
    #[sea_orm(belongs_to, from = "vendor_id", to = "id")]
    pub vendor: HasOne<super::vendor::Entity>,

    pub website: String,
    pub facebook_url: String,
    pub instagram_url: String,
    pub business_license: String,
    pub tax_id: String,
    pub bank_account: String,
}

impl ActiveModelBehavior for ActiveModel {}
