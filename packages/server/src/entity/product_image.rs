use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_image")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub product_id: i32,
    #[sea_orm(belongs_to, from = "product_id", to = "id")]
    pub product: HasOne<super::product::Entity>,

    /// Storage path or URL of the uploaded file.
    pub image: String,
    pub alt_text: String,
    /// Conventionally at most one per product; not enforced by the schema.
    pub is_primary: bool,
    pub position: i32,
}

impl ActiveModelBehavior for ActiveModel {}
