use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Unique on `(product_id, name, value)`, see `seed::ensure_indexes`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_variant")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub product_id: i32,
    #[sea_orm(belongs_to, from = "product_id", to = "id")]
    pub product: HasOne<super::product::Entity>,

    pub name: String,
    pub value: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price_adjustment: Decimal,
    pub stock_quantity: i32,
    pub sku_suffix: String,
}

impl ActiveModelBehavior for ActiveModel {}
