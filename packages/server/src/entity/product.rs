use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub vendor_id: i32,
    #[sea_orm(belongs_to, from = "vendor_id", to = "id")]
    pub vendor: HasOne<super::vendor::Entity>,

    pub category_id: i32,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: HasOne<super::category::Entity>,

    pub name: String,
    /// Assigned once on insert from name + store name, never rewritten.
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub short_description: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub compare_price: Option<Decimal>,
    /// One of: new, used, refurbished
    pub condition: String,
    /// Assigned once on insert, never rewritten.
    #[sea_orm(unique)]
    pub sku: String,
    pub stock_quantity: i32,
    pub track_inventory: bool,
    #[sea_orm(column_type = "Decimal(Some((6, 2)))")]
    pub weight: Option<Decimal>,
    pub dimensions: String,
    pub is_digital: bool,
    pub is_active: bool,
    pub is_featured: bool,
    pub meta_title: String,
    pub meta_description: String,

    #[sea_orm(has_many)]
    pub images: HasMany<super::product_image::Entity>,

    #[sea_orm(has_many)]
    pub variants: HasMany<super::product_variant::Entity>,

    #[sea_orm(has_many)]
    pub reviews: HasMany<super::review::Entity>,

    #[sea_orm(has_many)]
    pub order_items: HasMany<super::order_item::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
