use std::collections::HashMap;

use catalog_common::Sku;
use catalog_common::retry::RetryPolicy;
use catalog_common::slug::product_slug_base;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::info;

use crate::entity::{category, product, product_image, product_variant, review, vendor};
use crate::error::{AppError, conflict_on_unique};
use crate::models::product::*;
use crate::models::shared::escape_like;

use super::identity::{IdentityService, PRODUCT_IDENTITY_KEYS, retry_identity_collision};
use super::orders::OrderLedger;

/// Filters for the public product listing.
#[derive(Debug, Default)]
pub struct ProductFilter {
    pub category_id: Option<i32>,
    pub search: Option<String>,
}

pub struct ProductService<'a, C: ConnectionTrait + TransactionTrait> {
    pub conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> ProductService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Create a product in `vendor`'s store with generated slug and SKU.
    ///
    /// The product row is retried under a savepoint until its slug and SKU
    /// are both free; the attached images land in the same transaction.
    pub async fn create(
        &self,
        vendor: &vendor::Model,
        req: CreateProductRequest,
        policy: RetryPolicy,
    ) -> Result<(product::Model, Vec<product_image::Model>), AppError> {
        find_active_category(self.conn, req.category_id).await?;

        let name = req.name.trim().to_string();
        let base = product_slug_base(&name, &vendor.store_name)?;

        let txn = self.conn.begin().await?;
        let mut budget = policy.start();
        let created = loop {
            let slug = IdentityService::new(&txn).product_slug(&base).await?;
            let sku = Sku::generate(vendor.id);
            let now = Utc::now();
            let model = product::ActiveModel {
                vendor_id: Set(vendor.id),
                category_id: Set(req.category_id),
                name: Set(name.clone()),
                slug: Set(slug),
                description: Set(req.description.clone()),
                short_description: Set(req.short_description.clone().unwrap_or_default()),
                price: Set(req.price),
                compare_price: Set(req.compare_price),
                condition: Set(req.condition.unwrap_or_default().as_str().to_string()),
                sku: Set(sku.into_inner()),
                stock_quantity: Set(req.stock_quantity.unwrap_or(0)),
                track_inventory: Set(req.track_inventory.unwrap_or(true)),
                weight: Set(req.weight),
                dimensions: Set(req.dimensions.clone().unwrap_or_default()),
                is_digital: Set(req.is_digital.unwrap_or(false)),
                is_active: Set(true),
                is_featured: Set(req.is_featured.unwrap_or(false)),
                meta_title: Set(req.meta_title.clone().unwrap_or_default()),
                meta_description: Set(req.meta_description.clone().unwrap_or_default()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };

            let sp = txn.begin().await?;
            match model.insert(&sp).await {
                Ok(created) => {
                    sp.commit().await?;
                    break created;
                }
                Err(e) => {
                    sp.rollback().await?;
                    retry_identity_collision(
                        &mut budget,
                        e,
                        PRODUCT_IDENTITY_KEYS,
                        "Product conflicts with an existing product",
                    )
                    .await?;
                }
            }
        };

        let mut images = Vec::with_capacity(req.images.len());
        for (position, img) in req.images.into_iter().enumerate() {
            let image = product_image::ActiveModel {
                product_id: Set(created.id),
                image: Set(img.image.trim().to_string()),
                alt_text: Set(img.alt_text.unwrap_or_default()),
                is_primary: Set(position == 0),
                position: Set(position as i32),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            images.push(image);
        }

        txn.commit().await?;

        info!(
            id = created.id,
            slug = %created.slug,
            sku = %created.sku,
            retries = budget.failures(),
            "Product created"
        );
        Ok((created, images))
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<product::Model, AppError> {
        product::Entity::find()
            .filter(product::Column::Slug.eq(slug))
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".into()))
    }

    pub async fn find_active_by_slug(&self, slug: &str) -> Result<product::Model, AppError> {
        let product = self.find_by_slug(slug).await?;
        if !product.is_active {
            return Err(AppError::NotFound("Product not found".into()));
        }
        Ok(product)
    }

    /// Active products, newest first, with the total before paging.
    pub async fn list_active(
        &self,
        filter: &ProductFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), DbErr> {
        let mut select = product::Entity::find().filter(product::Column::IsActive.eq(true));

        if let Some(category_id) = filter.category_id {
            select = select.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(ref search) = filter.search {
            let term = escape_like(search.trim());
            if !term.is_empty() {
                let pattern = format!("%{}%", term.to_lowercase());
                select = select.filter(
                    Condition::any()
                        .add(
                            Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                                .like(LikeExpr::new(pattern.clone()).escape('\\')),
                        )
                        .add(
                            Expr::expr(Func::lower(Expr::col(product::Column::Description)))
                                .like(LikeExpr::new(pattern).escape('\\')),
                        ),
                );
            }
        }

        let total = select.clone().count(self.conn).await?;
        let data = select
            .order_by_desc(product::Column::CreatedAt)
            .order_by_desc(product::Column::Id)
            .offset(Some((page - 1) * per_page))
            .limit(Some(per_page))
            .all(self.conn)
            .await?;
        Ok((data, total))
    }

    /// Products of one store, newest first. With `active_only` unset the
    /// deactivated ones are included, as the owner sees them.
    pub async fn list_by_vendor(
        &self,
        vendor_id: i32,
        active_only: bool,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), DbErr> {
        let mut select = product::Entity::find().filter(product::Column::VendorId.eq(vendor_id));
        if active_only {
            select = select.filter(product::Column::IsActive.eq(true));
        }

        let total = select.clone().count(self.conn).await?;
        let data = select
            .order_by_desc(product::Column::CreatedAt)
            .order_by_desc(product::Column::Id)
            .offset(Some((page - 1) * per_page))
            .limit(Some(per_page))
            .all(self.conn)
            .await?;
        Ok((data, total))
    }

    /// Other active products from the same category, newest first.
    pub async fn related(
        &self,
        product: &product::Model,
        limit: u64,
    ) -> Result<Vec<product::Model>, DbErr> {
        product::Entity::find()
            .filter(product::Column::CategoryId.eq(product.category_id))
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::Id.ne(product.id))
            .order_by_desc(product::Column::CreatedAt)
            .limit(limit)
            .all(self.conn)
            .await
    }

    /// Wrap products as list items carrying their primary image.
    pub async fn list_items(
        &self,
        products: Vec<product::Model>,
    ) -> Result<Vec<ProductListItem>, DbErr> {
        let ids: Vec<i32> = products.iter().map(|p| p.id).collect();
        let mut primary: HashMap<i32, String> = HashMap::new();
        if !ids.is_empty() {
            let rows: Vec<(i32, String)> = product_image::Entity::find()
                .select_only()
                .column(product_image::Column::ProductId)
                .column(product_image::Column::Image)
                .filter(product_image::Column::ProductId.is_in(ids))
                .filter(product_image::Column::IsPrimary.eq(true))
                .order_by_asc(product_image::Column::Position)
                .into_tuple()
                .all(self.conn)
                .await?;
            for (product_id, image) in rows {
                primary.entry(product_id).or_insert(image);
            }
        }

        Ok(products
            .into_iter()
            .map(|p| {
                let image = primary.remove(&p.id);
                ProductListItem::new(p, image)
            })
            .collect())
    }

    /// Apply a PATCH. Slug and SKU stay as assigned on creation.
    pub async fn update(
        &self,
        product: product::Model,
        req: UpdateProductRequest,
    ) -> Result<product::Model, AppError> {
        if req == UpdateProductRequest::default() {
            return Ok(product);
        }
        if let Some(category_id) = req.category_id
            && category_id != product.category_id
        {
            find_active_category(self.conn, category_id).await?;
        }

        let mut active: product::ActiveModel = product.into();
        if let Some(category_id) = req.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(name) = req.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = req.description {
            active.description = Set(description);
        }
        if let Some(short) = req.short_description {
            active.short_description = Set(short);
        }
        if let Some(price) = req.price {
            active.price = Set(price);
        }
        if let Some(compare_price) = req.compare_price {
            active.compare_price = Set(compare_price);
        }
        if let Some(condition) = req.condition {
            active.condition = Set(condition.as_str().to_string());
        }
        if let Some(qty) = req.stock_quantity {
            active.stock_quantity = Set(qty);
        }
        if let Some(track) = req.track_inventory {
            active.track_inventory = Set(track);
        }
        if let Some(weight) = req.weight {
            active.weight = Set(weight);
        }
        if let Some(dimensions) = req.dimensions {
            active.dimensions = Set(dimensions);
        }
        if let Some(digital) = req.is_digital {
            active.is_digital = Set(digital);
        }
        if let Some(is_active) = req.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(featured) = req.is_featured {
            active.is_featured = Set(featured);
        }
        if let Some(title) = req.meta_title {
            active.meta_title = Set(title);
        }
        if let Some(desc) = req.meta_description {
            active.meta_description = Set(desc);
        }

        active.updated_at = Set(Utc::now());
        Ok(active.update(self.conn).await?)
    }

    /// Delete a product with its images, variants and reviews.
    ///
    /// Products that appear in any order stay, since order history
    /// references them.
    pub async fn delete(&self, product: &product::Model) -> Result<(), AppError> {
        let txn = self.conn.begin().await?;

        if OrderLedger::new(&txn).product_has_orders(product.id).await? {
            return Err(AppError::Conflict(
                "Cannot delete a product that has been ordered; deactivate it instead".into(),
            ));
        }

        delete_product_rows(&txn, &[product.id]).await?;
        txn.commit().await?;

        info!(id = product.id, slug = %product.slug, "Product deleted");
        Ok(())
    }

    pub async fn images(&self, product_id: i32) -> Result<Vec<product_image::Model>, DbErr> {
        product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .order_by_asc(product_image::Column::Position)
            .order_by_asc(product_image::Column::Id)
            .all(self.conn)
            .await
    }

    /// Attach an image. A new primary image demotes the previous one; the
    /// first image of a product is always primary.
    pub async fn add_image(
        &self,
        product: &product::Model,
        req: AddProductImageRequest,
    ) -> Result<product_image::Model, AppError> {
        let txn = self.conn.begin().await?;

        let existing = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product.id))
            .count(&txn)
            .await?;
        let is_primary = req.is_primary || existing == 0;

        if is_primary {
            product_image::Entity::update_many()
                .col_expr(product_image::Column::IsPrimary, Expr::value(false))
                .filter(product_image::Column::ProductId.eq(product.id))
                .exec(&txn)
                .await?;
        }

        let image = product_image::ActiveModel {
            product_id: Set(product.id),
            image: Set(req.image.trim().to_string()),
            alt_text: Set(req.alt_text.unwrap_or_default()),
            is_primary: Set(is_primary),
            position: Set(req.position.unwrap_or(existing as i32)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(image)
    }

    pub async fn variants(&self, product_id: i32) -> Result<Vec<product_variant::Model>, DbErr> {
        product_variant::Entity::find()
            .filter(product_variant::Column::ProductId.eq(product_id))
            .order_by_asc(product_variant::Column::Name)
            .order_by_asc(product_variant::Column::Value)
            .all(self.conn)
            .await
    }

    pub async fn add_variant(
        &self,
        product: &product::Model,
        req: CreateVariantRequest,
    ) -> Result<product_variant::Model, AppError> {
        product_variant::ActiveModel {
            product_id: Set(product.id),
            name: Set(req.name.trim().to_string()),
            value: Set(req.value.trim().to_string()),
            price_adjustment: Set(req.price_adjustment.unwrap_or(Decimal::ZERO)),
            stock_quantity: Set(req.stock_quantity.unwrap_or(0)),
            sku_suffix: Set(req.sku_suffix.unwrap_or_default()),
            ..Default::default()
        }
        .insert(self.conn)
        .await
        .map_err(|e| conflict_on_unique(e, "This variant already exists for the product"))
    }
}

/// Delete products and everything hanging off them. Callers check order
/// history first.
pub(crate) async fn delete_product_rows<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[i32],
) -> Result<(), DbErr> {
    if product_ids.is_empty() {
        return Ok(());
    }
    review::Entity::delete_many()
        .filter(review::Column::ProductId.is_in(product_ids.to_vec()))
        .exec(conn)
        .await?;
    product_image::Entity::delete_many()
        .filter(product_image::Column::ProductId.is_in(product_ids.to_vec()))
        .exec(conn)
        .await?;
    product_variant::Entity::delete_many()
        .filter(product_variant::Column::ProductId.is_in(product_ids.to_vec()))
        .exec(conn)
        .await?;
    product::Entity::delete_many()
        .filter(product::Column::Id.is_in(product_ids.to_vec()))
        .exec(conn)
        .await?;
    Ok(())
}

async fn find_active_category<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<category::Model, AppError> {
    category::Entity::find_by_id(id)
        .filter(category::Column::IsActive.eq(true))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))
}
