//! Read-only queries over the order tables.

use catalog_common::OrderStatus;
use rust_decimal::Decimal;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;

use crate::entity::{order, order_item, product};

/// An order line of one of the vendor's products, newest first.
#[derive(Debug, Clone)]
pub struct VendorOrderLine {
    pub item: order_item::Model,
    pub order: order::Model,
}

pub struct OrderLedger<'a, C: ConnectionTrait> {
    pub conn: &'a C,
}

impl<'a, C: ConnectionTrait> OrderLedger<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Whether `user_id` has a delivered or completed order containing `product_id`.
    pub async fn has_purchased(&self, user_id: i32, product_id: i32) -> Result<bool, DbErr> {
        let hit = order_item::Entity::find()
            .select_only()
            .column(order_item::Column::Id)
            .filter(order_item::Column::ProductId.eq(product_id))
            .filter(
                order_item::Column::OrderId.in_subquery(
                    SeaQuery::select()
                        .column(order::Column::Id)
                        .from(order::Entity)
                        .and_where(order::Column::UserId.eq(user_id))
                        .and_where(order::Column::Status.is_in(OrderStatus::completed_values()))
                        .to_owned(),
                ),
            )
            .into_tuple::<i32>()
            .one(self.conn)
            .await?;
        Ok(hit.is_some())
    }

    /// Sum of `total_price` over order lines of the vendor's products whose
    /// order is delivered or completed. Zero when there are none.
    pub async fn vendor_revenue(&self, vendor_id: i32) -> Result<Decimal, DbErr> {
        let totals: Vec<Decimal> = order_item::Entity::find()
            .select_only()
            .column(order_item::Column::TotalPrice)
            .filter(order_item::Column::ProductId.in_subquery(vendor_products(vendor_id)))
            .filter(
                order_item::Column::OrderId.in_subquery(
                    SeaQuery::select()
                        .column(order::Column::Id)
                        .from(order::Entity)
                        .and_where(order::Column::Status.is_in(OrderStatus::completed_values()))
                        .to_owned(),
                ),
            )
            .into_tuple()
            .all(self.conn)
            .await?;
        Ok(totals.into_iter().sum())
    }

    /// The `limit` most recent order lines for the vendor's products, any status.
    pub async fn recent_vendor_lines(
        &self,
        vendor_id: i32,
        limit: u64,
    ) -> Result<Vec<VendorOrderLine>, DbErr> {
        let rows = order_item::Entity::find()
            .filter(order_item::Column::ProductId.in_subquery(vendor_products(vendor_id)))
            .find_also_related(order::Entity)
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order_item::Column::Id)
            .limit(limit)
            .all(self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(item, order)| order.map(|order| VendorOrderLine { item, order }))
            .collect())
    }

    /// Whether any order line references `product_id`.
    pub async fn product_has_orders(&self, product_id: i32) -> Result<bool, DbErr> {
        let count = order_item::Entity::find()
            .filter(order_item::Column::ProductId.eq(product_id))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    /// Whether any order line references a product of `vendor_id`.
    pub async fn vendor_has_orders(&self, vendor_id: i32) -> Result<bool, DbErr> {
        let count = order_item::Entity::find()
            .filter(order_item::Column::ProductId.in_subquery(vendor_products(vendor_id)))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }
}

fn vendor_products(vendor_id: i32) -> sea_query::SelectStatement {
    SeaQuery::select()
        .column(product::Column::Id)
        .from(product::Entity)
        .and_where(product::Column::VendorId.eq(vendor_id))
        .to_owned()
}
