use std::collections::HashMap;

use catalog_common::rating::mean_rating;
use catalog_common::{RoleTransition, UserRole, ensure_role};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::info;

use crate::entity::{category, product, review, user, user_group, vendor, vendor_profile};
use crate::error::{AppError, conflict_on_unique};
use crate::models::vendor::{
    CategoryProductCount, DashboardOrderLine, RegisterVendorRequest, UpdateVendorRequest,
    normalize_handle,
};

use super::orders::OrderLedger;
use super::products::delete_product_rows;

/// Recent order lines shown on the vendor dashboard.
pub const DASHBOARD_RECENT_ORDERS: u64 = 10;

pub struct VendorService<'a, C: ConnectionTrait + TransactionTrait> {
    pub conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> VendorService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// The store owned by `user_id`, if the user has opened one.
    pub async fn find_vendor_for_user(&self, user_id: i32) -> Result<Option<vendor::Model>, DbErr> {
        vendor::Entity::find()
            .filter(vendor::Column::UserId.eq(user_id))
            .one(self.conn)
            .await
    }

    /// Like [`Self::find_vendor_for_user`], but a missing store is a permission error.
    pub async fn require_vendor(&self, user_id: i32) -> Result<vendor::Model, AppError> {
        self.find_vendor_for_user(user_id)
            .await?
            .ok_or_else(|| AppError::PermissionDenied("A vendor store is required".into()))
    }

    pub async fn find(&self, id: i32) -> Result<vendor::Model, AppError> {
        vendor::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Vendor not found".into()))
    }

    pub async fn profile(&self, vendor_id: i32) -> Result<Option<vendor_profile::Model>, DbErr> {
        vendor_profile::Entity::find()
            .filter(vendor_profile::Column::VendorId.eq(vendor_id))
            .one(self.conn)
            .await
    }

    /// Newest stores first.
    pub async fn list(&self, page: u64, per_page: u64) -> Result<(Vec<vendor::Model>, u64), DbErr> {
        let select = vendor::Entity::find();
        let total = select.clone().count(self.conn).await?;
        let data = select
            .order_by_desc(vendor::Column::CreatedAt)
            .order_by_desc(vendor::Column::Id)
            .offset(Some((page - 1) * per_page))
            .limit(Some(per_page))
            .all(self.conn)
            .await?;
        Ok((data, total))
    }

    /// Open a store for `owner` and move them from buyer to vendor.
    pub async fn register(
        &self,
        owner: &user::Model,
        req: RegisterVendorRequest,
    ) -> Result<vendor::Model, AppError> {
        let txn = self.conn.begin().await?;

        if VendorService::new(&txn)
            .find_vendor_for_user(owner.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("You already have a vendor store".into()));
        }

        let current: UserRole = owner.user_type.parse()?;
        let transition = ensure_role(current, UserRole::Vendor);

        let now = Utc::now();
        let created = vendor::ActiveModel {
            user_id: Set(owner.id),
            store_name: Set(req.store_name.trim().to_string()),
            store_description: Set(req.store_description),
            store_logo: Set(req.store_logo),
            phone: Set(req.phone.trim().to_string()),
            address: Set(req.address),
            twitter_handle: Set(req
                .twitter_handle
                .as_deref()
                .map(normalize_handle)
                .unwrap_or_default()),
            response_time: Set(req
                .response_time
                .unwrap_or_else(|| vendor::DEFAULT_RESPONSE_TIME.into())),
            shipping_policy: Set(req
                .shipping_policy
                .unwrap_or_else(|| vendor::DEFAULT_SHIPPING_POLICY.into())),
            return_policy: Set(req
                .return_policy
                .unwrap_or_else(|| vendor::DEFAULT_RETURN_POLICY.into())),
            is_verified: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, "You already have a vendor store"))?;

        vendor_profile::ActiveModel {
            vendor_id: Set(created.id),
            website: Set(String::new()),
            facebook_url: Set(String::new()),
            instagram_url: Set(String::new()),
            business_license: Set(String::new()),
            tax_id: Set(String::new()),
            bank_account: Set(String::new()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        apply_role_transition(&txn, owner.id, transition).await?;
        txn.commit().await?;

        info!(id = created.id, user_id = owner.id, store = %created.store_name, "Vendor registered");
        Ok(created)
    }

    /// Apply a PATCH to the store and, when given, its profile.
    pub async fn update(
        &self,
        vendor: vendor::Model,
        req: UpdateVendorRequest,
    ) -> Result<vendor::Model, AppError> {
        if req == UpdateVendorRequest::default() {
            return Ok(vendor);
        }
        let txn = self.conn.begin().await?;

        if let Some(p) = req.profile {
            let existing = VendorService::new(&txn).profile(vendor.id).await?;
            let mut active: vendor_profile::ActiveModel = match existing {
                Some(m) => m.into(),
                None => vendor_profile::ActiveModel {
                    vendor_id: Set(vendor.id),
                    website: Set(String::new()),
                    facebook_url: Set(String::new()),
                    instagram_url: Set(String::new()),
                    business_license: Set(String::new()),
                    tax_id: Set(String::new()),
                    bank_account: Set(String::new()),
                    ..Default::default()
                },
            };
            if let Some(v) = p.website {
                active.website = Set(v);
            }
            if let Some(v) = p.facebook_url {
                active.facebook_url = Set(v);
            }
            if let Some(v) = p.instagram_url {
                active.instagram_url = Set(v);
            }
            if let Some(v) = p.business_license {
                active.business_license = Set(v);
            }
            if let Some(v) = p.tax_id {
                active.tax_id = Set(v);
            }
            if let Some(v) = p.bank_account {
                active.bank_account = Set(v);
            }
            active.save(&txn).await?;
        }

        let mut active: vendor::ActiveModel = vendor.into();
        if let Some(v) = req.store_name {
            active.store_name = Set(v.trim().to_string());
        }
        if let Some(v) = req.store_description {
            active.store_description = Set(v);
        }
        if let Some(v) = req.store_logo {
            active.store_logo = Set(Some(v));
        }
        if let Some(v) = req.phone {
            active.phone = Set(v.trim().to_string());
        }
        if let Some(v) = req.address {
            active.address = Set(v);
        }
        if let Some(v) = req.twitter_handle {
            active.twitter_handle = Set(normalize_handle(&v));
        }
        if let Some(v) = req.response_time {
            active.response_time = Set(v);
        }
        if let Some(v) = req.shipping_policy {
            active.shipping_policy = Set(v);
        }
        if let Some(v) = req.return_policy {
            active.return_policy = Set(v);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Close the store, remove its catalog and move the owner back to buyer.
    pub async fn delete(&self, vendor: &vendor::Model) -> Result<(), AppError> {
        let txn = self.conn.begin().await?;

        if OrderLedger::new(&txn).vendor_has_orders(vendor.id).await? {
            return Err(AppError::Conflict(
                "Cannot close a store whose products have been ordered".into(),
            ));
        }

        let owner = user::Entity::find_by_id(vendor.user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::Internal(format!("vendor {} has no owner", vendor.id)))?;
        let current: UserRole = owner.user_type.parse()?;
        let transition = ensure_role(current, UserRole::Buyer);

        let product_ids: Vec<i32> = product::Entity::find()
            .select_only()
            .column(product::Column::Id)
            .filter(product::Column::VendorId.eq(vendor.id))
            .into_tuple()
            .all(&txn)
            .await?;
        delete_product_rows(&txn, &product_ids).await?;

        vendor_profile::Entity::delete_many()
            .filter(vendor_profile::Column::VendorId.eq(vendor.id))
            .exec(&txn)
            .await?;
        vendor::Entity::delete_by_id(vendor.id).exec(&txn).await?;

        apply_role_transition(&txn, owner.id, transition).await?;
        txn.commit().await?;

        info!(id = vendor.id, user_id = owner.id, products = product_ids.len(), "Vendor deleted");
        Ok(())
    }

    /// Staff switch for the verified badge.
    pub async fn set_verification(
        &self,
        vendor: vendor::Model,
        is_verified: bool,
    ) -> Result<vendor::Model, AppError> {
        if vendor.is_verified == is_verified {
            return Ok(vendor);
        }
        let mut active: vendor::ActiveModel = vendor.into();
        active.is_verified = Set(is_verified);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.conn).await?;

        info!(id = updated.id, is_verified, "Vendor verification changed");
        Ok(updated)
    }

    /// Revenue from delivered or completed orders of the vendor's products.
    pub async fn total_revenue(&self, vendor_id: i32) -> Result<Decimal, DbErr> {
        OrderLedger::new(self.conn).vendor_revenue(vendor_id).await
    }

    /// Unrounded mean of approved ratings across all the vendor's products.
    pub async fn average_rating(&self, vendor_id: i32) -> Result<f64, DbErr> {
        let ratings: Vec<i32> = approved_vendor_reviews(vendor_id)
            .select_only()
            .column(review::Column::Rating)
            .into_tuple()
            .all(self.conn)
            .await?;
        Ok(mean_rating(ratings))
    }

    pub async fn approved_review_count(&self, vendor_id: i32) -> Result<u64, DbErr> {
        approved_vendor_reviews(vendor_id).count(self.conn).await
    }

    /// `(all products, active products)`.
    pub async fn product_counts(&self, vendor_id: i32) -> Result<(u64, u64), DbErr> {
        let all = product::Entity::find().filter(product::Column::VendorId.eq(vendor_id));
        let total = all.clone().count(self.conn).await?;
        let active = all
            .filter(product::Column::IsActive.eq(true))
            .count(self.conn)
            .await?;
        Ok((total, active))
    }

    /// Active product count per category, largest first; ties by name.
    pub async fn category_counts(&self, vendor_id: i32) -> Result<Vec<CategoryProductCount>, DbErr> {
        let counts: Vec<(i32, i64)> = product::Entity::find()
            .select_only()
            .column(product::Column::CategoryId)
            .column_as(product::Column::Id.count(), "product_count")
            .filter(product::Column::VendorId.eq(vendor_id))
            .filter(product::Column::IsActive.eq(true))
            .group_by(product::Column::CategoryId)
            .into_tuple()
            .all(self.conn)
            .await?;
        if counts.is_empty() {
            return Ok(Vec::new());
        }

        let by_category: HashMap<i32, i64> = counts.into_iter().collect();
        let categories = category::Entity::find()
            .filter(category::Column::Id.is_in(by_category.keys().copied().collect::<Vec<_>>()))
            .order_by_asc(category::Column::Name)
            .all(self.conn)
            .await?;

        let mut rows: Vec<CategoryProductCount> = categories
            .into_iter()
            .map(|c| CategoryProductCount {
                product_count: Ord::max(by_category.get(&c.id).copied().unwrap_or(0), 0) as u64,
                category_id: c.id,
                name: c.name,
                slug: c.slug,
            })
            .collect();
        rows.sort_by(|a, b| b.product_count.cmp(&a.product_count));
        Ok(rows)
    }

    /// Most recent order lines for the vendor's products, any status.
    pub async fn recent_orders(&self, vendor_id: i32) -> Result<Vec<DashboardOrderLine>, DbErr> {
        let lines = OrderLedger::new(self.conn)
            .recent_vendor_lines(vendor_id, DASHBOARD_RECENT_ORDERS)
            .await?;
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let product_ids: Vec<i32> = lines.iter().map(|l| l.item.product_id).collect();
        let names: HashMap<i32, String> = product::Entity::find()
            .select_only()
            .column(product::Column::Id)
            .column(product::Column::Name)
            .filter(product::Column::Id.is_in(product_ids))
            .into_tuple::<(i32, String)>()
            .all(self.conn)
            .await?
            .into_iter()
            .collect();

        Ok(lines
            .into_iter()
            .map(|l| DashboardOrderLine {
                order_id: l.order.id,
                order_status: l.order.status,
                product_id: l.item.product_id,
                product_name: names.get(&l.item.product_id).cloned().unwrap_or_default(),
                quantity: l.item.quantity,
                total_price: l.item.total_price,
                ordered_at: l.order.created_at,
            })
            .collect())
    }
}

fn approved_vendor_reviews(vendor_id: i32) -> Select<review::Entity> {
    review::Entity::find()
        .filter(review::Column::IsApproved.eq(true))
        .filter(
            review::Column::ProductId.in_subquery(
                SeaQuery::select()
                    .column(product::Column::Id)
                    .from(product::Entity)
                    .and_where(product::Column::VendorId.eq(vendor_id))
                    .to_owned(),
            ),
        )
}

/// Persist a planned role change: `user_type` plus group membership.
pub async fn apply_role_transition<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    transition: RoleTransition,
) -> Result<(), DbErr> {
    user::Entity::update_many()
        .col_expr(user::Column::UserType, Expr::value(transition.to.as_str()))
        .filter(user::Column::Id.eq(user_id))
        .exec(conn)
        .await?;

    let joined = user_group::Entity::insert(user_group::ActiveModel {
        user_id: Set(user_id),
        group_name: Set(transition.join_group.to_string()),
        ..Default::default()
    })
    .on_conflict(
        sea_query::OnConflict::columns([user_group::Column::UserId, user_group::Column::GroupName])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await;
    match joined {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e),
    }

    user_group::Entity::delete_many()
        .filter(user_group::Column::UserId.eq(user_id))
        .filter(user_group::Column::GroupName.eq(transition.leave_group))
        .exec(conn)
        .await?;

    info!(user_id, from = %transition.from, to = %transition.to, "User role switched");
    Ok(())
}
