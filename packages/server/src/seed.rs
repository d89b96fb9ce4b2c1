use catalog_common::slugify;
use sea_orm::*;
use sea_query::{Index, PostgresQueryBuilder};
use tracing::{error, info, warn};

use crate::entity::{category, order, order_item, product, product_variant, review};
use crate::error::unique_violation;

/// Top-level categories created on first start.
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    (
        "Electronics",
        "Computers, phones, tablets, accessories and electronic gadgets",
    ),
    (
        "Clothing & Fashion",
        "Men's, women's and children's clothing, shoes and accessories",
    ),
    (
        "Home & Garden",
        "Furniture, home decor, garden tools and household items",
    ),
    (
        "Sports & Outdoors",
        "Exercise equipment, outdoor gear, sporting goods",
    ),
    (
        "Books & Media",
        "Books, movies, music, games and educational materials",
    ),
    (
        "Health & Beauty",
        "Skincare, makeup, health supplements and wellness products",
    ),
    (
        "Automotive",
        "Car parts, accessories, tools and automotive supplies",
    ),
    (
        "Toys & Games",
        "Children's toys, board games, puzzles and educational toys",
    ),
    (
        "Jewelry & Watches",
        "Fine jewelry, fashion jewelry, watches and accessories",
    ),
    (
        "Food & Beverages",
        "Gourmet foods, beverages, snacks and cooking ingredients",
    ),
    (
        "Art & Crafts",
        "Art supplies, craft materials, handmade items and collectibles",
    ),
    (
        "Office Supplies",
        "Office equipment, stationery, business supplies and furniture",
    ),
];

/// Insert the default categories that don't exist yet. Safe to run on every start.
pub async fn seed_default_categories(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u32;
    for &(name, description) in DEFAULT_CATEGORIES {
        let Ok(slug) = slugify(name) else {
            continue;
        };
        let model = category::ActiveModel {
            name: Set(name.to_string()),
            slug: Set(slug),
            description: Set(description.to_string()),
            image: Set(None),
            parent_id: Set(None),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let result = category::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(category::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) => inserted += n as u32,
            Err(DbErr::RecordNotInserted) => {}
            // A user-created category already holds the slug.
            Err(e) if unique_violation(&e).is_some() => {
                warn!(name, "Skipping default category, slug already taken");
            }
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} default categories", inserted);
    }
    Ok(())
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync only knows single-column uniqueness, so the
/// composite constraints and lookup indexes are created here on startup.
/// A unique constraint that cannot be created is an error; a lookup index
/// that cannot be created is only logged.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let constraints = [
        // One review per user per product.
        Index::create()
            .if_not_exists()
            .unique()
            .name("uq_review_user_product")
            .table(review::Entity)
            .col(review::Column::UserId)
            .col(review::Column::ProductId)
            .to_string(PostgresQueryBuilder),
        Index::create()
            .if_not_exists()
            .unique()
            .name("uq_product_variant_name_value")
            .table(product_variant::Entity)
            .col(product_variant::Column::ProductId)
            .col(product_variant::Column::Name)
            .col(product_variant::Column::Value)
            .to_string(PostgresQueryBuilder),
    ];
    for stmt in constraints {
        db.execute_unprepared(&stmt).await.map_err(|e| {
            error!("Failed to create unique index: {} ({})", e, stmt);
            e
        })?;
    }

    let lookups = [
        // Approved reviews of a product: summary and listing.
        Index::create()
            .if_not_exists()
            .name("idx_review_product_approved")
            .table(review::Entity)
            .col(review::Column::ProductId)
            .col(review::Column::IsApproved)
            .to_string(PostgresQueryBuilder),
        // Public listing: active products of a category, newest first.
        Index::create()
            .if_not_exists()
            .name("idx_product_category_active_created")
            .table(product::Entity)
            .col(product::Column::CategoryId)
            .col(product::Column::IsActive)
            .col(product::Column::CreatedAt)
            .to_string(PostgresQueryBuilder),
        // Purchase verification and vendor revenue.
        Index::create()
            .if_not_exists()
            .name("idx_order_item_product")
            .table(order_item::Entity)
            .col(order_item::Column::ProductId)
            .to_string(PostgresQueryBuilder),
        Index::create()
            .if_not_exists()
            .name("idx_order_user_status")
            .table(order::Entity)
            .col(order::Column::UserId)
            .col(order::Column::Status)
            .to_string(PostgresQueryBuilder),
    ];
    for stmt in lookups {
        if let Err(e) = db.execute_unprepared(&stmt).await {
            warn!("Failed to create index: {} ({})", e, stmt);
        }
    }
    info!("Ensured catalog indexes exist");

    Ok(())
}
