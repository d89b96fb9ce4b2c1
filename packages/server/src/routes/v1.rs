use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{categories, products, reviews, vendors};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/reviews", review_routes())
        .nest("/vendors", vendor_routes())
}

fn category_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            categories::list_categories,
            categories::create_category
        ))
        .routes(routes!(categories::get_category))
        .routes(routes!(categories::set_category_activation))
}

fn product_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(products::list_products, products::create_product))
        .routes(routes!(
            products::get_product,
            products::update_product,
            products::delete_product
        ))
        .routes(routes!(products::add_product_image))
        .routes(routes!(products::list_variants, products::create_variant))
        .routes(routes!(reviews::list_reviews, reviews::create_review))
        .routes(routes!(reviews::review_summary))
}

fn review_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(reviews::update_review, reviews::delete_review))
        .routes(routes!(reviews::set_review_approval))
}

fn vendor_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(vendors::list_vendors, vendors::register_vendor))
        .routes(routes!(vendors::get_own_vendor))
        .routes(routes!(vendors::get_dashboard))
        .routes(routes!(vendors::list_own_products))
        .routes(routes!(
            vendors::get_vendor,
            vendors::update_vendor,
            vendors::delete_vendor
        ))
        .routes(routes!(vendors::set_vendor_verification))
}
