//! HTTP routing. Each API version lives in its own module.

mod v1;

use utoipa_axum::router::OpenApiRouter;

use crate::state::AppState;

/// Prefix every API route is mounted under.
pub const API_PREFIX: &str = "/api";

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1::routes())
}
