use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use catalog_server::catalog::notifier::{DisabledNotifier, LogNotifier, Notifier};
use catalog_server::config::AppConfig;
use catalog_server::database::init_db;
use catalog_server::extractors::auth::USER_ID_HEADER;
use catalog_server::seed::{ensure_indexes, seed_default_categories};
use catalog_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Database schema synced");

    ensure_indexes(&db)
        .await
        .context("Failed to create database indexes")?;
    if config.catalog.seed_default_categories {
        seed_default_categories(&db)
            .await
            .context("Failed to seed default categories")?;
    }

    let notifier: Arc<dyn Notifier> = if config.notification.enabled {
        Arc::new(LogNotifier)
    } else {
        Arc::new(DisabledNotifier)
    };
    info!(channel = notifier.id(), "Notifications configured");

    let cors = build_cors(&config);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        config,
        notifier,
    };
    let app = catalog_server::build_router(state).layer(cors);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors
        .allow_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)])
        .max_age(Duration::from_secs(config.server.cors.max_age))
}
