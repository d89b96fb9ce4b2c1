use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::catalog::notifier::Notifier;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub notifier: Arc<dyn Notifier>,
}
