use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Outbound announcements (social posts, feeds) about catalog events.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name used in logs.
    fn id(&self) -> &str;

    async fn publish(&self, message: &str) -> anyhow::Result<()>;
}

/// Writes announcements to the log instead of an external channel.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn id(&self) -> &str {
        "log"
    }

    async fn publish(&self, message: &str) -> anyhow::Result<()> {
        info!(%message, "Announcement");
        Ok(())
    }
}

/// Drops every announcement.
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    fn id(&self) -> &str {
        "disabled"
    }

    async fn publish(&self, _message: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Fire-and-forget: the spawned task logs failures and never reports back.
pub fn dispatch(notifier: Arc<dyn Notifier>, message: String) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = notifier.publish(&message).await {
            warn!(channel = notifier.id(), error = %e, "Failed to publish announcement");
        }
    })
}

pub fn new_product_message(name: &str, store_name: &str, price: Decimal) -> String {
    format!("New on the marketplace: {name} by {store_name} for ${price}")
}

pub fn new_vendor_message(store_name: &str, twitter_handle: &str) -> String {
    let handle = twitter_handle.trim().trim_start_matches('@');
    if handle.is_empty() {
        format!("Welcome {store_name} to the marketplace!")
    } else {
        format!("Welcome {store_name} (@{handle}) to the marketplace!")
    }
}
