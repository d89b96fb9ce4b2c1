use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the random component taken from a fresh UUID.
const RANDOM_LEN: usize = 8;

/// Stock-keeping unit: `{vendor:03}-{unix_ts}-{random8}`.
///
/// Uniqueness is statistical only. The `product.sku` unique constraint is the
/// authority; a violation is handled by regenerating with a fresh token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    /// Generate a SKU for `vendor_id` at the current time.
    pub fn generate(vendor_id: i32) -> Self {
        Self::from_parts(vendor_id, Utc::now(), Uuid::new_v4())
    }

    /// Build a SKU from explicit parts.
    pub fn from_parts(vendor_id: i32, at: DateTime<Utc>, token: Uuid) -> Self {
        let token = token.to_string();
        Self(format!(
            "{:03}-{}-{}",
            vendor_id,
            at.timestamp(),
            &token[..RANDOM_LEN]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
