use std::collections::HashSet;
use std::time::Duration;

use catalog_common::retry::{RetryBudget, RetryDecision};
use catalog_common::slug::{is_candidate_of, resolve_unique_slug};
use sea_orm::*;
use tracing::warn;

use crate::entity::{category, product};
use crate::error::{AppError, unique_violation};

/// Unique constraints over generated product identifiers.
pub const PRODUCT_IDENTITY_KEYS: &[&str] = &["product_slug_key", "product_sku_key"];
/// Unique constraints over generated category identifiers.
pub const CATEGORY_IDENTITY_KEYS: &[&str] = &["category_slug_key"];

/// Slug lookups against committed rows.
///
/// The returned slug is only a guess: a concurrent insert can claim it
/// before ours lands, which the insert loop handles through
/// [`retry_identity_collision`].
pub struct IdentityService<'a, C: ConnectionTrait> {
    pub conn: &'a C,
}

impl<'a, C: ConnectionTrait> IdentityService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// First free slug among `base`, `base-1`, `base-2`, ... for a category.
    pub async fn category_slug(&self, base: &str) -> Result<String, DbErr> {
        let existing: Vec<String> = category::Entity::find()
            .select_only()
            .column(category::Column::Slug)
            .filter(category::Column::Slug.starts_with(base))
            .into_tuple()
            .all(self.conn)
            .await?;
        Ok(pick(base, existing))
    }

    /// First free slug among `base`, `base-1`, `base-2`, ... for a product.
    pub async fn product_slug(&self, base: &str) -> Result<String, DbErr> {
        let existing: Vec<String> = product::Entity::find()
            .select_only()
            .column(product::Column::Slug)
            .filter(product::Column::Slug.starts_with(base))
            .into_tuple()
            .all(self.conn)
            .await?;
        Ok(pick(base, existing))
    }
}

fn pick(base: &str, existing: Vec<String>) -> String {
    let taken: HashSet<String> = existing
        .into_iter()
        .filter(|s| is_candidate_of(s, base))
        .collect();
    resolve_unique_slug(base, &taken)
}

/// Name of the constraint in a PostgreSQL unique-violation message, e.g.
/// `product_slug_key` in `duplicate key value violates unique constraint "product_slug_key"`.
pub fn violated_constraint(detail: &str) -> Option<&str> {
    let (_, rest) = detail.split_once('"')?;
    let (name, _) = rest.split_once('"')?;
    Some(name)
}

/// Whether a unique violation hit one of `identity_keys`.
pub fn is_identity_collision(detail: &str, identity_keys: &[&str]) -> bool {
    violated_constraint(detail).is_some_and(|name| identity_keys.contains(&name))
}

/// Record a unique violation against `budget`.
///
/// Returns the backoff to sleep before the next attempt when the violation
/// is on a generated identifier and attempts remain.
pub fn collision_backoff(
    budget: &mut RetryBudget,
    detail: String,
    identity_keys: &[&str],
    other_conflict: &str,
) -> Result<Duration, AppError> {
    if !is_identity_collision(&detail, identity_keys) {
        return Err(AppError::Conflict(other_conflict.to_string()));
    }

    match budget.record_failure(detail) {
        RetryDecision::Retry { attempt, delay } => {
            warn!(attempt, ?delay, "Generated identifier collided, retrying");
            Ok(delay)
        }
        RetryDecision::Exhausted { history } => {
            warn!(
                attempts = history.len(),
                last_error = history.last().map(|a| a.error.as_str()).unwrap_or_default(),
                "Gave up generating a unique identifier"
            );
            Err(AppError::Conflict(
                "Could not generate a unique identifier, please retry".into(),
            ))
        }
    }
}

/// Decide what to do with a failed identity insert.
///
/// `Ok(())` means the caller should recompute its identifiers and try
/// again; the backoff has already been slept. A unique violation outside
/// `identity_keys` becomes `Conflict(other_conflict)`.
pub async fn retry_identity_collision(
    budget: &mut RetryBudget,
    err: DbErr,
    identity_keys: &[&str],
    other_conflict: &str,
) -> Result<(), AppError> {
    let Some(detail) = unique_violation(&err) else {
        return Err(AppError::from(err));
    };
    let delay = collision_backoff(budget, detail, identity_keys, other_conflict)?;
    tokio::time::sleep(delay).await;
    Ok(())
}
