//! URL slugs for catalog entities.
//!
//! A slug is derived once, when an entity is first stored, and never changes
//! afterwards. Uniqueness is resolved by trying `base`, `base-1`, `base-2`, ...
//! against whatever the caller considers taken.

use std::collections::HashSet;

use deunicode::deunicode;

/// Maximum slug length, matching the `slug` column width.
pub const MAX_SLUG_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    /// The source text has no letters or digits to build a slug from.
    #[error("'{0}' does not contain any letters or digits")]
    Empty(String),
}

/// Normalize free text into a slug.
///
/// Transliterates to ASCII first, so accented letters keep their base letter.
/// Then lowercases, turns every run of other characters into a single hyphen
/// and strips hyphens from both ends. `"Home & Garden"` becomes
/// `"home-garden"`, `"Café Crème"` becomes `"cafe-creme"`.
pub fn slugify(text: &str) -> Result<String, SlugError> {
    let ascii = deunicode(text);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_hyphen = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        return Err(SlugError::Empty(text.to_string()));
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    Ok(slug)
}

/// Slug base for a product: the product name qualified by its store name.
pub fn product_slug_base(name: &str, store_name: &str) -> Result<String, SlugError> {
    slugify(&format!("{name}-{store_name}"))
}

/// The `n`-th candidate for `base`: `base` itself for 0, `base-n` otherwise.
pub fn candidate(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}

/// First candidate for `base` that is not in `taken`.
pub fn resolve_unique_slug(base: &str, taken: &HashSet<String>) -> String {
    (0..)
        .map(|n| candidate(base, n))
        .find(|slug| !taken.contains(slug))
        .unwrap_or_else(|| base.to_string())
}

/// Whether `slug` is `base` or one of its numbered candidates.
pub fn is_candidate_of(slug: &str, base: &str) -> bool {
    if slug == base {
        return true;
    }
    slug.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}
