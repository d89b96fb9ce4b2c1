//! Catalog services: identity generation, purchase verification, review and
//! revenue aggregation, and the create/update flows that tie them together.

pub mod categories;
pub mod identity;
pub mod notifier;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod vendors;
