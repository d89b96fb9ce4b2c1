pub mod order_status;
pub mod pricing;
pub mod rating;
pub mod retry;
pub mod role;
pub mod sku;
pub mod slug;

pub use order_status::OrderStatus;
pub use rating::{Rating, RatingError, RatingSummary};
pub use role::{RoleTransition, RoleTransitionError, UserRole, ensure_role, switch_role};
pub use sku::Sku;
pub use slug::{SlugError, slugify};
