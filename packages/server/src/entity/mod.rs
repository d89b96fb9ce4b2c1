pub mod category;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_image;
pub mod product_variant;
pub mod review;
pub mod user;
pub mod user_group;
pub mod vendor;
pub mod vendor_profile;
