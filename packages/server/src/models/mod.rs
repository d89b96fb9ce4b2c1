pub mod category;
pub mod product;
pub mod review;
pub mod shared;
pub mod vendor;
