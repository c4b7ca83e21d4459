//! Domain models for the storefront.
//!
//! Models double as `sqlx` row types where the columns line up, and as JSON
//! response bodies for the API.

pub mod access;
pub mod cart;
pub mod catalog;
pub mod notification;
pub mod order;
pub mod review;
pub mod session;
pub mod user;

pub use access::{AccessScope, Caller};
pub use cart::{CartItem, CartLine, CartProduct, NewCartItem, PriceSummary};
pub use catalog::{
    DesignCategory, DesignCategoryInput, NewProduct, Product, ProductCategory,
    ProductCategoryInput, ProductFilter, ProductUpdate,
};
pub use notification::Notification;
pub use order::{NewOrder, Order};
pub use review::{NewReview, Review};
pub use session::CurrentUser;
pub use user::{NewUser, User};
