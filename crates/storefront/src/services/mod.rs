//! Business logic for the storefront.
//!
//! Services borrow the [`Repositories`](crate::db::Repositories) for the
//! duration of a request and take the resolved [`Caller`](crate::models::Caller)
//! explicitly. Every ownership decision goes through [`guard::authorize`].
//!
//! - [`auth`] - signup, login, password reset, name update
//! - [`catalog`] - products, product categories, design categories
//! - [`cart`] - cart lines
//! - [`orders`] - order rows and the shared order snapshot
//! - [`checkout`] - the cart-to-orders sequence
//! - [`reviews`] - product reviews
//! - [`users`] - account lookups
//! - [`notifications`] - the admin feed
//! - [`media`] - product image storage
//! - [`email`] - outbound mail over SMTP

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod guard;
pub mod media;
pub mod notifications;
pub mod orders;
pub mod reviews;
pub mod users;
