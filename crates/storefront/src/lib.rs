//! Stitchline Storefront library.
//!
//! The storefront is one axum application serving three surfaces:
//!
//! - the JSON API under `/api`
//! - server-rendered customer pages (catalog, cart, checkout, login)
//! - the admin dashboard under `/admin`
//!
//! The binary in `main.rs` wires it to `PostgreSQL`; tests build the same
//! router over in-memory stores (see `test_support`, behind the
//! `test-support` feature).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
