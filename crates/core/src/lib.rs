//! Stitchline Core - Shared domain types.
//!
//! This crate provides the types used across all Stitchline components:
//! - `storefront` - Customer storefront, JSON API and admin back-office
//! - `cli` - Command-line tools for migrations, admin accounts and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP. The optional `postgres` feature adds `sqlx` encoding so the
//! same types can be bound and decoded directly by the storefront's
//! repositories.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, prices, quantities,
//!   ratings, roles and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
