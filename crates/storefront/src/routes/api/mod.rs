//! JSON API handlers.
//!
//! Every success body is `{"data": ...}`; every failure goes through
//! [`AppError`](crate::error::AppError) and is `{"error": "..."}`.

pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod extract;
pub mod images;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;

use axum::{Json, http::StatusCode};
use serde::Serialize;

pub use extract::{ApiJson, ApiPath, ApiQuery};

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

/// `200 OK` with `{"data": ...}`.
pub const fn ok<T: Serialize>(data: T) -> Json<Data<T>> {
    Json(Data { data })
}

/// `201 Created` with `{"data": ...}`.
pub const fn created<T: Serialize>(data: T) -> (StatusCode, Json<Data<T>>) {
    (StatusCode::CREATED, ok(data))
}

/// `200 OK` acknowledging a delete.
#[must_use]
pub fn deleted() -> Json<Data<serde_json::Value>> {
    ok(serde_json::json!({ "deleted": true }))
}
