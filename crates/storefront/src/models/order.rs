//! Order types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stitchline_core::{
    DesignCategoryId, Email, OrderId, OrderStatus, Price, ProductCategoryId, ProductId, Quantity,
    UserId,
};

/// One ordered product line.
///
/// Orders are snapshots: product name, unit price, size and category names
/// are copied at checkout so later catalog edits leave history untouched.
/// `total_amount` is the whole checkout total, repeated on every line
/// placed by the same checkout.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: Email,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: Quantity,
    pub unit_price: Price,
    pub size: Option<String>,
    pub product_category_id: ProductCategoryId,
    pub product_category_name: String,
    pub design_category_id: DesignCategoryId,
    pub design_category_name: String,
    pub phone_number: String,
    pub alt_phone_number: Option<String>,
    pub address: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Data for inserting an order line.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: Email,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: Quantity,
    pub unit_price: Price,
    pub size: Option<String>,
    pub product_category_id: ProductCategoryId,
    pub product_category_name: String,
    pub design_category_id: DesignCategoryId,
    pub design_category_name: String,
    pub phone_number: String,
    pub alt_phone_number: Option<String>,
    pub address: String,
    pub city: String,
}
