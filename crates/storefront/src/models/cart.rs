//! Cart types and price summaries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stitchline_core::{CartItemId, DesignCategoryId, Price, ProductCategoryId, ProductId, Quantity, UserId};

/// A row in a user's cart.
///
/// Adding the same product twice creates two rows; quantities are not merged.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_category_id: ProductCategoryId,
    pub design_category_id: DesignCategoryId,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
}

/// Data for inserting a cart row.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_category_id: ProductCategoryId,
    pub design_category_id: DesignCategoryId,
    pub quantity: Quantity,
}

/// Live product data joined onto a cart row.
#[derive(Debug, Clone, Serialize)]
pub struct CartProduct {
    pub name: String,
    pub price: Price,
    pub size: Option<String>,
    pub image_url: Option<String>,
}

/// A cart row with its product, if the product still exists.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub product: Option<CartProduct>,
}

impl CartLine {
    /// Unit price times quantity; a line whose product is gone counts as zero.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product
            .as_ref()
            .map_or(Price::ZERO, |p| p.price.times(self.item.quantity))
    }
}

/// Subtotal, shipping and total for a set of cart lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceSummary {
    pub subtotal: Price,
    pub shipping_fee: Price,
    pub total: Price,
}

impl PriceSummary {
    /// Summary shown on the cart page: shipping is only charged once there
    /// is something to pay for.
    #[must_use]
    pub fn for_cart(lines: &[CartLine], shipping_fee: Price) -> Self {
        let subtotal = subtotal(lines);
        let shipping_fee = if subtotal.is_zero() {
            Price::ZERO
        } else {
            shipping_fee
        };
        Self::new(subtotal, shipping_fee)
    }

    /// Summary charged at checkout: the flat fee always applies.
    #[must_use]
    pub fn for_checkout(lines: &[CartLine], shipping_fee: Price) -> Self {
        Self::new(subtotal(lines), shipping_fee)
    }

    fn new(subtotal: Price, shipping_fee: Price) -> Self {
        Self {
            subtotal,
            shipping_fee,
            total: subtotal + shipping_fee,
        }
    }
}

fn subtotal(lines: &[CartLine]) -> Price {
    lines.iter().map(CartLine::line_total).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, price: u32, quantity: i32, product_exists: bool) -> CartLine {
        CartLine {
            item: CartItem {
                id: CartItemId::new(id),
                user_id: UserId::new(1),
                product_id: ProductId::new(id),
                product_category_id: ProductCategoryId::new(1),
                design_category_id: DesignCategoryId::new(1),
                quantity: Quantity::new(quantity).unwrap(),
                created_at: Utc::now(),
            },
            product: product_exists.then(|| CartProduct {
                name: format!("Product {id}"),
                price: Price::from_rupees(price),
                size: Some("M".into()),
                image_url: None,
            }),
        }
    }

    #[test]
    fn test_checkout_summary_adds_flat_shipping() {
        let lines = [line(1, 500, 2, true), line(2, 300, 1, true)];
        let summary = PriceSummary::for_checkout(&lines, Price::from_rupees(150));

        assert_eq!(summary.subtotal, Price::from_rupees(1300));
        assert_eq!(summary.total, Price::from_rupees(1450));
    }

    #[test]
    fn test_cart_summary_skips_shipping_when_empty() {
        let summary = PriceSummary::for_cart(&[], Price::from_rupees(150));
        assert_eq!(summary.shipping_fee, Price::ZERO);
        assert_eq!(summary.total, Price::ZERO);

        let summary = PriceSummary::for_cart(&[line(1, 200, 1, true)], Price::from_rupees(150));
        assert_eq!(summary.total, Price::from_rupees(350));
    }

    #[test]
    fn test_missing_product_counts_as_zero() {
        let lines = [line(1, 500, 2, false), line(2, 300, 1, true)];
        assert_eq!(lines[0].line_total(), Price::ZERO);
        assert_eq!(
            PriceSummary::for_cart(&lines, Price::from_rupees(150)).subtotal,
            Price::from_rupees(300)
        );
    }

    #[test]
    fn test_line_serializes_flat() {
        let json = serde_json::to_value(line(3, 100, 1, true)).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["quantity"], 1);
        assert_eq!(json["product"]["name"], "Product 3");
    }
}
