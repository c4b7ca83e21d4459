//! Checkout: turns the caller's cart into order lines, then clears the cart.
//!
//! The sequence moves through four stages:
//!
//! ```text
//! Reviewing ──▶ Submitting ──▶ Cleared ──▶ Confirmed
//! ```
//!
//! * **Reviewing** validates shipping details and loads the cart.
//! * **Submitting** inserts one order per cart line, in cart order.
//! * **Cleared** deletes the cart lines that were just ordered.
//! * **Confirmed** records a notification and mails a confirmation.
//!
//! Each insert and delete stands alone. A failure while submitting leaves
//! the orders already placed and every cart line in place; a failure while
//! clearing leaves all orders placed and some cart lines behind. Nothing is
//! rolled back and there is no idempotency key, so retrying after a partial
//! failure can duplicate orders. [`CheckoutFailure`] reports the stage and
//! the orders placed so far.

use std::fmt;

use serde::Serialize;
use tracing::instrument;

use stitchline_core::{OrderId, Price};

use crate::db::Repositories;
use crate::error::AppError;
use crate::models::{Caller, Order, PriceSummary};
use crate::services::email::EmailService;
use crate::services::notifications::notify;
use crate::services::orders::{OrderLine, ShippingInfo, snapshot};

/// Where a checkout got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStage {
    Reviewing,
    Submitting,
    Cleared,
    Confirmed,
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Reviewing => "reviewing",
            Self::Submitting => "submitting",
            Self::Cleared => "cleared",
            Self::Confirmed => "confirmed",
        };
        f.write_str(label)
    }
}

/// A checkout that stopped before confirming.
#[derive(Debug)]
pub struct CheckoutFailure {
    /// Stage that failed.
    pub stage: CheckoutStage,
    /// Orders inserted before the failure. They are not rolled back.
    pub placed: Vec<OrderId>,
    pub error: AppError,
}

impl CheckoutFailure {
    fn at(stage: CheckoutStage, placed: &[Order], error: impl Into<AppError>) -> Self {
        Self {
            stage,
            placed: placed.iter().map(|o| o.id).collect(),
            error: error.into(),
        }
    }
}

impl From<CheckoutFailure> for AppError {
    fn from(failure: CheckoutFailure) -> Self {
        if !failure.placed.is_empty() {
            tracing::error!(
                stage = %failure.stage,
                placed = ?failure.placed,
                error = %failure.error,
                "Checkout failed after placing orders"
            );
        }
        failure.error
    }
}

/// A completed checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub orders: Vec<Order>,
    #[serde(flatten)]
    pub summary: PriceSummary,
}

impl CheckoutReceipt {
    #[must_use]
    pub fn order_ids(&self) -> Vec<OrderId> {
        self.orders.iter().map(|o| o.id).collect()
    }
}

/// Runs checkouts for the caller's own cart.
pub struct CheckoutSequencer<'a> {
    repos: &'a Repositories,
    shipping_fee: Price,
    email: Option<&'a EmailService>,
}

impl<'a> CheckoutSequencer<'a> {
    #[must_use]
    pub const fn new(
        repos: &'a Repositories,
        shipping_fee: Price,
        email: Option<&'a EmailService>,
    ) -> Self {
        Self {
            repos,
            shipping_fee,
            email,
        }
    }

    /// Place one order per cart line, then clear the cart.
    ///
    /// Every line carries the same `total_amount`: the whole cart subtotal
    /// plus the flat shipping fee.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutFailure`] whose error is `AppError::Validation`
    /// for blank shipping fields, `AppError::EmptyCart` for an empty cart,
    /// `AppError::InvalidReference` if a product disappeared, or the
    /// datastore error that stopped the sequence.
    #[instrument(skip(self, shipping), fields(user_id = %caller.id))]
    pub async fn place_order(
        &self,
        caller: &Caller,
        shipping: ShippingInfo,
    ) -> Result<CheckoutReceipt, CheckoutFailure> {
        // Reviewing
        let stage = CheckoutStage::Reviewing;
        let shipping = shipping
            .validated()
            .map_err(|e| CheckoutFailure::at(stage, &[], e))?;
        let user = self
            .repos
            .users
            .get_by_id(caller.id)
            .await
            .map_err(|e| CheckoutFailure::at(stage, &[], e))?
            .ok_or_else(|| {
                CheckoutFailure::at(stage, &[], AppError::NotFound("User not found".into()))
            })?;
        let lines = self
            .repos
            .cart
            .list(Some(caller.id))
            .await
            .map_err(|e| CheckoutFailure::at(stage, &[], e))?;
        if lines.is_empty() {
            return Err(CheckoutFailure::at(stage, &[], AppError::EmptyCart));
        }
        let summary = PriceSummary::for_checkout(&lines, self.shipping_fee);

        // Submitting
        let stage = CheckoutStage::Submitting;
        let mut placed: Vec<Order> = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = line.product.as_ref().ok_or_else(|| {
                CheckoutFailure::at(
                    stage,
                    &placed,
                    AppError::InvalidReference(format!(
                        "Product {} no longer exists",
                        line.item.product_id
                    )),
                )
            })?;

            let new_order = snapshot(
                self.repos,
                &user,
                OrderLine {
                    product_id: line.item.product_id,
                    product_name: &product.name,
                    unit_price: product.price,
                    size: product.size.as_deref(),
                    quantity: line.item.quantity,
                    product_category_id: line.item.product_category_id,
                    design_category_id: line.item.design_category_id,
                },
                &shipping,
                summary.total,
            )
            .await
            .map_err(|e| CheckoutFailure::at(stage, &placed, e))?;

            let order = self
                .repos
                .orders
                .insert(&new_order)
                .await
                .map_err(|e| CheckoutFailure::at(stage, &placed, e))?;
            tracing::debug!(order_id = %order.id, cart_item_id = %line.item.id, "Order line placed");
            placed.push(order);
        }

        // Cleared
        let stage = CheckoutStage::Cleared;
        for line in &lines {
            let deleted = self
                .repos
                .cart
                .delete(line.item.id, Some(caller.id))
                .await
                .map_err(|e| CheckoutFailure::at(stage, &placed, e))?;
            if !deleted {
                tracing::warn!(cart_item_id = %line.item.id, "Cart line already gone");
            }
        }

        // Confirmed
        tracing::info!(
            orders = placed.len(),
            total = %summary.total,
            "Checkout confirmed"
        );
        notify(
            self.repos.notifications.as_ref(),
            &format!(
                "New order from {}: {} item(s), total {}",
                user.full_name,
                placed.len(),
                summary.total
            ),
        )
        .await;
        if let Some(email) = self.email
            && let Err(e) = email
                .send_order_confirmation(user.email.as_str(), &user.full_name, &placed)
                .await
        {
            tracing::warn!(error = %e, "Failed to send order confirmation");
        }

        Ok(CheckoutReceipt {
            orders: placed,
            summary,
        })
    }
}
