//! Cart operations, scoped to the caller's own rows unless they are admin.

use serde::Deserialize;
use tracing::instrument;

use stitchline_core::{
    CartItemId, DesignCategoryId, Price, ProductCategoryId, ProductId, Quantity, Role, UserId,
};

use crate::db::Repositories;
use crate::error::AppError;
use crate::models::{Caller, CartItem, CartLine, NewCartItem, PriceSummary};
use crate::services::guard::authorize;

/// Add-to-cart payload.
///
/// `user_id` defaults to the caller; only admins may name someone else.
/// Category ids default to the product's own categories.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCart {
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub product_id: ProductId,
    #[serde(default)]
    pub product_category_id: Option<ProductCategoryId>,
    #[serde(default)]
    pub design_category_id: Option<DesignCategoryId>,
    #[serde(default)]
    pub quantity: Option<i32>,
}

/// A cart with its price summary.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    #[serde(flatten)]
    pub summary: PriceSummary,
}

impl CartView {
    /// Attach cart-page totals to a set of lines.
    #[must_use]
    pub fn new(items: Vec<CartLine>, shipping_fee: Price) -> Self {
        let summary = PriceSummary::for_cart(&items, shipping_fee);
        Self { items, summary }
    }
}

/// Cart service.
pub struct CartService<'a> {
    repos: &'a Repositories,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// Cart lines visible to the caller: their own, or everyone's for admins.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` on datastore failure.
    #[instrument(skip(self), fields(user_id = %caller.id))]
    pub async fn list(&self, caller: &Caller) -> Result<Vec<CartLine>, AppError> {
        let scope = authorize(caller, None, Role::User)?;
        Ok(self.repos.cart.list(scope.owner()).await?)
    }

    /// The caller's own cart with totals, regardless of role.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` on datastore failure.
    pub async fn own_cart(&self, caller: &Caller, shipping_fee: Price) -> Result<CartView, AppError> {
        let items = self.repos.cart.list(Some(caller.id)).await?;
        Ok(CartView::new(items, shipping_fee))
    }

    /// Add a product to a cart. Repeated adds create separate rows.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if a non-admin targets another user's
    /// cart, `AppError::Validation` for a bad quantity and
    /// `AppError::InvalidReference` naming the first missing reference.
    #[instrument(skip(self, input), fields(user_id = %caller.id, product_id = %input.product_id))]
    pub async fn add(&self, caller: &Caller, input: AddToCart) -> Result<CartItem, AppError> {
        let user_id = input.user_id.unwrap_or(caller.id);
        authorize(caller, Some(user_id), Role::User)?;

        let quantity = parse_quantity(input.quantity.unwrap_or(1))?;

        if self.repos.users.get_by_id(user_id).await?.is_none() {
            return Err(AppError::InvalidReference(format!(
                "User {user_id} does not exist"
            )));
        }
        let product = self.repos.products.get(input.product_id).await?.ok_or_else(|| {
            AppError::InvalidReference(format!("Product {} does not exist", input.product_id))
        })?;

        let product_category_id = input.product_category_id.unwrap_or(product.category_id);
        if self
            .repos
            .categories
            .get_product_category(product_category_id)
            .await?
            .is_none()
        {
            return Err(AppError::InvalidReference(format!(
                "Product category {product_category_id} does not exist"
            )));
        }

        let design_category_id = input
            .design_category_id
            .unwrap_or(product.design_category_id);
        if self
            .repos
            .categories
            .get_design_category(design_category_id)
            .await?
            .is_none()
        {
            return Err(AppError::InvalidReference(format!(
                "Design category {design_category_id} does not exist"
            )));
        }

        let item = self
            .repos
            .cart
            .insert(&NewCartItem {
                user_id,
                product_id: product.id,
                product_category_id,
                design_category_id,
                quantity,
            })
            .await?;

        tracing::info!(cart_item_id = %item.id, quantity = %item.quantity, "Added to cart");
        Ok(item)
    }

    /// # Errors
    ///
    /// Returns `AppError::Validation` for a bad quantity and
    /// `AppError::NotFoundOrUnauthorized` if no visible row matched.
    #[instrument(skip(self), fields(user_id = %caller.id))]
    pub async fn update_quantity(
        &self,
        caller: &Caller,
        id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, AppError> {
        let scope = authorize(caller, None, Role::User)?;
        let quantity = parse_quantity(quantity)?;

        self.repos
            .cart
            .update_quantity(id, scope.owner(), quantity)
            .await?
            .ok_or(AppError::NotFoundOrUnauthorized)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFoundOrUnauthorized` if no visible row matched.
    #[instrument(skip(self), fields(user_id = %caller.id))]
    pub async fn remove(&self, caller: &Caller, id: CartItemId) -> Result<(), AppError> {
        let scope = authorize(caller, None, Role::User)?;
        if !self.repos.cart.delete(id, scope.owner()).await? {
            return Err(AppError::NotFoundOrUnauthorized);
        }
        tracing::info!(cart_item_id = %id, "Removed from cart");
        Ok(())
    }
}

fn parse_quantity(raw: i32) -> Result<Quantity, AppError> {
    Quantity::new(raw).map_err(|e| AppError::Validation(format!("quantity: {e}")))
}
