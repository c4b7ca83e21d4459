//! Order lines: listing, direct creation and admin maintenance.

use serde::Deserialize;
use tracing::instrument;

use stitchline_core::{
    DesignCategoryId, OrderId, OrderStatus, Price, ProductCategoryId, ProductId, Quantity, Role,
    UserId,
};

use crate::db::Repositories;
use crate::error::AppError;
use crate::models::{Caller, NewOrder, Order, Product, User};
use crate::services::guard::{authorize, require_admin};

/// Where an order ships. Phone, address and city are required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingInfo {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub alt_phone_number: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
}

impl ShippingInfo {
    /// Trim every field and reject blanks.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` naming the first blank required field.
    pub fn validated(self) -> Result<Self, AppError> {
        let required = |value: String, field: &str| {
            let value = value.trim().to_string();
            if value.is_empty() {
                Err(AppError::Validation(format!("{field} is required")))
            } else {
                Ok(value)
            }
        };

        Ok(Self {
            phone_number: required(self.phone_number, "phone_number")?,
            alt_phone_number: self
                .alt_phone_number
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            address: required(self.address, "address")?,
            city: required(self.city, "city")?,
        })
    }

    /// Prefill from the saved profile.
    #[must_use]
    pub fn from_profile(user: &User) -> Self {
        Self {
            phone_number: user.phone_number.clone().unwrap_or_default(),
            alt_phone_number: user.alt_phone_number.clone(),
            address: user.address.clone().unwrap_or_default(),
            city: user.city.clone().unwrap_or_default(),
        }
    }
}

/// One line being turned into an order snapshot.
pub(crate) struct OrderLine<'a> {
    pub product_id: ProductId,
    pub product_name: &'a str,
    pub unit_price: Price,
    pub size: Option<&'a str>,
    pub quantity: Quantity,
    pub product_category_id: ProductCategoryId,
    pub design_category_id: DesignCategoryId,
}

/// Copy user, product, category and shipping data into an order row.
pub(crate) async fn snapshot(
    repos: &Repositories,
    user: &User,
    line: OrderLine<'_>,
    shipping: &ShippingInfo,
    total_amount: Price,
) -> Result<NewOrder, AppError> {
    let product_category_name = repos
        .categories
        .get_product_category(line.product_category_id)
        .await?
        .ok_or_else(|| {
            AppError::InvalidReference(format!(
                "Product category {} does not exist",
                line.product_category_id
            ))
        })?
        .name;
    let design_category_name = repos
        .categories
        .get_design_category(line.design_category_id)
        .await?
        .ok_or_else(|| {
            AppError::InvalidReference(format!(
                "Design category {} does not exist",
                line.design_category_id
            ))
        })?
        .name;

    Ok(NewOrder {
        user_id: user.id,
        user_name: user.full_name.clone(),
        user_email: user.email.clone(),
        status: OrderStatus::pending(),
        total_amount,
        product_id: line.product_id,
        product_name: line.product_name.to_string(),
        quantity: line.quantity,
        unit_price: line.unit_price,
        size: line.size.map(str::to_string),
        product_category_id: line.product_category_id,
        product_category_name,
        design_category_id: line.design_category_id,
        design_category_name,
        phone_number: shipping.phone_number.clone(),
        alt_phone_number: shipping.alt_phone_number.clone(),
        address: shipping.address.clone(),
        city: shipping.city.clone(),
    })
}

/// Direct order creation for a single product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub product_id: ProductId,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(flatten)]
    pub shipping: ShippingInfo,
}

/// Status change payload.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: String,
}

/// Order service.
pub struct OrderService<'a> {
    repos: &'a Repositories,
    shipping_fee: Price,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories, shipping_fee: Price) -> Self {
        Self {
            repos,
            shipping_fee,
        }
    }

    /// Orders visible to the caller, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` on datastore failure.
    #[instrument(skip(self), fields(user_id = %caller.id))]
    pub async fn list(&self, caller: &Caller) -> Result<Vec<Order>, AppError> {
        let scope = authorize(caller, None, Role::User)?;
        Ok(self.repos.orders.list(scope.owner()).await?)
    }

    /// Place a single-product order outside the cart flow. The total is the
    /// line total plus the flat shipping fee.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if a non-admin orders for someone else,
    /// `AppError::Validation` for blank shipping fields or a bad quantity,
    /// and `AppError::InvalidReference` for an unknown user or product.
    #[instrument(skip(self, input), fields(user_id = %caller.id, product_id = %input.product_id))]
    pub async fn create(&self, caller: &Caller, input: CreateOrder) -> Result<Order, AppError> {
        let user_id = input.user_id.unwrap_or(caller.id);
        authorize(caller, Some(user_id), Role::User)?;

        let shipping = input.shipping.validated()?;
        let quantity = Quantity::new(input.quantity.unwrap_or(1))
            .map_err(|e| AppError::Validation(format!("quantity: {e}")))?;

        let user = self.repos.users.get_by_id(user_id).await?.ok_or_else(|| {
            AppError::InvalidReference(format!("User {user_id} does not exist"))
        })?;
        let product: Product = self.repos.products.get(input.product_id).await?.ok_or_else(
            || AppError::InvalidReference(format!("Product {} does not exist", input.product_id)),
        )?;

        let total_amount = product.price.times(quantity) + self.shipping_fee;
        let new_order = snapshot(
            self.repos,
            &user,
            OrderLine {
                product_id: product.id,
                product_name: &product.name,
                unit_price: product.price,
                size: product.size.as_deref(),
                quantity,
                product_category_id: product.category_id,
                design_category_id: product.design_category_id,
            },
            &shipping,
            total_amount,
        )
        .await?;

        let order = self.repos.orders.insert(&new_order).await?;
        tracing::info!(order_id = %order.id, "Order created");
        Ok(order)
    }

    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins, `AppError::Validation`
    /// for a blank status and `AppError::NotFoundOrUnauthorized` if nothing
    /// was updated.
    #[instrument(skip(self), fields(user_id = %caller.id))]
    pub async fn update_status(
        &self,
        caller: &Caller,
        id: OrderId,
        status: &str,
    ) -> Result<Order, AppError> {
        require_admin(caller)?;
        let status = OrderStatus::parse(status)
            .ok_or_else(|| AppError::Validation("status must be 1-32 characters".to_string()))?;

        let order = self
            .repos
            .orders
            .update_status(id, &status)
            .await?
            .ok_or(AppError::NotFoundOrUnauthorized)?;
        tracing::info!(order_id = %id, status = %order.status, "Order status changed");
        Ok(order)
    }

    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins and
    /// `AppError::NotFoundOrUnauthorized` if nothing was deleted.
    #[instrument(skip(self), fields(user_id = %caller.id))]
    pub async fn delete(&self, caller: &Caller, id: OrderId) -> Result<(), AppError> {
        require_admin(caller)?;
        if !self.repos.orders.delete(id).await? {
            return Err(AppError::NotFoundOrUnauthorized);
        }
        tracing::info!(order_id = %id, "Order deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::test_support::{seed_categories, seed_product, seed_user, shipping};

    fn order_for(product_id: ProductId, user_id: Option<UserId>) -> CreateOrder {
        CreateOrder {
            user_id,
            product_id,
            quantity: Some(2),
            shipping: shipping(),
        }
    }

    #[test]
    fn test_shipping_info_requires_fields() {
        let mut info = shipping();
        info.city = "  ".into();
        assert!(matches!(
            info.validated(),
            Err(AppError::Validation(msg)) if msg == "city is required"
        ));

        let mut info = shipping();
        info.alt_phone_number = Some(" ".into());
        assert_eq!(info.validated().unwrap().alt_phone_number, None);
    }

    #[tokio::test]
    async fn test_create_snapshots_product_and_categories() {
        let repos = Repositories::from_store(Arc::new(MemoryStore::new()));
        let user = seed_user(&repos, "u@x.pk", Role::User).await;
        let (category, design) = seed_categories(&repos).await;
        let product = seed_product(&repos, "Ajrak Tee", 500, category.id, design.id).await;
        let orders = OrderService::new(&repos, Price::from_rupees(150));

        let order = orders
            .create(&user.caller(), order_for(product.id, None))
            .await
            .unwrap();

        assert_eq!(order.product_name, "Ajrak Tee");
        assert_eq!(order.unit_price, Price::from_rupees(500));
        assert_eq!(order.total_amount, Price::from_rupees(1150));
        assert_eq!(order.status.as_str(), "pending");
        assert_eq!(order.product_category_name, category.name);
        assert_eq!(order.design_category_name, design.name);
        assert_eq!(order.user_email, user.email);
    }

    #[tokio::test]
    async fn test_snapshot_requires_existing_categories() {
        let repos = Repositories::from_store(Arc::new(MemoryStore::new()));
        let user = seed_user(&repos, "u@x.pk", Role::User).await;
        let (category, design) = seed_categories(&repos).await;
        let product = seed_product(&repos, "Ajrak Tee", 500, category.id, design.id).await;
        let line = |product_category_id, design_category_id| OrderLine {
            product_id: product.id,
            product_name: &product.name,
            unit_price: product.price,
            size: None,
            quantity: Quantity::ONE,
            product_category_id,
            design_category_id,
        };

        let err = snapshot(
            &repos,
            &user,
            line(ProductCategoryId::new(999), design.id),
            &shipping(),
            Price::from_rupees(650),
        )
        .await
        .unwrap_err();
        assert!(matches!(&err, AppError::InvalidReference(msg) if msg.contains("Product category")));

        let err = snapshot(
            &repos,
            &user,
            line(category.id, DesignCategoryId::new(999)),
            &shipping(),
            Price::from_rupees(650),
        )
        .await
        .unwrap_err();
        assert!(matches!(&err, AppError::InvalidReference(msg) if msg.contains("Design category")));
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped_and_status_is_admin_only() {
        let repos = Repositories::from_store(Arc::new(MemoryStore::new()));
        let admin = seed_user(&repos, "admin@x.pk", Role::Admin).await;
        let alice = seed_user(&repos, "alice@x.pk", Role::User).await;
        let bob = seed_user(&repos, "bob@x.pk", Role::User).await;
        let (category, design) = seed_categories(&repos).await;
        let product = seed_product(&repos, "Tee", 500, category.id, design.id).await;
        let orders = OrderService::new(&repos, Price::from_rupees(150));

        let alice_order = orders
            .create(&alice.caller(), order_for(product.id, None))
            .await
            .unwrap();
        orders
            .create(&admin.caller(), order_for(product.id, Some(bob.id)))
            .await
            .unwrap();

        assert!(matches!(
            orders.create(&alice.caller(), order_for(product.id, Some(bob.id))).await,
            Err(AppError::Forbidden(_))
        ));

        let visible = orders.list(&alice.caller()).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert!(visible.iter().all(|o| o.user_id == alice.id));
        assert_eq!(orders.list(&admin.caller()).await.unwrap().len(), 2);

        assert!(matches!(
            orders.update_status(&alice.caller(), alice_order.id, "shipped").await,
            Err(AppError::Forbidden(_))
        ));
        let shipped = orders
            .update_status(&admin.caller(), alice_order.id, " Shipped ")
            .await
            .unwrap();
        assert_eq!(shipped.status.as_str(), "shipped");

        assert!(matches!(
            orders.delete(&alice.caller(), alice_order.id).await,
            Err(AppError::Forbidden(_))
        ));
        orders.delete(&admin.caller(), alice_order.id).await.unwrap();
        assert!(matches!(
            orders.delete(&admin.caller(), alice_order.id).await,
            Err(AppError::NotFoundOrUnauthorized)
        ));
    }
}
