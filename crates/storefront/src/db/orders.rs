//! Order repository.

use async_trait::async_trait;

use stitchline_core::{OrderId, OrderStatus, UserId};

use super::{PgStore, RepositoryError};
use crate::models::{NewOrder, Order};

/// Persistence for order lines.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Orders newest first, optionally restricted to one owner.
    async fn list(&self, owner: Option<UserId>) -> Result<Vec<Order>, RepositoryError>;

    /// Insert one order line. Each insert stands alone; there is no
    /// transaction spanning several lines.
    async fn insert(&self, order: &NewOrder) -> Result<Order, RepositoryError>;

    async fn update_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<Option<Order>, RepositoryError>;

    async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError>;
}

const ORDER_COLUMNS: &str = "id, user_id, user_name, user_email, status, total_amount, \
     product_id, product_name, quantity, unit_price, size, \
     product_category_id, product_category_name, design_category_id, design_category_name, \
     phone_number, alt_phone_number, address, city, created_at";

#[async_trait]
impl OrderRepository for PgStore {
    async fn list(&self, owner: Option<UserId>) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE ($1::INT4 IS NULL OR user_id = $1)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(owner)
        .fetch_all(self.pool())
        .await?;
        Ok(orders)
    }

    async fn insert(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO orders (user_id, user_name, user_email, status, total_amount,
                                product_id, product_name, quantity, unit_price, size,
                                product_category_id, product_category_name,
                                design_category_id, design_category_name,
                                phone_number, alt_phone_number, address, city)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id)
        .bind(&order.user_name)
        .bind(&order.user_email)
        .bind(&order.status)
        .bind(order.total_amount)
        .bind(order.product_id)
        .bind(&order.product_name)
        .bind(order.quantity)
        .bind(order.unit_price)
        .bind(&order.size)
        .bind(order.product_category_id)
        .bind(&order.product_category_name)
        .bind(order.design_category_id)
        .bind(&order.design_category_name)
        .bind(&order.phone_number)
        .bind(&order.alt_phone_number)
        .bind(&order.address)
        .bind(&order.city)
        .fetch_one(self.pool())
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "referenced row does not exist"))
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool())
        .await?;
        Ok(order)
    }

    async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
