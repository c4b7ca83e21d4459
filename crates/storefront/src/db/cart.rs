//! Cart repository.
//!
//! Every read and write takes an owner filter: `None` is the admin bypass,
//! `Some(user)` restricts the statement to that user's rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stitchline_core::{
    CartItemId, DesignCategoryId, Price, ProductCategoryId, ProductId, Quantity, UserId,
};

use super::{PgStore, RepositoryError};
use crate::models::{CartItem, CartLine, CartProduct, NewCartItem};

/// Persistence for cart rows.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Cart rows with their products, oldest first.
    async fn list(&self, owner: Option<UserId>) -> Result<Vec<CartLine>, RepositoryError>;

    async fn insert(&self, item: &NewCartItem) -> Result<CartItem, RepositoryError>;

    /// Returns `None` if no row matched the id and owner filter.
    async fn update_quantity(
        &self,
        id: CartItemId,
        owner: Option<UserId>,
        quantity: Quantity,
    ) -> Result<Option<CartItem>, RepositoryError>;

    /// Returns `false` if no row matched the id and owner filter.
    async fn delete(&self, id: CartItemId, owner: Option<UserId>)
    -> Result<bool, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: CartItemId,
    user_id: UserId,
    product_id: ProductId,
    product_category_id: ProductCategoryId,
    design_category_id: DesignCategoryId,
    quantity: Quantity,
    created_at: DateTime<Utc>,
    product_name: Option<String>,
    product_price: Option<Price>,
    product_size: Option<String>,
    product_image: Option<String>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        let product = match (row.product_name, row.product_price) {
            (Some(name), Some(price)) => Some(CartProduct {
                name,
                price,
                size: row.product_size,
                image_url: row.product_image,
            }),
            _ => None,
        };

        Self {
            item: CartItem {
                id: row.id,
                user_id: row.user_id,
                product_id: row.product_id,
                product_category_id: row.product_category_id,
                design_category_id: row.design_category_id,
                quantity: row.quantity,
                created_at: row.created_at,
            },
            product,
        }
    }
}

const CART_COLUMNS: &str =
    "id, user_id, product_id, product_category_id, design_category_id, quantity, created_at";

#[async_trait]
impl CartRepository for PgStore {
    async fn list(&self, owner: Option<UserId>) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT c.id, c.user_id, c.product_id, c.product_category_id,
                   c.design_category_id, c.quantity, c.created_at,
                   p.name AS product_name, p.price AS product_price,
                   p.size AS product_size, p.image_urls[1] AS product_image
            FROM cart_items c
            LEFT JOIN products p ON p.id = c.product_id
            WHERE ($1::INT4 IS NULL OR c.user_id = $1)
            ORDER BY c.created_at, c.id
            ",
        )
        .bind(owner)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    async fn insert(&self, item: &NewCartItem) -> Result<CartItem, RepositoryError> {
        sqlx::query_as::<_, CartItem>(&format!(
            r"
            INSERT INTO cart_items (user_id, product_id, product_category_id,
                                    design_category_id, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CART_COLUMNS}
            "
        ))
        .bind(item.user_id)
        .bind(item.product_id)
        .bind(item.product_category_id)
        .bind(item.design_category_id)
        .bind(item.quantity)
        .fetch_one(self.pool())
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "referenced row does not exist"))
    }

    async fn update_quantity(
        &self,
        id: CartItemId,
        owner: Option<UserId>,
        quantity: Quantity,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(&format!(
            r"
            UPDATE cart_items SET quantity = $3
            WHERE id = $1 AND ($2::INT4 IS NULL OR user_id = $2)
            RETURNING {CART_COLUMNS}
            "
        ))
        .bind(id)
        .bind(owner)
        .bind(quantity)
        .fetch_optional(self.pool())
        .await?;
        Ok(item)
    }

    async fn delete(
        &self,
        id: CartItemId,
        owner: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM cart_items WHERE id = $1 AND ($2::INT4 IS NULL OR user_id = $2)",
        )
        .bind(id)
        .bind(owner)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
