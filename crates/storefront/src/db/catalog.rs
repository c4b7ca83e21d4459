//! Catalog repositories: products, product categories and design categories.

use async_trait::async_trait;

use stitchline_core::{DesignCategoryId, ProductCategoryId, ProductId};

use super::{PgStore, RepositoryError};
use crate::models::{
    DesignCategory, DesignCategoryInput, NewProduct, Product, ProductCategory,
    ProductCategoryInput, ProductUpdate,
};

/// Persistence for products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products, newest first.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError>;

    /// Apply a partial update. Returns `None` if the product does not exist.
    async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Returns `false` if the product does not exist.
    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError>;
}

/// Persistence for both category taxonomies.
///
/// Deleting a category still referenced by a product or cart row fails with
/// `RepositoryError::Conflict`.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list_product_categories(&self) -> Result<Vec<ProductCategory>, RepositoryError>;

    async fn get_product_category(
        &self,
        id: ProductCategoryId,
    ) -> Result<Option<ProductCategory>, RepositoryError>;

    async fn create_product_category(
        &self,
        input: &ProductCategoryInput,
    ) -> Result<ProductCategory, RepositoryError>;

    async fn update_product_category(
        &self,
        id: ProductCategoryId,
        input: &ProductCategoryInput,
    ) -> Result<Option<ProductCategory>, RepositoryError>;

    async fn delete_product_category(&self, id: ProductCategoryId)
    -> Result<bool, RepositoryError>;

    async fn list_design_categories(&self) -> Result<Vec<DesignCategory>, RepositoryError>;

    async fn get_design_category(
        &self,
        id: DesignCategoryId,
    ) -> Result<Option<DesignCategory>, RepositoryError>;

    async fn create_design_category(
        &self,
        input: &DesignCategoryInput,
    ) -> Result<DesignCategory, RepositoryError>;

    async fn update_design_category(
        &self,
        id: DesignCategoryId,
        input: &DesignCategoryInput,
    ) -> Result<Option<DesignCategory>, RepositoryError>;

    async fn delete_design_category(&self, id: DesignCategoryId) -> Result<bool, RepositoryError>;
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, size, image_urls, \
                               category_id, design_category_id, created_at";

const CATEGORY_IN_USE: &str = "category is still used by products or carts";

#[async_trait]
impl ProductRepository for PgStore {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool())
        .await?;
        Ok(products)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(product)
    }

    async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO products (name, description, price, size, image_urls,
                                  category_id, design_category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.size)
        .bind(&product.image_urls)
        .bind(product.category_id)
        .bind(product.design_category_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "unknown category"))
    }

    async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                size = COALESCE($5, size),
                category_id = COALESCE($6, category_id),
                design_category_id = COALESCE($7, design_category_id),
                image_urls = COALESCE($8, image_urls),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price)
        .bind(&update.size)
        .bind(update.category_id)
        .bind(update.design_category_id)
        .bind(&update.image_urls)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "unknown category"))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CategoryRepository for PgStore {
    async fn list_product_categories(&self) -> Result<Vec<ProductCategory>, RepositoryError> {
        let categories = sqlx::query_as::<_, ProductCategory>(
            "SELECT id, name, description, created_at FROM product_categories ORDER BY name",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(categories)
    }

    async fn get_product_category(
        &self,
        id: ProductCategoryId,
    ) -> Result<Option<ProductCategory>, RepositoryError> {
        let category = sqlx::query_as::<_, ProductCategory>(
            "SELECT id, name, description, created_at FROM product_categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(category)
    }

    async fn create_product_category(
        &self,
        input: &ProductCategoryInput,
    ) -> Result<ProductCategory, RepositoryError> {
        let category = sqlx::query_as::<_, ProductCategory>(
            r"
            INSERT INTO product_categories (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            ",
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(self.pool())
        .await?;
        Ok(category)
    }

    async fn update_product_category(
        &self,
        id: ProductCategoryId,
        input: &ProductCategoryInput,
    ) -> Result<Option<ProductCategory>, RepositoryError> {
        let category = sqlx::query_as::<_, ProductCategory>(
            r"
            UPDATE product_categories SET name = $2, description = $3
            WHERE id = $1
            RETURNING id, name, description, created_at
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_optional(self.pool())
        .await?;
        Ok(category)
    }

    async fn delete_product_category(
        &self,
        id: ProductCategoryId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM product_categories WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| RepositoryError::from_constraint(e, CATEGORY_IN_USE))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_design_categories(&self) -> Result<Vec<DesignCategory>, RepositoryError> {
        let categories = sqlx::query_as::<_, DesignCategory>(
            r"
            SELECT id, name, theme, release_date, description, created_at
            FROM design_categories
            ORDER BY release_date DESC NULLS LAST, name
            ",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(categories)
    }

    async fn get_design_category(
        &self,
        id: DesignCategoryId,
    ) -> Result<Option<DesignCategory>, RepositoryError> {
        let category = sqlx::query_as::<_, DesignCategory>(
            r"
            SELECT id, name, theme, release_date, description, created_at
            FROM design_categories WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(category)
    }

    async fn create_design_category(
        &self,
        input: &DesignCategoryInput,
    ) -> Result<DesignCategory, RepositoryError> {
        let category = sqlx::query_as::<_, DesignCategory>(
            r"
            INSERT INTO design_categories (name, theme, release_date, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, theme, release_date, description, created_at
            ",
        )
        .bind(&input.name)
        .bind(&input.theme)
        .bind(input.release_date)
        .bind(&input.description)
        .fetch_one(self.pool())
        .await?;
        Ok(category)
    }

    async fn update_design_category(
        &self,
        id: DesignCategoryId,
        input: &DesignCategoryInput,
    ) -> Result<Option<DesignCategory>, RepositoryError> {
        let category = sqlx::query_as::<_, DesignCategory>(
            r"
            UPDATE design_categories
            SET name = $2, theme = $3, release_date = $4, description = $5
            WHERE id = $1
            RETURNING id, name, theme, release_date, description, created_at
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.theme)
        .bind(input.release_date)
        .bind(&input.description)
        .fetch_optional(self.pool())
        .await?;
        Ok(category)
    }

    async fn delete_design_category(&self, id: DesignCategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM design_categories WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| RepositoryError::from_constraint(e, CATEGORY_IN_USE))?;
        Ok(result.rows_affected() > 0)
    }
}
