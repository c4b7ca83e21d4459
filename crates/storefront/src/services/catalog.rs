//! Catalog management: products and the two category taxonomies.
//!
//! Reads are public. Every write requires an admin caller.

use tracing::instrument;

use stitchline_core::{DesignCategoryId, Price, ProductCategoryId, ProductId};

use crate::db::Repositories;
use crate::error::AppError;
use crate::models::{
    Caller, DesignCategory, DesignCategoryInput, NewProduct, Product, ProductCategory,
    ProductCategoryInput, ProductFilter, ProductUpdate,
};
use crate::services::guard::require_admin;
use crate::services::media::{MediaService, Upload};

/// Text fields of a product form, exactly as submitted.
///
/// Blank values count as absent.
#[derive(Debug, Clone, Default)]
pub struct ProductFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub size: Option<String>,
    pub category_id: Option<String>,
    pub design_category_id: Option<String>,
}

impl ProductFields {
    /// Record one form field; unknown names are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match name {
            "name" => self.name = value,
            "description" => self.description = value,
            "price" => self.price = value,
            "size" => self.size = value,
            "category_id" => self.category_id = value,
            "design_category_id" => self.design_category_id = value,
            _ => {}
        }
    }
}

/// A submitted product form with its image files in upload order.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub fields: ProductFields,
    pub images: Vec<Upload>,
}

/// Catalog service.
pub struct CatalogService<'a> {
    repos: &'a Repositories,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// All products, newest first, narrowed by `filter`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` on datastore failure.
    pub async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, AppError> {
        let products = self.repos.products.list().await?;
        Ok(filter.apply(products))
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if there is no such product.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, AppError> {
        self.repos
            .products
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))
    }

    /// Create a product. Fields are validated before any image is stored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins, `AppError::Validation`
    /// for missing fields or images, `AppError::InvalidReference` for
    /// unknown categories, and `AppError::Media` if storing an image fails.
    #[instrument(skip(self, form, media), fields(user_id = %caller.id))]
    pub async fn create_product(
        &self,
        caller: &Caller,
        form: ProductForm,
        media: &MediaService<'_>,
    ) -> Result<Product, AppError> {
        require_admin(caller)?;

        let fields = form.fields;
        let name = fields.name.ok_or_else(|| missing("name"))?;
        let description = fields.description.ok_or_else(|| missing("description"))?;
        let price = parse_price(fields.price.as_deref().ok_or_else(|| missing("price"))?)?;
        let category_id = parse_id::<ProductCategoryId>(
            fields.category_id.as_deref().ok_or_else(|| missing("category_id"))?,
            "category_id",
        )?;
        let design_category_id = parse_id::<DesignCategoryId>(
            fields
                .design_category_id
                .as_deref()
                .ok_or_else(|| missing("design_category_id"))?,
            "design_category_id",
        )?;
        if form.images.is_empty() {
            return Err(AppError::Validation(
                "At least one image is required".to_string(),
            ));
        }

        self.ensure_product_category(category_id).await?;
        self.ensure_design_category(design_category_id).await?;

        let image_urls = media.store_all(&form.images).await?;

        let product = self
            .repos
            .products
            .create(&NewProduct {
                name,
                description,
                price,
                size: fields.size,
                image_urls,
                category_id,
                design_category_id,
            })
            .await?;

        tracing::info!(product_id = %product.id, images = product.image_urls.len(), "Product created");
        Ok(product)
    }

    /// Apply the submitted fields to a product. New images replace the
    /// whole image list; no images leaves it unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins and
    /// `AppError::NotFoundOrUnauthorized` if no product was updated.
    #[instrument(skip(self, form, media), fields(user_id = %caller.id))]
    pub async fn update_product(
        &self,
        caller: &Caller,
        id: ProductId,
        form: ProductForm,
        media: &MediaService<'_>,
    ) -> Result<Product, AppError> {
        require_admin(caller)?;

        let fields = form.fields;
        let price = fields.price.as_deref().map(parse_price).transpose()?;
        let category_id = fields
            .category_id
            .as_deref()
            .map(|v| parse_id::<ProductCategoryId>(v, "category_id"))
            .transpose()?;
        let design_category_id = fields
            .design_category_id
            .as_deref()
            .map(|v| parse_id::<DesignCategoryId>(v, "design_category_id"))
            .transpose()?;

        if let Some(category_id) = category_id {
            self.ensure_product_category(category_id).await?;
        }
        if let Some(design_category_id) = design_category_id {
            self.ensure_design_category(design_category_id).await?;
        }
        if self.repos.products.get(id).await?.is_none() {
            return Err(AppError::NotFoundOrUnauthorized);
        }

        let image_urls = if form.images.is_empty() {
            None
        } else {
            Some(media.store_all(&form.images).await?)
        };

        let update = ProductUpdate {
            name: fields.name,
            description: fields.description,
            price,
            size: fields.size,
            category_id,
            design_category_id,
            image_urls,
        };

        let product = self
            .repos
            .products
            .update(id, &update)
            .await?
            .ok_or(AppError::NotFoundOrUnauthorized)?;

        tracing::info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins and
    /// `AppError::NotFoundOrUnauthorized` if nothing was deleted.
    #[instrument(skip(self), fields(user_id = %caller.id))]
    pub async fn delete_product(&self, caller: &Caller, id: ProductId) -> Result<(), AppError> {
        require_admin(caller)?;
        if !self.repos.products.delete(id).await? {
            return Err(AppError::NotFoundOrUnauthorized);
        }
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    // =========================================================================
    // Product categories
    // =========================================================================

    /// # Errors
    ///
    /// Returns `AppError::Database` on datastore failure.
    pub async fn list_product_categories(&self) -> Result<Vec<ProductCategory>, AppError> {
        Ok(self.repos.categories.list_product_categories().await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins and
    /// `AppError::Validation` for a blank name.
    #[instrument(skip(self, input), fields(user_id = %caller.id))]
    pub async fn create_product_category(
        &self,
        caller: &Caller,
        input: ProductCategoryInput,
    ) -> Result<ProductCategory, AppError> {
        require_admin(caller)?;
        let input = clean_product_category(input)?;
        let category = self.repos.categories.create_product_category(&input).await?;
        tracing::info!(category_id = %category.id, "Product category created");
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins and
    /// `AppError::NotFoundOrUnauthorized` if nothing was updated.
    #[instrument(skip(self, input), fields(user_id = %caller.id))]
    pub async fn update_product_category(
        &self,
        caller: &Caller,
        id: ProductCategoryId,
        input: ProductCategoryInput,
    ) -> Result<ProductCategory, AppError> {
        require_admin(caller)?;
        let input = clean_product_category(input)?;
        self.repos
            .categories
            .update_product_category(id, &input)
            .await?
            .ok_or(AppError::NotFoundOrUnauthorized)
    }

    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins,
    /// `AppError::NotFoundOrUnauthorized` if nothing was deleted, and a
    /// conflict while products or carts still use the category.
    #[instrument(skip(self), fields(user_id = %caller.id))]
    pub async fn delete_product_category(
        &self,
        caller: &Caller,
        id: ProductCategoryId,
    ) -> Result<(), AppError> {
        require_admin(caller)?;
        if !self.repos.categories.delete_product_category(id).await? {
            return Err(AppError::NotFoundOrUnauthorized);
        }
        Ok(())
    }

    // =========================================================================
    // Design categories
    // =========================================================================

    /// # Errors
    ///
    /// Returns `AppError::Database` on datastore failure.
    pub async fn list_design_categories(&self) -> Result<Vec<DesignCategory>, AppError> {
        Ok(self.repos.categories.list_design_categories().await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins and
    /// `AppError::Validation` for a blank name.
    #[instrument(skip(self, input), fields(user_id = %caller.id))]
    pub async fn create_design_category(
        &self,
        caller: &Caller,
        input: DesignCategoryInput,
    ) -> Result<DesignCategory, AppError> {
        require_admin(caller)?;
        let input = clean_design_category(input)?;
        let category = self.repos.categories.create_design_category(&input).await?;
        tracing::info!(category_id = %category.id, "Design category created");
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins and
    /// `AppError::NotFoundOrUnauthorized` if nothing was updated.
    #[instrument(skip(self, input), fields(user_id = %caller.id))]
    pub async fn update_design_category(
        &self,
        caller: &Caller,
        id: DesignCategoryId,
        input: DesignCategoryInput,
    ) -> Result<DesignCategory, AppError> {
        require_admin(caller)?;
        let input = clean_design_category(input)?;
        self.repos
            .categories
            .update_design_category(id, &input)
            .await?
            .ok_or(AppError::NotFoundOrUnauthorized)
    }

    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins,
    /// `AppError::NotFoundOrUnauthorized` if nothing was deleted, and a
    /// conflict while products or carts still use the category.
    #[instrument(skip(self), fields(user_id = %caller.id))]
    pub async fn delete_design_category(
        &self,
        caller: &Caller,
        id: DesignCategoryId,
    ) -> Result<(), AppError> {
        require_admin(caller)?;
        if !self.repos.categories.delete_design_category(id).await? {
            return Err(AppError::NotFoundOrUnauthorized);
        }
        Ok(())
    }

    async fn ensure_product_category(&self, id: ProductCategoryId) -> Result<(), AppError> {
        if self.repos.categories.get_product_category(id).await?.is_none() {
            return Err(AppError::InvalidReference(format!(
                "Product category {id} does not exist"
            )));
        }
        Ok(())
    }

    async fn ensure_design_category(&self, id: DesignCategoryId) -> Result<(), AppError> {
        if self.repos.categories.get_design_category(id).await?.is_none() {
            return Err(AppError::InvalidReference(format!(
                "Design category {id} does not exist"
            )));
        }
        Ok(())
    }
}

fn missing(field: &str) -> AppError {
    AppError::Validation(format!("{field} is required"))
}

fn parse_price(raw: &str) -> Result<Price, AppError> {
    Price::parse(raw).map_err(|e| AppError::Validation(format!("price: {e}")))
}

fn parse_id<T: std::str::FromStr>(raw: &str, field: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("{field} must be a number")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_product_category(input: ProductCategoryInput) -> Result<ProductCategoryInput, AppError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(missing("name"));
    }
    Ok(ProductCategoryInput {
        name,
        description: non_blank(input.description),
    })
}

fn clean_design_category(input: DesignCategoryInput) -> Result<DesignCategoryInput, AppError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(missing("name"));
    }
    Ok(DesignCategoryInput {
        name,
        theme: non_blank(input.theme),
        release_date: input.release_date,
        description: non_blank(input.description),
    })
}
