//! Catalog types: products and the two category taxonomies.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use stitchline_core::{DesignCategoryId, Price, ProductCategoryId, ProductId};

/// A product in the catalog.
///
/// `image_urls` keeps upload order; the first entry is the primary image.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub size: Option<String>,
    pub image_urls: Vec<String>,
    pub category_id: ProductCategoryId,
    pub design_category_id: DesignCategoryId,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// The image shown on listing cards.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }
}

/// Data for inserting a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub size: Option<String>,
    pub image_urls: Vec<String>,
    pub category_id: ProductCategoryId,
    pub design_category_id: DesignCategoryId,
}

/// Partial product update. `None` leaves the column as it is; a new image
/// list replaces the old one wholesale.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub size: Option<String>,
    pub category_id: Option<ProductCategoryId>,
    pub design_category_id: Option<DesignCategoryId>,
    pub image_urls: Option<Vec<String>>,
}

/// Listing filter taken from the query string.
///
/// Filtering happens in memory after the full listing is fetched. Empty
/// parameters (the "All" option of a select box) mean no filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProductFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category_id: Option<ProductCategoryId>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub design_category_id: Option<DesignCategoryId>,
}

impl ProductFilter {
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.category_id.is_none_or(|id| product.category_id == id)
            && self
                .design_category_id
                .is_none_or(|id| product.design_category_id == id)
    }

    #[must_use]
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        products.into_iter().filter(|p| self.matches(p)).collect()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.category_id.is_none() && self.design_category_id.is_none()
    }
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// A product category (e.g. "Hoodies").
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductCategory {
    pub id: ProductCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create/update payload for a product category.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductCategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A design category, i.e. a themed print collection.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DesignCategory {
    pub id: DesignCategoryId,
    pub name: String,
    pub theme: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create/update payload for a design category.
#[derive(Debug, Clone, Deserialize)]
pub struct DesignCategoryInput {
    pub name: String,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32, category: i32, design: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Price::from_rupees(100),
            size: None,
            image_urls: vec![],
            category_id: ProductCategoryId::new(category),
            design_category_id: DesignCategoryId::new(design),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_by_both_categories() {
        let products = vec![product(1, 1, 1), product(2, 1, 2), product(3, 2, 2)];

        let filter = ProductFilter {
            category_id: Some(ProductCategoryId::new(1)),
            design_category_id: Some(DesignCategoryId::new(2)),
        };
        let ids: Vec<i32> = filter.apply(products.clone()).iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![2]);

        assert_eq!(ProductFilter::default().apply(products).len(), 3);
    }

    #[test]
    fn test_filter_treats_empty_params_as_unset() {
        let filter: ProductFilter =
            serde_json::from_str(r#"{"category_id": "", "design_category_id": "4"}"#).unwrap();
        assert_eq!(filter.category_id, None);
        assert_eq!(filter.design_category_id, Some(DesignCategoryId::new(4)));

        let filter: ProductFilter = serde_json::from_str("{}").unwrap();
        assert!(filter.is_empty());

        assert!(serde_json::from_str::<ProductFilter>(r#"{"category_id": "x"}"#).is_err());
    }

    #[test]
    fn test_primary_image_is_first_upload() {
        let mut p = product(1, 1, 1);
        assert_eq!(p.primary_image(), None);
        p.image_urls = vec!["/media/a.jpg".into(), "/media/b.jpg".into()];
        assert_eq!(p.primary_image(), Some("/media/a.jpg"));
    }
}
