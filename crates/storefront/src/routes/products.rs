//! Product listing and detail pages.
//!
//! The listing's filter state lives in the query string, so a filtered view
//! can be bookmarked and the select boxes survive a reload.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State, rejection::QueryRejection},
    response::IntoResponse,
};
use tracing::instrument;

use stitchline_core::ProductId;

use super::Nav;
use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalCaller;
use crate::models::{Product, ProductFilter};
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// Product display data for listing grids.
#[derive(Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    pub image_url: Option<String>,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price.to_string(),
            image_url: product.primary_image().map(str::to_string),
        }
    }
}

/// One option of a filter select box.
#[derive(Clone)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A review shown on the product page.
pub struct SampleReview {
    pub author: &'static str,
    pub rating: u8,
    pub comment: &'static str,
}

/// Reviews shown on every product page. Stored reviews are only exposed
/// through the API.
const SAMPLE_REVIEWS: &[SampleReview] = &[
    SampleReview {
        author: "Ayesha",
        rating: 5,
        comment: "Beautiful print and the fabric holds up after washing.",
    },
    SampleReview {
        author: "Bilal",
        rating: 4,
        comment: "Great fit. Delivery took a few days longer than expected.",
    },
    SampleReview {
        author: "Sana",
        rating: 5,
        comment: "The colours are even brighter in person.",
    },
];

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub nav: Nav,
    pub products: Vec<ProductCard>,
    pub category_options: Vec<FilterOption>,
    pub design_options: Vec<FilterOption>,
    pub filtered: bool,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub nav: Nav,
    pub product: Product,
    pub price: String,
    pub category_name: Option<String>,
    pub design_category_name: Option<String>,
    pub reviews: &'static [SampleReview],
}

/// Display the product listing.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalCaller(caller): OptionalCaller,
    filter: Result<Query<ProductFilter>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let filter = filter.map(|Query(f)| f).unwrap_or_default();
    let catalog = CatalogService::new(state.repos());

    let products = catalog.list_products(filter).await?;
    let category_options = catalog
        .list_product_categories()
        .await?
        .into_iter()
        .map(|c| FilterOption {
            value: c.id.to_string(),
            selected: filter.category_id == Some(c.id),
            label: c.name,
        })
        .collect();
    let design_options = catalog
        .list_design_categories()
        .await?
        .into_iter()
        .map(|c| FilterOption {
            value: c.id.to_string(),
            selected: filter.design_category_id == Some(c.id),
            label: c.name,
        })
        .collect();

    Ok(ProductsIndexTemplate {
        nav: Nav::for_caller(caller.as_ref()),
        products: products.iter().map(ProductCard::from).collect(),
        category_options,
        design_options,
        filtered: !filter.is_empty(),
    })
}

/// Display a product.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    OptionalCaller(caller): OptionalCaller,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse, AppError> {
    let product = CatalogService::new(state.repos()).get_product(id).await?;
    let category_name = state
        .repos()
        .categories
        .get_product_category(product.category_id)
        .await?
        .map(|c| c.name);
    let design_category_name = state
        .repos()
        .categories
        .get_design_category(product.design_category_id)
        .await?
        .map(|c| c.name);

    Ok(ProductShowTemplate {
        nav: Nav::for_caller(caller.as_ref()),
        price: product.price.to_string(),
        product,
        category_name,
        design_category_name,
        reviews: SAMPLE_REVIEWS,
    })
}
