//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::Nav;
use super::products::ProductCard;
use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalCaller;
use crate::models::{DesignCategory, ProductCategory, ProductFilter};
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// Products shown on the home page.
const LATEST_PRODUCTS: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub nav: Nav,
    pub product_categories: Vec<ProductCategory>,
    pub design_categories: Vec<DesignCategory>,
    pub latest: Vec<ProductCard>,
}

/// Display the home page: both category lists and the newest products.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    OptionalCaller(caller): OptionalCaller,
) -> Result<impl IntoResponse, AppError> {
    let catalog = CatalogService::new(state.repos());
    let product_categories = catalog.list_product_categories().await?;
    let design_categories = catalog.list_design_categories().await?;
    let latest = catalog
        .list_products(ProductFilter::default())
        .await?
        .iter()
        .take(LATEST_PRODUCTS)
        .map(ProductCard::from)
        .collect();

    Ok(HomeTemplate {
        nav: Nav::for_caller(caller.as_ref()),
        product_categories,
        design_categories,
        latest,
    })
}
