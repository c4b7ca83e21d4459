//! Cart page and its form actions.
//!
//! Every action redirects back to the cart page, so a reload never repeats
//! a submission.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use stitchline_core::{CartItemId, ProductId};

use super::Nav;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireCaller;
use crate::models::CartLine;
use crate::services::cart::{AddToCart, CartService};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub size: Option<String>,
    pub image_url: Option<String>,
    pub unit_price: String,
    pub quantity: i32,
    pub line_total: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        let product = line.product.as_ref();
        Self {
            id: line.item.id,
            product_id: line.item.product_id,
            name: product.map_or_else(|| "Unavailable product".to_string(), |p| p.name.clone()),
            size: product.and_then(|p| p.size.clone()),
            image_url: product.and_then(|p| p.image_url.clone()),
            unit_price: product.map(|p| p.price.to_string()).unwrap_or_default(),
            quantity: line.item.quantity.get(),
            line_total: line.line_total().to_string(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<i32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub quantity: i32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub nav: Nav,
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    /// `None` while the cart is empty.
    pub shipping_fee: Option<String>,
    pub total: String,
}

/// Display the caller's cart.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<impl IntoResponse, AppError> {
    let view = CartService::new(state.repos())
        .own_cart(&caller, state.config().shipping_fee)
        .await?;

    Ok(CartShowTemplate {
        nav: Nav::for_caller(Some(&caller)),
        lines: view.items.iter().map(CartLineView::from).collect(),
        subtotal: view.summary.subtotal.to_string(),
        shipping_fee: (!view.summary.subtotal.is_zero())
            .then(|| view.summary.shipping_fee.to_string()),
        total: view.summary.total.to_string(),
    })
}

/// Add a product to the caller's cart.
#[instrument(skip_all)]
pub async fn add(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Form(form): Form<AddToCartForm>,
) -> Result<impl IntoResponse, AppError> {
    CartService::new(state.repos())
        .add(
            &caller,
            AddToCart {
                user_id: None,
                product_id: form.product_id,
                product_category_id: None,
                design_category_id: None,
                quantity: form.quantity,
            },
        )
        .await?;
    Ok(Redirect::to("/cart"))
}

/// Change a line's quantity.
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<CartItemId>,
    Form(form): Form<UpdateCartForm>,
) -> Result<impl IntoResponse, AppError> {
    CartService::new(state.repos())
        .update_quantity(&caller, id, form.quantity)
        .await?;
    Ok(Redirect::to("/cart"))
}

/// Remove a line.
#[instrument(skip_all)]
pub async fn remove(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<CartItemId>,
) -> Result<impl IntoResponse, AppError> {
    CartService::new(state.repos()).remove(&caller, id).await?;
    Ok(Redirect::to("/cart"))
}
