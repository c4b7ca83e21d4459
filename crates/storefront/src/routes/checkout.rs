//! Checkout form and order confirmation pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use stitchline_core::OrderId;

use super::Nav;
use super::cart::CartLineView;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireCaller;
use crate::models::{Caller, PriceSummary, session::keys};
use crate::services::cart::CartService;
use crate::services::checkout::CheckoutSequencer;
use crate::services::orders::ShippingInfo;
use crate::state::AppState;

/// Confirmed order display data.
#[derive(Clone)]
pub struct OrderView {
    pub id: OrderId,
    pub product_name: String,
    pub size: Option<String>,
    pub quantity: i32,
    pub line_total: String,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub nav: Nav,
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub shipping_fee: String,
    pub total: String,
    pub shipping: ShippingInfo,
    pub error: Option<String>,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub nav: Nav,
    pub orders: Vec<OrderView>,
    pub total: Option<String>,
}

async fn render_checkout(
    state: &AppState,
    caller: &Caller,
    shipping: ShippingInfo,
    error: Option<String>,
) -> Result<CheckoutTemplate, AppError> {
    let view = CartService::new(state.repos())
        .own_cart(caller, state.config().shipping_fee)
        .await?;
    let summary = PriceSummary::for_checkout(&view.items, state.config().shipping_fee);

    Ok(CheckoutTemplate {
        nav: Nav::for_caller(Some(caller)),
        lines: view.items.iter().map(CartLineView::from).collect(),
        subtotal: summary.subtotal.to_string(),
        shipping_fee: summary.shipping_fee.to_string(),
        total: summary.total.to_string(),
        shipping,
        error,
    })
}

/// Display the checkout form, prefilled from the caller's profile.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .repos()
        .users
        .get_by_id(caller.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    render_checkout(&state, &caller, ShippingInfo::from_profile(&user), None).await
}

/// Place the order. Failures re-render the form with the submitted values.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    RequireCaller(caller): RequireCaller,
    Form(shipping): Form<ShippingInfo>,
) -> Result<Response, AppError> {
    let result = CheckoutSequencer::new(
        state.repos(),
        state.config().shipping_fee,
        state.email(),
    )
    .place_order(&caller, shipping.clone())
    .await;

    match result {
        Ok(receipt) => {
            session
                .insert(keys::LAST_CHECKOUT, receipt.order_ids())
                .await?;
            Ok(Redirect::to("/orders/confirmation").into_response())
        }
        Err(failure) => {
            let error: AppError = failure.into();
            let status = error.status();
            let page =
                render_checkout(&state, &caller, shipping, Some(error.public_message())).await?;
            Ok((status, page).into_response())
        }
    }
}

/// Show the orders placed by the caller's last checkout.
#[instrument(skip_all)]
pub async fn confirmation(
    State(state): State<AppState>,
    session: Session,
    RequireCaller(caller): RequireCaller,
) -> Result<impl IntoResponse, AppError> {
    let ids: Vec<OrderId> = session
        .get(keys::LAST_CHECKOUT)
        .await?
        .unwrap_or_default();

    let orders: Vec<_> = state
        .repos()
        .orders
        .list(Some(caller.id))
        .await?
        .into_iter()
        .filter(|o| ids.contains(&o.id))
        .collect();

    Ok(ConfirmationTemplate {
        nav: Nav::for_caller(Some(&caller)),
        total: orders.first().map(|o| o.total_amount.to_string()),
        orders: orders
            .iter()
            .map(|o| OrderView {
                id: o.id,
                product_name: o.product_name.clone(),
                size: o.size.clone(),
                quantity: o.quantity.get(),
                line_total: o.line_total().to_string(),
            })
            .collect(),
    })
}
