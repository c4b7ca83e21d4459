//! Checkout endpoint.

use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use super::{ApiJson, created};
use crate::error::AppError;
use crate::middleware::RequireCaller;
use crate::models::session::keys;
use crate::services::checkout::CheckoutSequencer;
use crate::services::orders::ShippingInfo;
use crate::state::AppState;

/// Turn the caller's cart into orders and clear it.
///
/// The placed order ids are kept in the session for the confirmation page.
#[instrument(skip_all)]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireCaller(caller): RequireCaller,
    ApiJson(shipping): ApiJson<ShippingInfo>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = CheckoutSequencer::new(
        state.repos(),
        state.config().shipping_fee,
        state.email(),
    )
    .place_order(&caller, shipping)
    .await?;

    session
        .insert(keys::LAST_CHECKOUT, receipt.order_ids())
        .await?;

    Ok(created(receipt))
}
