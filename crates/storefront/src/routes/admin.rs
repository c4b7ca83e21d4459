//! Admin dashboard.
//!
//! Every handler requires an admin caller. Form actions redirect back to the
//! dashboard with a `notice` or `error` query parameter; server failures are
//! returned as errors instead.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{
        Multipart, Path, Query, State, multipart::MultipartRejection, rejection::QueryRejection,
    },
    response::{IntoResponse, Redirect},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use stitchline_core::{OrderId, ProductId};

use super::Nav;
use super::api::products::read_product_form;
use super::products::ProductCard;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireCaller;
use crate::models::{
    DesignCategory, DesignCategoryInput, Order, ProductCategory, ProductCategoryInput,
    ProductFilter, User,
};
use crate::services::catalog::CatalogService;
use crate::services::guard::require_admin;
use crate::services::notifications::NotificationService;
use crate::services::orders::OrderService;
use crate::services::users::UserService;
use crate::state::AppState;

/// Flash messages carried in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Notification display data.
pub struct NotificationView {
    pub message: String,
    pub created_at: String,
}

/// Order display data.
pub struct AdminOrderView {
    pub id: OrderId,
    pub created_at: String,
    pub customer: String,
    pub email: String,
    pub product_name: String,
    pub size: Option<String>,
    pub quantity: i32,
    pub total_amount: String,
    pub status: String,
    pub address: String,
}

impl From<&Order> for AdminOrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            created_at: order.created_at.format("%d %b %Y %H:%M").to_string(),
            customer: order.user_name.clone(),
            email: order.user_email.to_string(),
            product_name: order.product_name.clone(),
            size: order.size.clone(),
            quantity: order.quantity.get(),
            total_amount: order.total_amount.to_string(),
            status: order.status.to_string(),
            address: format!("{}, {} ({})", order.address, order.city, order.phone_number),
        }
    }
}

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub nav: Nav,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub notifications: Vec<NotificationView>,
    pub users: Vec<User>,
    pub products: Vec<ProductCard>,
    pub orders: Vec<AdminOrderView>,
    pub product_categories: Vec<ProductCategory>,
    pub design_categories: Vec<DesignCategory>,
}

/// Design category form; the date input submits an empty string when unset.
#[derive(Debug, Deserialize)]
pub struct DesignCategoryForm {
    pub name: String,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TryFrom<DesignCategoryForm> for DesignCategoryInput {
    type Error = AppError;

    fn try_from(form: DesignCategoryForm) -> Result<Self, Self::Error> {
        let release_date = form
            .release_date
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                NaiveDate::parse_from_str(v, "%Y-%m-%d").map_err(|_| {
                    AppError::Validation("release_date must be YYYY-MM-DD".to_string())
                })
            })
            .transpose()?;

        Ok(Self {
            name: form.name,
            theme: form.theme,
            release_date,
            description: form.description,
        })
    }
}

/// Order status form.
#[derive(Debug, Deserialize)]
pub struct OrderStatusForm {
    pub status: String,
}

/// Redirect back to the dashboard, reporting client errors as a flash
/// message.
fn back(result: Result<String, AppError>) -> Result<Redirect, AppError> {
    match result {
        Ok(notice) => Ok(Redirect::to(&format!(
            "/admin?notice={}",
            urlencoding::encode(&notice)
        ))),
        Err(e) if e.status().is_client_error() => Ok(Redirect::to(&format!(
            "/admin?error={}",
            urlencoding::encode(&e.public_message())
        ))),
        Err(e) => Err(e),
    }
}

/// Display the dashboard.
#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    flash: Result<Query<FlashQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&caller)?;
    let flash = flash.map(|Query(f)| f).unwrap_or_default();

    let catalog = CatalogService::new(state.repos());
    let notifications = NotificationService::new(state.repos())
        .list(&caller)
        .await?
        .into_iter()
        .map(|n| NotificationView {
            message: n.message,
            created_at: n.created_at.format("%d %b %Y %H:%M").to_string(),
        })
        .collect();
    let users = UserService::new(state.repos()).list(&caller).await?;
    let products = catalog
        .list_products(ProductFilter::default())
        .await?
        .iter()
        .map(ProductCard::from)
        .collect();
    let orders = OrderService::new(state.repos(), state.config().shipping_fee)
        .list(&caller)
        .await?
        .iter()
        .map(AdminOrderView::from)
        .collect();

    Ok(DashboardTemplate {
        nav: Nav::for_caller(Some(&caller)),
        notice: flash.notice,
        error: flash.error,
        notifications,
        users,
        products,
        orders,
        product_categories: catalog.list_product_categories().await?,
        design_categories: catalog.list_design_categories().await?,
    })
}

/// Create a product from the dashboard form.
#[instrument(skip_all)]
pub async fn create_product(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, AppError> {
    require_admin(&caller)?;
    let result = async {
        let form = read_product_form(multipart).await?;
        let product = CatalogService::new(state.repos())
            .create_product(&caller, form, &state.media())
            .await?;
        Ok::<_, AppError>(format!("Created {}", product.name))
    }
    .await;
    back(result)
}

#[instrument(skip_all)]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<ProductId>,
) -> Result<Redirect, AppError> {
    require_admin(&caller)?;
    let result = CatalogService::new(state.repos())
        .delete_product(&caller, id)
        .await
        .map(|()| "Product deleted".to_string());
    back(result)
}

#[instrument(skip_all)]
pub async fn create_product_category(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Form(input): Form<ProductCategoryInput>,
) -> Result<Redirect, AppError> {
    require_admin(&caller)?;
    let result = CatalogService::new(state.repos())
        .create_product_category(&caller, input)
        .await
        .map(|c| format!("Added product category {}", c.name));
    back(result)
}

#[instrument(skip_all)]
pub async fn create_design_category(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Form(form): Form<DesignCategoryForm>,
) -> Result<Redirect, AppError> {
    require_admin(&caller)?;
    let result = async {
        let input = DesignCategoryInput::try_from(form)?;
        let category = CatalogService::new(state.repos())
            .create_design_category(&caller, input)
            .await?;
        Ok::<_, AppError>(format!("Added design category {}", category.name))
    }
    .await;
    back(result)
}

#[instrument(skip_all)]
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<OrderId>,
    Form(form): Form<OrderStatusForm>,
) -> Result<Redirect, AppError> {
    require_admin(&caller)?;
    let result = OrderService::new(state.repos(), state.config().shipping_fee)
        .update_status(&caller, id, &form.status)
        .await
        .map(|o| format!("Order {} is now {}", o.id, o.status));
    back(result)
}

#[instrument(skip_all)]
pub async fn clear_notifications(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<Redirect, AppError> {
    require_admin(&caller)?;
    let result = NotificationService::new(state.repos())
        .clear(&caller)
        .await
        .map(|n| format!("Cleared {n} notifications"));
    back(result)
}
