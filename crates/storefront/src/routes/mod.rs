//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Datastore readiness
//!
//! # Pages
//! GET  /                                - Home page
//! GET  /products                        - Product listing (query-string filters)
//! GET  /products/{id}                   - Product detail
//! GET  /cart                            - Cart page
//! POST /cart/add                        - Add to cart
//! POST /cart/{id}/update                - Change quantity
//! POST /cart/{id}/remove                - Remove line
//! GET  /checkout                        - Shipping form
//! POST /checkout                        - Place order
//! GET  /orders/confirmation             - Last checkout
//! GET  /login, POST /login              - Login
//! GET  /signup, POST /signup            - Signup
//! POST /logout                          - Logout
//! GET  /admin                           - Admin dashboard
//! POST /admin/...                       - Dashboard actions
//!
//! # JSON API
//! POST /api/auth/signup | login | logout | password-reset | password-reset/confirm
//! GET  /api/auth/session
//! GET  /api/users, /api/users/{id}; PATCH /api/users/me/name
//! GET|POST /api/products; GET|PUT|DELETE /api/products/{id}
//! GET|POST /api/product-categories; PUT|DELETE /api/product-categories/{id}
//! GET|POST /api/design-categories; PUT|DELETE /api/design-categories/{id}
//! GET|POST /api/cart; PUT|DELETE /api/cart/{id}
//! GET|POST /api/orders; PATCH|DELETE /api/orders/{id}
//! POST /api/checkout
//! GET|POST /api/products/{id}/reviews; DELETE /api/reviews/{id}
//! GET|DELETE /api/notifications
//! POST /api/images
//! ```

pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod home;
pub mod products;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, header::CACHE_CONTROL},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::{
    api_rate_limiter, auth_rate_limiter, request_id_middleware, security_headers_middleware,
};
use crate::models::Caller;
use crate::state::AppState;

/// Largest accepted request body (multipart product uploads).
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Navigation state shared by every page template.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nav {
    pub signed_in: bool,
    pub is_admin: bool,
}

impl Nav {
    #[must_use]
    pub fn for_caller(caller: Option<&Caller>) -> Self {
        Self {
            signed_in: caller.is_some(),
            is_admin: caller.is_some_and(Caller::is_admin),
        }
    }
}

/// Create the auth API router.
pub fn auth_api_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(api::auth::signup))
        .route("/login", post(api::auth::login))
        .route("/logout", post(api::auth::logout))
        .route("/session", get(api::auth::current))
        .route("/password-reset", post(api::auth::request_reset))
        .route("/password-reset/confirm", post(api::auth::confirm_reset))
}

/// Create the resource API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(api::users::list))
        .route("/users/me/name", patch(api::users::update_name))
        .route("/users/{id}", get(api::users::show))
        .route(
            "/products",
            get(api::products::list).post(api::products::create),
        )
        .route(
            "/products/{id}",
            get(api::products::show)
                .put(api::products::update)
                .delete(api::products::delete),
        )
        .route(
            "/products/{id}/reviews",
            get(api::reviews::list).post(api::reviews::create),
        )
        .route("/reviews/{id}", axum::routing::delete(api::reviews::delete))
        .route(
            "/product-categories",
            get(api::categories::list_product_categories)
                .post(api::categories::create_product_category),
        )
        .route(
            "/product-categories/{id}",
            put(api::categories::update_product_category)
                .delete(api::categories::delete_product_category),
        )
        .route(
            "/design-categories",
            get(api::categories::list_design_categories)
                .post(api::categories::create_design_category),
        )
        .route(
            "/design-categories/{id}",
            put(api::categories::update_design_category)
                .delete(api::categories::delete_design_category),
        )
        .route("/cart", get(api::cart::list).post(api::cart::add))
        .route(
            "/cart/{id}",
            put(api::cart::update).delete(api::cart::remove),
        )
        .route("/orders", get(api::orders::list).post(api::orders::create))
        .route(
            "/orders/{id}",
            patch(api::orders::update_status).delete(api::orders::delete),
        )
        .route("/checkout", post(api::checkout::place_order))
        .route(
            "/notifications",
            get(api::notifications::list).delete(api::notifications::clear),
        )
        .route("/images", post(api::images::upload))
}

/// Create the server-rendered page router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/cart", get(cart::show))
        .route("/cart/add", post(cart::add))
        .route("/cart/{id}/update", post(cart::update))
        .route("/cart/{id}/remove", post(cart::remove))
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .route("/orders/confirmation", get(checkout::confirmation))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", post(auth::logout))
        .nest(
            "/admin",
            admin_routes().layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
}

/// Create the admin dashboard router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/products", post(admin::create_product))
        .route("/products/{id}/delete", post(admin::delete_product))
        .route("/product-categories", post(admin::create_product_category))
        .route("/design-categories", post(admin::create_design_category))
        .route("/orders/{id}/status", post(admin::update_order_status))
        .route("/notifications/clear", post(admin::clear_notifications))
}

/// Build the complete application: routes, static files and middleware.
///
/// Sentry layers are added by the binary so tests run without a hub.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let mut auth = auth_api_routes();
    let mut api = api_routes();
    if state.config().rate_limit {
        if let Some(limiter) = auth_rate_limiter() {
            auth = auth.layer(limiter);
        }
        if let Some(limiter) = api_rate_limiter() {
            api = api.layer(limiter);
        }
    }
    let api = api
        .nest("/auth", auth)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=31536000, immutable"),
        ))
        .service(ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")));
    let media_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=86400"),
        ))
        .service(ServeDir::new(state.config().media.dir.clone()));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api)
        .merge(page_routes())
        .nest_service("/static", static_files)
        .nest_service("/media", media_files)
        .layer(session_layer)
        .layer(from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
