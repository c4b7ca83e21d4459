//! Fixtures shared by unit tests and the router tests in `tests/`.
//!
//! Everything here runs against [`MemoryStore`] and [`MemoryMediaStore`];
//! nothing touches `PostgreSQL` or the filesystem.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use secrecy::SecretString;

use stitchline_core::{DesignCategoryId, Email, Price, ProductCategoryId, Role};

use crate::config::{MediaConfig, StorefrontConfig};
use crate::db::Repositories;
use crate::db::memory::MemoryStore;
use crate::models::{
    DesignCategory, DesignCategoryInput, NewProduct, NewUser, Product, ProductCategory,
    ProductCategoryInput, User,
};
use crate::services::auth::hash_password;
use crate::services::media::MemoryMediaStore;
use crate::services::orders::ShippingInfo;
use crate::state::AppState;

/// Password of every seeded account.
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Configuration pointing at `base_url` with rate limiting and SMTP off.
#[must_use]
pub fn test_config(base_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/stitchline_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: base_url.to_string(),
        media: MediaConfig {
            dir: PathBuf::from("media"),
            public_url: format!("{base_url}/media"),
        },
        shipping_fee: Price::from_rupees(150),
        rate_limit: false,
        email: None,
        expose_reset_codes: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Insert an account with [`TEST_PASSWORD`].
pub async fn seed_user(repos: &Repositories, email: &str, role: Role) -> User {
    let local = email.split('@').next().unwrap_or(email);
    repos
        .users
        .create(&NewUser {
            email: Email::parse(email).unwrap(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            full_name: format!("Test {local}"),
            role,
            phone_number: Some("0300-1234567".to_string()),
            alt_phone_number: None,
            address: Some("12 Mall Road".to_string()),
            city: Some("Lahore".to_string()),
        })
        .await
        .unwrap()
}

/// Insert one product category and one design category.
pub async fn seed_categories(repos: &Repositories) -> (ProductCategory, DesignCategory) {
    let category = repos
        .categories
        .create_product_category(&ProductCategoryInput {
            name: "Shirts".to_string(),
            description: None,
        })
        .await
        .unwrap();
    let design = repos
        .categories
        .create_design_category(&DesignCategoryInput {
            name: "Truck Art".to_string(),
            theme: Some("Folk".to_string()),
            release_date: None,
            description: None,
        })
        .await
        .unwrap();
    (category, design)
}

/// Insert a product priced in whole rupees with a single image.
pub async fn seed_product(
    repos: &Repositories,
    name: &str,
    rupees: u32,
    category_id: ProductCategoryId,
    design_category_id: DesignCategoryId,
) -> Product {
    repos
        .products
        .create(&NewProduct {
            name: name.to_string(),
            description: format!("{name} description"),
            price: Price::from_rupees(rupees),
            size: Some("M".to_string()),
            image_urls: vec![format!("http://localhost/media/{}.png", name.to_lowercase())],
            category_id,
            design_category_id,
        })
        .await
        .unwrap()
}

/// Shipping details with every required field filled in.
#[must_use]
pub fn shipping() -> ShippingInfo {
    ShippingInfo {
        phone_number: "0300-1234567".to_string(),
        alt_phone_number: None,
        address: "12 Mall Road".to_string(),
        city: "Lahore".to_string(),
    }
}

/// A fully wired router over in-memory stores.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub media: Arc<MemoryMediaStore>,
}

impl TestApp {
    /// Router with reset codes echoed in responses, as in local development.
    #[must_use]
    pub fn new() -> Self {
        let mut config = test_config("http://localhost:3000");
        config.expose_reset_codes = true;
        Self::with_config(config)
    }

    #[must_use]
    pub fn with_config(config: StorefrontConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let media = Arc::new(MemoryMediaStore::new());
        let session_layer = crate::middleware::create_session_layer(
            tower_sessions::MemoryStore::default(),
            &config,
        );
        let state = AppState::new(
            config,
            Repositories::from_store(store.clone()),
            media.clone(),
            None,
        );
        let router = crate::routes::app(state.clone(), session_layer);

        Self {
            router,
            state,
            store,
            media,
        }
    }

    #[must_use]
    pub fn repos(&self) -> &Repositories {
        self.state.repos()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
