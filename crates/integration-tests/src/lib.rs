//! End-to-end tests for the Stitchline storefront.
//!
//! The tests talk to a running server over HTTP, so they are `#[ignore]`d
//! by default.
//!
//! # Running Tests
//!
//! ```bash
//! sl-cli migrate
//! sl-cli seed
//! sl-cli admin create -e admin@example.com -n Admin -p "long password"
//! cargo run -p stitchline-storefront &
//!
//! STOREFRONT_URL=http://localhost:3000 \
//! TEST_ADMIN_EMAIL=admin@example.com TEST_ADMIN_PASSWORD="long password" \
//!     cargo test -p stitchline-integration-tests -- --ignored
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::{Client, Response};
use serde_json::{Value, json};

/// Password given to every account created by [`TestContext::signup`].
pub const PASSWORD: &str = "integration-secret";

/// Base URL of the storefront under test.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// One browser-like session against the storefront.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// A fresh client with its own cookie jar.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .cookie_store(true)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: storefront_url(),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sign up a unique customer account and keep its session.
    ///
    /// Returns the account's email.
    pub async fn signup(&self) -> String {
        let email = format!("it-{}@example.com", uuid::Uuid::new_v4().simple());
        let resp = self
            .client
            .post(self.url("/api/auth/signup"))
            .json(&json!({
                "email": email,
                "password": PASSWORD,
                "full_name": "Integration Tester",
                "phone_number": "0300-1234567",
                "address": "12 Mall Road",
                "city": "Lahore",
            }))
            .send()
            .await
            .expect("Failed to sign up");
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
        email
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to log in")
    }

    /// Sign in with `TEST_ADMIN_EMAIL` / `TEST_ADMIN_PASSWORD`.
    pub async fn login_admin(&self) {
        let email = std::env::var("TEST_ADMIN_EMAIL").expect("TEST_ADMIN_EMAIL not set");
        let password = std::env::var("TEST_ADMIN_PASSWORD").expect("TEST_ADMIN_PASSWORD not set");
        let resp = self.login(&email, &password).await;
        assert!(resp.status().is_success(), "admin login failed");
    }

    pub async fn get_json(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed");
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    pub async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
    ) -> (reqwest::StatusCode, Value) {
        let resp = self
            .client
            .request(method, self.url(path))
            .json(body)
            .send()
            .await
            .expect("Request failed");
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    /// The first product in the catalog; run `sl-cli seed` first.
    pub async fn any_product(&self) -> Value {
        let (_, body) = self.get_json("/api/products").await;
        body["data"]
            .as_array()
            .and_then(|products| products.first().cloned())
            .expect("Catalog is empty; run `sl-cli seed`")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
