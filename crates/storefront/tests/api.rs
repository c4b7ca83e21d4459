//! Router-level tests for the JSON API over in-memory stores.
//!
//! Each test builds a fresh [`TestApp`], signs in through `/api/auth/login`
//! and carries the session cookie between requests like a browser would.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use stitchline_core::{Email, Price, Role};
use stitchline_storefront::models::Product;
use stitchline_storefront::test_support::{
    TEST_PASSWORD, TestApp, seed_categories, seed_product, seed_user, test_config,
};

const BOUNDARY: &str = "stitchline-test-boundary";

/// A cookie-carrying client for one browser session.
struct Client {
    router: Router,
    cookie: Option<String>,
}

impl Client {
    fn anonymous(app: &TestApp) -> Self {
        Self {
            router: app.router.clone(),
            cookie: None,
        }
    }

    async fn signed_in(app: &TestApp, email: &str) -> Self {
        let mut client = Self::anonymous(app);
        let (status, _) = client
            .json(
                Method::POST,
                "/api/auth/login",
                Some(json!({ "email": email, "password": TEST_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(client.cookie.is_some());
        client
    }

    async fn send(&mut self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    fn request(&self, method: Method, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn json(&mut self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(body) => self
                .request(method, uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => self.request(method, uri).body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn multipart(
        &mut self,
        uri: &str,
        fields: &[(&str, &str)],
        files: &[&str],
    ) -> (StatusCode, Value) {
        let request = self
            .request(Method::POST, uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(fields, files)))
            .unwrap();
        self.send(request).await
    }
}

fn multipart_body(fields: &[(&str, &str)], files: &[&str]) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    for file in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{file}\"\r\nContent-Type: image/png\r\n\r\npng-bytes-{file}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

fn price(value: &Value) -> Price {
    serde_json::from_value(value.clone()).unwrap()
}

fn shipping_json() -> Value {
    json!({
        "phone_number": "0300-1234567",
        "address": "12 Mall Road",
        "city": "Lahore",
    })
}

async fn catalog(app: &TestApp) -> (Product, Product) {
    let (category, design) = seed_categories(app.repos()).await;
    let kurta = seed_product(app.repos(), "Kurta", 500, category.id, design.id).await;
    let tote = seed_product(app.repos(), "Tote", 300, category.id, design.id).await;
    (kurta, tote)
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let client = Client::anonymous(&app);
    let request = client.request(Method::GET, "/health").body(Body::empty()).unwrap();
    let response = client.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_endpoints_require_session() {
    let app = TestApp::new();
    let mut client = Client::anonymous(&app);

    let (status, body) = client.json(Method::GET, "/api/cart", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = client.json(Method::GET, "/api/auth/session", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_reports_role() {
    let app = TestApp::new();
    let admin = seed_user(app.repos(), "admin@example.com", Role::Admin).await;
    let mut client = Client::signed_in(&app, "admin@example.com").await;

    let (status, body) = client.json(Method::GET, "/api/auth/session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(admin.id));
    assert_eq!(body["data"]["role"], "admin");

    let (status, _) = client.json(Method::POST, "/api/auth/logout", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = client.json(Method::GET, "/api/auth/session", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_signs_in_as_user() {
    let app = TestApp::new();
    let mut client = Client::anonymous(&app);

    let (status, body) = client
        .json(
            Method::POST,
            "/api/auth/signup",
            Some(json!({
                "email": "new@example.com",
                "password": "longenough",
                "full_name": "New Customer",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "user");
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = client.json(Method::GET, "/api/auth/session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "user");

    let (status, _) = Client::anonymous(&app)
        .json(
            Method::POST,
            "/api/auth/signup",
            Some(json!({
                "email": "new@example.com",
                "password": "longenough",
                "full_name": "Someone Else",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_does_not_reveal_accounts() {
    let app = TestApp::new();
    seed_user(app.repos(), "known@example.com", Role::User).await;

    let (wrong_status, wrong_body) = Client::anonymous(&app)
        .json(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "known@example.com", "password": "not the password" })),
        )
        .await;
    let (unknown_status, unknown_body) = Client::anonymous(&app)
        .json(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "nobody@example.com", "password": TEST_PASSWORD })),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let mut client = Client::anonymous(&app);
    let request = client
        .request(Method::POST, "/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = client.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_users_cannot_touch_each_others_cart() {
    let app = TestApp::new();
    let (kurta, _) = catalog(&app).await;
    seed_user(app.repos(), "alice@example.com", Role::User).await;
    seed_user(app.repos(), "bob@example.com", Role::User).await;

    let mut alice = Client::signed_in(&app, "alice@example.com").await;
    let mut bob = Client::signed_in(&app, "bob@example.com").await;

    let (status, body) = alice
        .json(
            Method::POST,
            "/api/cart",
            Some(json!({ "product_id": kurta.id, "quantity": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = body["data"]["id"].clone();
    let uri = format!("/api/cart/{item_id}");

    let (status, _) = bob
        .json(Method::PUT, &uri, Some(json!({ "quantity": 5 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = bob.json(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = bob.json(Method::GET, "/api/cart", None).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);

    let (_, body) = alice.json(Method::GET, "/api/cart", None).await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 1);
}

#[tokio::test]
async fn test_user_cannot_add_to_someone_elses_cart() {
    let app = TestApp::new();
    let (kurta, _) = catalog(&app).await;
    let alice = seed_user(app.repos(), "alice@example.com", Role::User).await;
    seed_user(app.repos(), "bob@example.com", Role::User).await;

    let mut bob = Client::signed_in(&app, "bob@example.com").await;
    let (status, _) = bob
        .json(
            Method::POST,
            "/api/cart",
            Some(json!({ "user_id": alice.id, "product_id": kurta.id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.repos().cart.list(Some(alice.id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_bypasses_ownership() {
    let app = TestApp::new();
    let (kurta, _) = catalog(&app).await;
    seed_user(app.repos(), "alice@example.com", Role::User).await;
    seed_user(app.repos(), "admin@example.com", Role::Admin).await;

    let mut alice = Client::signed_in(&app, "alice@example.com").await;
    let (_, body) = alice
        .json(
            Method::POST,
            "/api/cart",
            Some(json!({ "product_id": kurta.id, "quantity": 2 })),
        )
        .await;
    let uri = format!("/api/cart/{}", body["data"]["id"]);

    let mut admin = Client::signed_in(&app, "admin@example.com").await;
    let (status, body) = admin.json(Method::GET, "/api/cart", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(price(&body["data"]["subtotal"]), Price::from_rupees(1000));

    let (status, body) = admin
        .json(Method::PUT, &uri, Some(json!({ "quantity": 3 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantity"], 3);

    let (status, body) = admin.json(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], true);

    let (_, body) = alice.json(Method::GET, "/api/cart", None).await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_admin_cannot_create_catalog_entries() {
    let app = TestApp::new();
    let (kurta, _) = catalog(&app).await;
    seed_user(app.repos(), "alice@example.com", Role::User).await;
    let mut alice = Client::signed_in(&app, "alice@example.com").await;
    let category_id = kurta.category_id.to_string();
    let design_category_id = kurta.design_category_id.to_string();

    let (status, _) = alice
        .multipart(
            "/api/products",
            &[
                ("name", "Shawl"),
                ("description", "Wool"),
                ("price", "900"),
                ("category_id", category_id.as_str()),
                ("design_category_id", design_category_id.as_str()),
            ],
            &["shawl.png"],
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.media.names().is_empty());

    let (status, _) = alice
        .json(
            Method::POST,
            "/api/product-categories",
            Some(json!({ "name": "Hats" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = alice
        .json(Method::DELETE, &format!("/api/products/{}", kurta.id), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(app.repos().products.list().await.unwrap().len(), 2);
    assert_eq!(app.repos().categories.list_product_categories().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_product_images_keep_upload_order() {
    let app = TestApp::new();
    let (kurta, _) = catalog(&app).await;
    seed_user(app.repos(), "admin@example.com", Role::Admin).await;
    let mut admin = Client::signed_in(&app, "admin@example.com").await;
    let category_id = kurta.category_id.to_string();
    let design_category_id = kurta.design_category_id.to_string();

    let (status, body) = admin
        .multipart(
            "/api/products",
            &[
                ("name", "Shawl"),
                ("description", "Wool"),
                ("price", "900"),
                ("size", "L"),
                ("category_id", category_id.as_str()),
                ("design_category_id", design_category_id.as_str()),
            ],
            &["c.png", "a.png", "b.png"],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let urls: Vec<&str> = body["data"]["image_urls"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u.as_str().unwrap())
        .collect();
    assert_eq!(urls.len(), 3);
    assert!(urls[0].ends_with("-c.png"));
    assert!(urls[1].ends_with("-a.png"));
    assert!(urls[2].ends_with("-b.png"));
    assert!(urls.iter().all(|u| u.starts_with("http://localhost:3000/media/")));
    assert_eq!(app.media.names().len(), 3);

    let id = body["data"]["id"].clone();
    let (status, body) = Client::anonymous(&app)
        .json(Method::GET, &format!("/api/products/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["image_urls"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_product_with_unknown_category_is_rejected() {
    let app = TestApp::new();
    let (kurta, _) = catalog(&app).await;
    seed_user(app.repos(), "admin@example.com", Role::Admin).await;
    let mut admin = Client::signed_in(&app, "admin@example.com").await;
    let design_category_id = kurta.design_category_id.to_string();

    let (status, _) = admin
        .multipart(
            "/api/products",
            &[
                ("name", "Shawl"),
                ("description", "Wool"),
                ("price", "900"),
                ("category_id", "9999"),
                ("design_category_id", design_category_id.as_str()),
            ],
            &["shawl.png"],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.repos().products.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_admin_dashboard_accepts_large_images() {
    let app = TestApp::new();
    let (kurta, _) = catalog(&app).await;
    seed_user(app.repos(), "admin@example.com", Role::Admin).await;
    let admin = Client::signed_in(&app, "admin@example.com").await;

    let mut body = multipart_body(
        &[
            ("name", "Shawl"),
            ("description", "Wool"),
            ("price", "900"),
            ("category_id", kurta.category_id.to_string().as_str()),
            ("design_category_id", kurta.design_category_id.to_string().as_str()),
        ],
        &[],
    )
    .into_bytes();
    // Reopen the closing boundary to append a 3 MiB photo
    body.truncate(body.len() - format!("--{BOUNDARY}--\r\n").len());
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"shawl.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend(std::iter::repeat_n(0xAB_u8, 3 * 1024 * 1024));
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let request = admin
        .request(Method::POST, "/admin/products")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = admin.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(!location.contains("error"), "{location}");

    assert_eq!(app.repos().products.list().await.unwrap().len(), 3);
    assert_eq!(app.media.names().len(), 1);
}

#[tokio::test]
async fn test_category_in_use_cannot_be_deleted() {
    let app = TestApp::new();
    let (kurta, _) = catalog(&app).await;
    seed_user(app.repos(), "admin@example.com", Role::Admin).await;
    let mut admin = Client::signed_in(&app, "admin@example.com").await;

    let (status, _) = admin
        .json(
            Method::DELETE,
            &format!("/api/product-categories/{}", kurta.category_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_checkout_places_one_order_per_line() {
    let app = TestApp::new();
    let (kurta, tote) = catalog(&app).await;
    let alice = seed_user(app.repos(), "alice@example.com", Role::User).await;
    let mut client = Client::signed_in(&app, "alice@example.com").await;

    for (product, quantity) in [(&kurta, 2), (&tote, 1)] {
        let (status, _) = client
            .json(
                Method::POST,
                "/api/cart",
                Some(json!({ "product_id": product.id, "quantity": quantity })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = client.json(Method::GET, "/api/cart", None).await;
    assert_eq!(price(&body["data"]["subtotal"]), Price::from_rupees(1300));
    assert_eq!(price(&body["data"]["total"]), Price::from_rupees(1450));

    let (status, body) = client
        .json(Method::POST, "/api/checkout", Some(shipping_json()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(price(&body["data"]["subtotal"]), Price::from_rupees(1300));
    assert_eq!(price(&body["data"]["total"]), Price::from_rupees(1450));

    let orders = body["data"]["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    for order in orders {
        assert_eq!(price(&order["total_amount"]), Price::from_rupees(1450));
        assert_eq!(order["status"], "pending");
        assert_eq!(order["city"], "Lahore");
    }

    assert!(app.repos().cart.list(Some(alice.id)).await.unwrap().is_empty());
    assert_eq!(app.repos().orders.list(Some(alice.id)).await.unwrap().len(), 2);

    let (_, body) = client.json(Method::GET, "/api/orders", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_checkout_rejects_empty_cart_and_missing_shipping() {
    let app = TestApp::new();
    let (kurta, _) = catalog(&app).await;
    seed_user(app.repos(), "alice@example.com", Role::User).await;
    let mut client = Client::signed_in(&app, "alice@example.com").await;

    let (status, _) = client
        .json(Method::POST, "/api/checkout", Some(shipping_json()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    client
        .json(
            Method::POST,
            "/api/cart",
            Some(json!({ "product_id": kurta.id })),
        )
        .await;
    let (status, _) = client
        .json(
            Method::POST,
            "/api/checkout",
            Some(json!({ "phone_number": "", "address": "12 Mall Road", "city": "Lahore" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.repos().orders.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_failure_keeps_placed_orders_and_cart() {
    let app = TestApp::new();
    let (kurta, tote) = catalog(&app).await;
    let alice = seed_user(app.repos(), "alice@example.com", Role::User).await;
    let mut client = Client::signed_in(&app, "alice@example.com").await;

    for product in [&kurta, &tote] {
        client
            .json(
                Method::POST,
                "/api/cart",
                Some(json!({ "product_id": product.id })),
            )
            .await;
    }

    app.store.fail_order_inserts_after(1);
    let (status, body) = client
        .json(Method::POST, "/api/checkout", Some(shipping_json()))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");

    assert_eq!(app.repos().orders.list(Some(alice.id)).await.unwrap().len(), 1);
    assert_eq!(app.repos().cart.list(Some(alice.id)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_order_status_is_admin_only() {
    let app = TestApp::new();
    let (kurta, _) = catalog(&app).await;
    seed_user(app.repos(), "alice@example.com", Role::User).await;
    seed_user(app.repos(), "admin@example.com", Role::Admin).await;

    let mut alice = Client::signed_in(&app, "alice@example.com").await;
    alice
        .json(
            Method::POST,
            "/api/cart",
            Some(json!({ "product_id": kurta.id })),
        )
        .await;
    let (_, body) = alice
        .json(Method::POST, "/api/checkout", Some(shipping_json()))
        .await;
    let uri = format!("/api/orders/{}", body["data"]["orders"][0]["id"]);

    let (status, _) = alice
        .json(Method::PATCH, &uri, Some(json!({ "status": "shipped" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut admin = Client::signed_in(&app, "admin@example.com").await;
    let (status, body) = admin
        .json(Method::PATCH, &uri, Some(json!({ "status": "Shipped" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "shipped");

    let (_, body) = admin.json(Method::GET, "/api/notifications", None).await;
    assert!(!body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reviews_are_deleted_by_their_author_only() {
    let app = TestApp::new();
    let (kurta, _) = catalog(&app).await;
    seed_user(app.repos(), "alice@example.com", Role::User).await;
    seed_user(app.repos(), "bob@example.com", Role::User).await;

    let mut alice = Client::signed_in(&app, "alice@example.com").await;
    let (status, body) = alice
        .json(
            Method::POST,
            &format!("/api/products/{}/reviews", kurta.id),
            Some(json!({ "rating": 5, "comment": "Lovely stitching" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/reviews/{}", body["data"]["id"]);

    let mut bob = Client::signed_in(&app, "bob@example.com").await;
    let (status, _) = bob.json(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = alice.json(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = alice
        .json(
            Method::POST,
            &format!("/api/products/{}/reviews", kurta.id),
            Some(json!({ "rating": 9, "comment": "Too many stars" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = TestApp::new();
    seed_user(app.repos(), "alice@example.com", Role::User).await;
    let email = Email::parse("alice@example.com").unwrap();
    let original_hash = app.store.password_hash(&email).unwrap();
    let mut client = Client::anonymous(&app);

    let (status, body) = client
        .json(
            Method::POST,
            "/api/auth/password-reset",
            Some(json!({ "email": "alice@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let code = body["data"]["code"].as_str().unwrap().to_string();
    assert_eq!(app.store.reset_code(&email).as_deref(), Some(code.as_str()));

    let wrong = if code == "aaaaaa" { "bbbbbb" } else { "aaaaaa" };
    let (status, _) = client
        .json(
            Method::POST,
            "/api/auth/password-reset/confirm",
            Some(json!({
                "email": "alice@example.com",
                "code": wrong,
                "new_password": "brand new secret",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.password_hash(&email).unwrap(), original_hash);
    assert!(app.store.reset_code(&email).is_some());

    let (status, _) = client
        .json(
            Method::POST,
            "/api/auth/password-reset/confirm",
            Some(json!({
                "email": "alice@example.com",
                "code": code,
                "new_password": "brand new secret",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(app.store.password_hash(&email).unwrap(), original_hash);
    assert!(app.store.reset_code(&email).is_none());

    let (status, _) = Client::anonymous(&app)
        .json(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "alice@example.com", "password": "brand new secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_password_reset_for_unknown_email_looks_the_same() {
    let app = TestApp::new();
    seed_user(app.repos(), "alice@example.com", Role::User).await;

    let mut bodies = Vec::new();
    for email in ["alice@example.com", "nobody@example.com"] {
        let (status, body) = Client::anonymous(&app)
            .json(
                Method::POST,
                "/api/auth/password-reset",
                Some(json!({ "email": email })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        bodies.push(body["data"].clone());
    }

    let (known, unknown) = (&bodies[0], &bodies[1]);
    assert_eq!(known["message"], unknown["message"]);
    let mut known_keys: Vec<_> = known.as_object().unwrap().keys().collect();
    let mut unknown_keys: Vec<_> = unknown.as_object().unwrap().keys().collect();
    known_keys.sort();
    unknown_keys.sort();
    assert_eq!(known_keys, unknown_keys);
    assert_eq!(unknown["code"].as_str().unwrap().len(), 6);

    let (status, _) = Client::anonymous(&app)
        .json(
            Method::POST,
            "/api/auth/password-reset/confirm",
            Some(json!({
                "email": "nobody@example.com",
                "code": unknown["code"],
                "new_password": "brand new secret",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_password_reset_code_not_echoed_by_default() {
    let app = TestApp::with_config(test_config("http://localhost:3000"));
    seed_user(app.repos(), "alice@example.com", Role::User).await;
    let email = Email::parse("alice@example.com").unwrap();

    for address in ["alice@example.com", "nobody@example.com"] {
        let (status, body) = Client::anonymous(&app)
            .json(
                Method::POST,
                "/api/auth/password-reset",
                Some(json!({ "email": address })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["message"].is_string());
        assert!(body["data"].get("code").is_none());
    }
    assert!(app.store.reset_code(&email).is_some());
}
