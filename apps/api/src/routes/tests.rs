//! Router tests: requests go through the full axum stack against an
//! in-memory database.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use medmart_core::UserRole;
use medmart_db::{Database, DbConfig, NewUser};

use crate::{router, ApiConfig, AppState};

struct TestApp {
    app: Router,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(ApiConfig::for_tests()).await
    }

    async fn with_config(config: ApiConfig) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(db, config);
        TestApp {
            app: router(state.clone()),
            state,
        }
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    /// Signs up and returns `(access_token, user_id)`.
    async fn signup(&self, email: &str, role: &str) -> (String, String) {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(json!({
                    "email": email,
                    "password": "correct horse",
                    "fullName": "Test Account",
                    "role": role,
                    "companyName": if role == "supplier" { Some("Acme Medical") } else { None },
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        (
            body["accessToken"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Admins can't sign up, so one is created directly.
    async fn admin(&self) -> String {
        let user = self
            .state
            .db
            .users()
            .create(&NewUser {
                email: "ops@medmart.test".to_string(),
                password_hash: "unused".to_string(),
                full_name: "Ops".to_string(),
                role: UserRole::Admin,
                company_name: None,
            })
            .await
            .unwrap();
        self.state.jwt.issue(&user).unwrap().access_token
    }

    async fn list_product(&self, token: &str, sku: &str, price_cents: i64, stock: i64) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/products",
                Some(token),
                Some(json!({
                    "sku": sku,
                    "name": format!("Item {}", sku),
                    "priceCents": price_cents,
                    "stock": stock,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

fn checkout_body(card: &str) -> Value {
    json!({
        "address": {
            "fullName": "Morgan Patel",
            "line1": "400 Elm St",
            "city": "Denver",
            "region": "CO",
            "postalCode": "80202",
            "country": "US"
        },
        "payment": {
            "cardholderName": "Morgan Patel",
            "cardNumber": card,
            "expiry": "12/49",
            "cvc": "123"
        }
    })
}

#[tokio::test]
async fn test_health() {
    let t = TestApp::new().await;
    let (status, body) = t.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_signup_login_refresh() {
    let t = TestApp::new().await;
    t.signup("Nurse@Clinic.org", "buyer").await;

    // Emails are stored lowercased, so the duplicate is caught
    let (status, body) = t
        .send(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "email": "nurse@clinic.org", "password": "another pass", "fullName": "Dup" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = t
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nurse@clinic.org", "password": "wrong password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let (status, body) = t
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": " NURSE@clinic.org", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "buyer");
    let refresh_token = body["refreshToken"].as_str().unwrap().to_string();
    let access_token = body["accessToken"].as_str().unwrap().to_string();

    let (status, body) = t
        .send(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refreshToken": refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["accessToken"].is_string());

    // An access token is not a refresh token
    let (status, _) = t
        .send(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refreshToken": access_token })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_rules() {
    let t = TestApp::new().await;

    let (status, _) = t
        .send(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "email": "boss@x.io", "password": "long enough", "fullName": "Boss", "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t
        .send(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "email": "sales@x.io", "password": "long enough", "fullName": "Sam", "role": "supplier" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, _) = t
        .send(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "email": "short@x.io", "password": "short", "fullName": "Sam" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_authentication_required() {
    let t = TestApp::new().await;

    let (status, body) = t.send(Method::GET, "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let (status, _) = t.get("/api/user", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update() {
    let t = TestApp::new().await;
    let (token, _) = t.signup("buyer@clinic.org", "buyer").await;

    let (status, body) = t
        .send(
            Method::PUT,
            "/api/user",
            Some(&token),
            Some(json!({ "fullName": "  Dana Reyes ", "companyName": "Northside Clinic" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fullName"], "Dana Reyes");

    let (_, body) = t.get("/api/user", &token).await;
    assert_eq!(body["companyName"], "Northside Clinic");
}

#[tokio::test]
async fn test_supplier_product_management() {
    let t = TestApp::new().await;
    let (supplier, _) = t.signup("sales@acme.test", "supplier").await;
    let (other_supplier, _) = t.signup("sales@rival.test", "supplier").await;
    let (buyer, _) = t.signup("buyer@clinic.org", "buyer").await;

    // Buyers can't list products
    let (status, _) = t
        .send(
            Method::POST,
            "/api/products",
            Some(&buyer),
            Some(json!({ "sku": "X-1", "name": "X", "priceCents": 100, "stock": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let gloves = t.list_product(&supplier, "GLV-NIT-M", 1299, 40).await;
    t.list_product(&supplier, "GZ-4X4", 450, 0).await;

    let (status, body) = t.send(Method::GET, "/api/products?search=glv", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], gloves.as_str());

    let (_, body) = t
        .send(Method::GET, "/api/products?inStock=true&sort=price_asc", None, None)
        .await;
    assert_eq!(body["total"], 1);

    let (status, _) = t.send(Method::GET, "/api/products?sort=cheapest", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Only the owner may edit
    let uri = format!("/api/products/{}", gloves);
    let (status, _) = t
        .send(Method::PUT, &uri, Some(&other_supplier), Some(json!({ "priceCents": 1 })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t
        .send(Method::PUT, &uri, Some(&supplier), Some(json!({ "priceCents": 1199 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["priceCents"], 1199);

    let (status, _) = t.send(Method::DELETE, &uri, Some(&supplier), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = t.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = t.send(Method::GET, "/api/suppliers", None, None).await;
    let acme = body
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["companyName"] == "Acme Medical")
        .cloned();
    assert!(acme.is_some());
}

#[tokio::test]
async fn test_cart_endpoints() {
    let t = TestApp::new().await;
    let (supplier, _) = t.signup("sales@acme.test", "supplier").await;
    let (buyer, _) = t.signup("buyer@clinic.org", "buyer").await;
    let p1 = t.list_product(&supplier, "P1", 100, 50).await;
    let p2 = t.list_product(&supplier, "P2", 250, 50).await;

    // Repeated adds accumulate
    for quantity in [2, 3] {
        let (status, _) = t
            .send(
                Method::POST,
                "/api/cart/items",
                Some(&buyer),
                Some(json!({ "productId": p1, "quantity": quantity })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, cart) = t.get("/api/cart", &buyer).await;
    assert_eq!(cart["items"][0]["quantity"], 5);
    assert_eq!(cart["totals"]["subtotalCents"], 500);
    assert_eq!(cart["quote"]["shippingCents"], 999);

    let (status, _) = t
        .send(
            Method::POST,
            "/api/cart/items",
            Some(&buyer),
            Some(json!({ "productId": p1, "quantity": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Merge adds to existing lines and skips unknown products
    let (status, cart) = t
        .send(
            Method::POST,
            "/api/cart/merge",
            Some(&buyer),
            Some(json!({ "items": [
                { "productId": p1, "quantity": 1 },
                { "productId": p2, "quantity": 2 },
                { "productId": "gone", "quantity": 1 }
            ] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["totals"]["totalItems"], 8);
    assert_eq!(cart["totals"]["itemCount"], 2);

    // Quantity zero removes the line
    let (_, cart) = t
        .send(
            Method::PUT,
            &format!("/api/cart/items/{}", p2),
            Some(&buyer),
            Some(json!({ "quantity": 0 })),
        )
        .await;
    assert_eq!(cart["totals"]["itemCount"], 1);

    // Removing an absent line is fine
    let (status, _) = t
        .send(Method::DELETE, &format!("/api/cart/items/{}", p2), Some(&buyer), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, cart) = t.send(Method::DELETE, "/api/cart", Some(&buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);
    assert_eq!(cart["quote"]["totalCents"], 0);
}

#[tokio::test]
async fn test_checkout_flow() {
    let t = TestApp::new().await;
    let (supplier, _) = t.signup("sales@acme.test", "supplier").await;
    let (buyer, _) = t.signup("buyer@clinic.org", "buyer").await;
    let p1 = t.list_product(&supplier, "P1", 2500, 10).await;

    let (status, body) = t
        .send(Method::POST, "/api/checkout", Some(&buyer), Some(checkout_body("4242 4242 4242 4242")))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "EMPTY_CART");

    t.send(
        Method::POST,
        "/api/cart/items",
        Some(&buyer),
        Some(json!({ "productId": p1, "quantity": 2 })),
    )
    .await;

    let (status, body) = t
        .send(Method::POST, "/api/checkout", Some(&buyer), Some(checkout_body("4242 4242 4242 4241")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (status, placed) = t
        .send(Method::POST, "/api/checkout", Some(&buyer), Some(checkout_body("4242 4242 4242 4242")))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", placed);
    assert_eq!(placed["order"]["subtotalCents"], 5000);
    assert_eq!(placed["order"]["shippingCents"], 999);
    assert_eq!(placed["order"]["totalCents"], 5999);
    assert_eq!(placed["order"]["paymentLast4"], "4242");

    let (_, cart) = t.get("/api/cart", &buyer).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);

    let (_, product) = t.send(Method::GET, &format!("/api/products/{}", p1), None, None).await;
    assert_eq!(product["stock"], 8);

    let (_, orders) = t.get("/api/orders", &buyer).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
    let (_, orders) = t.get("/api/orders", &supplier).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let order_id = placed["order"]["id"].as_str().unwrap();
    let (_, dashboard) = t.get("/api/dashboard/supplier", &supplier).await;
    assert_eq!(dashboard["unitsSold"], 2);
    let (status, _) = t.get("/api/dashboard/supplier", &buyer).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Buyers may cancel while pending, not ship
    let status_uri = format!("/api/orders/{}/status", order_id);
    let (status, _) = t
        .send(Method::PUT, &status_uri, Some(&buyer), Some(json!({ "status": "shipped" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = t
        .send(Method::PUT, &status_uri, Some(&supplier), Some(json!({ "status": "shipped" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "shipped");
}

#[tokio::test]
async fn test_checkout_rejects_oversold_cart() {
    let t = TestApp::new().await;
    let (supplier, _) = t.signup("sales@acme.test", "supplier").await;
    let (buyer, _) = t.signup("buyer@clinic.org", "buyer").await;
    let p1 = t.list_product(&supplier, "P1", 100, 1).await;

    t.send(
        Method::POST,
        "/api/cart/items",
        Some(&buyer),
        Some(json!({ "productId": p1, "quantity": 2 })),
    )
    .await;

    let (status, body) = t
        .send(Method::POST, "/api/checkout", Some(&buyer), Some(checkout_body("4242424242424242")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    // The cart survives a rejected order
    let (_, cart) = t.get("/api/cart", &buyer).await;
    assert_eq!(cart["totals"]["totalItems"], 2);
}

#[tokio::test]
async fn test_admin_endpoints() {
    let t = TestApp::new().await;
    let admin = t.admin().await;
    let (buyer, buyer_id) = t.signup("buyer@clinic.org", "buyer").await;
    t.signup("sales@acme.test", "supplier").await;

    let (status, _) = t.get("/api/admin/stats", &buyer).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, stats) = t.get("/api/admin/stats", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalUsers"], 3);
    assert_eq!(stats["buyers"], 1);
    assert_eq!(stats["suppliers"], 1);

    let (_, feed) = t.get("/api/admin/recent-activity?limit=1", &admin).await;
    assert_eq!(feed.as_array().unwrap().len(), 1);
    assert_eq!(feed[0]["kind"], "user_signed_up");

    let (_, users) = t.get("/api/admin/users?role=supplier", &admin).await;
    assert_eq!(users.as_array().unwrap().len(), 1);

    let (status, user) = t
        .send(
            Method::PUT,
            &format!("/api/admin/users/{}/role", buyer_id),
            Some(&admin),
            Some(json!({ "role": "supplier" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "supplier");
}

#[tokio::test]
async fn test_notifications() {
    let t = TestApp::new().await;
    let (buyer, _) = t.signup("buyer@clinic.org", "buyer").await;
    let (other, _) = t.signup("other@clinic.org", "buyer").await;

    let (_, inbox) = t.get("/api/notifications?unreadOnly=true", &buyer).await;
    let inbox = inbox.as_array().unwrap().clone();
    assert_eq!(inbox.len(), 1);
    let id = inbox[0]["id"].as_str().unwrap();

    // Another user's notification reads as missing
    let uri = format!("/api/notifications/{}/read", id);
    let (status, _) = t.send(Method::POST, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t.send(Method::POST, &uri, Some(&buyer), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, inbox) = t.get("/api/notifications?unreadOnly=true", &buyer).await;
    assert!(inbox.as_array().unwrap().is_empty());

    let (_, body) = t.send(Method::POST, "/api/notifications/read-all", Some(&other), None).await;
    assert_eq!(body["updated"], 1);
}

#[tokio::test]
async fn test_avatar_upload() {
    let t = TestApp::new().await;
    let (token, user_id) = t.signup("buyer@clinic.org", "buyer").await;

    let upload = |content_type: &'static str, bytes: Vec<u8>| {
        Request::builder()
            .method(Method::PUT)
            .uri("/api/avatar")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(bytes))
            .unwrap()
    };

    let response = t.app.clone().oneshot(upload("text/plain", vec![1, 2, 3])).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    // Test config allows 1 KiB
    let response = t.app.clone().oneshot(upload("image/png", vec![0; 2048])).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let png = vec![0x89, b'P', b'N', b'G'];
    let response = t.app.clone().oneshot(upload("image/png", png.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = Request::builder()
        .uri(format!("/api/avatar/{}", user_id))
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.to_vec(), png);

    let (_, me) = t.get("/api/user", &token).await;
    assert_eq!(me["hasAvatar"], true);
}

#[tokio::test]
async fn test_avatar_limit_above_default_body_limit() {
    let mut config = ApiConfig::for_tests();
    config.max_avatar_bytes = 3 * 1024 * 1024;
    let t = TestApp::with_config(config).await;
    let (token, _) = t.signup("buyer@clinic.org", "buyer").await;

    let upload = |size: usize| {
        Request::builder()
            .method(Method::PUT)
            .uri("/api/avatar")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "image/jpeg")
            .body(Body::from(vec![0u8; size]))
            .unwrap()
    };

    let response = t.app.clone().oneshot(upload(5 * 512 * 1024)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = t.app.clone().oneshot(upload(3 * 1024 * 1024 + 1)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_cart_quantity_overflow_is_rejected() {
    let t = TestApp::new().await;
    let (supplier, _) = t.signup("sales@acme.test", "supplier").await;
    let (buyer, _) = t.signup("buyer@clinic.org", "buyer").await;
    let p1 = t.list_product(&supplier, "P1", 1000, 50).await;

    let (status, cart) = t
        .send(
            Method::POST,
            "/api/cart/items",
            Some(&buyer),
            Some(json!({ "productId": p1, "quantity": i64::MAX / 100 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["totals"]["subtotalCents"], i64::MAX);

    let (status, _) = t
        .send(
            Method::POST,
            "/api/cart/items",
            Some(&buyer),
            Some(json!({ "productId": p1, "quantity": i64::MAX })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, cart) = t.get("/api/cart", &buyer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"][0]["quantity"], i64::MAX / 100);
    assert_eq!(cart["quote"]["totalCents"], i64::MAX);
}
