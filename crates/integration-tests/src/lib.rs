//! Integration tests for Cornerstore.
//!
//! Tests run the real storefront and admin routers on ephemeral ports against
//! [`FakeCommerce`], an in-process stand-in for the commerce backend's REST
//! API. No network access or credentials are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cornerstore-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_checkout` - Browse, cart and checkout flows
//! - `admin_create_product` - Product creation proxy

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, put},
};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};

use cornerstore_admin::config::{AdminConfig, CommerceWriteConfig};
use cornerstore_core::{ApiErrorBody, ApiErrorDetail};
use cornerstore_storefront::config::{CheckoutSettings, CommerceConfig, StorefrontConfig};

/// Public key the fake accepts for catalog, cart and checkout calls.
pub const PUBLIC_KEY: &str = "pk_test_4b8Rz2QmX7";
/// Secret key the fake requires for orders and product creation.
pub const SECRET_KEY: &str = "sk_5f7Qz9LmN2xR8tVb4KcW1hJd";

/// Seeded catalog: `(id, name, unit price in cents)`.
pub const CATALOG: &[(&str, &str, u64)] = &[("prod_p1", "Soap", 600), ("prod_p2", "Candle", 900)];

// =============================================================================
// Fake Commerce Backend
// =============================================================================

struct Line {
    id: String,
    product_id: String,
    quantity: u32,
}

#[derive(Default)]
struct Ledger {
    next_id: usize,
    carts: HashMap<String, Vec<Line>>,
    tokens: HashMap<String, String>,
    orders: HashMap<String, Value>,
    captures: Vec<Value>,
    created_products: Vec<Value>,
    token_calls: usize,
    decline_with: Option<String>,
}

impl Ledger {
    fn next(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory fake of the commerce backend REST API.
///
/// Cheap to clone; clones share one ledger so tests can inspect what the
/// servers under test sent.
#[derive(Clone, Default)]
pub struct FakeCommerce {
    ledger: Arc<Mutex<Ledger>>,
}

impl FakeCommerce {
    /// Start the fake on an ephemeral port and return it with its base URL.
    pub async fn start() -> (Self, String) {
        let fake = Self::default();
        let url = spawn(fake.router()).await;
        (fake, url)
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent capture fail with a gateway error.
    pub fn decline_captures_with(&self, message: &str) {
        self.ledger().decline_with = Some(message.to_string());
    }

    /// Forget every cart, as the backend does when carts expire.
    pub fn expire_carts(&self) {
        self.ledger().carts.clear();
    }

    /// Number of live carts.
    #[must_use]
    pub fn cart_count(&self) -> usize {
        self.ledger().carts.len()
    }

    /// Number of checkout tokens requested.
    #[must_use]
    pub fn token_calls(&self) -> usize {
        self.ledger().token_calls
    }

    /// Capture payloads received, in order, including declined ones.
    #[must_use]
    pub fn captures(&self) -> Vec<Value> {
        self.ledger().captures.clone()
    }

    /// Product creation bodies received, in order.
    #[must_use]
    pub fn created_products(&self) -> Vec<Value> {
        self.ledger().created_products.clone()
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/products", get(list_products).post(create_product))
            .route("/products/{product_id}", get(retrieve_product))
            .route("/carts", get(create_cart))
            .route("/carts/{cart_id}", get(retrieve_cart).post(add_to_cart))
            .route("/carts/{cart_id}/items", delete(empty_cart))
            .route(
                "/carts/{cart_id}/items/{line_id}",
                put(update_item).delete(remove_item),
            )
            .route("/checkouts/{id}", get(generate_token).post(capture))
            .route("/orders/{order_id}", get(retrieve_order))
            .with_state(self.clone())
    }
}

#[derive(Deserialize)]
struct AddBody {
    id: String,
    #[serde(default = "one")]
    quantity: u32,
}

const fn one() -> u32 {
    1
}

#[derive(Deserialize)]
struct UpdateBody {
    quantity: u32,
}

fn error_response(status: StatusCode, error_type: &str, message: &str) -> Response {
    let body = ApiErrorBody {
        status_code: Some(status.as_u16()),
        error: Some(ApiErrorDetail {
            error_type: Some(error_type.to_string()),
            message: Some(message.to_string()),
        }),
    };
    (status, Json(body)).into_response()
}

fn require_key(headers: &HeaderMap, expected: &str) -> Result<(), Response> {
    match headers.get("x-authorization").and_then(|v| v.to_str().ok()) {
        Some(key) if key == expected => Ok(()),
        _ => Err(error_response(
            StatusCode::UNAUTHORIZED,
            "authentication_error",
            "A valid API key is required",
        )),
    }
}

fn unit_cents(product_id: &str) -> Option<u64> {
    CATALOG
        .iter()
        .find(|(id, _, _)| *id == product_id)
        .map(|(_, _, cents)| *cents)
}

#[allow(clippy::cast_precision_loss)]
fn price_json(cents: u64) -> Value {
    let formatted = format!("{}.{:02}", cents / 100, cents % 100);
    json!({
        "raw": cents as f64 / 100.0,
        "formatted": formatted,
        "formatted_with_symbol": format!("${formatted}"),
        "formatted_with_code": format!("{formatted} USD"),
    })
}

fn product_json(id: &str, name: &str, cents: u64) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("<p>{name} description</p>"),
        "price": price_json(cents),
        "image": null,
        "categories": [{"name": "Home"}],
    })
}

fn cart_json(id: &str, lines: &[Line]) -> Value {
    let mut subtotal = 0;
    let line_items: Vec<Value> = lines
        .iter()
        .map(|line| {
            let cents = unit_cents(&line.product_id).unwrap_or_default();
            let name = CATALOG
                .iter()
                .find(|(id, _, _)| *id == line.product_id)
                .map_or("", |(_, name, _)| *name);
            subtotal += cents * u64::from(line.quantity);
            json!({
                "id": line.id,
                "product_id": line.product_id,
                "name": name,
                "quantity": line.quantity,
                "price": price_json(cents),
                "line_total": price_json(cents * u64::from(line.quantity)),
                "image": null,
            })
        })
        .collect();

    json!({
        "id": id,
        "total_items": lines.iter().map(|line| line.quantity).sum::<u32>(),
        "total_unique_items": lines.len(),
        "subtotal": price_json(subtotal),
        "line_items": line_items,
    })
}

fn cart_not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "not_found", "Cart not found")
}

fn mutation(ledger: &Ledger, cart_id: &str) -> Response {
    match ledger.carts.get(cart_id) {
        Some(lines) => Json(json!({"success": true, "cart": cart_json(cart_id, lines)})).into_response(),
        None => cart_not_found(),
    }
}

async fn list_products(headers: HeaderMap) -> Response {
    if let Err(denied) = require_key(&headers, PUBLIC_KEY) {
        return denied;
    }
    let data: Vec<Value> = CATALOG
        .iter()
        .map(|(id, name, cents)| product_json(id, name, *cents))
        .collect();
    Json(json!({ "data": data })).into_response()
}

async fn retrieve_product(headers: HeaderMap, Path(product_id): Path<String>) -> Response {
    if let Err(denied) = require_key(&headers, PUBLIC_KEY) {
        return denied;
    }
    CATALOG
        .iter()
        .find(|(id, _, _)| *id == product_id)
        .map_or_else(
            || error_response(StatusCode::NOT_FOUND, "not_found", "Product not found"),
            |(id, name, cents)| Json(product_json(id, name, *cents)).into_response(),
        )
}

async fn create_product(
    State(fake): State<FakeCommerce>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = require_key(&headers, SECRET_KEY) {
        return denied;
    }
    let mut ledger = fake.ledger();
    ledger.created_products.push(body.clone());

    let product = &body["product"];
    let Some(name) = product["name"].as_str() else {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation",
            "The name field is required.",
        );
    };
    let id = format!("prod_new_{}", ledger.next());

    Json(json!({
        "id": id,
        "name": name,
        "description": product["description"],
        "price": {"raw": product["price"]},
    }))
    .into_response()
}

async fn create_cart(State(fake): State<FakeCommerce>, headers: HeaderMap) -> Response {
    if let Err(denied) = require_key(&headers, PUBLIC_KEY) {
        return denied;
    }
    let mut ledger = fake.ledger();
    let id = format!("cart_{}", ledger.next());
    ledger.carts.insert(id.clone(), Vec::new());
    Json(cart_json(&id, &[])).into_response()
}

async fn retrieve_cart(
    State(fake): State<FakeCommerce>,
    headers: HeaderMap,
    Path(cart_id): Path<String>,
) -> Response {
    if let Err(denied) = require_key(&headers, PUBLIC_KEY) {
        return denied;
    }
    let ledger = fake.ledger();
    ledger.carts.get(&cart_id).map_or_else(cart_not_found, |lines| {
        Json(cart_json(&cart_id, lines)).into_response()
    })
}

async fn add_to_cart(
    State(fake): State<FakeCommerce>,
    headers: HeaderMap,
    Path(cart_id): Path<String>,
    Json(body): Json<AddBody>,
) -> Response {
    if let Err(denied) = require_key(&headers, PUBLIC_KEY) {
        return denied;
    }
    if unit_cents(&body.id).is_none() {
        return error_response(StatusCode::NOT_FOUND, "not_found", "Product not found");
    }

    let mut ledger = fake.ledger();
    let line_id = format!("item_{}", ledger.next());
    let Some(lines) = ledger.carts.get_mut(&cart_id) else {
        return cart_not_found();
    };
    match lines.iter_mut().find(|line| line.product_id == body.id) {
        Some(line) => line.quantity += body.quantity,
        None => lines.push(Line {
            id: line_id,
            product_id: body.id,
            quantity: body.quantity,
        }),
    }
    mutation(&ledger, &cart_id)
}

async fn update_item(
    State(fake): State<FakeCommerce>,
    headers: HeaderMap,
    Path((cart_id, line_id)): Path<(String, String)>,
    Json(body): Json<UpdateBody>,
) -> Response {
    if let Err(denied) = require_key(&headers, PUBLIC_KEY) {
        return denied;
    }
    let mut ledger = fake.ledger();
    let Some(lines) = ledger.carts.get_mut(&cart_id) else {
        return cart_not_found();
    };
    if body.quantity == 0 {
        lines.retain(|line| line.id != line_id);
    } else if let Some(line) = lines.iter_mut().find(|line| line.id == line_id) {
        line.quantity = body.quantity;
    } else {
        return error_response(StatusCode::NOT_FOUND, "not_found", "Line item not found");
    }
    mutation(&ledger, &cart_id)
}

async fn remove_item(
    State(fake): State<FakeCommerce>,
    headers: HeaderMap,
    Path((cart_id, line_id)): Path<(String, String)>,
) -> Response {
    if let Err(denied) = require_key(&headers, PUBLIC_KEY) {
        return denied;
    }
    let mut ledger = fake.ledger();
    let Some(lines) = ledger.carts.get_mut(&cart_id) else {
        return cart_not_found();
    };
    lines.retain(|line| line.id != line_id);
    mutation(&ledger, &cart_id)
}

async fn empty_cart(
    State(fake): State<FakeCommerce>,
    headers: HeaderMap,
    Path(cart_id): Path<String>,
) -> Response {
    if let Err(denied) = require_key(&headers, PUBLIC_KEY) {
        return denied;
    }
    let mut ledger = fake.ledger();
    let Some(lines) = ledger.carts.get_mut(&cart_id) else {
        return cart_not_found();
    };
    lines.clear();
    mutation(&ledger, &cart_id)
}

async fn generate_token(
    State(fake): State<FakeCommerce>,
    headers: HeaderMap,
    Path(cart_id): Path<String>,
) -> Response {
    if let Err(denied) = require_key(&headers, PUBLIC_KEY) {
        return denied;
    }
    let mut ledger = fake.ledger();
    ledger.token_calls += 1;
    if !ledger.carts.contains_key(&cart_id) {
        return cart_not_found();
    }
    let token_id = format!("chkt_{}", ledger.next());
    ledger.tokens.insert(token_id.clone(), cart_id.clone());
    Json(json!({"id": token_id, "cart_id": cart_id})).into_response()
}

async fn capture(
    State(fake): State<FakeCommerce>,
    headers: HeaderMap,
    Path(token_id): Path<String>,
    Json(payload): Json<Value>,
) -> Response {
    if let Err(denied) = require_key(&headers, PUBLIC_KEY) {
        return denied;
    }
    let mut ledger = fake.ledger();
    ledger.captures.push(payload.clone());

    if let Some(message) = ledger.decline_with.clone() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "gateway_error", &message);
    }
    let Some(cart_id) = ledger.tokens.remove(&token_id) else {
        return error_response(StatusCode::NOT_FOUND, "not_found", "Checkout token not found");
    };

    let sequence = ledger.next();
    let order_id = format!("ord_{sequence}");
    let order = json!({
        "id": order_id,
        "customer_reference": format!("CS-{sequence:04}"),
        "customer": {
            "email": payload["customer"]["email"],
            "firstname": payload["customer"]["firstname"],
            "lastname": payload["customer"]["lastname"],
        },
    });
    ledger.orders.insert(order_id, order.clone());
    if let Some(lines) = ledger.carts.get_mut(&cart_id) {
        lines.clear();
    }
    Json(order).into_response()
}

async fn retrieve_order(
    State(fake): State<FakeCommerce>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Response {
    if let Err(denied) = require_key(&headers, SECRET_KEY) {
        return denied;
    }
    fake.ledger().orders.get(&order_id).map_or_else(
        || error_response(StatusCode::NOT_FOUND, "not_found", "Order not found"),
        |order| Json(order.clone()).into_response(),
    )
}

// =============================================================================
// Servers Under Test
// =============================================================================

/// Serve a router on an ephemeral local port and return its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind ephemeral port");
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });
    format!("http://{addr}")
}

/// Storefront configuration pointing at a fake backend.
#[must_use]
pub fn storefront_config(api_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        static_dir: "../storefront/static".to_string(),
        commerce: CommerceConfig {
            api_url: api_url.to_string(),
            public_key: PUBLIC_KEY.to_string(),
            secret_key: SecretString::from(SECRET_KEY),
            timeout: Duration::from_secs(5),
        },
        checkout: CheckoutSettings::default(),
        admin_proxy_url: "http://127.0.0.1:3001".to_string(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Admin proxy configuration pointing at a fake backend.
#[must_use]
pub fn admin_config(api_url: &str) -> AdminConfig {
    AdminConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        allowed_origin: None,
        commerce: CommerceWriteConfig {
            api_url: api_url.to_string(),
            secret_key: SecretString::from(SECRET_KEY),
            timeout: Duration::from_secs(5),
        },
        json_logs: false,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Start the storefront against a fake backend and return its base URL.
pub async fn spawn_storefront(api_url: &str) -> String {
    let state = cornerstore_storefront::state::AppState::new(storefront_config(api_url))
        .expect("Failed to build storefront state");
    spawn(cornerstore_storefront::routes::app(state)).await
}

/// Start the admin proxy against a fake backend and return its base URL.
pub async fn spawn_admin(api_url: &str) -> String {
    let state = cornerstore_admin::state::AppState::new(admin_config(api_url))
        .expect("Failed to build admin state");
    spawn(cornerstore_admin::routes::app(state)).await
}

/// Browser-like client that keeps the session cookie.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build HTTP client")
}
