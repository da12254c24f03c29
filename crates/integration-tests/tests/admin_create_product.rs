//! Product creation proxy against the fake commerce backend.

#![allow(clippy::unwrap_used)]

use cornerstore_integration_tests::{FakeCommerce, spawn_admin};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn post_products(base: &str, body: &str) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}/api/products"))
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_create_product_returns_backend_product() {
    let (fake, api) = FakeCommerce::start().await;
    let base = spawn_admin(&api).await;

    let (status, body) = post_products(
        &base,
        r#"{"name": "Beeswax Candle", "price": "14.50", "description": "Hand poured"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Beeswax Candle");
    assert!(body["id"].as_str().unwrap().starts_with("prod_new_"));

    assert_eq!(
        fake.created_products(),
        vec![json!({"product": {
            "name": "Beeswax Candle",
            "price": 14.5,
            "description": "Hand poured",
        }})]
    );
}

#[tokio::test]
async fn test_unparseable_price_is_forwarded_as_null() {
    let (fake, api) = FakeCommerce::start().await;
    let base = spawn_admin(&api).await;

    let (status, _) = post_products(&base, r#"{"name": "Mystery", "price": "free"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        fake.created_products(),
        vec![json!({"product": {"name": "Mystery", "price": null}})]
    );
}

#[tokio::test]
async fn test_backend_rejection_becomes_error_envelope() {
    let (_fake, api) = FakeCommerce::start().await;
    let base = spawn_admin(&api).await;

    let (status, body) = post_products(&base, r#"{"price": 3}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "The name field is required."}));
}

#[tokio::test]
async fn test_malformed_body_never_reaches_backend() {
    let (fake, api) = FakeCommerce::start().await;
    let base = spawn_admin(&api).await;

    let (status, body) = post_products(&base, "name=Soap").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    assert!(fake.created_products().is_empty());
}
