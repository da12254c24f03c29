//! Browse, cart and checkout flows against the fake commerce backend.

#![allow(clippy::unwrap_used)]

use cornerstore_integration_tests::{FakeCommerce, browser, spawn_storefront};
use cornerstore_storefront::services::checkout::{CART_FETCH_ERROR, MISSING_REGION_ERROR};
use reqwest::{Client, StatusCode};
use serde_json::json;

fn checkout_form(state: &str) -> Vec<(&'static str, String)> {
    vec![
        ("email", "ada@example.org".to_string()),
        ("state", state.to_string()),
        ("first_name", "Ada".to_string()),
        ("last_name", "Lovelace".to_string()),
        ("address", "1 Analytical Way".to_string()),
        ("city", "Los Angeles".to_string()),
        ("zip", "90001".to_string()),
        ("country", "US".to_string()),
        ("card_number", "4242424242424242".to_string()),
        ("expiry_month", "01".to_string()),
        ("expiry_year", "2030".to_string()),
        ("cvc", "123".to_string()),
        ("postal_zip_code", "90001".to_string()),
    ]
}

async fn add_to_cart(client: &Client, base: &str, product_id: &str) {
    let response = client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", product_id), ("quantity", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("hx-trigger")
            .and_then(|v| v.to_str().ok()),
        Some("cart-updated")
    );
}

async fn get_text(client: &Client, url: String) -> (StatusCode, String) {
    let response = client.get(url).send().await.unwrap();
    (response.status(), response.text().await.unwrap())
}

#[tokio::test]
async fn test_browse_add_checkout_and_confirm() {
    let (fake, api) = FakeCommerce::start().await;
    let base = spawn_storefront(&api).await;
    let client = browser();

    let (status, listing) = get_text(&client, format!("{base}/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listing.contains("Soap"));
    assert!(listing.contains("Candle"));

    add_to_cart(&client, &base, "prod_p1").await;

    let (_, cart) = get_text(&client, format!("{base}/cart")).await;
    assert!(cart.contains("Soap"));
    assert!(cart.contains("$6.00"));
    assert!(!cart.contains("Candle"));

    let (status, checkout) = get_text(&client, format!("{base}/checkout")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(checkout.contains("Soap"));
    assert_eq!(fake.token_calls(), 1);

    let response = client
        .post(format!("{base}/checkout"))
        .form(&checkout_form("CA"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.url().path().starts_with("/confirmation/ord_"));
    let confirmation = response.text().await.unwrap();
    assert!(confirmation.contains("CS-"));

    let captures = fake.captures();
    assert_eq!(captures.len(), 1);
    let payload = &captures[0];
    assert_eq!(payload["customer"]["county_state"], "CA");
    assert_eq!(payload["customer"]["email"], "ada@example.org");
    assert_eq!(payload["shipping"]["country"], "US");
    assert_eq!(payload["shipping"]["town_city"], "Los Angeles");
    assert_eq!(payload["billing"], payload["shipping"]);
    assert_eq!(payload["payment"]["gateway"], "test_gateway");
    assert_eq!(payload["payment"]["card"]["number"], "4242424242424242");

    let line_items = payload["line_items"].as_object().unwrap();
    assert_eq!(line_items.len(), 1);
    assert_eq!(line_items.values().next().unwrap(), &json!({"quantity": 1}));

    // The captured cart is gone from the session
    let (_, count) = get_text(&client, format!("{base}/cart/count")).await;
    assert!(count.contains(">0<"));
}

#[tokio::test]
async fn test_checkout_without_cart_requests_no_token() {
    let (fake, api) = FakeCommerce::start().await;
    let base = spawn_storefront(&api).await;
    let client = browser();

    let (status, body) = get_text(&client, format!("{base}/checkout")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No items in cart"));
    assert_eq!(fake.token_calls(), 0);
}

#[tokio::test]
async fn test_checkout_with_empty_cart_requests_no_token() {
    let (fake, api) = FakeCommerce::start().await;
    let base = spawn_storefront(&api).await;
    let client = browser();

    // Visiting the cart page creates an empty cart
    let (_, cart) = get_text(&client, format!("{base}/cart")).await;
    assert!(cart.contains("Your cart is empty"));

    let (_, body) = get_text(&client, format!("{base}/checkout")).await;
    assert!(body.contains("No items in cart"));
    assert_eq!(fake.token_calls(), 0);
}

#[tokio::test]
async fn test_emptied_cart_cannot_be_captured_from_old_checkout() {
    let (fake, api) = FakeCommerce::start().await;
    let base = spawn_storefront(&api).await;
    let client = browser();

    add_to_cart(&client, &base, "prod_p1").await;
    let (_, checkout) = get_text(&client, format!("{base}/checkout")).await;
    assert!(checkout.contains("Soap"));

    let response = client.post(format!("{base}/cart/empty")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, body) = get_text(&client, format!("{base}/checkout")).await;
    assert!(body.contains("No items in cart"));

    let response = client
        .post(format!("{base}/checkout"))
        .form(&checkout_form("CA"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.url().path(), "/checkout");
    assert!(!response.text().await.unwrap().contains("Soap"));
    assert!(fake.captures().is_empty());
}

#[tokio::test]
async fn test_cart_change_after_checkout_load_discards_snapshot() {
    let (fake, api) = FakeCommerce::start().await;
    let base = spawn_storefront(&api).await;
    let client = browser();

    add_to_cart(&client, &base, "prod_p1").await;
    get_text(&client, format!("{base}/checkout")).await;

    // Emptied from another tab; the checkout page is never reloaded
    client.post(format!("{base}/cart/empty")).send().await.unwrap();

    let response = client
        .post(format!("{base}/checkout"))
        .form(&checkout_form("CA"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.url().path(), "/checkout");
    assert!(fake.captures().is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_shows_cart_fetch_error() {
    let base = spawn_storefront("http://127.0.0.1:1").await;

    let (status, body) = get_text(&browser(), format!("{base}/cart")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(CART_FETCH_ERROR));
    assert!(!body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_cart_count_replaces_expired_cart_once() {
    let (fake, api) = FakeCommerce::start().await;
    let base = spawn_storefront(&api).await;
    let client = browser();

    add_to_cart(&client, &base, "prod_p1").await;
    fake.expire_carts();

    for _ in 0..3 {
        let (_, count) = get_text(&client, format!("{base}/cart/count")).await;
        assert!(count.contains(">0<"));
    }
    assert_eq!(fake.cart_count(), 1);
}

#[tokio::test]
async fn test_missing_region_blocks_capture_and_keeps_values() {
    let (fake, api) = FakeCommerce::start().await;
    let base = spawn_storefront(&api).await;
    let client = browser();

    add_to_cart(&client, &base, "prod_p1").await;
    get_text(&client, format!("{base}/checkout")).await;

    let response = client
        .post(format!("{base}/checkout"))
        .form(&checkout_form(""))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.url().path(), "/checkout");

    let body = response.text().await.unwrap();
    assert!(body.contains(MISSING_REGION_ERROR));
    assert!(body.contains("value=\"ada@example.org\""));
    assert!(body.contains("value=\"1 Analytical Way\""));
    assert!(fake.captures().is_empty());
}

#[tokio::test]
async fn test_declined_capture_shows_backend_message() {
    let (fake, api) = FakeCommerce::start().await;
    let base = spawn_storefront(&api).await;
    let client = browser();
    fake.decline_captures_with("Card declined");

    add_to_cart(&client, &base, "prod_p1").await;
    get_text(&client, format!("{base}/checkout")).await;

    let response = client
        .post(format!("{base}/checkout"))
        .form(&checkout_form("CA"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.url().path(), "/checkout");

    let body = response.text().await.unwrap();
    assert!(body.contains("Card declined"));
    assert!(body.contains("value=\"CA\" selected"));
    assert_eq!(fake.captures().len(), 1);

    // Cart is untouched, so the shopper can retry
    let (_, cart) = get_text(&client, format!("{base}/cart")).await;
    assert!(cart.contains("Soap"));
}

#[tokio::test]
async fn test_capture_sends_one_entry_per_line_with_current_quantities() {
    let (fake, api) = FakeCommerce::start().await;
    let base = spawn_storefront(&api).await;
    let client = browser();

    add_to_cart(&client, &base, "prod_p1").await;
    add_to_cart(&client, &base, "prod_p2").await;

    // Fresh fake: cart_1 holds item_2 (Soap) then item_3 (Candle)
    let response = client
        .post(format!("{base}/cart/update"))
        .form(&[("line_item_id", "item_2"), ("quantity", "3")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let items = response.text().await.unwrap();
    assert!(items.contains("value=\"3\""));
    assert!(items.contains("Total: $27.00"));

    get_text(&client, format!("{base}/checkout")).await;
    client
        .post(format!("{base}/checkout"))
        .form(&checkout_form("NY"))
        .send()
        .await
        .unwrap();

    let captures = fake.captures();
    assert_eq!(
        captures[0]["line_items"],
        json!({"item_2": {"quantity": 3}, "item_3": {"quantity": 1}})
    );
}

#[tokio::test]
async fn test_unknown_order_shows_no_order_found() {
    let (_fake, api) = FakeCommerce::start().await;
    let base = spawn_storefront(&api).await;
    let client = browser();

    let (status, body) = get_text(&client, format!("{base}/confirmation/ord_missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No order found"));

    let (status, body) = get_text(&client, format!("{base}/confirmation")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No order found"));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let (_fake, api) = FakeCommerce::start().await;
    let base = spawn_storefront(&api).await;

    let (status, _) = get_text(&browser(), format!("{base}/product/prod_nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
