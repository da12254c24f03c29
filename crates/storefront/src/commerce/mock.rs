//! In-memory `CommerceApi` for unit tests.
//!
//! Holds a single cart and counts the calls tests assert on.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;

use cornerstore_core::{
    CartId, CheckoutTokenId, LineItemId, OrderId, Price, Product, ProductId,
};

use super::{CapturePayload, Cart, CheckoutToken, CommerceApi, CommerceError, LineItem, Order};

/// Price with every display form set from a whole-dollar amount.
pub fn price(amount: i64) -> Price {
    Price {
        raw: Decimal::from(amount),
        formatted: format!("{amount}.00"),
        formatted_with_symbol: format!("${amount}.00"),
        formatted_with_code: format!("{amount}.00 USD"),
    }
}

/// Line item priced at $5 per unit.
pub fn line_item(id: &str, product_id: &str, quantity: u32) -> LineItem {
    LineItem {
        id: LineItemId::new(id),
        product_id: ProductId::new(product_id),
        name: format!("Product {product_id}"),
        quantity,
        price: price(5),
        line_total: Some(price(5 * i64::from(quantity))),
        image: None,
    }
}

/// Cart `cart_1` holding the given lines.
pub fn cart_with(line_items: Vec<LineItem>) -> Cart {
    let total_items = line_items.iter().map(|item| item.quantity).sum::<u32>();
    Cart {
        id: CartId::new("cart_1"),
        total_items,
        total_unique_items: u32::try_from(line_items.len()).unwrap(),
        subtotal: price(5 * i64::from(total_items)),
        line_items,
    }
}

/// Product with the given ID and name.
pub fn product(id: &str, name: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: format!("<p>{name} description</p>"),
        price: price(10),
        image: None,
        categories: Vec::new(),
        permalink: None,
    }
}

fn backend_down() -> CommerceError {
    CommerceError::Api {
        status: 503,
        message: None,
    }
}

pub struct MockCommerce {
    products: Vec<Product>,
    cart: Mutex<Cart>,
    fail_cart: bool,
    fail_token: bool,
    decline: Option<Option<String>>,
    token_calls: AtomicUsize,
    capture_calls: AtomicUsize,
    update_calls: AtomicUsize,
    last_payload: Mutex<Option<CapturePayload>>,
}

impl MockCommerce {
    pub fn new() -> Self {
        Self {
            products: vec![product("prod_p1", "Soap"), product("prod_p2", "Candle")],
            cart: Mutex::new(cart_with(Vec::new())),
            fail_cart: false,
            fail_token: false,
            decline: None,
            token_calls: AtomicUsize::new(0),
            capture_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            last_payload: Mutex::new(None),
        }
    }

    pub fn with_cart(self, cart: Cart) -> Self {
        *self.cart.lock().unwrap() = cart;
        self
    }

    pub fn failing_cart(mut self) -> Self {
        self.fail_cart = true;
        self
    }

    pub fn failing_token(mut self) -> Self {
        self.fail_token = true;
        self
    }

    /// Reject every capture, optionally with a backend message.
    pub fn declining_capture(mut self, message: Option<&str>) -> Self {
        self.decline = Some(message.map(str::to_string));
        self
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn capture_calls(&self) -> usize {
        self.capture_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<CapturePayload> {
        self.last_payload.lock().unwrap().clone()
    }

    pub fn cart(&self) -> Cart {
        self.cart.lock().unwrap().clone()
    }

    fn recount(cart: &mut Cart) {
        cart.total_items = cart.line_items.iter().map(|item| item.quantity).sum();
        cart.total_unique_items = u32::try_from(cart.line_items.len()).unwrap();
        cart.subtotal = price(5 * i64::from(cart.total_items));
    }
}

#[async_trait]
impl CommerceApi for MockCommerce {
    async fn list_products(&self) -> Result<Vec<Product>, CommerceError> {
        Ok(self.products.clone())
    }

    async fn retrieve_product(&self, product_id: &ProductId) -> Result<Product, CommerceError> {
        self.products
            .iter()
            .find(|p| &p.id == product_id)
            .cloned()
            .ok_or_else(|| CommerceError::NotFound("Product not found".to_string()))
    }

    async fn retrieve_cart(&self, _cart_id: Option<&CartId>) -> Result<Cart, CommerceError> {
        if self.fail_cart {
            return Err(backend_down());
        }
        Ok(self.cart())
    }

    async fn add_to_cart(
        &self,
        _cart_id: &CartId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        if self.fail_cart {
            return Err(backend_down());
        }
        let mut cart = self.cart.lock().unwrap();
        let next = cart.line_items.len() + 1;
        match cart
            .line_items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
        {
            Some(item) => item.quantity += quantity,
            None => cart
                .line_items
                .push(line_item(&format!("item_{next}"), product_id.as_str(), quantity)),
        }
        Self::recount(&mut cart);
        Ok(cart.clone())
    }

    async fn update_cart_item(
        &self,
        _cart_id: &CartId,
        line_item_id: &LineItemId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut cart = self.cart.lock().unwrap();
        if quantity == 0 {
            cart.line_items.retain(|item| &item.id != line_item_id);
        } else if let Some(item) = cart.line_items.iter_mut().find(|item| &item.id == line_item_id) {
            item.quantity = quantity;
        }
        Self::recount(&mut cart);
        Ok(cart.clone())
    }

    async fn remove_cart_item(
        &self,
        _cart_id: &CartId,
        line_item_id: &LineItemId,
    ) -> Result<Cart, CommerceError> {
        let mut cart = self.cart.lock().unwrap();
        cart.line_items.retain(|item| &item.id != line_item_id);
        Self::recount(&mut cart);
        Ok(cart.clone())
    }

    async fn empty_cart(&self, _cart_id: &CartId) -> Result<Cart, CommerceError> {
        let mut cart = self.cart.lock().unwrap();
        cart.line_items.clear();
        Self::recount(&mut cart);
        Ok(cart.clone())
    }

    async fn generate_token(&self, cart_id: &CartId) -> Result<CheckoutToken, CommerceError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_token {
            return Err(backend_down());
        }
        Ok(CheckoutToken {
            id: Some(CheckoutTokenId::new("chkt_1")),
            cart_id: Some(cart_id.clone()),
        })
    }

    async fn capture_checkout(
        &self,
        _token_id: &CheckoutTokenId,
        payload: &CapturePayload,
    ) -> Result<Order, CommerceError> {
        self.capture_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payload.lock().unwrap() = Some(payload.clone());
        if let Some(message) = &self.decline {
            return Err(CommerceError::Api {
                status: 422,
                message: message.clone(),
            });
        }
        Ok(Order {
            id: OrderId::new("ord_1"),
            customer_reference: "REF-0001".to_string(),
            customer: None,
            order_value: None,
        })
    }

    async fn retrieve_order(&self, order_id: &OrderId) -> Result<Order, CommerceError> {
        if order_id.as_str() == "ord_1" {
            Ok(Order {
                id: order_id.clone(),
                customer_reference: "REF-0001".to_string(),
                customer: None,
                order_value: Some(price(10)),
            })
        } else {
            Err(CommerceError::NotFound("Order not found".to_string()))
        }
    }
}
