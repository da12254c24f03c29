//! Catalog product as returned by the commerce backend.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// An image asset attached to a product or line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Public asset URL.
    pub url: String,
}

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID.
    #[serde(default)]
    pub id: Option<String>,
    /// URL slug.
    #[serde(default)]
    pub slug: Option<String>,
    /// Display name.
    pub name: String,
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Description as HTML authored in the backend dashboard.
    #[serde(default)]
    pub description: String,
    pub price: Price,
    /// Primary image, if one has been uploaded.
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub permalink: Option<String>,
}

impl Product {
    /// Category names joined for display (e.g., "Soap, Gifts").
    #[must_use]
    pub fn category_names(&self) -> String {
        self.categories
            .iter()
            .map(|category| category.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_from_backend_json() {
        let json = r#"{
            "id": "prod_p1",
            "name": "Lavender Soap",
            "description": "<p>Hand made</p>",
            "price": {"raw": 6, "formatted": "6.00", "formatted_with_symbol": "$6.00", "formatted_with_code": "6.00 USD"},
            "image": null,
            "categories": [{"id": "cat_1", "slug": "soap", "name": "Soap"}, {"name": "Gifts"}],
            "inventory": {"managed": false},
            "active": true
        }"#;

        let product: Product = serde_json::from_str(json).expect("deserialize");
        assert_eq!(product.id.as_str(), "prod_p1");
        assert!(product.image.is_none());
        assert_eq!(product.category_names(), "Soap, Gifts");
        assert_eq!(product.price.display(), "$6.00");
    }

    #[test]
    fn test_product_minimal_json() {
        let json = r#"{"id": "prod_p2", "name": "Candle", "price": {"raw": 10}}"#;
        let product: Product = serde_json::from_str(json).expect("deserialize");
        assert!(product.description.is_empty());
        assert!(product.categories.is_empty());
        assert_eq!(product.category_names(), "");
    }
}
