//! Product entity.

use crate::{CategoryId, ProductId};
use serde::{Deserialize, Serialize};

/// A product listed in a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: u32,
    pub image_url: Option<String>,
    pub category_id: CategoryId,
}

/// Fields for a product that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub stock: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category_id: CategoryId,
}

impl NewProduct {
    /// Creates a product draft with the required fields only.
    #[must_use]
    pub fn new(name: impl Into<String>, price: f64, stock: u32, category_id: CategoryId) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            stock,
            image_url: None,
            category_id,
        }
    }
}

/// Partial update for a product. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<u32>,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl ProductChanges {
    /// Update that moves a product into another category.
    #[must_use]
    pub fn move_to(category_id: CategoryId) -> Self {
        Self {
            category_id: Some(category_id),
            ..Default::default()
        }
    }
}

impl Product {
    /// Builds a persisted product from a draft and its assigned id.
    #[must_use]
    pub fn from_new(id: ProductId, new: NewProduct) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            price: new.price,
            stock: new.stock,
            image_url: new.image_url,
            category_id: new.category_id,
        }
    }

    /// Merges a partial update into this product.
    pub fn apply(&mut self, changes: ProductChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(stock) = changes.stock {
            self.stock = stock;
        }
        if let Some(image_url) = changes.image_url {
            self.image_url = Some(image_url);
        }
        if let Some(category_id) = changes.category_id {
            self.category_id = category_id;
        }
    }
}
