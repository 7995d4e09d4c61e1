//! The catalog slice the settlement engine validates against.
//!
//! Catalog CRUD lives elsewhere; the orchestrator only needs identity,
//! price, stock, and the active flag. Stock mutation goes through the
//! settlement crate's inventory store, never through this struct directly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ProductId, SellerId};

/// A sellable product as the orchestrator sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: SellerId,
    pub name: String,
    pub image: String,
    pub price: Decimal,
    pub stock: u32,
    pub active: bool,
}

impl Product {
    /// Whether the requested quantity can currently be fulfilled.
    #[must_use]
    pub fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Product {
    pub fn dummy(seller_id: SellerId, price: Decimal, stock: u32) -> Self {
        Self {
            id: ProductId::new(),
            seller_id,
            name: "Test Product".to_string(),
            image: "https://img.example/test.png".to_string(),
            price,
            stock,
            active: true,
        }
    }
}
