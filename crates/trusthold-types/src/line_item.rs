//! Line items: immutable snapshots of the purchased product at order time.
//!
//! The snapshot is decoupled from the live catalog record so historic
//! orders stay accurate after catalog edits. Each item carries its own
//! commission and a return-eligibility window computed from delivery.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    money::{commission_for, round_money},
    LineItemId, OrderId, Product, ProductId, SellerId,
};

/// What the product looked like at the moment of purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub unit_price: Decimal,
}

impl ProductSnapshot {
    #[must_use]
    pub fn of(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            image: product.image.clone(),
            unit_price: product.price,
        }
    }
}

/// Pricing breakdown for one line item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base: Decimal,
    pub variant: Decimal,
    pub customization: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
}

/// Commission charged on this item: `amount = total × rate / 100`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionInfo {
    pub rate_percent: Decimal,
    pub amount: Decimal,
}

impl CommissionInfo {
    #[must_use]
    pub fn on(total: Decimal, rate_percent: Decimal) -> Self {
        Self {
            rate_percent,
            amount: commission_for(total, rate_percent),
        }
    }
}

/// Fulfillment sub-status of one line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FulfillmentStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Returned,
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Processing => write!(f, "PROCESSING"),
            Self::Shipped => write!(f, "SHIPPED"),
            Self::Delivered => write!(f, "DELIVERED"),
            Self::Returned => write!(f, "RETURNED"),
        }
    }
}

/// One purchased row of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub order_id: OrderId,
    pub seller_id: SellerId,
    pub snapshot: ProductSnapshot,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub breakdown: PriceBreakdown,
    pub commission: CommissionInfo,
    pub fulfillment: FulfillmentStatus,
    pub delivered_at: Option<DateTime<Utc>>,
    pub return_eligible_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LineItem {
    /// Build a line item from the live product, snapshotting it.
    #[must_use]
    pub fn new(
        order_id: OrderId,
        product: &Product,
        quantity: u32,
        commission_rate_percent: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        let total_price = round_money(product.price * Decimal::from(quantity));
        Self {
            id: LineItemId::new(),
            order_id,
            seller_id: product.seller_id,
            snapshot: ProductSnapshot::of(product),
            quantity,
            unit_price: product.price,
            total_price,
            breakdown: PriceBreakdown {
                base: total_price,
                ..PriceBreakdown::default()
            },
            commission: CommissionInfo::on(total_price, commission_rate_percent),
            fulfillment: FulfillmentStatus::Pending,
            delivered_at: None,
            return_eligible_until: None,
            created_at: now,
        }
    }

    /// Mark delivered and open the return window.
    pub fn mark_delivered(&mut self, now: DateTime<Utc>, return_window_days: i64) {
        self.fulfillment = FulfillmentStatus::Delivered;
        self.delivered_at = Some(now);
        self.return_eligible_until = Some(now + Duration::days(return_window_days));
    }

    /// Whether the item can still be returned at `now`.
    #[must_use]
    pub fn is_return_eligible(&self, now: DateTime<Utc>) -> bool {
        self.return_eligible_until.is_some_and(|until| now <= until)
    }
}
