//! The order aggregate: buyer, line-item references, per-seller shipment
//! sub-records, monetary totals, and an append-only status history.
//!
//! The order is the authority for delivery eligibility — the auto-release
//! scheduler consults the per-seller shipment sub-status here, never the
//! escrow's own clock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    money::round_money, ActorRef, BuyerId, BuyerToken, EscrowId, LineItemId, OrderId, OrderNumber,
    Result, SellerId, TrustHoldError,
};

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Confirmed => write!(f, "CONFIRMED"),
            Self::Processing => write!(f, "PROCESSING"),
            Self::Shipped => write!(f, "SHIPPED"),
            Self::Delivered => write!(f, "DELIVERED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Per-seller delivery sub-status on an order's shipment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Returned,
}

impl std::fmt::Display for DeliveryStatus {
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

/// Per-seller shipment sub-record: the seller's slice of the order and
/// where their delivery stands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerShipment {
    pub seller_id: SellerId,
    pub subtotal: Decimal,
    pub commission: Decimal,
    pub delivery_status: DeliveryStatus,
    pub tracking: Option<String>,
}

impl SellerShipment {
    #[must_use]
    pub fn new(seller_id: SellerId, subtotal: Decimal, commission: Decimal) -> Self {
        Self {
            seller_id,
            subtotal,
            commission,
            delivery_status: DeliveryStatus::Pending,
            tracking: None,
        }
    }

    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.delivery_status == DeliveryStatus::Delivered
    }
}

/// Monetary totals. `total` is always recomputed from the parts —
/// `total = subtotal + tax + shipping − discount` — never drifted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    #[must_use]
    pub fn new(subtotal: Decimal, tax: Decimal, shipping: Decimal, discount: Decimal) -> Self {
        let mut totals = Self {
            subtotal,
            tax,
            shipping,
            discount,
            total: Decimal::ZERO,
        };
        totals.recompute();
        totals
    }

    /// Recompute `total` from the source fields.
    pub fn recompute(&mut self) {
        self.total = round_money(self.subtotal + self.tax + self.shipping - self.discount);
    }

    /// Whether the stored total matches its source fields.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.total == round_money(self.subtotal + self.tax + self.shipping - self.discount)
    }
}

/// One entry in the append-only status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub actor: ActorRef,
    pub note: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// A marketplace order. Line items are separate entities referenced by id;
/// sellers see the [`BuyerToken`], never the buyer's real identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub buyer_id: BuyerId,
    pub buyer_token: BuyerToken,
    pub item_ids: Vec<LineItemId>,
    pub shipments: Vec<SellerShipment>,
    pub totals: OrderTotals,
    pub status: OrderStatus,
    /// Append-only. Always has at least one entry matching the current status.
    pub status_history: Vec<StatusEntry>,
    pub shipping_address: String,
    pub payment_method: String,
    pub notes: Option<String>,
    pub escrow_id: Option<EscrowId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Construct a new order in `Pending` status with a seeded history entry.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        buyer_id: BuyerId,
        item_ids: Vec<LineItemId>,
        shipments: Vec<SellerShipment>,
        totals: OrderTotals,
        shipping_address: String,
        payment_method: String,
        notes: Option<String>,
        actor: ActorRef,
        now: DateTime<Utc>,
    ) -> Self {
        let id = OrderId::new();
        Self {
            id,
            order_number: OrderNumber::generate(id),
            buyer_id,
            buyer_token: BuyerToken::derive(buyer_id, id),
            item_ids,
            shipments,
            totals,
            status: OrderStatus::Pending,
            status_history: vec![StatusEntry {
                status: OrderStatus::Pending,
                actor,
                note: None,
                changed_at: now,
            }],
            shipping_address,
            payment_method,
            notes,
            escrow_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to a new status, appending to the history.
    pub fn set_status(
        &mut self,
        status: OrderStatus,
        actor: ActorRef,
        note: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.status = status;
        self.status_history.push(StatusEntry {
            status,
            actor,
            note,
            changed_at: now,
        });
        self.updated_at = now;
    }

    /// The shipment sub-record for a seller, if any.
    #[must_use]
    pub fn shipment(&self, seller_id: SellerId) -> Option<&SellerShipment> {
        self.shipments.iter().find(|s| s.seller_id == seller_id)
    }

    fn shipment_mut(&mut self, seller_id: SellerId) -> Option<&mut SellerShipment> {
        self.shipments.iter_mut().find(|s| s.seller_id == seller_id)
    }

    /// Record a tracking number and move the shipment to `Shipped`.
    pub fn mark_shipped(
        &mut self,
        seller_id: SellerId,
        tracking: String,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let id = self.id;
        let shipment = self
            .shipment_mut(seller_id)
            .ok_or(TrustHoldError::ShipmentNotFound {
                order: id,
                seller: seller_id,
            })?;
        shipment.delivery_status = DeliveryStatus::Shipped;
        shipment.tracking = Some(tracking);
        self.updated_at = now;
        Ok(())
    }

    /// Confirm delivery of one seller's shipment. When every shipment is
    /// delivered, the order itself moves to `Delivered`.
    pub fn mark_delivered(
        &mut self,
        seller_id: SellerId,
        actor: ActorRef,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let id = self.id;
        let shipment = self
            .shipment_mut(seller_id)
            .ok_or(TrustHoldError::ShipmentNotFound {
                order: id,
                seller: seller_id,
            })?;
        shipment.delivery_status = DeliveryStatus::Delivered;
        if self.is_fully_delivered() {
            self.set_status(OrderStatus::Delivered, actor, None, now);
        } else {
            self.updated_at = now;
        }
        Ok(())
    }

    /// Whether this seller's shipment has been delivered — the hard
    /// precondition for auto-releasing that seller's escrow entry.
    #[must_use]
    pub fn is_delivered_for(&self, seller_id: SellerId) -> bool {
        self.shipment(seller_id).is_some_and(SellerShipment::is_delivered)
    }

    #[must_use]
    pub fn is_fully_delivered(&self) -> bool {
        !self.shipments.is_empty() && self.shipments.iter().all(SellerShipment::is_delivered)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy(buyer_id: BuyerId, shipments: Vec<SellerShipment>, totals: OrderTotals) -> Self {
        Self::new(
            buyer_id,
            Vec::new(),
            shipments,
            totals,
            "1 Test Street".to_string(),
            "card".to_string(),
            None,
            ActorRef::system(),
            Utc::now(),
        )
    }
}
