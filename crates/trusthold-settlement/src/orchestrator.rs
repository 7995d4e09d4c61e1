//! The settlement orchestrator: the one entry point that ties inventory,
//! pricing, orders, and escrow together.
//!
//! Order creation is a saga: stock reservations are compensated (restored)
//! if any later step fails, so a failed checkout never leaks reserved
//! units. Every successful mutating operation emits exactly one audit
//! event; a failing sink is logged, never propagated.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;

use trusthold_escrow::EscrowTransaction;
use trusthold_pricing::{price_order, PricedItem};
use trusthold_types::{
    audit::emit, constants, ActorRef, AuditEvent, AuditSink, BuyerId, DisputeDecision, EscrowId,
    FulfillmentStatus, LineItem, MarketplaceConfig, Order, OrderId, OrderStatus, OrderTotals,
    Product, ProductId, Result, SellerEntry, SellerId, SellerShipment, TrustHoldError,
};

use crate::stores::{EscrowStore, InventoryStore, OrderStore};

/// One requested row of a new order.
#[derive(Debug, Clone)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Everything the buyer submits at checkout.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: BuyerId,
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: String,
    pub payment_method: String,
    pub notes: Option<String>,
}

/// The settlement service. All methods take `&self`; interior mutability
/// lives in the stores, so one instance is shared across threads behind
/// an `Arc`.
pub struct SettlementService {
    config: MarketplaceConfig,
    audit: Arc<dyn AuditSink>,
    inventory: InventoryStore,
    orders: OrderStore,
    escrows: EscrowStore,
}

impl SettlementService {
    #[must_use]
    pub fn new(config: MarketplaceConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            config,
            audit,
            inventory: InventoryStore::new(),
            orders: OrderStore::new(),
            escrows: EscrowStore::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    #[must_use]
    pub fn inventory(&self) -> &InventoryStore {
        &self.inventory
    }

    #[must_use]
    pub fn orders(&self) -> &OrderStore {
        &self.orders
    }

    #[must_use]
    pub fn escrows(&self) -> &EscrowStore {
        &self.escrows
    }

    pub(crate) fn audit_sink(&self) -> &dyn AuditSink {
        self.audit.as_ref()
    }

    // -----------------------------------------------------------------
    // Order creation saga
    // -----------------------------------------------------------------

    /// Create an order: reserve stock, price it, persist the order and
    /// its line items, and open the escrow — all or nothing. Any failure
    /// after a reservation restores every reserved unit.
    ///
    /// # Errors
    /// - `InvalidInput` for an empty item list or zero quantity
    /// - `ProductNotFound` / `ProductInactive` / `InsufficientStock` from
    ///   reservation
    /// - `InvalidOrder` if pricing produces no positive seller entry
    pub fn create_order(&self, request: NewOrder) -> Result<Order> {
        if request.items.is_empty() {
            return Err(TrustHoldError::InvalidInput {
                field: "items".to_string(),
                message: "order must contain at least one item".to_string(),
            });
        }
        for item in &request.items {
            if item.quantity == 0 {
                return Err(TrustHoldError::InvalidInput {
                    field: "quantity".to_string(),
                    message: format!("quantity for product {} must be positive", item.product_id),
                });
            }
        }

        // Reserve stock row by row; on failure, compensate what was taken.
        let mut reserved: Vec<(ProductId, u32)> = Vec::with_capacity(request.items.len());
        let mut products = Vec::with_capacity(request.items.len());
        for item in &request.items {
            match self.inventory.try_reserve(item.product_id, item.quantity) {
                Ok(product) => {
                    reserved.push((item.product_id, item.quantity));
                    products.push(product);
                }
                Err(err) => {
                    self.compensate(&reserved);
                    return Err(err);
                }
            }
        }

        match self.finish_order(&request, &products) {
            Ok(order) => Ok(order),
            Err(err) => {
                self.compensate(&reserved);
                Err(err)
            }
        }
    }

    /// The post-reservation half of the saga: pricing, persistence, escrow.
    fn finish_order(&self, request: &NewOrder, products: &[Product]) -> Result<Order> {
        let now = Utc::now();
        let actor = ActorRef::user(request.buyer_id.0);

        let priced: Vec<PricedItem> = products
            .iter()
            .zip(&request.items)
            .map(|(product, item)| PricedItem {
                seller_id: product.seller_id,
                unit_price: product.price,
                quantity: item.quantity,
            })
            .collect();
        let pricing = price_order(&priced, &self.config);

        let shipments: Vec<SellerShipment> = pricing
            .per_seller
            .iter()
            .map(|s| SellerShipment::new(s.seller_id, s.subtotal, s.commission))
            .collect();
        let totals = OrderTotals::new(
            pricing.subtotal,
            pricing.tax,
            pricing.shipping,
            pricing.discount,
        );

        let mut order = Order::new(
            request.buyer_id,
            Vec::new(),
            shipments,
            totals,
            request.shipping_address.clone(),
            request.payment_method.clone(),
            request.notes.clone(),
            actor.clone(),
            now,
        );

        let items: Vec<LineItem> = products
            .iter()
            .zip(&request.items)
            .map(|(product, item)| {
                LineItem::new(
                    order.id,
                    product,
                    item.quantity,
                    self.config.commission_rate_percent,
                    now,
                )
            })
            .collect();
        order.item_ids = items.iter().map(|i| i.id).collect();

        let entries: Vec<SellerEntry> = pricing
            .per_seller
            .iter()
            .map(|s| SellerEntry::new(s.seller_id, s.subtotal, s.commission))
            .collect();
        let escrow = EscrowTransaction::open(
            order.id,
            request.buyer_id,
            entries,
            &self.config.escrow,
            actor.clone(),
            now,
        )?;
        order.escrow_id = Some(escrow.id);
        order.set_status(OrderStatus::Confirmed, actor.clone(), None, now);

        let escrow_id = escrow.id;
        for item in items {
            self.orders.insert_item(item);
        }
        self.escrows.insert(escrow);
        self.orders.insert_order(order.clone());

        tracing::info!(
            order = %order.id, escrow = %escrow_id, total = %order.totals.total,
            "order created"
        );
        emit(
            self.audit.as_ref(),
            AuditEvent::new(
                actor,
                "order_created",
                constants::RESOURCE_ORDER,
                order.id.to_string(),
                now,
            )
            .with_after(json!({
                "order_number": order.order_number.0,
                "total": order.totals.total.to_string(),
                "escrow_id": escrow_id.to_string(),
                "sellers": order.shipments.len(),
            })),
        );
        Ok(order)
    }

    fn compensate(&self, reserved: &[(ProductId, u32)]) {
        for &(product_id, quantity) in reserved {
            self.inventory.restore(product_id, quantity);
        }
    }

    // -----------------------------------------------------------------
    // Shipping and delivery
    // -----------------------------------------------------------------

    /// Record a tracking number and move one seller's shipment to
    /// `Shipped`, along with that seller's line items.
    ///
    /// # Errors
    /// `OrderNotFound` or `ShipmentNotFound`.
    pub fn mark_shipped(
        &self,
        order_id: OrderId,
        seller_id: SellerId,
        tracking: &str,
        actor: ActorRef,
    ) -> Result<Order> {
        let now = Utc::now();
        let order = self.orders.with_order_mut(order_id, |order| {
            order.mark_shipped(seller_id, tracking.to_string(), now)?;
            Ok(order.clone())
        })?;

        for item_id in &order.item_ids {
            self.orders.with_item_mut(*item_id, |item| {
                if item.seller_id == seller_id {
                    item.fulfillment = FulfillmentStatus::Shipped;
                }
            });
        }

        emit(
            self.audit.as_ref(),
            AuditEvent::new(
                actor,
                "shipment_shipped",
                constants::RESOURCE_ORDER,
                order_id.to_string(),
                now,
            )
            .with_after(json!({
                "seller_id": seller_id.to_string(),
                "tracking": tracking,
            })),
        );
        Ok(order)
    }

    /// Confirm delivery of one seller's shipment. Also stamps the
    /// seller's line items with their return windows.
    ///
    /// # Errors
    /// `OrderNotFound` or `ShipmentNotFound`.
    pub fn mark_delivered(
        &self,
        order_id: OrderId,
        seller_id: SellerId,
        actor: ActorRef,
    ) -> Result<Order> {
        let now = Utc::now();
        let order = self.orders.with_order_mut(order_id, |order| {
            order.mark_delivered(seller_id, actor.clone(), now)?;
            Ok(order.clone())
        })?;

        let return_window = self.config.escrow.return_window_days;
        for item_id in &order.item_ids {
            self.orders.with_item_mut(*item_id, |item| {
                if item.seller_id == seller_id {
                    item.mark_delivered(now, return_window);
                }
            });
        }

        emit(
            self.audit.as_ref(),
            AuditEvent::new(
                actor,
                "shipment_delivered",
                constants::RESOURCE_ORDER,
                order_id.to_string(),
                now,
            )
            .with_after(json!({
                "seller_id": seller_id.to_string(),
                "order_status": order.status.to_string(),
            })),
        );
        Ok(order)
    }

    // -----------------------------------------------------------------
    // Escrow operations
    // -----------------------------------------------------------------

    /// Release one seller's held funds.
    ///
    /// # Errors
    /// Propagates the escrow state machine's guards; see
    /// [`EscrowTransaction::release_funds`].
    pub fn release_escrow_entry(
        &self,
        escrow_id: EscrowId,
        seller_id: SellerId,
        actor: ActorRef,
        reason: &str,
    ) -> Result<EscrowTransaction> {
        let now = Utc::now();
        let (before, tx) = self.escrows.with_escrow_mut(escrow_id, |tx| {
            let before = tx.status;
            tx.release_funds(seller_id, actor.clone(), reason, now)?;
            Ok((before, tx.clone()))
        })?;
        emit(
            self.audit.as_ref(),
            AuditEvent::new(
                actor,
                "funds_released",
                constants::RESOURCE_ESCROW,
                escrow_id.to_string(),
                now,
            )
            .with_before(json!({"status": before.to_string()}))
            .with_after(json!({
                "status": tx.status.to_string(),
                "seller_id": seller_id.to_string(),
                "reason": reason,
            })),
        );
        Ok(tx)
    }

    /// Full refund of held funds to the buyer, outside any dispute.
    ///
    /// # Errors
    /// See [`EscrowTransaction::refund_to_buyer`].
    pub fn refund_escrow(
        &self,
        escrow_id: EscrowId,
        amount: Decimal,
        reason: &str,
        method: &str,
        actor: ActorRef,
    ) -> Result<EscrowTransaction> {
        let now = Utc::now();
        let (before, tx) = self.escrows.with_escrow_mut(escrow_id, |tx| {
            let before = tx.status;
            tx.refund_to_buyer(amount, reason, method, actor.clone(), now)?;
            Ok((before, tx.clone()))
        })?;
        emit(
            self.audit.as_ref(),
            AuditEvent::new(
                actor,
                "refunded_to_buyer",
                constants::RESOURCE_ESCROW,
                escrow_id.to_string(),
                now,
            )
            .with_before(json!({"status": before.to_string()}))
            .with_after(json!({
                "status": tx.status.to_string(),
                "amount": amount.to_string(),
                "reason": reason,
            })),
        );
        Ok(tx)
    }

    /// Open a dispute on an escrow, freezing its held entries.
    ///
    /// # Errors
    /// See [`EscrowTransaction::create_dispute`].
    pub fn dispute_escrow(
        &self,
        escrow_id: EscrowId,
        reason: &str,
        description: &str,
        actor: ActorRef,
        evidence: Vec<String>,
    ) -> Result<EscrowTransaction> {
        let now = Utc::now();
        let (before, tx) = self.escrows.with_escrow_mut(escrow_id, |tx| {
            let before = tx.status;
            tx.create_dispute(reason, description, actor.clone(), evidence, now)?;
            Ok((before, tx.clone()))
        })?;
        emit(
            self.audit.as_ref(),
            AuditEvent::new(
                actor,
                "dispute_opened",
                constants::RESOURCE_ESCROW,
                escrow_id.to_string(),
                now,
            )
            .with_before(json!({"status": before.to_string()}))
            .with_after(json!({
                "status": tx.status.to_string(),
                "reason": reason,
            })),
        );
        Ok(tx)
    }

    /// Resolve the open dispute.
    ///
    /// For `PartialRefund` the amount is required here and must be
    /// strictly below the escrow's original total; boundary amounts are
    /// expressed as `BuyerFavor` / `SellerFavor` instead.
    ///
    /// # Errors
    /// `InvalidDecision` for a missing or out-of-range partial amount,
    /// plus the state machine's guards; see
    /// [`EscrowTransaction::resolve_dispute`].
    pub fn resolve_dispute(
        &self,
        escrow_id: EscrowId,
        decision: DisputeDecision,
        amount: Option<Decimal>,
        actor: ActorRef,
        notes: Option<String>,
    ) -> Result<EscrowTransaction> {
        let now = Utc::now();
        let (before, tx) = self.escrows.with_escrow_mut(escrow_id, |tx| {
            if decision == DisputeDecision::PartialRefund {
                let amount = amount.ok_or_else(|| TrustHoldError::InvalidDecision {
                    reason: "partial_refund requires an amount".to_string(),
                })?;
                if amount >= tx.total_amount {
                    return Err(TrustHoldError::InvalidDecision {
                        reason: format!(
                            "partial_refund amount {amount} must be below the escrow total {}",
                            tx.total_amount
                        ),
                    });
                }
            }
            let before = tx.status;
            tx.resolve_dispute(decision, amount, actor.clone(), notes.clone(), now)?;
            Ok((before, tx.clone()))
        })?;
        emit(
            self.audit.as_ref(),
            AuditEvent::new(
                actor,
                "dispute_resolved",
                constants::RESOURCE_ESCROW,
                escrow_id.to_string(),
                now,
            )
            .with_before(json!({"status": before.to_string()}))
            .with_after(json!({
                "status": tx.status.to_string(),
                "decision": decision.to_string(),
                "refund_amount": tx
                    .dispute
                    .as_ref()
                    .and_then(|d| d.resolution.as_ref())
                    .map(|r| r.refund_amount.to_string()),
            })),
        );
        Ok(tx)
    }

    /// Administrative cancellation: held funds return to the buyer.
    ///
    /// # Errors
    /// See [`EscrowTransaction::cancel`].
    pub fn cancel_escrow(
        &self,
        escrow_id: EscrowId,
        actor: ActorRef,
        reason: &str,
    ) -> Result<EscrowTransaction> {
        let now = Utc::now();
        let (before, tx) = self.escrows.with_escrow_mut(escrow_id, |tx| {
            let before = tx.status;
            tx.cancel(actor.clone(), reason, now)?;
            Ok((before, tx.clone()))
        })?;
        emit(
            self.audit.as_ref(),
            AuditEvent::new(
                actor,
                "escrow_cancelled",
                constants::RESOURCE_ESCROW,
                escrow_id.to_string(),
                now,
            )
            .with_before(json!({"status": before.to_string()}))
            .with_after(json!({
                "status": tx.status.to_string(),
                "reason": reason,
            })),
        );
        Ok(tx)
    }
}
