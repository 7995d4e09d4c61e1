//! Full-stack scenarios: checkout through escrow settlement, exercised
//! only through the public `SettlementService` surface.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use trusthold_settlement::{
    ConservationCheck, NewOrder, OrderItemRequest, SettlementService,
};
use trusthold_types::{
    ActorRef, BuyerId, DisputeDecision, EntryStatus, EscrowPolicy, EscrowStatus, MarketplaceConfig,
    MemoryAuditSink, Product, SellerId, TrustHoldError,
};

fn dec(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn service_with(config: MarketplaceConfig) -> (SettlementService, Arc<MemoryAuditSink>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let sink = Arc::new(MemoryAuditSink::new());
    (SettlementService::new(config, sink.clone()), sink)
}

fn service() -> (SettlementService, Arc<MemoryAuditSink>) {
    service_with(MarketplaceConfig::default())
}

fn seed(service: &SettlementService, price_cents: i64, stock: u32) -> Product {
    let product = Product::dummy(SellerId::new(), dec(price_cents), stock);
    service.inventory().insert(product.clone());
    product
}

fn checkout(buyer: BuyerId, items: Vec<OrderItemRequest>) -> NewOrder {
    NewOrder {
        buyer_id: buyer,
        items,
        shipping_address: "42 Market Street".to_string(),
        payment_method: "card".to_string(),
        notes: None,
    }
}

fn row(product: &Product, quantity: u32) -> OrderItemRequest {
    OrderItemRequest {
        product_id: product.id,
        quantity,
    }
}

#[test]
fn two_seller_checkout_reference_figures() {
    // Seller A $100 gross, seller B $50. Defaults: commission 5%, tax 8%,
    // $10 shipping below the $500 free threshold.
    let (service, _) = service();
    let a = seed(&service, 5000, 10); // 2 × $50
    let b = seed(&service, 5000, 10); // 1 × $50
    let buyer = BuyerId::new();

    let order = service
        .create_order(checkout(buyer, vec![row(&a, 2), row(&b, 1)]))
        .unwrap();

    assert_eq!(order.totals.subtotal, dec(15000));
    assert_eq!(order.totals.tax, dec(1200));
    assert_eq!(order.totals.shipping, dec(1000));
    assert_eq!(order.totals.total, dec(17200));

    let escrow = service.escrows().get(order.escrow_id.unwrap()).unwrap();
    assert_eq!(escrow.total_amount, dec(15000));
    assert_eq!(escrow.status, EscrowStatus::Held);

    let entry_a = escrow.entry(a.seller_id).unwrap();
    assert_eq!(entry_a.amount, dec(10000));
    assert_eq!(entry_a.commission, dec(500));
    assert_eq!(entry_a.net_amount, dec(9500));
    let entry_b = escrow.entry(b.seller_id).unwrap();
    assert_eq!(entry_b.amount, dec(5000));
    assert_eq!(entry_b.commission, dec(250));
    assert_eq!(entry_b.net_amount, dec(4750));

    ConservationCheck::verify(&service).unwrap();
}

#[test]
fn release_is_guarded_against_double_payout() {
    let (service, _) = service();
    let a = seed(&service, 10000, 5);
    let b = seed(&service, 5000, 5);
    let order = service
        .create_order(checkout(BuyerId::new(), vec![row(&a, 1), row(&b, 1)]))
        .unwrap();
    let escrow_id = order.escrow_id.unwrap();
    let admin = ActorRef::admin(uuid::Uuid::now_v7());

    let tx = service
        .release_escrow_entry(escrow_id, a.seller_id, admin.clone(), "delivery confirmed")
        .unwrap();
    assert_eq!(tx.status, EscrowStatus::PartiallyReleased);
    assert_eq!(tx.released_net_total(), dec(9500));

    // Retrying the same release must fail, not pay twice.
    let err = service
        .release_escrow_entry(escrow_id, a.seller_id, admin, "retry")
        .unwrap_err();
    assert!(matches!(
        err,
        TrustHoldError::InvalidEntryState {
            current: EntryStatus::Released,
            ..
        }
    ));

    let tx = service.escrows().get(escrow_id).unwrap();
    assert_eq!(tx.released_net_total(), dec(9500));
    ConservationCheck::verify(&service).unwrap();
}

#[test]
fn dispute_partial_split_reference_figures() {
    // $150 across two sellers ($100 / $50); $60 back to the buyer leaves
    // $90 split 2:1 → A gets 60 (commission 3), B gets 30 (commission 1.50).
    let (service, _) = service();
    let a = seed(&service, 10000, 5);
    let b = seed(&service, 5000, 5);
    let buyer = BuyerId::new();
    let order = service
        .create_order(checkout(buyer, vec![row(&a, 1), row(&b, 1)]))
        .unwrap();
    let escrow_id = order.escrow_id.unwrap();
    let admin = ActorRef::admin(uuid::Uuid::now_v7());

    service
        .dispute_escrow(
            escrow_id,
            "not_as_described",
            "both items arrived damaged",
            ActorRef::user(buyer.0),
            vec!["photo-1.jpg".to_string()],
        )
        .unwrap();
    assert_eq!(
        service.escrows().get(escrow_id).unwrap().status,
        EscrowStatus::Disputed
    );

    // Release and refund are frozen while the dispute is open.
    let err = service
        .release_escrow_entry(escrow_id, a.seller_id, admin.clone(), "attempt")
        .unwrap_err();
    assert!(matches!(err, TrustHoldError::InvalidEscrowState { .. }));

    let tx = service
        .resolve_dispute(
            escrow_id,
            DisputeDecision::PartialRefund,
            Some(dec(6000)),
            admin,
            Some("split per inspection".to_string()),
        )
        .unwrap();

    let entry_a = tx.entry(a.seller_id).unwrap();
    assert_eq!(entry_a.status, EntryStatus::Released);
    assert_eq!(entry_a.amount, dec(6000));
    assert_eq!(entry_a.commission, dec(300));
    assert_eq!(entry_a.net_amount, dec(5700));
    let entry_b = tx.entry(b.seller_id).unwrap();
    assert_eq!(entry_b.amount, dec(3000));
    assert_eq!(entry_b.commission, dec(150));
    assert_eq!(entry_b.net_amount, dec(2850));

    let refunded: Decimal = tx.refunds.iter().map(|r| r.amount).sum();
    assert_eq!(refunded, dec(6000));
    assert!(!tx.has_open_dispute());

    ConservationCheck::verify(&service).unwrap();
}

#[test]
fn auto_release_waits_for_delivery() {
    // Hold period zero: everything is due immediately, so the sweep's
    // only gate is delivery.
    let config = MarketplaceConfig {
        escrow: EscrowPolicy {
            hold_period_days: 0,
            ..EscrowPolicy::default()
        },
        ..MarketplaceConfig::default()
    };
    let (service, sink) = service_with(config);
    let a = seed(&service, 10000, 5);
    let b = seed(&service, 5000, 5);
    let order = service
        .create_order(checkout(BuyerId::new(), vec![row(&a, 1), row(&b, 1)]))
        .unwrap();
    let escrow_id = order.escrow_id.unwrap();
    let later = Utc::now() + Duration::hours(1);

    // Nothing delivered: due but fully held back.
    let report = service.run_auto_release(later);
    assert!(report.released.is_empty());
    assert_eq!(report.flagged_undelivered, vec![escrow_id]);
    assert!(report.failed.is_empty());

    // One delivery: only that seller's entry releases.
    service
        .mark_delivered(order.id, a.seller_id, ActorRef::seller(a.seller_id.0))
        .unwrap();
    let report = service.run_auto_release(later);
    assert_eq!(report.released, vec![escrow_id]);
    assert_eq!(report.flagged_undelivered, vec![escrow_id]);

    let tx = service.escrows().get(escrow_id).unwrap();
    assert_eq!(tx.status, EscrowStatus::PartiallyReleased);
    assert_eq!(tx.entry(a.seller_id).unwrap().status, EntryStatus::Released);
    assert_eq!(tx.entry(b.seller_id).unwrap().status, EntryStatus::Held);
    let release = tx.entry(a.seller_id).unwrap().release.as_ref().unwrap();
    assert!(release.actor.is_system());

    // A repeated sweep releases nothing new but keeps flagging the
    // undelivered remainder.
    let repeat = service.run_auto_release(later);
    assert!(repeat.released.is_empty());
    assert_eq!(repeat.flagged_undelivered, vec![escrow_id]);

    // Second delivery; the next sweep completes the escrow.
    service
        .mark_delivered(order.id, b.seller_id, ActorRef::seller(b.seller_id.0))
        .unwrap();
    let report = service.run_auto_release(later);
    assert_eq!(report.released, vec![escrow_id]);
    assert!(report.flagged_undelivered.is_empty());

    let tx = service.escrows().get(escrow_id).unwrap();
    assert_eq!(tx.status, EscrowStatus::Released);
    assert!(tx.entries().iter().all(|e| e
        .release
        .as_ref()
        .is_some_and(|r| r.actor.is_system())));

    let auto_events: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|e| e.action == "escrow_auto_released")
        .collect();
    assert_eq!(auto_events.len(), 2);

    ConservationCheck::verify(&service).unwrap();
}

#[test]
fn concurrent_checkouts_never_oversell() {
    let (service, _) = service();
    let product = seed(&service, 5000, 1);
    let service = Arc::new(service);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = Arc::clone(&service);
            let product_id = product.id;
            std::thread::spawn(move || {
                service
                    .create_order(checkout(
                        BuyerId::new(),
                        vec![OrderItemRequest {
                            product_id,
                            quantity: 1,
                        }],
                    ))
                    .is_ok()
            })
        })
        .collect();
    let outcomes: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(outcomes.iter().filter(|&&ok| ok).count(), 1);
    assert_eq!(service.inventory().stock(product.id), Some(0));
    assert_eq!(service.orders().all_orders().len(), 1);
    ConservationCheck::verify(&service).unwrap();
}

#[test]
fn full_refund_and_cancellation_paths() {
    let (service, _) = service();
    let a = seed(&service, 10000, 5);
    let buyer = BuyerId::new();
    let order = service
        .create_order(checkout(buyer, vec![row(&a, 1)]))
        .unwrap();
    let escrow_id = order.escrow_id.unwrap();
    let admin = ActorRef::admin(uuid::Uuid::now_v7());

    // Partial refund outside a dispute is rejected by policy.
    let err = service
        .refund_escrow(escrow_id, dec(4000), "change of mind", "original_payment", admin.clone())
        .unwrap_err();
    assert!(matches!(err, TrustHoldError::PartialRefundRequiresDispute));

    let tx = service
        .refund_escrow(escrow_id, dec(10000), "change of mind", "original_payment", admin.clone())
        .unwrap();
    assert_eq!(tx.status, EscrowStatus::Refunded);
    assert_eq!(tx.refunds.len(), 1);

    // Terminal escrows cannot be cancelled.
    let err = service.cancel_escrow(escrow_id, admin.clone(), "cleanup").unwrap_err();
    assert!(matches!(err, TrustHoldError::NotCancellable { .. }));

    // A fresh order can be cancelled while held; funds return to the buyer.
    let order = service
        .create_order(checkout(buyer, vec![row(&a, 1)]))
        .unwrap();
    let tx = service
        .cancel_escrow(order.escrow_id.unwrap(), admin, "fraud review")
        .unwrap();
    assert_eq!(tx.status, EscrowStatus::Cancelled);
    let refunded: Decimal = tx.refunds.iter().map(|r| r.amount).sum();
    assert_eq!(refunded, dec(10000));

    ConservationCheck::verify(&service).unwrap();
}

#[test]
fn every_operation_audits_exactly_once() {
    let (service, sink) = service();
    let a = seed(&service, 10000, 5);
    let buyer = BuyerId::new();
    let order = service
        .create_order(checkout(buyer, vec![row(&a, 1)]))
        .unwrap();
    let escrow_id = order.escrow_id.unwrap();
    let admin = ActorRef::admin(uuid::Uuid::now_v7());

    service
        .mark_delivered(order.id, a.seller_id, ActorRef::seller(a.seller_id.0))
        .unwrap();
    service
        .release_escrow_entry(escrow_id, a.seller_id, admin, "delivery confirmed")
        .unwrap();

    let actions: Vec<String> = sink.events().into_iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec!["order_created", "shipment_delivered", "funds_released"]
    );

    // Failed operations must not audit.
    let before = sink.len();
    let _ = service.release_escrow_entry(
        escrow_id,
        a.seller_id,
        ActorRef::admin(uuid::Uuid::now_v7()),
        "retry",
    );
    assert_eq!(sink.len(), before);
}
