//! The order pricing calculator.
//!
//! Contract: `commission = round(itemTotal × rate / 100)`,
//! `net = itemTotal − commission`. Shipping is free at or above the policy
//! threshold, else the flat fee. Tax is a flat rate on the subtotal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use trusthold_types::{
    money::{commission_for, round_money},
    MarketplaceConfig, SellerId,
};

/// One input row: what is being bought from whom at what price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedItem {
    pub seller_id: SellerId,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Per-seller money: gross subtotal, platform commission, seller net.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerTotals {
    pub seller_id: SellerId,
    pub subtotal: Decimal,
    pub commission: Decimal,
    pub net: Decimal,
}

/// Everything the orchestrator needs to persist an order and open its escrow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPricing {
    /// Total per input row, in input order.
    pub item_totals: Vec<Decimal>,
    /// One row per seller, ordered by first appearance in the input.
    pub per_seller: Vec<SellerTotals>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// Total for one line: `unit_price × quantity`, rounded.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

/// Price an order. Pure and deterministic: same items + same config
/// always produce the same figures.
#[must_use]
pub fn price_order(items: &[PricedItem], config: &MarketplaceConfig) -> OrderPricing {
    let item_totals: Vec<Decimal> = items
        .iter()
        .map(|item| line_total(item.unit_price, item.quantity))
        .collect();

    // Group by seller, preserving first-appearance order.
    let mut per_seller: Vec<SellerTotals> = Vec::new();
    for (item, total) in items.iter().zip(&item_totals) {
        match per_seller.iter_mut().find(|s| s.seller_id == item.seller_id) {
            Some(existing) => existing.subtotal += *total,
            None => per_seller.push(SellerTotals {
                seller_id: item.seller_id,
                subtotal: *total,
                commission: Decimal::ZERO,
                net: Decimal::ZERO,
            }),
        }
    }
    for seller in &mut per_seller {
        seller.commission = commission_for(seller.subtotal, config.commission_rate_percent);
        seller.net = seller.subtotal - seller.commission;
    }

    let subtotal: Decimal = round_money(item_totals.iter().copied().sum());
    let shipping = if subtotal >= config.shipping.free_threshold {
        Decimal::ZERO
    } else {
        config.shipping.flat_fee
    };
    let tax = round_money(subtotal * config.tax_rate_percent / Decimal::ONE_HUNDRED);
    let discount = Decimal::ZERO;
    let total = round_money(subtotal + tax + shipping - discount);

    tracing::trace!(%subtotal, %shipping, %tax, %total, sellers = per_seller.len(), "priced order");

    OrderPricing {
        item_totals,
        per_seller,
        subtotal,
        shipping,
        tax,
        discount,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MarketplaceConfig {
        MarketplaceConfig::default() // commission 5%, tax 8%, shipping 10 free ≥ 500
    }

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn two_seller_reference_scenario() {
        // Seller A: $100 gross, Seller B: $50 gross. Shipping $10, tax 8% of
        // $150 = $12, grand total $172.
        let a = SellerId::new();
        let b = SellerId::new();
        let items = [
            PricedItem {
                seller_id: a,
                unit_price: dec(5000),
                quantity: 2,
            },
            PricedItem {
                seller_id: b,
                unit_price: dec(5000),
                quantity: 1,
            },
        ];

        let pricing = price_order(&items, &config());
        assert_eq!(pricing.item_totals, vec![dec(10000), dec(5000)]);
        assert_eq!(pricing.subtotal, dec(15000));
        assert_eq!(pricing.shipping, dec(1000));
        assert_eq!(pricing.tax, dec(1200));
        assert_eq!(pricing.total, dec(17200));

        assert_eq!(pricing.per_seller.len(), 2);
        let sa = &pricing.per_seller[0];
        assert_eq!(sa.seller_id, a);
        assert_eq!(sa.subtotal, dec(10000));
        assert_eq!(sa.commission, dec(500));
        assert_eq!(sa.net, dec(9500));
        let sb = &pricing.per_seller[1];
        assert_eq!(sb.subtotal, dec(5000));
        assert_eq!(sb.commission, dec(250));
        assert_eq!(sb.net, dec(4750));
    }

    #[test]
    fn free_shipping_at_threshold() {
        let items = [PricedItem {
            seller_id: SellerId::new(),
            unit_price: dec(50000),
            quantity: 1,
        }];
        let pricing = price_order(&items, &config());
        assert_eq!(pricing.subtotal, dec(50000));
        assert_eq!(pricing.shipping, Decimal::ZERO);
    }

    #[test]
    fn multiple_rows_same_seller_merge() {
        let seller = SellerId::new();
        let items = [
            PricedItem {
                seller_id: seller,
                unit_price: dec(3000),
                quantity: 1,
            },
            PricedItem {
                seller_id: seller,
                unit_price: dec(2000),
                quantity: 2,
            },
        ];
        let pricing = price_order(&items, &config());
        assert_eq!(pricing.per_seller.len(), 1);
        assert_eq!(pricing.per_seller[0].subtotal, dec(7000));
        // 5% of 70.00 = 3.50
        assert_eq!(pricing.per_seller[0].commission, dec(350));
        assert_eq!(pricing.per_seller[0].net, dec(6650));
    }

    #[test]
    fn seller_nets_cover_subtotal_minus_commission() {
        let items: Vec<PricedItem> = (0..5)
            .map(|i| PricedItem {
                seller_id: SellerId::new(),
                unit_price: dec(3333 + i),
                quantity: 1,
            })
            .collect();
        let pricing = price_order(&items, &config());
        for seller in &pricing.per_seller {
            assert_eq!(seller.net, seller.subtotal - seller.commission);
        }
        let seller_sum: Decimal = pricing.per_seller.iter().map(|s| s.subtotal).sum();
        assert_eq!(seller_sum, pricing.subtotal);
    }

    #[test]
    fn deterministic() {
        let items = [PricedItem {
            seller_id: SellerId::new(),
            unit_price: dec(1999),
            quantity: 3,
        }];
        let a = price_order(&items, &config());
        let b = price_order(&items, &config());
        assert_eq!(a.total, b.total);
        assert_eq!(a.per_seller, b.per_seller);
    }

    #[test]
    fn empty_order_prices_to_shipping_only() {
        let pricing = price_order(&[], &config());
        assert_eq!(pricing.subtotal, Decimal::ZERO);
        assert_eq!(pricing.tax, Decimal::ZERO);
        // Below threshold, flat fee applies; the orchestrator rejects empty
        // orders before pricing.
        assert_eq!(pricing.shipping, dec(1000));
    }
}
