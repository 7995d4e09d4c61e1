//! Marketplace policy configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, escrow::LogRetention};

/// Shipping policy: free above a subtotal threshold, else a flat fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingPolicy {
    pub free_threshold: Decimal,
    pub flat_fee: Decimal,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_threshold: Decimal::from(constants::DEFAULT_FREE_SHIPPING_THRESHOLD),
            flat_fee: Decimal::from(constants::DEFAULT_SHIPPING_FLAT_FEE),
        }
    }
}

/// Escrow hold and retention policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowPolicy {
    /// Days held funds wait before becoming auto-release eligible.
    pub hold_period_days: i64,
    /// Days after delivery during which a line item is return-eligible.
    pub return_window_days: i64,
    /// Retention policy for the escrow activity log. Unbounded by default:
    /// this log is the audit trail and is never truncated unless a
    /// deployment explicitly opts into a cap.
    pub activity_log_retention: LogRetention,
}

impl Default for EscrowPolicy {
    fn default() -> Self {
        Self {
            hold_period_days: constants::DEFAULT_HOLD_PERIOD_DAYS,
            return_window_days: constants::DEFAULT_RETURN_WINDOW_DAYS,
            activity_log_retention: LogRetention::Unbounded,
        }
    }
}

/// Top-level marketplace configuration handed to the settlement service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    /// Platform commission, percent of each seller's gross amount.
    pub commission_rate_percent: Decimal,
    pub shipping: ShippingPolicy,
    /// Flat tax rate, percent of the order subtotal.
    pub tax_rate_percent: Decimal,
    pub escrow: EscrowPolicy,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            commission_rate_percent: Decimal::from(constants::DEFAULT_COMMISSION_RATE_PERCENT),
            shipping: ShippingPolicy::default(),
            tax_rate_percent: Decimal::from(constants::DEFAULT_TAX_RATE_PERCENT),
            escrow: EscrowPolicy::default(),
        }
    }
}
