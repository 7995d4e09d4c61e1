//! System-wide policy defaults for the TrustHold settlement engine.

/// Default platform commission rate (percent of gross seller amount).
pub const DEFAULT_COMMISSION_RATE_PERCENT: u32 = 5;

/// Default flat tax rate (percent of order subtotal).
pub const DEFAULT_TAX_RATE_PERCENT: u32 = 8;

/// Orders with a subtotal at or above this threshold ship free.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: u32 = 500;

/// Flat shipping fee below the free-shipping threshold.
pub const DEFAULT_SHIPPING_FLAT_FEE: u32 = 10;

/// Default escrow hold period before funds are auto-release eligible.
pub const DEFAULT_HOLD_PERIOD_DAYS: i64 = 7;

/// Default return-eligibility window after delivery.
pub const DEFAULT_RETURN_WINDOW_DAYS: i64 = 14;

/// Reason string recorded when the scheduler releases funds.
pub const AUTO_RELEASE_REASON: &str = "auto_release";

/// Resource-type labels used in audit events.
pub const RESOURCE_ORDER: &str = "order";
pub const RESOURCE_ESCROW: &str = "escrow_transaction";
