//! Error types for the TrustHold escrow-settlement engine.
//!
//! All errors use the `TH_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Validation / pricing errors
//! - 3xx: Escrow errors
//! - 4xx: Dispute errors
//! - 5xx: Inventory / catalog errors
//! - 9xx: General / internal errors
//!
//! The API layer distinguishes four categories: validation (caller must
//! correct the input, never retried), not-found, invalid-state (carries the
//! current state so a benign race can be told apart from a bug), and
//! infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{EntryStatus, EscrowId, EscrowStatus, OrderId, ProductId, SellerId};

/// Central error enum for all TrustHold operations.
#[derive(Debug, Error)]
pub enum TrustHoldError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// The requested order was not found.
    #[error("TH_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order failed validation (no items, bad quantities, etc.).
    #[error("TH_ERR_101: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// No shipment sub-record exists for this seller on the order.
    #[error("TH_ERR_102: No shipment for seller {seller} on order {order}")]
    ShipmentNotFound { order: OrderId, seller: SellerId },

    // =================================================================
    // Validation / Pricing Errors (2xx)
    // =================================================================
    /// Malformed input or business-rule violation on a named field.
    #[error("TH_ERR_200: Validation failed on {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// A monetary amount is out of range for the operation.
    #[error("TH_ERR_201: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    // =================================================================
    // Escrow Errors (3xx)
    // =================================================================
    /// The requested escrow transaction was not found.
    #[error("TH_ERR_300: Escrow not found: {0}")]
    EscrowNotFound(EscrowId),

    /// No seller entry for this seller exists on the escrow.
    #[error("TH_ERR_301: No seller entry for {seller} on escrow {escrow}")]
    SellerEntryNotFound { escrow: EscrowId, seller: SellerId },

    /// The seller entry cannot make the requested transition.
    /// Carries the current status so callers can distinguish a benign
    /// race (already RELEASED) from a real bug.
    #[error("TH_ERR_302: Seller entry {seller} is {current}, cannot {attempted}")]
    InvalidEntryState {
        seller: SellerId,
        current: EntryStatus,
        attempted: &'static str,
    },

    /// The aggregate escrow status forbids the requested operation.
    #[error("TH_ERR_303: Escrow is {current}, cannot {attempted}")]
    InvalidEscrowState {
        current: EscrowStatus,
        attempted: &'static str,
    },

    /// A refund was requested for more than is still held.
    #[error("TH_ERR_304: Refund {requested} exceeds held total {held}")]
    RefundExceedsHeld { requested: Decimal, held: Decimal },

    /// Partial refunds against held, undisputed funds are rejected by
    /// policy — partial splits are only legal through dispute resolution.
    #[error("TH_ERR_305: Partial refund requires an open dispute")]
    PartialRefundRequiresDispute,

    /// Cancellation is only legal from HELD or DISPUTED.
    #[error("TH_ERR_306: Escrow is {current}, cannot cancel")]
    NotCancellable { current: EscrowStatus },

    // =================================================================
    // Dispute Errors (4xx)
    // =================================================================
    /// A dispute is already open on this escrow.
    #[error("TH_ERR_400: Dispute already open on escrow {0}")]
    DisputeAlreadyOpen(EscrowId),

    /// No open dispute exists to resolve.
    #[error("TH_ERR_401: No open dispute on escrow {0}")]
    DisputeNotOpen(EscrowId),

    /// The resolution decision is malformed (unknown kind, missing or
    /// out-of-range amount for partial_refund).
    #[error("TH_ERR_402: Invalid resolution decision: {reason}")]
    InvalidDecision { reason: String },

    // =================================================================
    // Inventory / Catalog Errors (5xx)
    // =================================================================
    /// The referenced product does not exist.
    #[error("TH_ERR_500: Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The product exists but is not active for sale.
    #[error("TH_ERR_501: Product not active: {0}")]
    ProductInactive(ProductId),

    /// Not enough stock for the requested quantity.
    #[error("TH_ERR_502: Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductId,
        requested: u32,
        available: u32,
    },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("TH_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Storage or other infrastructure unavailable mid-sequence.
    #[error("TH_ERR_901: Infrastructure error: {0}")]
    Infrastructure(String),

    /// The audit sink rejected an event. Never blocks the mutation.
    #[error("TH_ERR_902: Audit emission failed: {0}")]
    AuditEmitFailed(String),

    /// Serialization / deserialization error.
    #[error("TH_ERR_903: Serialization error: {0}")]
    Serialization(String),

    /// An escrow-conservation invariant was violated.
    #[error("TH_ERR_904: Conservation violation: {reason}")]
    ConservationViolation { reason: String },
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, TrustHoldError>;

// Conversion from std::io::Error
impl From<std::io::Error> for TrustHoldError {
    fn from(err: std::io::Error) -> Self {
        Self::Infrastructure(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for TrustHoldError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
