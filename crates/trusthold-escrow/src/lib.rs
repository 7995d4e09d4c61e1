//! # trusthold-escrow
//!
//! **Escrow Plane**: the [`EscrowTransaction`] aggregate and its state
//! machine — holds, releases, refunds, cancellation, and dispute
//! resolution with proportional multi-seller splits.
//!
//! ## Architecture
//!
//! An escrow transaction is created synchronously inside the
//! order-creation transaction and never physically deleted; terminal
//! states are retained for audit. Its seller-entry set is immutable after
//! creation — only sub-statuses change. The aggregate status is always a
//! pure recomputation over entry statuses, never an independently-mutable
//! flag.
//!
//! ```text
//! open() ─► HELD ─┬─ release_funds(seller) ──► PARTIALLY_RELEASED ─► RELEASED
//!                 ├─ refund_to_buyer(full) ──► REFUNDED
//!                 ├─ create_dispute() ───────► DISPUTED ─ resolve ─► …
//!                 └─ cancel() ──────────────► CANCELLED (terminal)
//! ```
//!
//! Every mutating operation appends exactly one immutable activity-log
//! entry; retention is an explicit policy, unbounded by default.

pub mod dispute;
pub mod transaction;

pub use transaction::EscrowTransaction;
