//! # trusthold-settlement
//!
//! **Settlement Plane**: the orchestration layer over inventory, pricing,
//! orders, and escrow.
//!
//! - [`SettlementService`] — order-creation saga (reserve → price →
//!   persist → open escrow, with compensating stock restore), the escrow
//!   operation surface, and delivery confirmation
//! - [`stores`] — thread-safe in-memory stores; escrow mutations are
//!   serialized through [`stores::EscrowStore::with_escrow_mut`]
//! - the auto-release sweep ([`SettlementService::run_auto_release`]),
//!   gated on per-seller delivery
//! - [`ConservationCheck`] — the money-conservation sweep
//!
//! Every successful mutating operation emits exactly one audit event
//! through the configured [`trusthold_types::AuditSink`].

pub mod conservation;
pub mod orchestrator;
pub mod scheduler;
pub mod stores;

pub use conservation::{ConservationCheck, ConservationReport};
pub use orchestrator::{NewOrder, OrderItemRequest, SettlementService};
pub use scheduler::SweepReport;
