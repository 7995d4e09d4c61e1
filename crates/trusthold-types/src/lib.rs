//! # trusthold-types
//!
//! Shared types, errors, and configuration for the **TrustHold** marketplace
//! escrow-settlement engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`EscrowId`], [`LineItemId`], [`ProductId`], [`SellerId`], [`BuyerId`], [`DisputeId`]
//! - **Numbers & tokens**: [`OrderNumber`], [`EscrowNumber`], [`BuyerToken`]
//! - **Actors**: [`ActorKind`], [`ActorRef`] — the tagged "performed by" reference
//! - **Catalog slice**: [`Product`]
//! - **Order model**: [`Order`], [`OrderStatus`], [`SellerShipment`], [`DeliveryStatus`], [`OrderTotals`]
//! - **Line-item model**: [`LineItem`], [`ProductSnapshot`], [`PriceBreakdown`], [`CommissionInfo`]
//! - **Escrow entry model**: [`SellerEntry`], [`EntryStatus`], [`EscrowStatus`], [`Dispute`], [`Resolution`]
//! - **Audit model**: [`AuditEvent`], [`AuditSink`]
//! - **Configuration**: [`MarketplaceConfig`], [`ShippingPolicy`], [`EscrowPolicy`]
//! - **Errors**: [`TrustHoldError`] with `TH_ERR_` prefix codes
//! - **Constants**: policy defaults and action names

pub mod actor;
pub mod audit;
pub mod config;
pub mod constants;
pub mod error;
pub mod escrow;
pub mod ids;
pub mod line_item;
pub mod money;
pub mod order;
pub mod product;

// Re-export all primary types at crate root for ergonomic imports:
//   use trusthold_types::{Order, SellerEntry, EscrowStatus, ...};

pub use actor::*;
pub use audit::*;
pub use config::*;
pub use error::*;
pub use escrow::*;
pub use ids::*;
pub use line_item::*;
pub use money::*;
pub use order::*;
pub use product::*;

// Constants are accessed via `trusthold_types::constants::FOO`
// (not re-exported to avoid name collisions).
