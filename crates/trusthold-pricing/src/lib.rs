//! # trusthold-pricing
//!
//! **Pricing Plane**: pure money/commission computation for marketplace
//! orders — zero side effects, fully deterministic.
//!
//! ## Architecture
//!
//! The calculator sits between the catalog and the settlement orchestrator:
//! it takes priced item rows and the marketplace policy and produces every
//! monetary figure an order and its escrow need:
//!
//! ```text
//! items + policy → price_order() → OrderPricing
//!                                    ├── per-item totals
//!                                    ├── per-seller subtotal / commission / net
//!                                    └── order subtotal / shipping / tax / total
//! ```
//!
//! All outputs are recomputed from source fields on every call and rounded
//! to 2 decimal places — never mutated incrementally.

pub mod calculator;

pub use calculator::{line_total, price_order, OrderPricing, PricedItem, SellerTotals};
