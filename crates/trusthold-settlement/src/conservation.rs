//! Conservation sweep: prove that no money has been created or destroyed.
//!
//! For every escrow, the released entry amounts plus the recorded buyer
//! refunds plus the still-open amounts must equal the original total.
//! Every refund path (full refund, dispute resolution, cancellation)
//! records a `RefundEntry`, so refunded entries themselves count zero.

use rust_decimal::Decimal;

use trusthold_escrow::EscrowTransaction;
use trusthold_types::{EntryStatus, Result, TrustHoldError};

use crate::orchestrator::SettlementService;

/// Summary of one full sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConservationReport {
    pub escrows_checked: usize,
    pub orders_checked: usize,
}

/// Consistency checker over a whole service instance.
pub struct ConservationCheck;

impl ConservationCheck {
    /// Verify every escrow and order in the service.
    ///
    /// # Errors
    /// `ConservationViolation` naming the first inconsistency found.
    pub fn verify(service: &SettlementService) -> Result<ConservationReport> {
        let escrows = service.escrows().all();
        let orders = service.orders().all_orders();

        for tx in &escrows {
            Self::verify_escrow(tx)?;

            let order = orders.iter().find(|o| o.id == tx.order_id).ok_or_else(|| {
                TrustHoldError::ConservationViolation {
                    reason: format!("escrow {} references missing order {}", tx.id, tx.order_id),
                }
            })?;
            if order.escrow_id != Some(tx.id) {
                return Err(TrustHoldError::ConservationViolation {
                    reason: format!(
                        "order {} does not point back at escrow {}",
                        order.id, tx.id
                    ),
                });
            }
        }

        for order in &orders {
            if !order.totals.is_consistent() {
                return Err(TrustHoldError::ConservationViolation {
                    reason: format!("order {} totals drifted from their parts", order.id),
                });
            }
            let Some(escrow_id) = order.escrow_id else {
                return Err(TrustHoldError::ConservationViolation {
                    reason: format!("order {} has no escrow", order.id),
                });
            };
            if !escrows.iter().any(|tx| tx.id == escrow_id) {
                return Err(TrustHoldError::ConservationViolation {
                    reason: format!("order {} references missing escrow {escrow_id}", order.id),
                });
            }
        }

        tracing::debug!(
            escrows = escrows.len(),
            orders = orders.len(),
            "conservation sweep clean"
        );
        Ok(ConservationReport {
            escrows_checked: escrows.len(),
            orders_checked: orders.len(),
        })
    }

    /// The per-escrow invariants.
    ///
    /// # Errors
    /// `ConservationViolation` naming the first inconsistency found.
    pub fn verify_escrow(tx: &EscrowTransaction) -> Result<()> {
        for entry in tx.entries() {
            if entry.net_amount + entry.commission != entry.amount {
                return Err(TrustHoldError::ConservationViolation {
                    reason: format!(
                        "escrow {} seller {}: net {} + commission {} != amount {}",
                        tx.id, entry.seller_id, entry.net_amount, entry.commission, entry.amount
                    ),
                });
            }
        }

        let released: Decimal = tx
            .entries()
            .iter()
            .filter(|e| e.status == EntryStatus::Released)
            .map(|e| e.amount)
            .sum();
        let refunded: Decimal = tx.refunds.iter().map(|r| r.amount).sum();
        let open = tx.open_total();

        if released + refunded + open != tx.total_amount {
            return Err(TrustHoldError::ConservationViolation {
                reason: format!(
                    "escrow {}: released {released} + refunded {refunded} + open {open} != total {}",
                    tx.id, tx.total_amount
                ),
            });
        }
        Ok(())
    }
}
