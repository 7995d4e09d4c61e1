//! The auto-release sweep: release held funds whose hold period has
//! elapsed, but only for sellers whose shipment the order shows as
//! delivered.
//!
//! The sweep is an externally triggered pass over candidates, not a
//! resident timer. Candidate selection is a lock-free snapshot, so every
//! candidate is re-checked under the escrow lock before any release — a
//! dispute or manual operation landing between query and lock simply
//! drops the candidate. Running the sweep twice over the same instant
//! is harmless.

use chrono::{DateTime, Utc};
use serde_json::json;

use trusthold_types::{
    audit::emit, constants, ActorRef, AuditEvent, EscrowId, SellerId,
};

use crate::orchestrator::SettlementService;

/// What one sweep did.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Escrows in which at least one entry was auto-released.
    pub released: Vec<EscrowId>,
    /// Escrows past their hold period that still have undelivered
    /// shipments; their entries stay held until delivery.
    pub flagged_undelivered: Vec<EscrowId>,
    /// Escrows the sweep could not process, with the failure text.
    pub failed: Vec<(EscrowId, String)>,
}

impl SettlementService {
    /// Run one auto-release pass at `now`.
    pub fn run_auto_release(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        let candidates = self.escrows().held_due(now);
        tracing::debug!(candidates = candidates.len(), "auto-release sweep started");

        for escrow_id in candidates {
            // Delivery state comes from the order, outside the escrow lock.
            let Some(snapshot) = self.escrows().get(escrow_id) else {
                continue;
            };
            let Some(order) = self.orders().order(snapshot.order_id) else {
                report
                    .failed
                    .push((escrow_id, format!("order {} not found", snapshot.order_id)));
                continue;
            };
            let delivered: Vec<SellerId> = order
                .shipments
                .iter()
                .filter(|s| s.is_delivered())
                .map(|s| s.seller_id)
                .collect();

            let outcome = self.escrows().with_escrow_mut(escrow_id, |tx| {
                // The candidate query is stale by design; re-check here.
                if !tx.is_auto_release_due(now) {
                    return Ok((Vec::new(), false));
                }
                let eligible: Vec<SellerId> = tx
                    .entries()
                    .iter()
                    .filter(|e| e.is_held() && delivered.contains(&e.seller_id))
                    .map(|e| e.seller_id)
                    .collect();
                for seller_id in &eligible {
                    tx.release_funds(
                        *seller_id,
                        ActorRef::system(),
                        constants::AUTO_RELEASE_REASON,
                        now,
                    )?;
                }
                let held_back = tx.entries().iter().any(trusthold_types::SellerEntry::is_held);
                Ok((eligible, held_back))
            });

            match outcome {
                Ok((released_sellers, held_back)) => {
                    if !released_sellers.is_empty() {
                        emit(
                            self.audit_sink(),
                            AuditEvent::new(
                                ActorRef::system(),
                                "escrow_auto_released",
                                constants::RESOURCE_ESCROW,
                                escrow_id.to_string(),
                                now,
                            )
                            .with_after(json!({
                                "sellers": released_sellers
                                    .iter()
                                    .map(ToString::to_string)
                                    .collect::<Vec<_>>(),
                            })),
                        );
                        report.released.push(escrow_id);
                    }
                    if held_back {
                        tracing::info!(
                            escrow = %escrow_id,
                            "hold period elapsed but shipments undelivered; entries stay held"
                        );
                        report.flagged_undelivered.push(escrow_id);
                    }
                }
                Err(err) => {
                    tracing::warn!(escrow = %escrow_id, %err, "auto-release failed");
                    report.failed.push((escrow_id, err.to_string()));
                }
            }
        }

        tracing::info!(
            released = report.released.len(),
            flagged = report.flagged_undelivered.len(),
            failed = report.failed.len(),
            "auto-release sweep finished"
        );
        report
    }
}
