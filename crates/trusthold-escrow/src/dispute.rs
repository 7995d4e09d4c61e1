//! Dispute resolution: buyer favor, seller favor, and proportional
//! partial splits across the sellers of one order.
//!
//! Partial-split arithmetic is exact: amounts are computed in `Decimal`,
//! rounded to cents, and the rounding remainder is assigned
//! deterministically to the entry with the largest original share, so
//! refunded + released always sums to the disputed pool.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use trusthold_types::{
    money::round_money, ActorRef, DisputeDecision, RefundEntry, Resolution, Result, TrustHoldError,
};

use crate::transaction::EscrowTransaction;

impl EscrowTransaction {
    /// Close the open dispute with a decision.
    ///
    /// - `BuyerFavor`: the full disputed pool is refunded; every
    ///   non-terminal entry → REFUNDED.
    /// - `SellerFavor`: every non-terminal entry released in full.
    /// - `PartialRefund`: `amount` goes back to the buyer; the remainder
    ///   is distributed to non-terminal entries proportionally to their
    ///   original share, commission scaled pro-rata, then released.
    ///   `amount == 0` is equivalent to `SellerFavor`; `amount` equal to
    ///   the disputed pool is equivalent to `BuyerFavor`.
    ///
    /// # Errors
    /// - `DisputeNotOpen` if no dispute is open
    /// - `InvalidDecision` if `amount` is missing or out of range for
    ///   `PartialRefund`
    pub fn resolve_dispute(
        &mut self,
        decision: DisputeDecision,
        amount: Option<Decimal>,
        actor: ActorRef,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !self.has_open_dispute() {
            return Err(TrustHoldError::DisputeNotOpen(self.id));
        }

        let pool = self.open_total();
        let refund_amount = match decision {
            DisputeDecision::BuyerFavor => {
                self.refund_pool(pool, "dispute_buyer_favor", &actor, now)?;
                pool
            }
            DisputeDecision::SellerFavor => {
                self.release_pool("dispute_seller_favor", &actor, now)?;
                Decimal::ZERO
            }
            DisputeDecision::PartialRefund => {
                let amount = amount.ok_or_else(|| TrustHoldError::InvalidDecision {
                    reason: "partial_refund requires an amount".into(),
                })?;
                if amount < Decimal::ZERO || amount > pool {
                    return Err(TrustHoldError::InvalidDecision {
                        reason: format!("partial_refund amount {amount} outside [0, {pool}]"),
                    });
                }
                if amount == pool {
                    self.refund_pool(pool, "dispute_partial_refund", &actor, now)?;
                } else if amount == Decimal::ZERO {
                    self.release_pool("dispute_partial_refund", &actor, now)?;
                } else {
                    self.split_pool(pool, amount, &actor, now)?;
                }
                amount
            }
        };

        let resolution = Resolution {
            decision,
            refund_amount,
            resolved_by: actor.clone(),
            notes,
            resolved_at: now,
        };
        if let Some(dispute) = self.dispute.as_mut() {
            dispute.resolution = Some(resolution);
        }
        tracing::info!(
            escrow = %self.id, %decision, %refund_amount, "dispute resolved"
        );
        self.log_activity(
            "dispute_resolved",
            actor,
            Some(format!("{decision}: refunded {refund_amount}")),
            now,
        );
        self.recompute(now);
        Ok(())
    }

    /// Refund the whole disputed pool to the buyer.
    fn refund_pool(
        &mut self,
        pool: Decimal,
        reason: &str,
        actor: &ActorRef,
        now: DateTime<Utc>,
    ) -> Result<()> {
        for entry in self.open_entries_mut() {
            entry.mark_refunded(actor.clone(), reason, now)?;
        }
        self.refunds.push(RefundEntry {
            amount: pool,
            reason: reason.to_string(),
            method: "original_payment".to_string(),
            actor: actor.clone(),
            at: now,
        });
        Ok(())
    }

    /// Release every non-terminal entry in full.
    fn release_pool(&mut self, reason: &str, actor: &ActorRef, now: DateTime<Utc>) -> Result<()> {
        for entry in self.open_entries_mut() {
            entry.mark_released(actor.clone(), reason, now)?;
        }
        Ok(())
    }

    /// Refund `amount` to the buyer and distribute `pool − amount` to the
    /// non-terminal entries proportionally to their original amounts.
    fn split_pool(
        &mut self,
        pool: Decimal,
        amount: Decimal,
        actor: &ActorRef,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let remaining = pool - amount;

        let open_idx: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.status.is_open())
            .map(|(i, _)| i)
            .collect();

        let mut reduced: Vec<Decimal> = open_idx
            .iter()
            .map(|&i| round_money(remaining * self.entries[i].amount / pool))
            .collect();

        // Assign the rounding remainder to the largest original share
        // (first on ties) so the split sums exactly.
        let assigned: Decimal = reduced.iter().copied().sum();
        let remainder = remaining - assigned;
        if remainder != Decimal::ZERO {
            let mut largest = 0;
            for (pos, &i) in open_idx.iter().enumerate() {
                if self.entries[i].amount > self.entries[open_idx[largest]].amount {
                    largest = pos;
                }
            }
            reduced[largest] = round_money(reduced[largest] + remainder);
        }

        for (pos, &i) in open_idx.iter().enumerate() {
            let entry = &mut self.entries[i];
            let original = entry.amount;
            let share = reduced[pos];
            // Commission scales pro-rata with the reduced share.
            entry.commission = round_money(entry.commission * share / original);
            entry.amount = share;
            entry.net_amount = share - entry.commission;
            entry.mark_released(actor.clone(), "dispute_partial_refund", now)?;
        }

        self.refunds.push(RefundEntry {
            amount,
            reason: "dispute_partial_refund".to_string(),
            method: "original_payment".to_string(),
            actor: actor.clone(),
            at: now,
        });
        Ok(())
    }
}
