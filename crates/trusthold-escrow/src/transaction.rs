//! The escrow transaction aggregate and its non-dispute operations.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use trusthold_types::{
    ActivityEntry, ActorRef, BuyerId, Dispute, EntryStatus, EscrowId, EscrowNumber,
    EscrowPolicy, EscrowStatus, FeeSummary, LogRetention, OrderId, RefundEntry, Result, SellerEntry,
    SellerId, TrustHoldError,
};

/// Funds collected from a buyer, held in trust per seller, pending a
/// release trigger.
///
/// The entry set is fixed at creation. All mutation goes through the
/// operation methods, each of which appends one activity entry and
/// recomputes the derived aggregate status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowTransaction {
    pub id: EscrowId,
    pub escrow_number: EscrowNumber,
    pub order_id: OrderId,
    pub buyer_id: BuyerId,
    pub(crate) entries: Vec<SellerEntry>,
    /// Sum of all entry amounts at creation. Fixed for the lifetime of
    /// the transaction; partial splits reduce entries, not this.
    pub total_amount: Decimal,
    /// Derived — recomputed after every mutation.
    pub status: EscrowStatus,
    pub hold_period_days: i64,
    pub auto_release_at: DateTime<Utc>,
    pub dispute: Option<Dispute>,
    /// Append-only record of money returned to the buyer.
    pub refunds: Vec<RefundEntry>,
    activity: Vec<ActivityEntry>,
    retention: LogRetention,
    pub fees: FeeSummary,
    cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EscrowTransaction {
    /// Open a new escrow transaction holding the given seller entries.
    ///
    /// # Errors
    /// Returns `InvalidOrder` if no entry has a positive amount.
    pub fn open(
        order_id: OrderId,
        buyer_id: BuyerId,
        entries: Vec<SellerEntry>,
        policy: &EscrowPolicy,
        actor: ActorRef,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let entries: Vec<SellerEntry> = entries
            .into_iter()
            .filter(|e| e.amount > Decimal::ZERO)
            .collect();
        if entries.is_empty() {
            return Err(TrustHoldError::InvalidOrder {
                reason: "escrow requires at least one seller entry with a positive amount".into(),
            });
        }

        let id = EscrowId::new();
        let total_amount: Decimal = entries.iter().map(|e| e.amount).sum();
        let commission_total: Decimal = entries.iter().map(|e| e.commission).sum();

        let mut tx = Self {
            id,
            escrow_number: EscrowNumber::generate(id),
            order_id,
            buyer_id,
            entries,
            total_amount,
            status: EscrowStatus::Held,
            hold_period_days: policy.hold_period_days,
            auto_release_at: now + Duration::days(policy.hold_period_days),
            dispute: None,
            refunds: Vec::new(),
            activity: Vec::new(),
            retention: policy.activity_log_retention,
            fees: FeeSummary { commission_total },
            cancelled: false,
            created_at: now,
            updated_at: now,
        };
        tx.log_activity("escrow_opened", actor, Some(format!("total {total_amount}")), now);
        Ok(tx)
    }

    // -----------------------------------------------------------------
    // Read side
    // -----------------------------------------------------------------

    /// The fixed seller-entry set.
    #[must_use]
    pub fn entries(&self) -> &[SellerEntry] {
        &self.entries
    }

    /// The entry for one seller, if present.
    #[must_use]
    pub fn entry(&self, seller_id: SellerId) -> Option<&SellerEntry> {
        self.entries.iter().find(|e| e.seller_id == seller_id)
    }

    /// The escrow's own append-only activity log.
    #[must_use]
    pub fn activity(&self) -> &[ActivityEntry] {
        &self.activity
    }

    /// Sum of amounts still in plain HELD state.
    #[must_use]
    pub fn held_total(&self) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.status == EntryStatus::Held)
            .map(|e| e.amount)
            .sum()
    }

    /// Sum of amounts not yet terminal (HELD or DISPUTED).
    #[must_use]
    pub fn open_total(&self) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.status.is_open())
            .map(|e| e.amount)
            .sum()
    }

    /// Cumulative net paid out to sellers so far.
    #[must_use]
    pub fn released_net_total(&self) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.status == EntryStatus::Released)
            .map(|e| e.net_amount)
            .sum()
    }

    /// Whether a dispute is currently open.
    #[must_use]
    pub fn has_open_dispute(&self) -> bool {
        self.dispute.as_ref().is_some_and(Dispute::is_open)
    }

    /// Whether the scheduler should consider this escrow at `now`:
    /// the hold period has elapsed, at least one entry is still plain
    /// HELD, and no dispute is freezing the funds.
    #[must_use]
    pub fn is_auto_release_due(&self, now: DateTime<Utc>) -> bool {
        self.auto_release_at <= now
            && !self.has_open_dispute()
            && self.held_total() > Decimal::ZERO
    }

    // -----------------------------------------------------------------
    // Derived status
    // -----------------------------------------------------------------

    /// Pure recomputation of the aggregate status from the entry statuses.
    #[must_use]
    fn derived_status(&self) -> EscrowStatus {
        if self.cancelled {
            return EscrowStatus::Cancelled;
        }
        if self.has_open_dispute()
            && self.entries.iter().any(|e| e.status == EntryStatus::Disputed)
        {
            return EscrowStatus::Disputed;
        }
        if self.entries.iter().all(|e| e.status == EntryStatus::Held) {
            return EscrowStatus::Held;
        }
        if self.entries.iter().all(|e| e.status == EntryStatus::Released) {
            return EscrowStatus::Released;
        }
        if self.entries.iter().all(|e| e.status == EntryStatus::Refunded) {
            return EscrowStatus::Refunded;
        }
        // Mixed outcomes, with or without remaining held entries.
        EscrowStatus::PartiallyReleased
    }

    pub(crate) fn recompute(&mut self, now: DateTime<Utc>) {
        self.status = self.derived_status();
        self.fees.commission_total = self.entries.iter().map(|e| e.commission).sum();
        self.updated_at = now;
    }

    pub(crate) fn log_activity(
        &mut self,
        action: &str,
        actor: ActorRef,
        detail: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.activity.push(ActivityEntry {
            action: action.to_string(),
            actor,
            detail,
            at: now,
        });
        self.retention.apply(&mut self.activity);
    }

    pub(crate) fn entry_mut(&mut self, seller_id: SellerId) -> Result<&mut SellerEntry> {
        let escrow = self.id;
        self.entries
            .iter_mut()
            .find(|e| e.seller_id == seller_id)
            .ok_or(TrustHoldError::SellerEntryNotFound {
                escrow,
                seller: seller_id,
            })
    }

    pub(crate) fn open_entries_mut(&mut self) -> impl Iterator<Item = &mut SellerEntry> {
        self.entries.iter_mut().filter(|e| e.status.is_open())
    }

    // -----------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------

    /// Release one seller's held funds.
    ///
    /// Not idempotent-success: a repeated call fails with
    /// `InvalidEntryState` rather than silently succeeding — the guard
    /// against double payout on retried calls.
    ///
    /// # Errors
    /// - `InvalidEscrowState` while a dispute is open
    /// - `SellerEntryNotFound` if the seller has no entry
    /// - `InvalidEntryState` if the entry is not HELD
    pub fn release_funds(
        &mut self,
        seller_id: SellerId,
        actor: ActorRef,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.has_open_dispute() {
            return Err(TrustHoldError::InvalidEscrowState {
                current: self.status,
                attempted: "release",
            });
        }
        let reason = reason.into();
        self.entry_mut(seller_id)?
            .mark_released(actor.clone(), reason.clone(), now)?;
        tracing::info!(escrow = %self.id, seller = %seller_id, %reason, "funds released");
        self.log_activity(
            "funds_released",
            actor,
            Some(format!("seller {seller_id}: {reason}")),
            now,
        );
        self.recompute(now);
        Ok(())
    }

    /// Refund held funds to the buyer outside of a dispute.
    ///
    /// Only a full refund of `total_amount` is legal here: partial splits
    /// go through dispute resolution.
    ///
    /// # Errors
    /// - `InvalidEscrowState` while a dispute is open
    /// - `InvalidAmount` for non-positive amounts
    /// - `RefundExceedsHeld` if more than the held total is requested
    /// - `PartialRefundRequiresDispute` for any other partial amount
    pub fn refund_to_buyer(
        &mut self,
        amount: Decimal,
        reason: impl Into<String>,
        method: impl Into<String>,
        actor: ActorRef,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.has_open_dispute() {
            return Err(TrustHoldError::InvalidEscrowState {
                current: self.status,
                attempted: "refund",
            });
        }
        if amount <= Decimal::ZERO {
            return Err(TrustHoldError::InvalidAmount {
                reason: format!("refund amount must be positive, got {amount}"),
            });
        }
        let held = self.held_total();
        if amount > held {
            return Err(TrustHoldError::RefundExceedsHeld {
                requested: amount,
                held,
            });
        }
        if amount != self.total_amount {
            return Err(TrustHoldError::PartialRefundRequiresDispute);
        }

        let reason = reason.into();
        for entry in self.open_entries_mut() {
            entry.mark_refunded(actor.clone(), reason.clone(), now)?;
        }
        self.refunds.push(RefundEntry {
            amount,
            reason: reason.clone(),
            method: method.into(),
            actor: actor.clone(),
            at: now,
        });
        tracing::info!(escrow = %self.id, %amount, %reason, "refunded to buyer");
        self.log_activity("refunded_to_buyer", actor, Some(format!("{amount}: {reason}")), now);
        self.recompute(now);
        Ok(())
    }

    /// Open a dispute, freezing every still-held entry.
    ///
    /// # Errors
    /// - `DisputeAlreadyOpen` if one is open
    /// - `InvalidEscrowState` unless the aggregate is HELD or
    ///   PARTIALLY_RELEASED with at least one held entry
    pub fn create_dispute(
        &mut self,
        reason: impl Into<String>,
        description: impl Into<String>,
        actor: ActorRef,
        evidence: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.has_open_dispute() {
            return Err(TrustHoldError::DisputeAlreadyOpen(self.id));
        }
        if !matches!(
            self.status,
            EscrowStatus::Held | EscrowStatus::PartiallyReleased
        ) || self.held_total() == Decimal::ZERO
        {
            return Err(TrustHoldError::InvalidEscrowState {
                current: self.status,
                attempted: "dispute",
            });
        }

        for entry in &mut self.entries {
            if entry.is_held() {
                entry.mark_disputed()?;
            }
        }
        let reason = reason.into();
        // A resolved prior dispute is superseded; its history lives in the
        // activity log.
        self.dispute = Some(Dispute::open(
            reason.clone(),
            description,
            actor.clone(),
            evidence,
            now,
        ));
        tracing::info!(escrow = %self.id, %reason, "dispute opened");
        self.log_activity("dispute_opened", actor, Some(reason), now);
        self.recompute(now);
        Ok(())
    }

    /// Administrative cancellation. Legal only from HELD or DISPUTED;
    /// still-held funds return to the buyer. Terminal.
    ///
    /// # Errors
    /// Returns `NotCancellable` from any other aggregate state.
    pub fn cancel(
        &mut self,
        actor: ActorRef,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !matches!(self.status, EscrowStatus::Held | EscrowStatus::Disputed) {
            return Err(TrustHoldError::NotCancellable {
                current: self.status,
            });
        }
        let reason = reason.into();
        let returned = self.open_total();
        for entry in self.open_entries_mut() {
            entry.mark_refunded(actor.clone(), reason.clone(), now)?;
        }
        if returned > Decimal::ZERO {
            self.refunds.push(RefundEntry {
                amount: returned,
                reason: reason.clone(),
                method: "original_payment".to_string(),
                actor: actor.clone(),
                at: now,
            });
        }
        self.cancelled = true;
        tracing::info!(escrow = %self.id, %returned, %reason, "escrow cancelled");
        self.log_activity("escrow_cancelled", actor, Some(reason), now);
        self.recompute(now);
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl EscrowTransaction {
    /// A two-seller escrow: 100.00 at 5.00 commission, 50.00 at 2.50.
    pub fn dummy_two_seller(a: SellerId, b: SellerId) -> Self {
        Self::open(
            OrderId::new(),
            BuyerId::new(),
            vec![
                SellerEntry::new(a, Decimal::new(10000, 2), Decimal::new(500, 2)),
                SellerEntry::new(b, Decimal::new(5000, 2), Decimal::new(250, 2)),
            ],
            &EscrowPolicy::default(),
            ActorRef::system(),
            Utc::now(),
        )
        .expect("dummy escrow is valid")
    }
}
