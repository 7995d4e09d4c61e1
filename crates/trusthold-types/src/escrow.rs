//! # Seller entries — the per-seller slice of an escrowed order
//!
//! Each multi-seller order holds one [`SellerEntry`] per seller. The entry
//! set is immutable after creation: entries are never added or removed,
//! only their sub-status changes.
//!
//! ## State Machine
//!
//! ```text
//!              ┌──────────┐
//!    ┌────────▶│ RELEASED │
//!    │         └──────────┘
//! ┌──┴───┐          ▲
//! │ HELD ├──────────┤ resolution
//! └──┬───┘     ┌────┴─────┐
//!    │ dispute │ DISPUTED │
//!    │         └────┬─────┘
//!    │              │ resolution
//!    │         ┌────▼─────┐
//!    └────────▶│ REFUNDED │
//!              └──────────┘
//! ```
//!
//! RELEASED and REFUNDED are terminal. A repeated release fails explicitly
//! rather than silently succeeding — the guard against double payout on
//! retried calls.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ActorRef, DisputeId, Result, SellerId, TrustHoldError};

/// Lifecycle state of one seller entry.
///
/// Transitions are **monotonic** (never go backwards):
/// - `Held → Released | Refunded | Disputed`
/// - `Disputed → Released | Refunded` (only through resolution)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryStatus {
    /// Funds collected from the buyer, not yet paid out.
    Held,
    /// Paid out to the seller. **Irreversible.**
    Released,
    /// Returned to the buyer. **Irreversible.**
    Refunded,
    /// Frozen under an open dispute; plain release/refund blocked.
    Disputed,
}

impl EntryStatus {
    /// Can this entry transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Held, Self::Released | Self::Refunded | Self::Disputed)
                | (Self::Disputed, Self::Released | Self::Refunded)
        )
    }

    /// Whether money is still held behind this status.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Held | Self::Disputed)
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Held => write!(f, "HELD"),
            Self::Released => write!(f, "RELEASED"),
            Self::Refunded => write!(f, "REFUNDED"),
            Self::Disputed => write!(f, "DISPUTED"),
        }
    }
}

/// Aggregate status of an escrow transaction — a pure function of its
/// entry statuses (plus the sticky administrative `Cancelled`), recomputed
/// after every mutation, never an independently-mutable cached flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowStatus {
    Held,
    PartiallyReleased,
    Released,
    Refunded,
    Disputed,
    Cancelled,
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Held => write!(f, "HELD"),
            Self::PartiallyReleased => write!(f, "PARTIALLY_RELEASED"),
            Self::Released => write!(f, "RELEASED"),
            Self::Refunded => write!(f, "REFUNDED"),
            Self::Disputed => write!(f, "DISPUTED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Release/refund metadata stamped onto an entry when it leaves `Held`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub at: DateTime<Utc>,
    pub actor: ActorRef,
    pub reason: String,
}

/// One seller's held slice of an escrow transaction.
///
/// Invariant: `net_amount = amount − commission`, maintained by every
/// mutation path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerEntry {
    pub seller_id: SellerId,
    /// Gross amount held for this seller.
    pub amount: Decimal,
    /// Platform commission deducted on release.
    pub commission: Decimal,
    /// Seller payout after commission.
    pub net_amount: Decimal,
    pub status: EntryStatus,
    pub release: Option<ReleaseInfo>,
}

impl SellerEntry {
    #[must_use]
    pub fn new(seller_id: SellerId, amount: Decimal, commission: Decimal) -> Self {
        Self {
            seller_id,
            amount,
            commission,
            net_amount: amount - commission,
            status: EntryStatus::Held,
            release: None,
        }
    }

    fn transition(
        &mut self,
        target: EntryStatus,
        attempted: &'static str,
        release: Option<ReleaseInfo>,
    ) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(TrustHoldError::InvalidEntryState {
                seller: self.seller_id,
                current: self.status,
                attempted,
            });
        }
        self.status = target;
        if release.is_some() {
            self.release = release;
        }
        Ok(())
    }

    /// Release this entry to the seller.
    ///
    /// # Errors
    /// Returns `InvalidEntryState` unless the entry is HELD or DISPUTED.
    pub fn mark_released(
        &mut self,
        actor: ActorRef,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.transition(
            EntryStatus::Released,
            "release",
            Some(ReleaseInfo {
                at: now,
                actor,
                reason: reason.into(),
            }),
        )
    }

    /// Refund this entry to the buyer.
    ///
    /// # Errors
    /// Returns `InvalidEntryState` unless the entry is HELD or DISPUTED.
    pub fn mark_refunded(
        &mut self,
        actor: ActorRef,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.transition(
            EntryStatus::Refunded,
            "refund",
            Some(ReleaseInfo {
                at: now,
                actor,
                reason: reason.into(),
            }),
        )
    }

    /// Freeze this entry under a dispute.
    ///
    /// # Errors
    /// Returns `InvalidEntryState` unless the entry is HELD.
    pub fn mark_disputed(&mut self) -> Result<()> {
        self.transition(EntryStatus::Disputed, "dispute", None)
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.status == EntryStatus::Held
    }
}

// ---------------------------------------------------------------------------
// Disputes
// ---------------------------------------------------------------------------

/// The three legal resolution decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeDecision {
    BuyerFavor,
    SellerFavor,
    PartialRefund,
}

impl std::fmt::Display for DisputeDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuyerFavor => write!(f, "buyer_favor"),
            Self::SellerFavor => write!(f, "seller_favor"),
            Self::PartialRefund => write!(f, "partial_refund"),
        }
    }
}

impl std::str::FromStr for DisputeDecision {
    type Err = TrustHoldError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "buyer_favor" => Ok(Self::BuyerFavor),
            "seller_favor" => Ok(Self::SellerFavor),
            "partial_refund" => Ok(Self::PartialRefund),
            other => Err(TrustHoldError::InvalidDecision {
                reason: format!("unknown decision kind: {other}"),
            }),
        }
    }
}

/// How an open dispute was closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub decision: DisputeDecision,
    /// Amount refunded to the buyer under this resolution.
    pub refund_amount: Decimal,
    pub resolved_by: ActorRef,
    pub notes: Option<String>,
    pub resolved_at: DateTime<Utc>,
}

/// A dispute raised against an escrow transaction. Open while
/// `resolution` is `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub id: DisputeId,
    pub reason: String,
    pub description: String,
    pub raised_by: ActorRef,
    pub evidence: Vec<String>,
    pub opened_at: DateTime<Utc>,
    pub resolution: Option<Resolution>,
}

impl Dispute {
    #[must_use]
    pub fn open(
        reason: impl Into<String>,
        description: impl Into<String>,
        raised_by: ActorRef,
        evidence: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DisputeId::new(),
            reason: reason.into(),
            description: description.into(),
            raised_by,
            evidence,
            opened_at: now,
            resolution: None,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.resolution.is_none()
    }
}

// ---------------------------------------------------------------------------
// Refund and activity records
// ---------------------------------------------------------------------------

/// Append-only record of money returned to the buyer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundEntry {
    pub amount: Decimal,
    pub reason: String,
    pub method: String,
    pub actor: ActorRef,
    pub at: DateTime<Utc>,
}

/// One immutable entry of the escrow's own activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub action: String,
    pub actor: ActorRef,
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

/// Retention policy for the activity log. `Unbounded` preserves the full
/// audit trail; `Capped` keeps only the most recent `n` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogRetention {
    Unbounded,
    Capped(usize),
}

impl LogRetention {
    /// Apply the policy to a log, trimming the oldest entries if capped.
    pub fn apply(self, log: &mut Vec<ActivityEntry>) {
        if let Self::Capped(max) = self {
            if log.len() > max {
                log.drain(..log.len() - max);
            }
        }
    }
}

/// Aggregated platform fees on an escrow transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeSummary {
    pub commission_total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> SellerEntry {
        SellerEntry::new(SellerId::new(), Decimal::new(10000, 2), Decimal::new(500, 2))
    }

    #[test]
    fn net_equals_amount_minus_commission() {
        let e = entry();
        assert_eq!(e.net_amount, Decimal::new(9500, 2));
    }

    #[test]
    fn valid_transitions() {
        assert!(EntryStatus::Held.can_transition_to(EntryStatus::Released));
        assert!(EntryStatus::Held.can_transition_to(EntryStatus::Refunded));
        assert!(EntryStatus::Held.can_transition_to(EntryStatus::Disputed));
        assert!(EntryStatus::Disputed.can_transition_to(EntryStatus::Released));
        assert!(EntryStatus::Disputed.can_transition_to(EntryStatus::Refunded));
    }

    #[test]
    fn terminal_states_are_terminal() {
        for terminal in [EntryStatus::Released, EntryStatus::Refunded] {
            for target in [
                EntryStatus::Held,
                EntryStatus::Released,
                EntryStatus::Refunded,
                EntryStatus::Disputed,
            ] {
                assert!(
                    !terminal.can_transition_to(target),
                    "{terminal} → {target} must be illegal"
                );
            }
        }
    }

    #[test]
    fn double_release_blocked() {
        let mut e = entry();
        e.mark_released(ActorRef::system(), "manual", Utc::now())
            .unwrap();
        let err = e
            .mark_released(ActorRef::system(), "manual", Utc::now())
            .unwrap_err();
        assert!(
            matches!(
                err,
                TrustHoldError::InvalidEntryState {
                    current: EntryStatus::Released,
                    ..
                }
            ),
            "Got: {err:?}"
        );
    }

    #[test]
    fn release_stamps_metadata() {
        let mut e = entry();
        let now = Utc::now();
        e.mark_released(ActorRef::system(), "auto_release", now)
            .unwrap();
        let info = e.release.unwrap();
        assert_eq!(info.reason, "auto_release");
        assert_eq!(info.at, now);
        assert!(info.actor.is_system());
    }

    #[test]
    fn disputed_entry_resolvable_both_ways() {
        let mut a = entry();
        a.mark_disputed().unwrap();
        assert!(a.mark_released(ActorRef::system(), "resolution", Utc::now()).is_ok());

        let mut b = entry();
        b.mark_disputed().unwrap();
        assert!(b.mark_refunded(ActorRef::system(), "resolution", Utc::now()).is_ok());
    }

    #[test]
    fn refunded_entry_cannot_be_disputed() {
        let mut e = entry();
        e.mark_refunded(ActorRef::system(), "refund", Utc::now())
            .unwrap();
        assert!(e.mark_disputed().is_err());
    }

    #[test]
    fn decision_parse_roundtrip() {
        for (s, d) in [
            ("buyer_favor", DisputeDecision::BuyerFavor),
            ("seller_favor", DisputeDecision::SellerFavor),
            ("partial_refund", DisputeDecision::PartialRefund),
        ] {
            assert_eq!(s.parse::<DisputeDecision>().unwrap(), d);
            assert_eq!(format!("{d}"), s);
        }
        assert!("split_evenly".parse::<DisputeDecision>().is_err());
    }

    #[test]
    fn retention_cap_trims_oldest() {
        let mk = |action: &str| ActivityEntry {
            action: action.to_string(),
            actor: ActorRef::system(),
            detail: None,
            at: Utc::now(),
        };
        let mut log = vec![mk("a"), mk("b"), mk("c"), mk("d")];

        LogRetention::Unbounded.apply(&mut log);
        assert_eq!(log.len(), 4);

        LogRetention::Capped(2).apply(&mut log);
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].action, "c");
        assert_eq!(log[1].action, "d");
    }
}
