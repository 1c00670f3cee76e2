//! The audit trail, recording every ledger mutation as an event.
//!
//! RULE: An engine operation that changes a balance, a holding or a
//! combat profile records exactly one event, in the same store lock as
//! the write. Replaying a user's `wallet_delta`s reproduces their wallet.

use crate::{
    blackjack::HandOutcome,
    combat::RpgClass,
    moderation::ModAction,
    store::BalanceField,
    types::{CaseId, Money, Symbol, UserId},
};
use serde::{Deserialize, Serialize};

/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    // ── Ledger ─────────────────────────────────────
    Granted {
        user: UserId,
        field: BalanceField,
        amount: Money,
    },
    FundsTransferred {
        user: UserId,
        from: BalanceField,
        to: BalanceField,
        amount: Money,
    },

    // ── Economy ────────────────────────────────────
    WorkPaid {
        user: UserId,
        job: String,
        pay: Money,
    },
    CrimeSucceeded {
        user: UserId,
        loot: Money,
    },
    CrimeFailed {
        user: UserId,
        fine: Money,
        charged: Money,
    },
    StockPurchased {
        user: UserId,
        symbol: Symbol,
        shares: i64,
        price: f64,
        charge: Money,
    },

    // ── Combat ─────────────────────────────────────
    ClassChanged {
        user: UserId,
        class: RpgClass,
    },
    EncounterResolved {
        user: UserId,
        monster: String,
        victory: bool,
        hp_after: i64,
        gold: Money,
    },
    Healed {
        user: UserId,
        cost: Money,
    },

    // ── Casino ─────────────────────────────────────
    CoinflipSettled {
        user: UserId,
        bet: Money,
        delta: Money,
    },
    SlotsSettled {
        user: UserId,
        bet: Money,
        delta: Money,
    },
    BlackjackDealt {
        user: UserId,
        bet: Money,
    },
    BlackjackSettled {
        user: UserId,
        bet: Money,
        outcome: HandOutcome,
        payout: Money,
        timed_out: bool,
    },

    // ── Moderation ─────────────────────────────────
    ModerationLogged {
        user: UserId,
        case_id: CaseId,
        moderator: UserId,
        action: ModAction,
    },
}

impl GameEvent {
    pub fn user(&self) -> UserId {
        match self {
            Self::Granted { user, .. }
            | Self::FundsTransferred { user, .. }
            | Self::WorkPaid { user, .. }
            | Self::CrimeSucceeded { user, .. }
            | Self::CrimeFailed { user, .. }
            | Self::StockPurchased { user, .. }
            | Self::ClassChanged { user, .. }
            | Self::EncounterResolved { user, .. }
            | Self::Healed { user, .. }
            | Self::CoinflipSettled { user, .. }
            | Self::SlotsSettled { user, .. }
            | Self::BlackjackDealt { user, .. }
            | Self::BlackjackSettled { user, .. }
            | Self::ModerationLogged { user, .. } => *user,
        }
    }

    /// Signed change this event made to the user's wallet.
    pub fn wallet_delta(&self) -> Money {
        match self {
            Self::Granted { field: BalanceField::Wallet, amount, .. } => *amount,
            Self::FundsTransferred { from: BalanceField::Wallet, to: BalanceField::Bank, amount, .. } => -amount,
            Self::FundsTransferred { from: BalanceField::Bank, to: BalanceField::Wallet, amount, .. } => *amount,
            Self::WorkPaid { pay, .. } => *pay,
            Self::CrimeSucceeded { loot, .. } => *loot,
            Self::CrimeFailed { charged, .. } => -charged,
            Self::StockPurchased { charge, .. } => -charge,
            Self::EncounterResolved { gold, .. } => *gold,
            Self::Healed { cost, .. } => -cost,
            Self::CoinflipSettled { delta, .. } | Self::SlotsSettled { delta, .. } => *delta,
            Self::BlackjackDealt { bet, .. } => -bet,
            Self::BlackjackSettled { payout, .. } => *payout,
            _ => 0,
        }
    }
}

/// A persisted event, as stored in event_log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub user_id:    UserId,
    pub kind:       String,
    pub payload:    String, // JSON-serialized GameEvent
    pub created_at: String,
}

impl EventLogEntry {
    pub fn decode(&self) -> serde_json::Result<GameEvent> {
        serde_json::from_str(&self.payload)
    }
}
