use crate::types::Money;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Money, available: Money },

    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A credit would take a balance past what it can hold.
    #[error("Balance limit exceeded: {0}")]
    BalanceLimit(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GameError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn balance_limit(msg: impl Into<String>) -> Self {
        Self::BalanceLimit(msg.into())
    }

    /// Stable snake_case tag for callers that render errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_)            => "validation",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::Precondition(_)          => "precondition",
            Self::BalanceLimit(_)          => "balance_limit",
            Self::Database(_)              => "database",
            Self::Serialization(_)         => "serialization",
            Self::Other(_)                 => "internal",
        }
    }

    /// True for errors caused by the player's request rather than the engine.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::InsufficientFunds { .. }
                | Self::Precondition(_)
                | Self::BalanceLimit(_)
        )
    }
}

pub type GameResult<T> = Result<T, GameError>;
