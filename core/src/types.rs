//! Shared primitive types used across the entire engine.

/// A market tick. One tick = one price update of every instrument.
pub type Tick = u64;

/// The stable per-user identifier handed to us by the messaging layer.
pub type UserId = u64;

/// Whole currency units. Wallet and bank balances are always integral.
pub type Money = i64;

/// Ticker symbol of a tradable instrument, always upper case.
pub type Symbol = String;

/// Auto-incrementing moderation case number.
pub type CaseId = i64;
