//! Casino games settled in one step: coinflip and slots.
//!
//! Blackjack lives in its own module because it spans several inputs.

use crate::{
    config::CasinoConfig,
    engine::GameEngine,
    error::{GameError, GameResult},
    event::GameEvent,
    store::{BalanceField, LedgerStore},
    types::{Money, UserId},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coin {
    Heads,
    Tails,
}

impl FromStr for Coin {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heads" => Ok(Self::Heads),
            "tails" => Ok(Self::Tails),
            other   => Err(GameError::validation(format!("Choose heads or tails, not '{other}'"))),
        }
    }
}

pub fn coinflip_delta(bet: Money, choice: Coin, landed: Coin) -> Money {
    if choice == landed { bet } else { -bet }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotsLine {
    Jackpot,
    Pair,
    Miss,
}

/// Classify three reels and compute the signed wallet change.
pub fn slots_payout<S: PartialEq>(
    reels: &[S; 3],
    bet: Money,
    cfg: &CasinoConfig,
) -> GameResult<(SlotsLine, Money)> {
    let too_large = || GameError::balance_limit(format!("a bet of {bet} pays more than a wallet holds"));
    let [a, b, c] = reels;
    if a == b && b == c {
        let win = bet.checked_mul(cfg.jackpot_multiplier).ok_or_else(too_large)?;
        Ok((SlotsLine::Jackpot, win))
    } else if a == b || b == c || a == c {
        let win = bet as f64 * cfg.pair_multiplier;
        // The cast saturates; anything at or past 2^63 is refused instead.
        if win >= Money::MAX as f64 {
            return Err(too_large());
        }
        Ok((SlotsLine::Pair, win as Money))
    } else {
        Ok((SlotsLine::Miss, -bet))
    }
}

/// The largest win any spin can produce for `bet`.
pub fn slots_top_prize(bet: Money, cfg: &CasinoConfig) -> GameResult<Money> {
    let (_, jackpot) = slots_payout(&[0, 0, 0], bet, cfg)?;
    let (_, pair) = slots_payout(&[0, 0, 1], bet, cfg)?;
    Ok(jackpot.max(pair))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinflipOutcome {
    pub choice: Coin,
    pub landed: Coin,
    pub won:    bool,
    pub delta:  Money,
    pub wallet: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotsOutcome {
    pub reels:  [String; 3],
    pub line:   SlotsLine,
    pub delta:  Money,
    pub wallet: Money,
}

/// Bets must be positive and covered by the wallet.
pub(crate) fn check_bet(store: &LedgerStore, user: UserId, bet: Money) -> GameResult<()> {
    if bet <= 0 {
        return Err(GameError::validation("Bet must be positive"));
    }
    let available = store.balance(user)?.wallet;
    if available < bet {
        return Err(GameError::InsufficientFunds { needed: bet, available });
    }
    Ok(())
}

/// Refuse a game whose best result the wallet could not hold.
pub(crate) fn check_winnings(store: &LedgerStore, user: UserId, win: Money) -> GameResult<()> {
    let wallet = store.balance(user)?.wallet;
    if wallet.checked_add(win).is_none() {
        return Err(GameError::balance_limit(format!("a wallet of {wallet} cannot take a win of {win}")));
    }
    Ok(())
}

/// Apply a settled bet. The wallet must still cover `bet` when written.
fn settle_bet(store: &LedgerStore, user: UserId, bet: Money, delta: Money) -> GameResult<Money> {
    if !store.try_adjust_balance(user, delta, BalanceField::Wallet, bet)? {
        let available = store.balance(user)?.wallet;
        if available >= bet {
            return Err(GameError::balance_limit(format!("wallet of {available} cannot take {delta:+}")));
        }
        return Err(GameError::InsufficientFunds { needed: bet, available });
    }
    Ok(store.balance(user)?.wallet)
}

impl GameEngine {
    pub fn coinflip(&self, user: UserId, bet: Money, choice: &str) -> GameResult<CoinflipOutcome> {
        let choice: Coin = choice.parse()?;
        if bet <= 0 {
            return Err(GameError::validation("Bet must be positive"));
        }
        self.ledger(user, |store| {
            check_bet(store, user, bet)?;
            check_winnings(store, user, bet)?;
            let landed = if self.rngs.casino.lock().chance(0.5) { Coin::Heads } else { Coin::Tails };
            let delta = coinflip_delta(bet, choice, landed);
            let wallet = settle_bet(store, user, bet, delta)?;
            self.record(store, &GameEvent::CoinflipSettled { user, bet, delta })?;
            log::debug!("user={user} casino: coinflip {choice:?} landed {landed:?}, {delta:+}");
            Ok(CoinflipOutcome { choice, landed, won: delta > 0, delta, wallet })
        })
    }

    pub fn slots(&self, user: UserId, bet: Money) -> GameResult<SlotsOutcome> {
        if bet <= 0 {
            return Err(GameError::validation("Bet must be positive"));
        }
        let cfg = &self.config.casino;
        let top_prize = slots_top_prize(bet, cfg)?;
        self.ledger(user, |store| {
            check_bet(store, user, bet)?;
            check_winnings(store, user, top_prize)?;
            let reels = {
                let mut rng = self.rngs.casino.lock();
                [
                    rng.pick(&cfg.slot_symbols).clone(),
                    rng.pick(&cfg.slot_symbols).clone(),
                    rng.pick(&cfg.slot_symbols).clone(),
                ]
            };
            let (line, delta) = slots_payout(&reels, bet, cfg)?;
            let wallet = settle_bet(store, user, bet, delta)?;
            self.record(store, &GameEvent::SlotsSettled { user, bet, delta })?;
            log::debug!("user={user} casino: slots {} {line:?}, {delta:+}", reels.join(" "));
            Ok(SlotsOutcome { reels, line, delta, wallet })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn coinflip_is_even_money() {
        assert_eq!(coinflip_delta(40, Coin::Heads, Coin::Heads), 40);
        assert_eq!(coinflip_delta(40, Coin::Heads, Coin::Tails), -40);
        assert_eq!("TAILS".parse::<Coin>().unwrap(), Coin::Tails);
        assert!("edge".parse::<Coin>().is_err());
    }

    #[test]
    fn slots_paytable() {
        let cfg = GameConfig::builtin().casino;
        assert_eq!(slots_payout(&["7", "7", "7"], 10, &cfg).unwrap(), (SlotsLine::Jackpot, 100));
        assert_eq!(slots_payout(&["7", "🍒", "7"], 10, &cfg).unwrap(), (SlotsLine::Pair, 15));
        assert_eq!(slots_payout(&["🍒", "🍒", "7"], 10, &cfg).unwrap(), (SlotsLine::Pair, 15));
        assert_eq!(slots_payout(&["🍋", "🍒", "7"], 10, &cfg).unwrap(), (SlotsLine::Miss, -10));
        assert_eq!(slots_top_prize(10, &cfg).unwrap(), 100);
    }

    #[test]
    fn pair_payout_truncates() {
        let cfg = GameConfig::builtin().casino;
        // 3 × 1.5 = 4.5
        assert_eq!(slots_payout(&["a", "a", "b"], 3, &cfg).unwrap().1, 4);
    }

    #[test]
    fn oversized_wins_are_errors_not_wraps() {
        let cfg = GameConfig::builtin().casino;
        let bet = i64::MAX / 5;
        assert_eq!(slots_payout(&["7", "7", "7"], bet, &cfg).unwrap_err().kind(), "balance_limit");
        assert_eq!(slots_payout(&["7", "7", "x"], bet, &cfg).unwrap().1, (bet as f64 * 1.5) as i64);
        assert_eq!(slots_payout(&["7", "7", "x"], i64::MAX / 4 * 3, &cfg).unwrap_err().kind(), "balance_limit");
        assert_eq!(slots_payout(&["7", "x", "y"], bet, &cfg).unwrap().1, -bet);
        assert!(slots_top_prize(bet, &cfg).is_err());
    }
}
