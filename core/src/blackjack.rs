//! Blackjack against a house dealer, played over several inputs.
//!
//! A hand is a session: dealt by `blackjack_start`, advanced by
//! `blackjack_act`, and settled as a Stand when the player goes idle.
//! The stake leaves the wallet when the cards are dealt and the payout
//! (2× on a win, 1× on a push) is credited at settlement.

use crate::{
    casino::{check_bet, check_winnings},
    config::CasinoConfig,
    engine::GameEngine,
    error::{GameError, GameResult},
    event::GameEvent,
    rng::GameRng,
    session::Taken,
    store::{BalanceField, LedgerStore},
    types::{Money, UserId},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Card values summed, with aces (11) dropped to 1 one at a time while
/// the total is over 21.
pub fn hand_score(cards: &[u8]) -> u32 {
    let mut total: u32 = cards.iter().map(|&c| c as u32).sum();
    let mut aces = cards.iter().filter(|&&c| c == 11).count();
    while total > 21 && aces > 0 {
        total -= 10;
        aces -= 1;
    }
    total
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackjackAction {
    Hit,
    Stand,
}

impl FromStr for BlackjackAction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hit"   => Ok(Self::Hit),
            "stand" => Ok(Self::Stand),
            other   => Err(GameError::validation(format!("Choose hit or stand, not '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandOutcome {
    Win,
    Loss,
    Push,
}

impl HandOutcome {
    /// Player bust first, then dealer bust, then the higher total.
    pub fn judge(player: u32, dealer: u32) -> Self {
        if player > 21 {
            Self::Loss
        } else if dealer > 21 || player > dealer {
            Self::Win
        } else if player < dealer {
            Self::Loss
        } else {
            Self::Push
        }
    }

    /// Credit returned to the wallet for an escrowed `bet`.
    pub fn payout(&self, bet: Money) -> GameResult<Money> {
        match self {
            Self::Win  => bet
                .checked_mul(2)
                .ok_or_else(|| GameError::balance_limit(format!("a bet of {bet} cannot be paid double"))),
            Self::Push => Ok(bet),
            Self::Loss => Ok(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackjackHand {
    pub bet:    Money,
    pub player: Vec<u8>,
    pub dealer: Vec<u8>,
}

impl BlackjackHand {
    pub fn deal(bet: Money, shoe: &[u8], rng: &mut GameRng) -> Self {
        let mut draw = || *rng.pick(shoe);
        let player = vec![draw(), draw()];
        let dealer = vec![draw(), draw()];
        Self { bet, player, dealer }
    }

    pub fn player_score(&self) -> u32 {
        hand_score(&self.player)
    }

    pub fn dealer_score(&self) -> u32 {
        hand_score(&self.dealer)
    }

    /// The player's turn ends at 21 or over.
    pub fn player_done(&self) -> bool {
        self.player_score() >= 21
    }

    pub fn hit(&mut self, shoe: &[u8], rng: &mut GameRng) {
        self.player.push(*rng.pick(shoe));
    }

    /// Play the dealer out (unless the player bust) and judge the hand.
    pub fn finish(&mut self, cfg: &CasinoConfig, rng: &mut GameRng) -> HandOutcome {
        if self.player_score() <= 21 {
            while self.dealer_score() < cfg.dealer_stands_on as u32 {
                self.dealer.push(*rng.pick(&cfg.shoe));
            }
        }
        HandOutcome::judge(self.player_score(), self.dealer_score())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BlackjackStatus {
    /// Waiting on hit or stand. Only the dealer's first card is shown.
    PlayerTurn { dealer_upcard: u8 },
    Settled {
        outcome:      HandOutcome,
        dealer:       Vec<u8>,
        dealer_score: u32,
        payout:       Money,
        /// payout − bet
        net:          Money,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlackjackResult {
    pub user:         UserId,
    pub bet:          Money,
    pub player:       Vec<u8>,
    pub player_score: u32,
    #[serde(flatten)]
    pub status:       BlackjackStatus,
    pub wallet:       Money,
    pub timed_out:    bool,
}

impl BlackjackResult {
    pub fn is_settled(&self) -> bool {
        matches!(self.status, BlackjackStatus::Settled { .. })
    }
}

impl GameEngine {
    /// Deal a hand and escrow the bet. One open hand per user. A bet whose
    /// winning payout the wallet could not hold is refused before dealing.
    pub fn blackjack_start(&self, user: UserId, bet: Money) -> GameResult<BlackjackResult> {
        if bet <= 0 {
            return Err(GameError::validation("Bet must be positive"));
        }
        HandOutcome::Win.payout(bet)?;
        let cfg = &self.config.casino;
        self.ledger(user, |store| {
            let now = self.now();
            if self.blackjack.is_live(user, now) {
                return Err(GameError::precondition("You already have a hand in play"));
            }
            check_bet(store, user, bet)?;
            check_winnings(store, user, bet)?;

            let hand = {
                let mut rng = self.rngs.casino.lock();
                BlackjackHand::deal(bet, &cfg.shoe, &mut rng)
            };
            log::debug!("user={user} blackjack: dealt {:?} for {bet}", hand.player);

            if hand.player_done() {
                self.escrow(store, user, bet)?;
                return self.settle_hand(store, user, hand, false);
            }

            let view = self.in_play(store, user, &hand)?;
            let stale = self
                .blackjack
                .open(user, hand, now)
                .map_err(|_| GameError::precondition("You already have a hand in play"))?;
            if let Err(e) = self.escrow(store, user, bet) {
                self.blackjack.take(user, now);
                return Err(e);
            }
            if let Some(stale) = stale {
                self.settle_hand(store, user, stale, true)?;
            }
            Ok(BlackjackResult { wallet: store.balance(user)?.wallet, ..view })
        })
    }

    /// Advance the open hand. A hand left idle past the timeout is settled
    /// as a Stand and the late action is ignored.
    pub fn blackjack_act(&self, user: UserId, action: BlackjackAction) -> GameResult<BlackjackResult> {
        let cfg = &self.config.casino;
        self.ledger(user, |store| {
            let now = self.now();
            let mut hand = match self.blackjack.take(user, now) {
                Taken::Missing => return Err(GameError::precondition("No blackjack hand in play")),
                Taken::Expired(hand) => return self.settle_hand(store, user, hand, true),
                Taken::Live(hand) => hand,
            };

            match action {
                BlackjackAction::Stand => self.settle_hand(store, user, hand, false),
                BlackjackAction::Hit => {
                    {
                        let mut rng = self.rngs.casino.lock();
                        hand.hit(&cfg.shoe, &mut rng);
                    }
                    if hand.player_done() {
                        return self.settle_hand(store, user, hand, false);
                    }
                    let view = self.in_play(store, user, &hand)?;
                    self.blackjack.put(user, hand, now);
                    Ok(view)
                }
            }
        })
    }

    /// Settle a hand the housekeeping loop found idle.
    pub(crate) fn settle_timed_out(&self, user: UserId, hand: BlackjackHand) -> GameResult<BlackjackResult> {
        self.ledger(user, |store| self.settle_hand(store, user, hand, true))
    }

    fn escrow(&self, store: &LedgerStore, user: UserId, bet: Money) -> GameResult<()> {
        if !store.try_adjust_balance(user, -bet, BalanceField::Wallet, bet)? {
            let available = store.balance(user)?.wallet;
            return Err(GameError::InsufficientFunds { needed: bet, available });
        }
        self.record(store, &GameEvent::BlackjackDealt { user, bet })
    }

    fn in_play(&self, store: &LedgerStore, user: UserId, hand: &BlackjackHand) -> GameResult<BlackjackResult> {
        Ok(BlackjackResult {
            user,
            bet:          hand.bet,
            player:       hand.player.clone(),
            player_score: hand.player_score(),
            status:       BlackjackStatus::PlayerTurn {
                dealer_upcard: hand.dealer.first().copied().unwrap_or_default(),
            },
            wallet:       store.balance(user)?.wallet,
            timed_out:    false,
        })
    }

    fn settle_hand(
        &self,
        store: &LedgerStore,
        user: UserId,
        mut hand: BlackjackHand,
        timed_out: bool,
    ) -> GameResult<BlackjackResult> {
        let outcome = {
            let mut rng = self.rngs.casino.lock();
            hand.finish(&self.config.casino, &mut rng)
        };
        let payout = outcome.payout(hand.bet)?;
        if payout > 0 {
            store.adjust_balance(user, payout, BalanceField::Wallet)?;
        }
        self.record(store, &GameEvent::BlackjackSettled {
            user,
            bet: hand.bet,
            outcome,
            payout,
            timed_out,
        })?;
        log::debug!(
            "user={user} blackjack: {outcome:?} {} vs {}{}",
            hand.player_score(),
            hand.dealer_score(),
            if timed_out { " (timed out)" } else { "" }
        );

        Ok(BlackjackResult {
            user,
            bet:          hand.bet,
            player_score: hand.player_score(),
            status:       BlackjackStatus::Settled {
                outcome,
                dealer_score: hand.dealer_score(),
                dealer:       hand.dealer,
                payout,
                net:          payout - hand.bet,
            },
            player:       hand.player,
            wallet:       store.balance(user)?.wallet,
            timed_out,
        })
    }
}
