use crate::{
    blackjack::BlackjackAction,
    engine::GameEngine,
    error::GameResult,
    moderation::ModAction,
    store::BalanceField,
    types::{Money, UserId},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every action a caller can ask of the engine.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Economy ───────────────────────────────────
    Balance  { user: UserId },
    Deposit  { user: UserId, amount: Money },
    Withdraw { user: UserId, amount: Money },
    Work     { user: UserId },
    Crime    { user: UserId },
    BuyStock { user: UserId, symbol: String, amount: i64 },
    Portfolio { user: UserId },
    Market,

    // ── Combat ────────────────────────────────────
    Profile     { user: UserId },
    SelectClass { user: UserId, class: String },
    ConfirmClass { user: UserId, accept: bool },
    Dungeon     { user: UserId },
    Heal        { user: UserId },

    // ── Casino ────────────────────────────────────
    Coinflip       { user: UserId, bet: Money, choice: String },
    Slots          { user: UserId, bet: Money },
    Blackjack      { user: UserId, bet: Money },
    BlackjackAct   { user: UserId, action: BlackjackAction },

    // ── Moderation ────────────────────────────────
    LogModeration {
        target:    UserId,
        moderator: UserId,
        action:    ModAction,
        #[serde(default)]
        reason:    Option<String>,
    },
    ModerationHistory { user: UserId },

    // ── Persona ───────────────────────────────────
    Mood,
    EightBall { question: String },
    Roulette  { user: UserId },

    // ── Administration ────────────────────────────
    Grant { user: UserId, amount: Money, field: BalanceField },
    TickMarket,
    Housekeeping,
}

impl GameEngine {
    /// Run one command and serialize its result.
    pub fn execute(&self, command: &PlayerCommand) -> GameResult<Value> {
        use PlayerCommand as C;
        let value = match command {
            C::Balance { user }                  => serde_json::to_value(self.balance(*user)?)?,
            C::Deposit { user, amount }          => serde_json::to_value(self.deposit(*user, *amount)?)?,
            C::Withdraw { user, amount }         => serde_json::to_value(self.withdraw(*user, *amount)?)?,
            C::Work { user }                     => serde_json::to_value(self.work(*user)?)?,
            C::Crime { user }                    => serde_json::to_value(self.crime(*user)?)?,
            C::BuyStock { user, symbol, amount } => serde_json::to_value(self.buy_stock(*user, symbol, *amount)?)?,
            C::Portfolio { user }                => serde_json::to_value(self.portfolio(*user)?)?,
            C::Market                            => serde_json::to_value(self.market().listing())?,

            C::Profile { user }                  => serde_json::to_value(self.profile(*user)?)?,
            C::SelectClass { user, class }       => serde_json::to_value(self.request_class_change(*user, class)?)?,
            C::ConfirmClass { user, accept }     => serde_json::to_value(self.confirm_class_change(*user, *accept)?)?,
            C::Dungeon { user }                  => serde_json::to_value(self.dungeon(*user)?)?,
            C::Heal { user }                     => serde_json::to_value(self.heal(*user)?)?,

            C::Coinflip { user, bet, choice }    => serde_json::to_value(self.coinflip(*user, *bet, choice)?)?,
            C::Slots { user, bet }               => serde_json::to_value(self.slots(*user, *bet)?)?,
            C::Blackjack { user, bet }           => serde_json::to_value(self.blackjack_start(*user, *bet)?)?,
            C::BlackjackAct { user, action }     => serde_json::to_value(self.blackjack_act(*user, *action)?)?,

            C::LogModeration { target, moderator, action, reason } => serde_json::to_value(
                self.log_moderation(*target, *moderator, *action, reason.as_deref())?,
            )?,
            C::ModerationHistory { user }        => serde_json::to_value(self.moderation_history(*user)?)?,

            C::Mood                              => serde_json::to_value(self.mood())?,
            C::EightBall { question }            => serde_json::to_value(self.eight_ball(question)?)?,
            C::Roulette { user }                 => serde_json::to_value(self.roulette(*user))?,

            C::Grant { user, amount, field }     => serde_json::to_value(self.grant(*user, *amount, *field)?)?,
            C::TickMarket                        => serde_json::to_value(self.tick_market())?,
            C::Housekeeping                      => serde_json::to_value(self.housekeeping()?)?,
        };
        Ok(value)
    }
}
