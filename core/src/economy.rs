//! Economy engine: banking, jobs, crime and stock purchases.

use crate::{
    engine::GameEngine,
    error::{GameError, GameResult},
    event::GameEvent,
    store::{BalanceField, Holding},
    types::{Money, Symbol, UserId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceView {
    pub wallet:    Money,
    pub bank:      Money,
    pub net_worth: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub amount: Money,
    pub wallet: Money,
    pub bank:   Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOutcome {
    pub job:    String,
    pub pay:    Money,
    pub wallet: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CrimeOutcome {
    Success { loot: Money, wallet: Money },
    /// `charged` is less than `fine` when the wallet ran dry.
    Caught { fine: Money, charged: Money, wallet: Money },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOutcome {
    pub symbol:  Symbol,
    pub shares:  i64,
    pub price:   f64,
    /// Exact price × shares, folded into the average cost.
    pub cost:    f64,
    /// Whole units actually taken from the wallet.
    pub charged: Money,
    pub holding: Holding,
    pub wallet:  Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol:       Symbol,
    pub shares:       i64,
    pub avg_cost:     f64,
    pub price:        f64,
    pub market_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioView {
    pub positions:   Vec<Position>,
    pub total_value: f64,
}

/// Cost-weighted mean after buying `new_shares` for `cost` in total.
pub fn weighted_average_cost(old_shares: i64, old_avg: f64, new_shares: i64, cost: f64) -> f64 {
    let total = old_shares + new_shares;
    if total <= 0 {
        return 0.0;
    }
    (old_shares as f64 * old_avg + cost) / total as f64
}

/// Whole currency units needed to pay for `cost`.
pub fn charge_for(cost: f64) -> Money {
    cost.ceil() as Money
}

impl GameEngine {
    pub fn balance(&self, user: UserId) -> GameResult<BalanceView> {
        self.ledger(user, |store| {
            let b = store.balance(user)?;
            Ok(BalanceView { wallet: b.wallet, bank: b.bank, net_worth: b.net_worth() })
        })
    }

    pub fn deposit(&self, user: UserId, amount: Money) -> GameResult<TransferOutcome> {
        self.move_funds(user, amount, BalanceField::Wallet, BalanceField::Bank)
    }

    pub fn withdraw(&self, user: UserId, amount: Money) -> GameResult<TransferOutcome> {
        self.move_funds(user, amount, BalanceField::Bank, BalanceField::Wallet)
    }

    fn move_funds(
        &self,
        user: UserId,
        amount: Money,
        from: BalanceField,
        to: BalanceField,
    ) -> GameResult<TransferOutcome> {
        if amount <= 0 {
            return Err(GameError::validation("Amount must be positive"));
        }
        self.ledger(user, |store| {
            if !store.transfer(user, amount, from, to)? {
                let available = store.balance(user)?.get(from);
                return Err(GameError::InsufficientFunds { needed: amount, available });
            }
            self.record(store, &GameEvent::FundsTransferred { user, from, to, amount })?;
            log::debug!("user={user} economy: moved {amount} {from:?} -> {to:?}");
            let b = store.balance(user)?;
            Ok(TransferOutcome { amount, wallet: b.wallet, bank: b.bank })
        })
    }

    /// Pick a job at random and pay `trunc(salary × U(0.8, 1.2))`.
    pub fn work(&self, user: UserId) -> GameResult<WorkOutcome> {
        self.ledger(user, |store| {
            let (job, pay) = {
                let mut rng = self.rngs.economy.lock();
                let job = rng.pick(&self.config.jobs).clone();
                let factor = rng.uniform(self.config.pay_factor_min, self.config.pay_factor_max);
                let pay = (job.salary as f64 * factor) as Money;
                (job, pay)
            };
            store.adjust_balance(user, pay, BalanceField::Wallet)?;
            self.record(store, &GameEvent::WorkPaid { user, job: job.name.clone(), pay })?;
            log::debug!("user={user} economy: worked as {} for {pay}", job.name);
            Ok(WorkOutcome { job: job.name, pay, wallet: store.balance(user)?.wallet })
        })
    }

    pub fn crime(&self, user: UserId) -> GameResult<CrimeOutcome> {
        let crime = &self.config.crime;
        self.ledger(user, |store| {
            let (succeeded, amount) = {
                let mut rng = self.rngs.economy.lock();
                if rng.next_f64() > crime.success_threshold {
                    (true, rng.range_inclusive(crime.loot_min, crime.loot_max))
                } else {
                    (false, rng.range_inclusive(crime.fine_min, crime.fine_max))
                }
            };

            if succeeded {
                store.adjust_balance(user, amount, BalanceField::Wallet)?;
                self.record(store, &GameEvent::CrimeSucceeded { user, loot: amount })?;
                log::debug!("user={user} economy: crime paid {amount}");
                return Ok(CrimeOutcome::Success { loot: amount, wallet: store.balance(user)?.wallet });
            }

            let charged = store.debit_capped(user, amount)?;
            self.record(store, &GameEvent::CrimeFailed { user, fine: amount, charged })?;
            log::debug!("user={user} economy: caught, fined {amount} (charged {charged})");
            Ok(CrimeOutcome::Caught { fine: amount, charged, wallet: store.balance(user)?.wallet })
        })
    }

    /// Buy `amount` shares at the current price. There is no sell side.
    pub fn buy_stock(&self, user: UserId, symbol: &str, amount: i64) -> GameResult<PurchaseOutcome> {
        if amount <= 0 {
            return Err(GameError::validation("Share amount must be positive"));
        }
        let instrument = self
            .market()
            .quote(symbol)
            .ok_or_else(|| GameError::validation(format!("Unknown symbol: {}", symbol.trim())))?;
        let price = instrument.price;
        let cost = price * amount as f64;
        let charged = charge_for(cost);

        self.ledger(user, |store| {
            let holding = store.purchase_shares(user, &instrument.symbol, charged, |existing| {
                match existing {
                    Some(h) => Holding {
                        avg_cost: weighted_average_cost(h.shares, h.avg_cost, amount, cost),
                        shares:   h.shares + amount,
                        symbol:   h.symbol,
                    },
                    None => Holding {
                        symbol:   instrument.symbol.clone(),
                        shares:   amount,
                        avg_cost: price,
                    },
                }
            })?;
            let Some(holding) = holding else {
                let available = store.balance(user)?.wallet;
                return Err(GameError::InsufficientFunds { needed: charged, available });
            };

            self.record(store, &GameEvent::StockPurchased {
                user,
                symbol: instrument.symbol.clone(),
                shares: amount,
                price,
                charge: charged,
            })?;
            log::debug!("user={user} economy: bought {amount} {} at {price:.2}", instrument.symbol);
            Ok(PurchaseOutcome {
                symbol: instrument.symbol.clone(),
                shares: amount,
                price,
                cost,
                charged,
                holding,
                wallet: store.balance(user)?.wallet,
            })
        })
    }

    /// Holdings valued at current prices.
    pub fn portfolio(&self, user: UserId) -> GameResult<PortfolioView> {
        let holdings = self.ledger(user, |store| store.portfolio_all(user))?;
        let positions: Vec<Position> = holdings
            .into_iter()
            .map(|h| {
                let price = self.market().quote(&h.symbol).map_or(h.avg_cost, |i| i.price);
                Position {
                    market_value: price * h.shares as f64,
                    symbol:       h.symbol,
                    shares:       h.shares,
                    avg_cost:     h.avg_cost,
                    price,
                }
            })
            .collect();
        let total_value = positions.iter().map(|p| p.market_value).sum();
        Ok(PortfolioView { positions, total_value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_cost_is_cost_weighted() {
        // 10 @ 100 then 10 more for 1200 total.
        let avg = weighted_average_cost(10, 100.0, 10, 1200.0);
        assert!((avg - 110.0).abs() < 1e-9);
    }

    #[test]
    fn first_purchase_average_is_unit_price() {
        let avg = weighted_average_cost(0, 0.0, 4, 4.0 * 12.5);
        assert!((avg - 12.5).abs() < 1e-9);
    }

    #[test]
    fn charge_rounds_up_fractions() {
        assert_eq!(charge_for(100.0), 100);
        assert_eq!(charge_for(100.01), 101);
        assert_eq!(charge_for(0.3), 1);
    }
}
