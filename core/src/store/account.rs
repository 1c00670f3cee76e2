use super::LedgerStore;
use crate::{
    error::{GameError, GameResult},
    types::{Money, UserId},
};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

/// Which balance column an adjustment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceField {
    Wallet,
    Bank,
}

impl BalanceField {
    fn column(self) -> &'static str {
        match self {
            Self::Wallet => "wallet",
            Self::Bank   => "bank",
        }
    }
}

/// Inclusive range a column may hold for `col + delta` to stay an integer.
/// SQLite turns an overflowing sum into a REAL, so every write is bounded.
pub(crate) fn headroom(delta: Money) -> (Money, Money) {
    if delta >= 0 {
        (Money::MIN, Money::MAX - delta)
    } else {
        (Money::MIN - delta, Money::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub wallet: Money,
    pub bank:   Money,
}

impl Balance {
    pub fn get(&self, field: BalanceField) -> Money {
        match field {
            BalanceField::Wallet => self.wallet,
            BalanceField::Bank   => self.bank,
        }
    }

    pub fn net_worth(&self) -> Money {
        self.wallet + self.bank
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub user_id:    UserId,
    pub wallet:     Money,
    pub bank:       Money,
    pub xp:         i64,
    pub level:      i64,
    pub reputation: i64,
    pub bio:        String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownRecord {
    pub user_id:    UserId,
    pub last_daily: Option<String>,
    pub last_work:  Option<String>,
    pub last_rob:   Option<String>,
    pub last_heist: Option<String>,
}

impl LedgerStore {
    // ── Account ───────────────────────────────────────────────────

    pub fn balance(&self, user: UserId) -> GameResult<Balance> {
        let balance = self.conn.query_row(
            "SELECT wallet, bank FROM users WHERE user_id = ?1",
            params![user as i64],
            |row| {
                Ok(Balance {
                    wallet: row.get(0)?,
                    bank:   row.get(1)?,
                })
            },
        )?;
        Ok(balance)
    }

    pub fn account(&self, user: UserId) -> GameResult<Account> {
        let account = self.conn.query_row(
            "SELECT user_id, wallet, bank, xp, level, reputation, bio, created_at
             FROM users WHERE user_id = ?1",
            params![user as i64],
            |row| {
                Ok(Account {
                    user_id:    row.get::<_, i64>(0)? as u64,
                    wallet:     row.get(1)?,
                    bank:       row.get(2)?,
                    xp:         row.get(3)?,
                    level:      row.get(4)?,
                    reputation: row.get(5)?,
                    bio:        row.get(6)?,
                    created_at: row.get(7)?,
                })
            },
        )?;
        Ok(account)
    }

    /// Single-statement increment. The store does not check the sign of the
    /// result; use `try_adjust_balance` for debits. A delta that would
    /// overflow the column fails with `BalanceLimit` and writes nothing.
    pub fn adjust_balance(&self, user: UserId, delta: Money, field: BalanceField) -> GameResult<()> {
        let col = field.column();
        let (lo, hi) = headroom(delta);
        let changed = self.conn.execute(
            &format!(
                "UPDATE users SET {col} = {col} + ?1
                 WHERE user_id = ?2 AND {col} BETWEEN ?3 AND ?4"
            ),
            params![delta, user as i64, lo, hi],
        )?;
        if changed != 1 {
            let current = self.balance(user)?.get(field);
            return Err(GameError::balance_limit(format!("{col} of {current} cannot take {delta:+}")));
        }
        Ok(())
    }

    /// Apply `delta` only while the field holds at least `required` and
    /// the result stays within `[0, i64::MAX]`. Check and write happen in
    /// one statement. Returns false, with nothing written, when the guard
    /// fails.
    pub fn try_adjust_balance(
        &self,
        user: UserId,
        delta: Money,
        field: BalanceField,
        required: Money,
    ) -> GameResult<bool> {
        let col = field.column();
        let (lo, hi) = headroom(delta);
        let changed = self.conn.execute(
            &format!(
                "UPDATE users SET {col} = {col} + ?1
                 WHERE user_id = ?2 AND {col} >= ?3 AND {col} BETWEEN ?4 AND ?5
                   AND {col} + ?1 >= 0"
            ),
            params![delta, user as i64, required, lo, hi],
        )?;
        Ok(changed == 1)
    }

    /// Move `amount` from one balance column to the other.
    /// Debit and credit commit together; false if the source is short,
    /// `BalanceLimit` if the destination cannot take it.
    pub fn transfer(
        &self,
        user: UserId,
        amount: Money,
        from: BalanceField,
        to: BalanceField,
    ) -> GameResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let src = from.column();
        let dst = to.column();
        let debited = tx.execute(
            &format!("UPDATE users SET {src} = {src} - ?1 WHERE user_id = ?2 AND {src} >= ?1"),
            params![amount, user as i64],
        )?;
        if debited != 1 {
            return Ok(false);
        }
        let credited = tx.execute(
            &format!("UPDATE users SET {dst} = {dst} + ?1 WHERE user_id = ?2 AND {dst} <= ?3"),
            params![amount, user as i64, headroom(amount).1],
        )?;
        if credited != 1 {
            return Err(GameError::balance_limit(format!("{dst} cannot take {amount}")));
        }
        tx.commit()?;
        Ok(true)
    }

    /// Debit up to `amount` from the wallet without taking it below zero.
    /// Returns what was actually charged.
    pub fn debit_capped(&self, user: UserId, amount: Money) -> GameResult<Money> {
        let tx = self.conn.unchecked_transaction()?;
        let wallet: Money = tx.query_row(
            "SELECT wallet FROM users WHERE user_id = ?1",
            params![user as i64],
            |row| row.get(0),
        )?;
        let charged = amount.min(wallet.max(0));
        tx.execute(
            "UPDATE users SET wallet = wallet - ?1 WHERE user_id = ?2",
            params![charged, user as i64],
        )?;
        tx.commit()?;
        Ok(charged)
    }

    // ── Cooldowns ─────────────────────────────────────────────────

    pub fn cooldown_record(&self, user: UserId) -> GameResult<Option<CooldownRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT user_id, last_daily, last_work, last_rob, last_heist
                 FROM cooldowns WHERE user_id = ?1",
                params![user as i64],
                |row| {
                    Ok(CooldownRecord {
                        user_id:    row.get::<_, i64>(0)? as u64,
                        last_daily: row.get(1)?,
                        last_work:  row.get(2)?,
                        last_rob:   row.get(3)?,
                        last_heist: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}
