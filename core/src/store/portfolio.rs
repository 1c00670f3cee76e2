use super::LedgerStore;
use crate::{
    error::GameResult,
    types::{Money, UserId},
};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol:   String,
    pub shares:   i64,
    pub avg_cost: f64,
}

impl LedgerStore {
    // ── Portfolio ─────────────────────────────────────────────────

    pub fn portfolio(&self, user: UserId, symbol: &str) -> GameResult<Option<Holding>> {
        let holding = self
            .conn
            .query_row(
                "SELECT symbol, shares, avg_cost FROM portfolio
                 WHERE user_id = ?1 AND symbol = ?2",
                params![user as i64, symbol],
                |row| {
                    Ok(Holding {
                        symbol:   row.get(0)?,
                        shares:   row.get(1)?,
                        avg_cost: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(holding)
    }

    pub fn portfolio_all(&self, user: UserId) -> GameResult<Vec<Holding>> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol, shares, avg_cost FROM portfolio
             WHERE user_id = ?1 ORDER BY symbol ASC",
        )?;
        let rows = stmt.query_map(params![user as i64], |row| {
            Ok(Holding {
                symbol:   row.get(0)?,
                shares:   row.get(1)?,
                avg_cost: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn upsert_portfolio(
        &self,
        user: UserId,
        symbol: &str,
        shares: i64,
        avg_cost: f64,
    ) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO portfolio (user_id, symbol, shares, avg_cost) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, symbol)
             DO UPDATE SET shares = excluded.shares, avg_cost = excluded.avg_cost",
            params![user as i64, symbol, shares, avg_cost],
        )?;
        Ok(())
    }

    /// Debit `charge` from the wallet and fold the purchase into the
    /// holding in one transaction. `merge` receives the existing holding
    /// (if any) and returns the new one.
    ///
    /// Returns None, with nothing written, if the wallet is short.
    pub fn purchase_shares(
        &self,
        user: UserId,
        symbol: &str,
        charge: Money,
        merge: impl FnOnce(Option<Holding>) -> Holding,
    ) -> GameResult<Option<Holding>> {
        let tx = self.conn.unchecked_transaction()?;
        let debited = tx.execute(
            "UPDATE users SET wallet = wallet - ?1 WHERE user_id = ?2 AND wallet >= ?1",
            params![charge, user as i64],
        )?;
        if debited != 1 {
            return Ok(None);
        }

        let existing = self.portfolio(user, symbol)?;
        let updated = merge(existing);
        self.upsert_portfolio(user, &updated.symbol, updated.shares, updated.avg_cost)?;
        tx.commit()?;
        Ok(Some(updated))
    }
}
