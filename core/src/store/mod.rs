//! SQLite persistence layer, the ledger store.
//!
//! RULE: Only the store talks to the database.
//! Engine components call store methods. They never execute SQL directly.
//!
//! Every method is a single statement or a single SQL transaction, so one
//! call is always one consistent update. Balance preconditions are folded
//! into the mutating statement itself (guarded updates); callers never
//! read a balance and then write it back.

use crate::{
    error::GameResult,
    event::EventLogEntry,
    types::UserId,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

mod account;
mod combat;
mod moderation;
mod portfolio;

pub use account::{Account, Balance, BalanceField, CooldownRecord};
pub use portfolio::Holding;

pub struct LedgerStore {
    conn: Connection,
}

impl LedgerStore {
    pub fn open(path: &str) -> GameResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GameResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order. Idempotent.
    pub fn migrate(&self) -> GameResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_ledger.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_event_log.sql"))?;
        Ok(())
    }

    // ── Registration ───────────────────────────────────────────

    /// Make sure `user` has a row in every per-user table.
    /// All three inserts commit together or not at all.
    pub fn register_if_absent(&self, user: UserId, now: DateTime<Utc>) -> GameResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let created = tx.execute(
            "INSERT OR IGNORE INTO users (user_id, created_at) VALUES (?1, ?2)",
            params![user as i64, now.to_rfc3339()],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO rpg_stats (user_id) VALUES (?1)",
            params![user as i64],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO cooldowns (user_id) VALUES (?1)",
            params![user as i64],
        )?;
        tx.commit()?;
        if created > 0 {
            log::debug!("user={user} ledger: registered");
        }
        Ok(created > 0)
    }

    pub fn user_count(&self) -> GameResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (user_id, kind, payload, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.user_id as i64,
                entry.kind,
                entry.payload,
                entry.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_user(&self, user: UserId) -> GameResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, kind, payload, created_at
             FROM event_log WHERE user_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![user as i64], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    user_id: row.get::<_, i64>(1)? as u64,
                    kind: row.get(2)?,
                    payload: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
