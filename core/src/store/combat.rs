use super::{account::headroom, LedgerStore};
use crate::{
    combat::{CombatProfile, RpgClass},
    config::ClassConfig,
    error::{GameError, GameResult},
    types::{Money, UserId},
};
use rusqlite::params;

impl LedgerStore {
    // ── Combat profile ────────────────────────────────────────────

    pub fn combat_profile(&self, user: UserId) -> GameResult<CombatProfile> {
        let (class_label, mut profile) = self.conn.query_row(
            "SELECT rpg_class, hp, max_hp, mana, max_mana, atk, def, agility,
                    dungeon_depth, battles_won
             FROM rpg_stats WHERE user_id = ?1",
            params![user as i64],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    CombatProfile {
                        class:         RpgClass::Novice,
                        hp:            row.get(1)?,
                        max_hp:        row.get(2)?,
                        mana:          row.get(3)?,
                        max_mana:      row.get(4)?,
                        atk:           row.get(5)?,
                        def:           row.get(6)?,
                        agility:       row.get(7)?,
                        dungeon_depth: row.get(8)?,
                        battles_won:   row.get(9)?,
                    },
                ))
            },
        )?;
        profile.class = class_label.parse().map_err(|_| {
            GameError::Other(anyhow::anyhow!("user {user} has corrupt class '{class_label}'"))
        })?;
        Ok(profile)
    }

    /// Overwrite every combat column. HP is clamped to [0, max_hp].
    pub fn set_combat_profile(&self, user: UserId, p: &CombatProfile) -> GameResult<()> {
        self.conn.execute(
            "UPDATE rpg_stats SET rpg_class = ?1, hp = ?2, max_hp = ?3, mana = ?4,
                    max_mana = ?5, atk = ?6, def = ?7, agility = ?8,
                    dungeon_depth = ?9, battles_won = ?10
             WHERE user_id = ?11",
            params![
                p.class.label(),
                p.hp.clamp(0, p.max_hp),
                p.max_hp,
                p.mana,
                p.max_mana,
                p.atk,
                p.def,
                p.agility,
                p.dungeon_depth,
                p.battles_won,
                user as i64,
            ],
        )?;
        Ok(())
    }

    /// Class selection: resets class, HP pool and base stats.
    pub fn reset_class(&self, user: UserId, class: &ClassConfig) -> GameResult<()> {
        self.conn.execute(
            "UPDATE rpg_stats SET rpg_class = ?1, hp = ?2, max_hp = ?2, atk = ?3,
                    def = ?4, agility = ?5
             WHERE user_id = ?6",
            params![
                class.class.label(),
                class.hp,
                class.atk,
                class.def,
                class.agl,
                user as i64,
            ],
        )?;
        Ok(())
    }

    pub fn set_hp(&self, user: UserId, hp: i64) -> GameResult<()> {
        self.conn.execute(
            "UPDATE rpg_stats SET hp = MIN(MAX(?1, 0), max_hp) WHERE user_id = ?2",
            params![hp, user as i64],
        )?;
        Ok(())
    }

    /// Persist a won fight: clamped HP, one more win, gold to the wallet.
    /// Nothing is written if the wallet cannot hold the gold.
    pub fn record_victory(&self, user: UserId, hp: i64, gold: Money) -> GameResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE rpg_stats SET hp = MIN(MAX(?1, 0), max_hp), battles_won = battles_won + 1
             WHERE user_id = ?2",
            params![hp, user as i64],
        )?;
        let (lo, hi) = headroom(gold);
        let credited = tx.execute(
            "UPDATE users SET wallet = wallet + ?1 WHERE user_id = ?2 AND wallet BETWEEN ?3 AND ?4",
            params![gold, user as i64, lo, hi],
        )?;
        if credited != 1 {
            return Err(GameError::balance_limit(format!("wallet cannot take {gold} gold")));
        }
        tx.commit()?;
        Ok(())
    }

    /// Charge `cost` and restore HP to max in one transaction.
    /// False, with nothing written, if the wallet cannot cover it.
    pub fn heal(&self, user: UserId, cost: Money) -> GameResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let charged = tx.execute(
            "UPDATE users SET wallet = wallet - ?1 WHERE user_id = ?2 AND wallet >= ?1",
            params![cost, user as i64],
        )?;
        if charged != 1 {
            return Ok(false);
        }
        tx.execute(
            "UPDATE rpg_stats SET hp = max_hp WHERE user_id = ?1",
            params![user as i64],
        )?;
        tx.commit()?;
        Ok(true)
    }
}
