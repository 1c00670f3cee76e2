use super::LedgerStore;
use crate::{
    error::GameResult,
    moderation::ModerationEntry,
    types::{CaseId, UserId},
};
use rusqlite::params;

impl LedgerStore {
    // ── Moderation log (append-only) ─────────────────────────────

    pub fn append_moderation_log(&self, entry: &ModerationEntry) -> GameResult<CaseId> {
        self.conn.execute(
            "INSERT INTO mod_logs (user_id, moderator_id, action, reason, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.user_id as i64,
                entry.moderator_id as i64,
                entry.action.tag(),
                entry.reason,
                entry.timestamp,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn moderation_log(&self, user: UserId) -> GameResult<Vec<ModerationEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT case_id, user_id, moderator_id, action, reason, timestamp
             FROM mod_logs WHERE user_id = ?1
             ORDER BY case_id ASC",
        )?;
        let rows = stmt
            .query_map(params![user as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(case_id, user_id, moderator_id, action, reason, timestamp)| {
                Ok(ModerationEntry {
                    case_id: Some(case_id),
                    user_id: user_id as u64,
                    moderator_id: moderator_id as u64,
                    action: action.parse()?,
                    reason,
                    timestamp,
                })
            })
            .collect()
    }
}
