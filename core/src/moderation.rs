//! Moderation case log.
//!
//! The platform performs the kick or ban itself; the engine only records
//! that it happened. Cases are append-only and never edited.

use crate::{
    engine::GameEngine,
    error::{GameError, GameResult},
    event::GameEvent,
    types::{CaseId, UserId},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_REASON: &str = "No reason provided";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModAction {
    Kick,
    Ban,
}

impl ModAction {
    /// Stored tag, matching the historical upper-case values.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Kick => "KICK",
            Self::Ban  => "BAN",
        }
    }
}

impl FromStr for ModAction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "KICK" => Ok(Self::Kick),
            "BAN"  => Ok(Self::Ban),
            other  => Err(GameError::validation(format!("Unknown moderation action: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationEntry {
    pub case_id:      Option<CaseId>,
    pub user_id:      UserId,
    pub moderator_id: UserId,
    pub action:       ModAction,
    pub reason:       String,
    /// `%Y-%m-%d %H:%M:%S`, engine clock.
    pub timestamp:    String,
}

impl GameEngine {
    /// Record a moderation action the caller has already carried out.
    pub fn log_moderation(
        &self,
        target: UserId,
        moderator: UserId,
        action: ModAction,
        reason: Option<&str>,
    ) -> GameResult<ModerationEntry> {
        let reason = match reason.map(str::trim) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => DEFAULT_REASON.to_string(),
        };
        let mut entry = ModerationEntry {
            case_id: None,
            user_id: target,
            moderator_id: moderator,
            action,
            reason,
            timestamp: self.now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };

        let store = self.store();
        let case_id = store.append_moderation_log(&entry)?;
        entry.case_id = Some(case_id);
        self.record(&store, &GameEvent::ModerationLogged {
            user: target,
            case_id,
            moderator,
            action,
        })?;
        log::info!("user={target} moderation: case #{case_id} {} by {moderator}", action.tag());
        Ok(entry)
    }

    pub fn moderation_history(&self, user: UserId) -> GameResult<Vec<ModerationEntry>> {
        self.store().moderation_log(user)
    }
}
