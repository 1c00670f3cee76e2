//! Persona: the bot's rotating mood and the novelty commands that read it.
//!
//! Nothing here touches the ledger.

use crate::{engine::GameEngine, error::{GameError, GameResult}, types::UserId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds a roulette loser is timed out for. The platform enforces it.
pub const ROULETTE_TIMEOUT_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    Sassy,
    Angry,
    Bored,
    Helpful,
}

impl Mood {
    pub const ALL: [Mood; 5] = [Mood::Happy, Mood::Sassy, Mood::Angry, Mood::Bored, Mood::Helpful];

    /// Presence text shown while in this mood.
    pub fn activity(&self) -> &'static str {
        match self {
            Self::Happy   => "Playing games! 🎮",
            Self::Sassy   => "Judging your profiles 💅",
            Self::Angry   => "Plotting world domination 👿",
            Self::Bored   => "Counting stars ✨",
            Self::Helpful => "Helping users! 💡",
        }
    }

    pub fn eight_ball_answers(&self) -> &'static [&'static str] {
        match self {
            Self::Angry => &["Don't ask me now.", "No.", "Go away.", "Obviously not.", "Why do you annoy me?"],
            Self::Sassy => &["As if.", "Maybe, if you're lucky.", "Ask your mom.", "I doubt it, hun.", "Sure, whatever."],
            _ => &["Yes, definitely.", "It is certain.", "Most likely.", "Outlook good.", "I think so."],
        }
    }
}

pub struct PersonaState {
    pub mood:       Mood,
    pub rotated_at: DateTime<Utc>,
}

impl PersonaState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { mood: Mood::Happy, rotated_at: now }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodView {
    pub mood:     Mood,
    pub activity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EightBallAnswer {
    pub question: String,
    pub mood:     Mood,
    pub answer:   String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouletteOutcome {
    pub user:         UserId,
    pub bang:         bool,
    /// Platform timeout to apply when `bang` is set.
    pub timeout_secs: Option<i64>,
}

impl GameEngine {
    pub fn mood(&self) -> MoodView {
        let mood = self.persona.lock().mood;
        MoodView { mood, activity: mood.activity().to_string() }
    }

    /// Re-roll the mood now. May land on the current one.
    pub fn rotate_mood(&self) -> Mood {
        let mood = *self.rngs.persona.lock().pick(&Mood::ALL);
        let mut state = self.persona.lock();
        state.mood = mood;
        state.rotated_at = self.now();
        log::info!("persona: mood is now {mood:?}");
        mood
    }

    /// Re-roll once the rotation period has elapsed.
    pub fn rotate_mood_if_due(&self) -> Option<Mood> {
        let period = Duration::seconds(self.config.timing.mood_rotation_secs);
        let due = self.now() - self.persona.lock().rotated_at >= period;
        due.then(|| self.rotate_mood())
    }

    pub fn eight_ball(&self, question: &str) -> GameResult<EightBallAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(GameError::validation("Ask a question"));
        }
        let mood = self.persona.lock().mood;
        let answer = *self.rngs.persona.lock().pick(mood.eight_ball_answers());
        Ok(EightBallAnswer {
            question: question.to_string(),
            mood,
            answer:   answer.to_string(),
        })
    }

    /// One chamber in six is loaded.
    pub fn roulette(&self, user: UserId) -> RouletteOutcome {
        let bang = self.rngs.persona.lock().range_inclusive(1, 6) == 1;
        if bang {
            log::debug!("user={user} persona: roulette fired");
        }
        RouletteOutcome {
            user,
            bang,
            timeout_secs: bang.then_some(ROULETTE_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moods_share_the_default_pool() {
        assert_eq!(Mood::Happy.eight_ball_answers(), Mood::Helpful.eight_ball_answers());
        assert_ne!(Mood::Angry.eight_ball_answers(), Mood::Sassy.eight_ball_answers());
    }
}
