//! Combat engine: character classes, dungeon encounters and healing.
//!
//! An encounter is never persisted mid-fight. It walks
//! Start -> EncounterShown -> Resolving -> {Victory, Defeat}
//! inside one call; only the outcome touches the ledger.

use crate::{
    config::{ClassConfig, CombatConfig, MonsterConfig},
    engine::GameEngine,
    error::{GameError, GameResult},
    event::GameEvent,
    rng::GameRng,
    session::Taken,
    store::BalanceField,
    types::{Money, UserId},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpgClass {
    Novice,
    Warrior,
    Mage,
    Rogue,
    Tank,
}

impl RpgClass {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Novice  => "Novice",
            Self::Warrior => "Warrior",
            Self::Mage    => "Mage",
            Self::Rogue   => "Rogue",
            Self::Tank    => "Tank",
        }
    }
}

impl fmt::Display for RpgClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RpgClass {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "novice"  => Ok(Self::Novice),
            "warrior" => Ok(Self::Warrior),
            "mage"    => Ok(Self::Mage),
            "rogue"   => Ok(Self::Rogue),
            "tank"    => Ok(Self::Tank),
            other     => Err(GameError::validation(format!("Unknown class: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatProfile {
    pub class:         RpgClass,
    pub hp:            i64,
    pub max_hp:        i64,
    pub mana:          i64,
    pub max_mana:      i64,
    pub atk:           i64,
    pub def:           i64,
    pub agility:       i64,
    pub dungeon_depth: i64,
    pub battles_won:   i64,
}

impl CombatProfile {
    /// A profile at 0 HP cannot fight until healed.
    pub fn ensure_can_fight(&self) -> GameResult<()> {
        if self.hp <= 0 {
            return Err(GameError::precondition(
                "You are incapacitated. Heal before entering the dungeon.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterPhase {
    Start,
    EncounterShown,
    Resolving,
    Victory,
    Defeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attacker {
    Player,
    Monster,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn:     u32,
    pub attacker: Attacker,
    pub damage:   i64,
    pub crit:     bool,
}

/// One fight between a player and a monster.
#[derive(Debug, Clone)]
pub struct Encounter {
    phase:      EncounterPhase,
    monster:    MonsterConfig,
    max_hp:     i64,
    player_hp:  i64,
    player_atk: i64,
    player_def: i64,
    monster_hp: i64,
    turns:      Vec<TurnRecord>,
}

impl Encounter {
    /// Refuses to start while the player is incapacitated.
    pub fn begin(profile: &CombatProfile, monster: MonsterConfig) -> GameResult<Self> {
        profile.ensure_can_fight()?;
        Ok(Self {
            phase:      EncounterPhase::Start,
            max_hp:     profile.max_hp,
            player_hp:  profile.hp,
            player_atk: profile.atk,
            player_def: profile.def,
            monster_hp: monster.hp,
            monster,
            turns:      Vec::new(),
        })
    }

    pub fn phase(&self) -> EncounterPhase {
        self.phase
    }

    pub fn monster(&self) -> &MonsterConfig {
        &self.monster
    }

    pub fn turns(&self) -> &[TurnRecord] {
        &self.turns
    }

    /// Start -> EncounterShown.
    pub fn reveal(&mut self) -> GameResult<()> {
        self.expect_phase(EncounterPhase::Start)?;
        self.phase = EncounterPhase::EncounterShown;
        Ok(())
    }

    /// EncounterShown -> Resolving -> Victory | Defeat.
    ///
    /// Strictly alternating turns while both sides stand. A killing blow
    /// by the player skips the monster's retaliation. Player damage is at
    /// least 1 every turn, so the loop is bounded by the monster's HP.
    pub fn resolve(&mut self, rules: &CombatConfig, rng: &mut GameRng) -> GameResult<EncounterPhase> {
        self.expect_phase(EncounterPhase::EncounterShown)?;
        self.phase = EncounterPhase::Resolving;

        let mut turn = 1u32;
        while self.player_hp > 0 && self.monster_hp > 0 {
            let (damage, crit) = player_strike(self.player_atk, rules, rng);
            self.monster_hp -= damage;
            self.turns.push(TurnRecord { turn, attacker: Attacker::Player, damage, crit });
            if self.monster_hp <= 0 {
                break;
            }

            let damage = monster_strike(self.monster.atk, self.player_def, rules, rng);
            self.player_hp -= damage;
            self.turns.push(TurnRecord { turn, attacker: Attacker::Monster, damage, crit: false });
            turn += 1;
        }

        self.phase = if self.player_hp > 0 {
            EncounterPhase::Victory
        } else {
            EncounterPhase::Defeat
        };
        Ok(self.phase)
    }

    pub fn is_victory(&self) -> bool {
        self.phase == EncounterPhase::Victory
    }

    /// Player HP clamped to [0, max_hp].
    pub fn final_hp(&self) -> i64 {
        self.player_hp.clamp(0, self.max_hp)
    }

    pub fn monster_hp(&self) -> i64 {
        self.monster_hp
    }

    /// Human-readable lines for the last `n` turns.
    pub fn log_tail(&self, n: usize) -> Vec<String> {
        let skip = self.turns.len().saturating_sub(n);
        self.turns[skip..]
            .iter()
            .map(|t| match t.attacker {
                Attacker::Player if t.crit => {
                    format!("Turn {}: You deal {} dmg (CRIT!)", t.turn, t.damage)
                }
                Attacker::Player => format!("Turn {}: You deal {} dmg", t.turn, t.damage),
                Attacker::Monster => {
                    format!("Turn {}: {} deals {} dmg", t.turn, self.monster.name, t.damage)
                }
            })
            .collect()
    }

    fn expect_phase(&self, expected: EncounterPhase) -> GameResult<()> {
        if self.phase != expected {
            return Err(GameError::precondition(format!(
                "encounter is {:?}, expected {:?}",
                self.phase, expected
            )));
        }
        Ok(())
    }
}

/// max(1, trunc(atk × U(0.9, 1.1))), doubled on a crit.
pub fn player_strike(atk: i64, rules: &CombatConfig, rng: &mut GameRng) -> (i64, bool) {
    let roll = rng.uniform(rules.player_roll_min, rules.player_roll_max);
    let mut damage = ((atk as f64 * roll) as i64).max(1);
    let crit = rng.chance(rules.crit_chance);
    if crit {
        damage *= 2;
    }
    (damage, crit)
}

/// max(0, trunc(atk × U(0.8, 1.2)) − U_int[0, def]).
pub fn monster_strike(atk: i64, def: i64, rules: &CombatConfig, rng: &mut GameRng) -> i64 {
    let roll = rng.uniform(rules.monster_roll_min, rules.monster_roll_max);
    let raw = (atk as f64 * roll) as i64;
    let blocked = rng.range_inclusive(0, def.max(0));
    (raw - blocked).max(0)
}

// ── Results ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterOutcome {
    pub monster:     String,
    pub monster_hp:  i64,
    pub monster_atk: i64,
    pub victory:     bool,
    pub hp_before:   i64,
    pub hp_after:    i64,
    pub gold:        Money,
    /// Shown to the player; not persisted.
    pub xp:          i64,
    pub turns:       usize,
    pub log_tail:    Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingClassChange {
    pub class: RpgClass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassChangePrompt {
    pub class:           RpgClass,
    pub expires_in_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClassChangeOutcome {
    Changed { profile: CombatProfile },
    Cancelled,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealOutcome {
    pub cost:   Money,
    pub hp:     i64,
    pub wallet: Money,
}

impl GameEngine {
    pub fn profile(&self, user: UserId) -> GameResult<CombatProfile> {
        self.ledger(user, |store| store.combat_profile(user))
    }

    /// Open a confirmation prompt for a class change. Nothing is reset
    /// until `confirm_class_change` accepts it.
    pub fn request_class_change(&self, user: UserId, class_name: &str) -> GameResult<ClassChangePrompt> {
        let class = self.selectable_class(class_name)?;
        self.ledger(user, |_| Ok(()))?;
        self.class_changes.put(user, PendingClassChange { class: class.class }, self.now());
        log::debug!("user={user} combat: class change to {} awaiting confirmation", class.class);
        Ok(ClassChangePrompt {
            class:           class.class,
            expires_in_secs: self.class_changes.ttl_secs(),
        })
    }

    pub fn confirm_class_change(&self, user: UserId, accept: bool) -> GameResult<ClassChangeOutcome> {
        let pending = match self.class_changes.take(user, self.now()) {
            Taken::Missing => {
                return Err(GameError::precondition("No class change is awaiting confirmation"))
            }
            Taken::Expired(_) => return Ok(ClassChangeOutcome::Expired),
            Taken::Live(p) => p,
        };
        if !accept {
            return Ok(ClassChangeOutcome::Cancelled);
        }

        let class = self
            .config
            .class(pending.class)
            .ok_or_else(|| GameError::validation(format!("{} is not selectable", pending.class)))?
            .clone();
        self.ledger(user, |store| {
            store.reset_class(user, &class)?;
            self.record(store, &GameEvent::ClassChanged { user, class: class.class })?;
            log::info!("user={user} combat: class is now {}", class.class);
            Ok(ClassChangeOutcome::Changed { profile: store.combat_profile(user)? })
        })
    }

    pub fn dungeon(&self, user: UserId) -> GameResult<EncounterOutcome> {
        self.ledger(user, |store| {
            let profile = store.combat_profile(user)?;
            // Refused before the draw so the combat stream does not move.
            profile.ensure_can_fight()?;

            let encounter = {
                let mut rng = self.rngs.combat.lock();
                let monster = rng.pick(&self.config.monsters).clone();
                let mut encounter = Encounter::begin(&profile, monster)?;
                encounter.reveal()?;
                encounter.resolve(&self.config.combat, &mut rng)?;
                encounter
            };

            let hp_after = encounter.final_hp();
            let monster = encounter.monster().clone();
            let gold = if encounter.is_victory() {
                store.record_victory(user, hp_after, monster.gold)?;
                monster.gold
            } else {
                store.set_hp(user, 0)?;
                0
            };

            let outcome = EncounterOutcome {
                monster:     monster.name.clone(),
                monster_hp:  monster.hp,
                monster_atk: monster.atk,
                victory:     encounter.is_victory(),
                hp_before:   profile.hp,
                hp_after,
                gold,
                xp:          monster.xp,
                turns:       encounter.turns().len(),
                log_tail:    encounter.log_tail(self.config.combat.log_tail),
            };

            self.record(store, &GameEvent::EncounterResolved {
                user,
                monster: outcome.monster.clone(),
                victory: outcome.victory,
                hp_after,
                gold,
            })?;
            log::debug!(
                "user={user} combat: {} vs {} in {} turns, hp {} -> {}",
                if outcome.victory { "won" } else { "lost" },
                outcome.monster,
                outcome.turns,
                outcome.hp_before,
                outcome.hp_after
            );
            Ok(outcome)
        })
    }

    /// Pay the heal cost and restore HP to max. Debit and heal commit together.
    pub fn heal(&self, user: UserId) -> GameResult<HealOutcome> {
        let cost = self.config.combat.heal_cost;
        self.ledger(user, |store| {
            if !store.heal(user, cost)? {
                let available = store.balance(user)?.get(BalanceField::Wallet);
                return Err(GameError::InsufficientFunds { needed: cost, available });
            }
            self.record(store, &GameEvent::Healed { user, cost })?;
            let profile = store.combat_profile(user)?;
            Ok(HealOutcome {
                cost,
                hp:     profile.hp,
                wallet: store.balance(user)?.wallet,
            })
        })
    }

    fn selectable_class(&self, name: &str) -> GameResult<&ClassConfig> {
        let invalid = || {
            let choices: Vec<&str> = self.config.classes.keys().map(|c| c.label()).collect();
            GameError::validation(format!("Invalid class. Choose: {}", choices.join(", ")))
        };
        let class: RpgClass = name.parse().map_err(|_| invalid())?;
        self.config.class(class).ok_or_else(invalid)
    }
}
