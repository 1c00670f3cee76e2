//! The game engine, the single entry point for every user action.
//!
//! Operations are spread over the component modules (economy, combat,
//! casino, blackjack, moderation, persona), each adding an `impl GameEngine`
//! block. This file owns construction, shared plumbing and housekeeping.
//!
//! RULES:
//!   - Every operation registers the user before touching their rows.
//!   - Every ledger mutation records one event under the same store lock.
//!   - All randomness flows through the per-component streams in `rngs`.
//!   - Lock order is store, then rng. Never take the store while holding
//!     an rng, the market or a session table.

use crate::{
    blackjack::{BlackjackHand, BlackjackResult},
    clock::{GameClock, MarketSchedule},
    combat::PendingClassChange,
    config::GameConfig,
    error::{GameError, GameResult},
    event::{EventLogEntry, GameEvent},
    market::{Market, Quote},
    persona::{Mood, PersonaState},
    rng::{GameRng, RngBank, RngSlot},
    session::SessionTable,
    store::{Balance, BalanceField, LedgerStore},
    types::{Money, UserId},
};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One independent stream per component.
pub(crate) struct EngineRngs {
    pub(crate) market:  Mutex<GameRng>,
    pub(crate) economy: Mutex<GameRng>,
    pub(crate) combat:  Mutex<GameRng>,
    pub(crate) casino:  Mutex<GameRng>,
    pub(crate) persona: Mutex<GameRng>,
}

impl EngineRngs {
    fn new(bank: &RngBank) -> Self {
        Self {
            market:  Mutex::new(bank.for_slot(RngSlot::Market)),
            economy: Mutex::new(bank.for_slot(RngSlot::Economy)),
            combat:  Mutex::new(bank.for_slot(RngSlot::Combat)),
            casino:  Mutex::new(bank.for_slot(RngSlot::Casino)),
            persona: Mutex::new(bank.for_slot(RngSlot::Persona)),
        }
    }
}

/// What one housekeeping pass did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Housekeeping {
    pub market_tick:           Option<Vec<Quote>>,
    pub blackjack_timeouts:    Vec<BlackjackResult>,
    pub class_change_timeouts: Vec<UserId>,
    pub mood:                  Option<Mood>,
}

/// Sessions that ran past their idle timeout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpiredSessions {
    pub blackjack:     Vec<BlackjackResult>,
    pub class_changes: Vec<UserId>,
}

pub struct GameEngine {
    pub(crate) config:        GameConfig,
    pub(crate) rngs:          EngineRngs,
    pub(crate) blackjack:     SessionTable<BlackjackHand>,
    pub(crate) class_changes: SessionTable<PendingClassChange>,
    pub(crate) persona:       Mutex<PersonaState>,
    store:                    Mutex<LedgerStore>,
    market:                   Arc<Market>,
    schedule:                 Mutex<MarketSchedule>,
    clock:                    GameClock,
    rng_bank:                 RngBank,
}

impl GameEngine {
    /// Wire an engine around an opened store. Applies migrations.
    pub fn new(config: GameConfig, store: LedgerStore, seed: u64, clock: GameClock) -> GameResult<Self> {
        store.migrate()?;
        let rng_bank = RngBank::new(seed);
        let now = clock.now();
        let market = Arc::new(Market::from_config(&config.instruments, config.price_floor));
        let timing = config.timing.clone();
        Ok(Self {
            rngs:          EngineRngs::new(&rng_bank),
            blackjack:     SessionTable::new(timing.blackjack_timeout_secs),
            class_changes: SessionTable::new(timing.confirm_timeout_secs),
            persona:       Mutex::new(PersonaState::new(now)),
            store:         Mutex::new(store),
            market,
            schedule:      Mutex::new(MarketSchedule::new(timing.market_tick_secs)),
            clock,
            rng_bank,
            config,
        })
    }

    /// Production wiring: tables from `data_dir`, system clock, and a
    /// SQLite file at `db` (in-memory when None).
    pub fn build(seed: u64, db: Option<&str>, data_dir: &str) -> anyhow::Result<Self> {
        let config = GameConfig::load(data_dir)?;
        let store = match db {
            Some(path) => LedgerStore::open(path)?,
            None => LedgerStore::in_memory()?,
        };
        let engine = Self::new(config, store, seed, GameClock::system())?;
        log::info!("engine: built with seed {seed}, db {}", db.unwrap_or(":memory:"));
        Ok(engine)
    }

    /// In-memory store, builtin tables and a manual clock starting at
    /// 2024-01-01T00:00:00Z.
    pub fn build_test(seed: u64) -> GameResult<Self> {
        Self::new(
            GameConfig::builtin(),
            LedgerStore::in_memory()?,
            seed,
            GameClock::manual(test_epoch()),
        )
    }

    // ── Accessors ──────────────────────────────────────────────

    /// Direct store access for inspection and fixtures.
    pub fn store(&self) -> MutexGuard<'_, LedgerStore> {
        self.store.lock()
    }

    pub fn market(&self) -> &Arc<Market> {
        &self.market
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn seed(&self) -> u64 {
        self.rng_bank.master_seed()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Plumbing ───────────────────────────────────────────────

    /// Lock the store, make sure `user` exists, then run `f`.
    pub(crate) fn ledger<T>(
        &self,
        user: UserId,
        f: impl FnOnce(&LedgerStore) -> GameResult<T>,
    ) -> GameResult<T> {
        let store = self.store.lock();
        store.register_if_absent(user, self.now())?;
        f(&store)
    }

    /// Append `event` to the event log. Call with the store already locked.
    pub(crate) fn record(&self, store: &LedgerStore, event: &GameEvent) -> GameResult<()> {
        let entry = EventLogEntry {
            id:         None,
            user_id:    event.user(),
            kind:       event_kind(event).to_string(),
            payload:    serde_json::to_string(event)?,
            created_at: self.now().to_rfc3339(),
        };
        store.append_event(&entry)
    }

    // ── Operations ─────────────────────────────────────────────

    /// Credit a balance directly. Used by administrators and fixtures.
    pub fn grant(&self, user: UserId, amount: Money, field: BalanceField) -> GameResult<Balance> {
        if amount <= 0 {
            return Err(GameError::validation("Grant amount must be positive"));
        }
        self.ledger(user, |store| {
            store.adjust_balance(user, amount, field)?;
            self.record(store, &GameEvent::Granted { user, field, amount })?;
            store.balance(user)
        })
    }

    pub fn events_for_user(&self, user: UserId) -> GameResult<Vec<EventLogEntry>> {
        self.store.lock().events_for_user(user)
    }

    /// Advance every instrument once, regardless of the schedule.
    pub fn tick_market(&self) -> Vec<Quote> {
        let mut schedule = self.schedule.lock();
        self.tick_market_locked(&mut schedule)
    }

    /// Tick only when a full period has elapsed since the last tick.
    pub fn tick_market_if_due(&self) -> Option<Vec<Quote>> {
        let mut schedule = self.schedule.lock();
        if !schedule.due(self.now()) {
            return None;
        }
        Some(self.tick_market_locked(&mut schedule))
    }

    fn tick_market_locked(&self, schedule: &mut MarketSchedule) -> Vec<Quote> {
        let quotes = {
            let mut rng = self.rngs.market.lock();
            self.market.tick(&mut rng)
        };
        let tick = schedule.advance(self.now());
        log::info!("tick={tick} market: prices updated");
        quotes
    }

    /// Settle idle blackjack hands as a Stand and drop idle confirmations.
    pub fn expire_sessions(&self) -> GameResult<ExpiredSessions> {
        let now = self.now();
        let mut expired = ExpiredSessions::default();

        for (user, hand) in self.blackjack.drain_expired(now) {
            expired.blackjack.push(self.settle_timed_out(user, hand)?);
        }
        for (user, pending) in self.class_changes.drain_expired(now) {
            log::debug!("user={user} combat: class change to {} timed out", pending.class);
            expired.class_changes.push(user);
        }
        Ok(expired)
    }

    /// One pass of the periodic background work.
    pub fn housekeeping(&self) -> GameResult<Housekeeping> {
        let market_tick = self.tick_market_if_due();
        let expired = self.expire_sessions()?;
        let mood = self.rotate_mood_if_due();
        Ok(Housekeeping {
            market_tick,
            blackjack_timeouts: expired.blackjack,
            class_change_timeouts: expired.class_changes,
            mood,
        })
    }
}

fn test_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Stable name for the event_log kind column.
fn event_kind(event: &GameEvent) -> &'static str {
    match event {
        GameEvent::Granted { .. }           => "granted",
        GameEvent::FundsTransferred { .. }  => "funds_transferred",
        GameEvent::WorkPaid { .. }          => "work_paid",
        GameEvent::CrimeSucceeded { .. }    => "crime_succeeded",
        GameEvent::CrimeFailed { .. }       => "crime_failed",
        GameEvent::StockPurchased { .. }    => "stock_purchased",
        GameEvent::ClassChanged { .. }      => "class_changed",
        GameEvent::EncounterResolved { .. } => "encounter_resolved",
        GameEvent::Healed { .. }            => "healed",
        GameEvent::CoinflipSettled { .. }   => "coinflip_settled",
        GameEvent::SlotsSettled { .. }      => "slots_settled",
        GameEvent::BlackjackDealt { .. }    => "blackjack_dealt",
        GameEvent::BlackjackSettled { .. }  => "blackjack_settled",
        GameEvent::ModerationLogged { .. }  => "moderation_logged",
    }
}
