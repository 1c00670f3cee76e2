//! Suspended multi-step interactions.
//!
//! A session is a small state machine owned by one user and advanced by
//! discrete input events. The table does not run timers: every access
//! passes the current time and an idle session is reported as expired the
//! next time anyone touches it, or when the housekeeping loop drains it.

use crate::types::UserId;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

struct Slot<S> {
    state:      S,
    touched_at: DateTime<Utc>,
}

/// Result of removing a session from its table.
#[derive(Debug, PartialEq)]
pub enum Taken<S> {
    Live(S),
    /// Idle past the TTL. The caller applies the timeout rule.
    Expired(S),
    Missing,
}

/// At most one session per user.
pub struct SessionTable<S> {
    ttl:   Duration,
    slots: Mutex<HashMap<UserId, Slot<S>>>,
}

impl<S> SessionTable<S> {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl:   Duration::seconds(ttl_secs),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Idle time after which a session lapses.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    fn expired(&self, slot: &Slot<S>, now: DateTime<Utc>) -> bool {
        now - slot.touched_at >= self.ttl
    }

    /// Start a session. Fails with the rejected state if a live one exists.
    /// An expired leftover is evicted and handed back so the caller can
    /// settle it.
    pub fn open(&self, user: UserId, state: S, now: DateTime<Utc>) -> Result<Option<S>, S> {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get(&user) {
            if !self.expired(slot, now) {
                return Err(state);
            }
        }
        let stale = slots
            .insert(user, Slot { state, touched_at: now })
            .map(|old| old.state);
        Ok(stale)
    }

    pub fn take(&self, user: UserId, now: DateTime<Utc>) -> Taken<S> {
        let mut slots = self.slots.lock();
        match slots.remove(&user) {
            None => Taken::Missing,
            Some(slot) if self.expired(&slot, now) => Taken::Expired(slot.state),
            Some(slot) => Taken::Live(slot.state),
        }
    }

    /// Insert or replace, resetting the idle timer.
    pub fn put(&self, user: UserId, state: S, now: DateTime<Utc>) {
        self.slots.lock().insert(user, Slot { state, touched_at: now });
    }

    /// Remove and return every session idle past the TTL.
    pub fn drain_expired(&self, now: DateTime<Utc>) -> Vec<(UserId, S)> {
        let mut slots = self.slots.lock();
        let stale: Vec<UserId> = slots
            .iter()
            .filter(|(_, slot)| self.expired(slot, now))
            .map(|(user, _)| *user)
            .collect();
        let mut drained: Vec<(UserId, S)> = stale
            .into_iter()
            .filter_map(|user| slots.remove(&user).map(|slot| (user, slot.state)))
            .collect();
        drained.sort_by_key(|(user, _)| *user);
        drained
    }

    pub fn is_live(&self, user: UserId, now: DateTime<Utc>) -> bool {
        self.slots
            .lock()
            .get(&user)
            .is_some_and(|slot| !self.expired(slot, now))
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
