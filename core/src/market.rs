//! Market simulator, a random walk over a fixed set of instruments.
//!
//! Prices live in memory only and restart from their configured values
//! whenever the engine is rebuilt. Ticks are scheduled by the caller.

use crate::{
    config::InstrumentConfig,
    rng::GameRng,
    types::{Symbol, Tick},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol:     Symbol,
    pub name:       String,
    pub price:      f64,
    pub volatility: f64,
    /// Price before the latest tick; equal to `price` until the first one.
    pub previous:   f64,
}

/// What players see for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol:     Symbol,
    pub name:       String,
    pub price:      f64,
    pub previous:   f64,
    pub change_pct: f64,
}

impl Quote {
    fn of(inst: &Instrument) -> Self {
        Self {
            symbol:     inst.symbol.clone(),
            name:       inst.name.clone(),
            price:      inst.price,
            previous:   inst.previous,
            change_pct: (inst.price - inst.previous) / inst.previous * 100.0,
        }
    }
}

struct MarketState {
    instruments: BTreeMap<Symbol, Instrument>,
    tick:        Tick,
}

pub struct Market {
    state:       RwLock<MarketState>,
    price_floor: f64,
}

impl Market {
    pub fn from_config(instruments: &[InstrumentConfig], price_floor: f64) -> Self {
        let instruments = instruments
            .iter()
            .map(|i| {
                let symbol = i.symbol.to_ascii_uppercase();
                (
                    symbol.clone(),
                    Instrument {
                        symbol,
                        name:       i.name.clone(),
                        price:      i.price,
                        volatility: i.volatility,
                        previous:   i.price,
                    },
                )
            })
            .collect();
        Self {
            state: RwLock::new(MarketState { instruments, tick: 0 }),
            price_floor,
        }
    }

    /// Move every instrument once: `price *= 1 + U(-vol, vol)`, floored.
    /// Instruments draw in symbol order so a seed replays exactly.
    pub fn tick(&self, rng: &mut GameRng) -> Vec<Quote> {
        let mut state = self.state.write();
        state.tick += 1;
        let tick = state.tick;
        let quotes: Vec<Quote> = state
            .instruments
            .values_mut()
            .map(|inst| {
                let change = rng.uniform(-inst.volatility, inst.volatility);
                inst.previous = inst.price;
                inst.price = (inst.price * (1.0 + change)).max(self.price_floor);
                Quote::of(inst)
            })
            .collect();
        if let Some(top) = quotes.iter().max_by(|a, b| a.change_pct.abs().total_cmp(&b.change_pct.abs())) {
            log::debug!("tick={tick} market: {} moved, largest {} {:+.2}%", quotes.len(), top.symbol, top.change_pct);
        }
        quotes
    }

    /// Case-insensitive lookup.
    pub fn quote(&self, symbol: &str) -> Option<Instrument> {
        self.state
            .read()
            .instruments
            .get(&symbol.trim().to_ascii_uppercase())
            .cloned()
    }

    /// Every instrument with its move over the latest tick, in symbol order.
    pub fn listing(&self) -> Vec<Quote> {
        self.state.read().instruments.values().map(Quote::of).collect()
    }

    pub fn current_tick(&self) -> Tick {
        self.state.read().tick
    }
}
