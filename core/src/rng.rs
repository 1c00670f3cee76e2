//! Deterministic random number generation.
//!
//! RULE: Nothing in the engine may call any platform RNG.
//! All randomness flows through GameRng instances derived
//! from the single master seed the engine was built with.
//!
//! Each component gets its own RNG stream, seeded from
//! (master_seed XOR slot_index * golden ratio). This means:
//!   - Adding a new component never changes existing components' streams.
//!   - A dungeon fight never shifts the next slots spin, and vice versa.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single engine component.
pub struct GameRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl GameRng {
    /// Create a stream from the master seed and a stable slot index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Uniform float in [lo, hi).
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Uniform integer in [lo, hi], both ends inclusive.
    pub fn range_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        assert!(lo <= hi, "empty range {lo}..={hi}");
        let span = (hi - lo) as u64 + 1;
        lo + self.next_u64_below(span) as i64
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick one element uniformly. Panics on an empty slice; every table
    /// passed here is validated non-empty when config is loaded.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        let idx = self.next_u64_below(items.len() as u64) as usize;
        &items[idx]
    }
}

/// All component RNGs for one engine, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_slot(&self, slot: RngSlot) -> GameRng {
        GameRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable slot assignments.
/// NEVER reorder or remove entries. Append only.
/// Reordering changes every component's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngSlot {
    Market  = 0,
    Economy = 1,
    Combat  = 2,
    Casino  = 3,
    Persona = 4,
    // Add new components here, at the end.
}

impl RngSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Market  => "market",
            Self::Economy => "economy",
            Self::Combat  => "combat",
            Self::Casino  => "casino",
            Self::Persona => "persona",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let bank = RngBank::new(12345);
        let mut a = bank.for_slot(RngSlot::Casino);
        let mut b = bank.for_slot(RngSlot::Casino);
        for _ in 0..32 {
            assert_eq!(a.next_u64_below(1000), b.next_u64_below(1000));
        }
    }

    #[test]
    fn slots_get_independent_streams() {
        let bank = RngBank::new(12345);
        let mut a = bank.for_slot(RngSlot::Casino);
        let mut b = bank.for_slot(RngSlot::Combat);
        let same = (0..32).all(|_| a.next_u64_below(1 << 40) == b.next_u64_below(1 << 40));
        assert!(!same, "Casino and combat streams should differ");
    }

    #[test]
    fn range_inclusive_hits_both_ends() {
        let mut rng = RngBank::new(7).for_slot(RngSlot::Economy);
        let draws: Vec<i64> = (0..500).map(|_| rng.range_inclusive(0, 3)).collect();
        assert!(draws.iter().all(|d| (0..=3).contains(d)));
        assert!(draws.contains(&0));
        assert!(draws.contains(&3));
    }

    #[test]
    fn uniform_stays_in_bounds() {
        let mut rng = RngBank::new(99).for_slot(RngSlot::Market);
        for _ in 0..1000 {
            let x = rng.uniform(-0.2, 0.2);
            assert!((-0.2..0.2).contains(&x), "{x} out of range");
        }
    }
}
