use crate::combat::RpgClass;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub salary: i64,
    /// Carried for compatibility; job selection does not gate on it.
    pub xp_req: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrimeConfig {
    /// A roll strictly above this succeeds (0.6 = 40% success).
    pub success_threshold: f64,
    pub loot_min: i64,
    pub loot_max: i64,
    pub fine_min: i64,
    pub fine_max: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct EconomyFile {
    jobs: Vec<JobConfig>,
    crime: CrimeConfig,
    pay_factor_min: f64,
    pay_factor_max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct MarketFile {
    instruments: Vec<InstrumentConfig>,
    price_floor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassConfig {
    pub class: RpgClass,
    pub hp: i64,
    pub atk: i64,
    pub def: i64,
    pub agl: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterConfig {
    pub name: String,
    pub hp: i64,
    pub atk: i64,
    pub xp: i64,
    pub gold: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    pub heal_cost: i64,
    pub crit_chance: f64,
    pub player_roll_min: f64,
    pub player_roll_max: f64,
    pub monster_roll_min: f64,
    pub monster_roll_max: f64,
    /// How many trailing log lines a result surfaces.
    pub log_tail: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct CombatFile {
    classes: Vec<ClassConfig>,
    monsters: Vec<MonsterConfig>,
    rules: CombatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasinoConfig {
    pub slot_symbols: Vec<String>,
    pub jackpot_multiplier: i64,
    pub pair_multiplier: f64,
    /// Card values the shoe draws from, with replacement.
    pub shoe: Vec<u8>,
    pub dealer_stands_on: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub market_tick_secs: i64,
    pub blackjack_timeout_secs: i64,
    pub confirm_timeout_secs: i64,
    pub mood_rotation_secs: i64,
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub jobs: Vec<JobConfig>,
    pub pay_factor_min: f64,
    pub pay_factor_max: f64,
    pub crime: CrimeConfig,
    pub instruments: Vec<InstrumentConfig>,
    pub price_floor: f64,
    pub classes: BTreeMap<RpgClass, ClassConfig>,
    pub monsters: Vec<MonsterConfig>,
    pub combat: CombatConfig,
    pub casino: CasinoConfig,
    pub timing: TimingConfig,
}

impl GameConfig {
    /// Load every table from the data/ directory.
    /// In tests, use GameConfig::builtin().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let economy: EconomyFile = read_json(&format!("{data_dir}/economy.json"))?;
        let market: MarketFile = read_json(&format!("{data_dir}/market.json"))?;
        let combat: CombatFile = read_json(&format!("{data_dir}/combat.json"))?;
        let casino: CasinoConfig = read_json(&format!("{data_dir}/casino.json"))?;
        let timing: TimingConfig = read_json(&format!("{data_dir}/timing.json"))?;

        let config = Self {
            jobs: economy.jobs,
            pay_factor_min: economy.pay_factor_min,
            pay_factor_max: economy.pay_factor_max,
            crime: economy.crime,
            instruments: market.instruments,
            price_floor: market.price_floor,
            classes: combat.classes.into_iter().map(|c| (c.class, c)).collect(),
            monsters: combat.monsters,
            combat: combat.rules,
            casino,
            timing,
        };
        config.validate()?;
        Ok(config)
    }

    /// Tables compiled into the binary. Identical to the shipped data/ files.
    pub fn builtin() -> Self {
        let job = |name: &str, salary, xp_req| JobConfig { name: name.into(), salary, xp_req };
        let instrument = |symbol: &str, name: &str, price, volatility| InstrumentConfig {
            symbol: symbol.into(),
            name: name.into(),
            price,
            volatility,
        };
        let class = |class, hp, atk, def, agl| (class, ClassConfig { class, hp, atk, def, agl });
        let monster = |name: &str, hp, atk, xp, gold| MonsterConfig {
            name: name.into(),
            hp,
            atk,
            xp,
            gold,
        };

        Self {
            jobs: vec![
                job("Janitor", 50, 0),
                job("Cashier", 80, 100),
                job("Developer", 200, 500),
                job("Manager", 400, 1000),
                job("CEO", 1000, 5000),
            ],
            pay_factor_min: 0.8,
            pay_factor_max: 1.2,
            crime: CrimeConfig {
                success_threshold: 0.6,
                loot_min: 300,
                loot_max: 1000,
                fine_min: 100,
                fine_max: 500,
            },
            instruments: vec![
                instrument("ALC", "Alice Corp", 100.0, 0.05),
                instrument("TCH", "TechGiant", 250.0, 0.03),
                instrument("MEM", "MemeStonk", 10.0, 0.20),
                instrument("GLD", "GoldRes", 1500.0, 0.01),
                instrument("OIL", "DinoJuice", 80.0, 0.04),
            ],
            price_floor: 0.1,
            classes: [
                class(RpgClass::Warrior, 150, 15, 10, 5),
                class(RpgClass::Mage, 90, 25, 3, 8),
                class(RpgClass::Rogue, 110, 20, 5, 20),
                class(RpgClass::Tank, 200, 8, 20, 2),
            ]
            .into_iter()
            .collect(),
            monsters: vec![
                monster("Slime", 30, 5, 10, 10),
                monster("Goblin Scout", 50, 10, 25, 30),
                monster("Orc Brute", 120, 18, 100, 150),
                monster("Dark Wizard", 80, 40, 200, 300),
                monster("Elder Dragon", 500, 70, 1000, 2000),
            ],
            combat: CombatConfig {
                heal_cost: 50,
                crit_chance: 0.1,
                player_roll_min: 0.9,
                player_roll_max: 1.1,
                monster_roll_min: 0.8,
                monster_roll_max: 1.2,
                log_tail: 3,
            },
            casino: CasinoConfig {
                slot_symbols: ["🍒", "🍊", "🍋", "🍇", "💎", "7️⃣", "🔔"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                jackpot_multiplier: 10,
                pair_multiplier: 1.5,
                shoe: vec![2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10, 11],
                dealer_stands_on: 17,
            },
            timing: TimingConfig {
                market_tick_secs: 300,
                blackjack_timeout_secs: 60,
                confirm_timeout_secs: 30,
                mood_rotation_secs: 1800,
            },
        }
    }

    /// Reject tables the engine cannot draw from.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jobs.is_empty() {
            anyhow::bail!("job table is empty");
        }
        if self.monsters.is_empty() {
            anyhow::bail!("monster table is empty");
        }
        if self.instruments.is_empty() {
            anyhow::bail!("instrument table is empty");
        }
        if self.casino.slot_symbols.is_empty() || self.casino.shoe.is_empty() {
            anyhow::bail!("casino tables are empty");
        }
        if self.price_floor <= 0.0 {
            anyhow::bail!("price floor must be positive, got {}", self.price_floor);
        }
        if let Some(bad) = self.instruments.iter().find(|i| i.price <= 0.0 || i.volatility < 0.0) {
            anyhow::bail!("instrument {} has invalid price or volatility", bad.symbol);
        }
        if self.crime.loot_min > self.crime.loot_max || self.crime.fine_min > self.crime.fine_max {
            anyhow::bail!("crime ranges are inverted");
        }
        if self.pay_factor_min > self.pay_factor_max {
            anyhow::bail!("pay factor range is inverted");
        }
        let rules = &self.combat;
        if rules.player_roll_min > rules.player_roll_max || rules.monster_roll_min > rules.monster_roll_max {
            anyhow::bail!("combat roll ranges are inverted");
        }
        if !(0.0..=1.0).contains(&rules.crit_chance) {
            anyhow::bail!("crit chance must be within [0, 1], got {}", rules.crit_chance);
        }
        if let Some(bad) = self.classes.values().find(|c| c.hp <= 0) {
            anyhow::bail!("class {} needs positive hp, got {}", bad.class, bad.hp);
        }
        if let Some(bad) = self.monsters.iter().find(|m| m.hp < 0 || m.gold < 0) {
            anyhow::bail!("monster {} has negative hp or gold", bad.name);
        }
        Ok(())
    }

    pub fn class(&self, class: RpgClass) -> Option<&ClassConfig> {
        self.classes.get(&class)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))
}
