//! bot-runner: headless command runner for the Alice game engine.
//!
//! Reads one JSON command per line on stdin and writes one JSON reply per
//! line on stdout. A background thread handles the periodic work (market
//! ticks, idle session timeouts, mood rotation).
//!
//! Usage:
//!   bot-runner --seed 12345 --db alice.db --data-dir ./data
//!   echo '{"cmd":"work","user":1}' | bot-runner

use alice_core::{command::PlayerCommand, engine::GameEngine, error::GameError};
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::env;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Serialize)]
struct ErrorBody {
    kind:    String,
    message: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Reply {
    Ok { ok: bool, result: Value },
    Err { ok: bool, error: ErrorBody },
}

impl Reply {
    fn ok(result: Value) -> Self {
        Self::Ok { ok: true, result }
    }

    fn err(kind: &str, message: impl Into<String>) -> Self {
        Self::Err {
            ok: false,
            error: ErrorBody { kind: kind.to_string(), message: message.into() },
        }
    }

    fn from_error(e: &GameError) -> Self {
        Self::err(e.kind(), e.to_string())
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let interval = parse_arg(&args, "--housekeeping-secs", 5u64);
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str());
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    eprintln!("Alice bot-runner");
    eprintln!("  seed:      {seed}");
    eprintln!("  db:        {}", db.unwrap_or(":memory:"));
    eprintln!("  data_dir:  {data_dir}");

    let engine = Arc::new(GameEngine::build(seed, db, data_dir)?);
    let running = Arc::new(AtomicBool::new(true));
    let worker = spawn_housekeeping(Arc::clone(&engine), Arc::clone(&running), interval);

    let served = run_command_loop(&engine);

    running.store(false, Ordering::Relaxed);
    if worker.join().is_err() {
        log::error!("housekeeping thread panicked");
    }
    let served = served?;
    log::info!("runner: served {served} commands");
    Ok(())
}

fn spawn_housekeeping(
    engine: Arc<GameEngine>,
    running: Arc<AtomicBool>,
    interval_secs: u64,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let step = Duration::from_millis(200);
        let mut waited = Duration::ZERO;
        while running.load(Ordering::Relaxed) {
            thread::sleep(step);
            waited += step;
            if waited < Duration::from_secs(interval_secs) {
                continue;
            }
            waited = Duration::ZERO;
            match engine.housekeeping() {
                Ok(report) => {
                    for hand in &report.blackjack_timeouts {
                        log::info!("user={} blackjack: settled after timeout", hand.user);
                    }
                    if let Some(mood) = report.mood {
                        log::debug!("persona: rotated to {mood:?}");
                    }
                }
                Err(e) => log::error!("housekeeping failed: {e}"),
            }
        }
    })
}

fn run_command_loop(engine: &GameEngine) -> Result<u64> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut served = 0u64;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if line.trim() == "quit" {
            break;
        }

        let reply = match serde_json::from_str::<PlayerCommand>(&line) {
            Err(e) => Reply::err("parse", e.to_string()),
            Ok(command) => match engine.execute(&command) {
                Ok(result) => Reply::ok(result),
                Err(e) => {
                    if !e.is_user_facing() {
                        log::error!("command {command:?} failed: {e}");
                    }
                    Reply::from_error(&e)
                }
            },
        };
        served += 1;
        writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
        stdout.flush()?;
    }
    Ok(served)
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
