//! Two engines, same seed, same commands.
//! They must produce identical results and identical event logs.

use alice_core::{command::PlayerCommand, engine::GameEngine};

fn script() -> Vec<PlayerCommand> {
    let lines = [
        r#"{"cmd":"grant","user":1,"amount":5000,"field":"wallet"}"#,
        r#"{"cmd":"grant","user":2,"amount":800,"field":"wallet"}"#,
        r#"{"cmd":"work","user":1}"#,
        r#"{"cmd":"crime","user":2}"#,
        r#"{"cmd":"tick_market"}"#,
        r#"{"cmd":"buy_stock","user":1,"symbol":"mem","amount":7}"#,
        r#"{"cmd":"coinflip","user":2,"bet":50,"choice":"heads"}"#,
        r#"{"cmd":"slots","user":1,"bet":25}"#,
        r#"{"cmd":"blackjack","user":2,"bet":40}"#,
        r#"{"cmd":"blackjack_act","user":2,"action":"stand"}"#,
        r#"{"cmd":"dungeon","user":1}"#,
        r#"{"cmd":"tick_market"}"#,
        r#"{"cmd":"buy_stock","user":1,"symbol":"MEM","amount":3}"#,
        r#"{"cmd":"deposit","user":1,"amount":100}"#,
        r#"{"cmd":"roulette","user":2}"#,
    ];
    lines
        .iter()
        .map(|l| serde_json::from_str(l).expect("valid command"))
        .collect()
}

fn run(seed: u64) -> (Vec<String>, Vec<String>) {
    let engine = GameEngine::build_test(seed).expect("build test engine");
    let results = script()
        .iter()
        .map(|cmd| match engine.execute(cmd) {
            Ok(v) => v.to_string(),
            Err(e) => format!("error: {e}"),
        })
        .collect();
    let events = [1, 2]
        .iter()
        .flat_map(|&user| engine.events_for_user(user).expect("read events"))
        .map(|e| format!("{}|{}|{}", e.kind, e.payload, e.created_at))
        .collect();
    (results, events)
}

#[test]
fn same_seed_produces_identical_runs() {
    let (results_a, events_a) = run(0xDEAD_BEEF);
    let (results_b, events_b) = run(0xDEAD_BEEF);

    assert!(!events_a.is_empty());
    assert_eq!(results_a, results_b, "results diverged");
    for (i, (a, b)) in events_a.iter().zip(&events_b).enumerate() {
        assert_eq!(a, b, "event {i} diverged");
    }
    assert_eq!(events_a.len(), events_b.len());
}

#[test]
fn different_seeds_diverge() {
    let (results_a, _) = run(1);
    let (results_b, _) = run(2);
    assert_ne!(results_a, results_b, "seeds 1 and 2 produced identical runs");
}
