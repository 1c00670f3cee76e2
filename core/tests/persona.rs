//! Mood rotation and novelty commands.

use alice_core::{engine::GameEngine, persona::Mood};
use chrono::Duration;

#[test]
fn mood_rotates_only_after_period() {
    let engine = GameEngine::build_test(80).unwrap();
    assert_eq!(engine.mood().mood, Mood::Happy);

    engine.clock().advance(Duration::seconds(1_799));
    assert!(engine.rotate_mood_if_due().is_none());

    engine.clock().advance(Duration::seconds(1));
    let mood = engine.rotate_mood_if_due().expect("rotation due");
    assert_eq!(engine.mood().mood, mood);
    assert_eq!(engine.mood().activity, mood.activity());
    assert!(engine.rotate_mood_if_due().is_none(), "timer restarts");
}

#[test]
fn eight_ball_answers_from_mood_pool() {
    let engine = GameEngine::build_test(81).unwrap();
    for _ in 0..20 {
        let mood = engine.rotate_mood();
        let answer = engine.eight_ball("Am I rich?").unwrap();
        assert_eq!(answer.mood, mood);
        assert!(mood.eight_ball_answers().contains(&answer.answer.as_str()));
    }
    assert_eq!(engine.eight_ball("  ").unwrap_err().kind(), "validation");
}

#[test]
fn roulette_fires_about_one_in_six() {
    let engine = GameEngine::build_test(82).unwrap();
    let spins = 6_000;
    let bangs = (0..spins).filter(|_| engine.roulette(1).bang).count();
    assert!((700..1_300).contains(&bangs), "{bangs} bangs in {spins} spins");

    let spin = engine.roulette(1);
    assert_eq!(spin.timeout_secs.is_some(), spin.bang);
}
