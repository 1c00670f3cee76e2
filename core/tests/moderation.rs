//! Moderation case log.

use alice_core::{engine::GameEngine, moderation::ModAction};
use chrono::Duration;

#[test]
fn cases_are_numbered_and_listed_in_order() {
    let engine = GameEngine::build_test(60).unwrap();

    let first = engine.log_moderation(5, 900, ModAction::Kick, Some("spam")).unwrap();
    engine.clock().advance(Duration::seconds(90));
    let second = engine.log_moderation(5, 901, ModAction::Ban, Some("  repeat offender ")).unwrap();
    engine.log_moderation(6, 900, ModAction::Kick, None).unwrap();

    assert!(second.case_id > first.case_id);
    assert_eq!(first.timestamp, "2024-01-01 00:00:00");
    assert_eq!(second.timestamp, "2024-01-01 00:01:30");

    let history = engine.moderation_history(5).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], first);
    assert_eq!(history[1].action, ModAction::Ban);
    assert_eq!(history[1].reason, "repeat offender");
    assert_eq!(history[1].moderator_id, 901);
}

#[test]
fn blank_reason_gets_a_default() {
    let engine = GameEngine::build_test(61).unwrap();
    let none = engine.log_moderation(1, 2, ModAction::Kick, None).unwrap();
    let blank = engine.log_moderation(1, 2, ModAction::Kick, Some("   ")).unwrap();
    assert_eq!(none.reason, "No reason provided");
    assert_eq!(blank.reason, "No reason provided");
}

#[test]
fn unknown_user_has_no_history() {
    let engine = GameEngine::build_test(62).unwrap();
    assert!(engine.moderation_history(404).unwrap().is_empty());
}

#[test]
fn action_tags_parse_case_insensitively() {
    assert_eq!("ban".parse::<ModAction>().unwrap(), ModAction::Ban);
    assert_eq!("KICK".parse::<ModAction>().unwrap(), ModAction::Kick);
    assert!("mute".parse::<ModAction>().is_err());
}
