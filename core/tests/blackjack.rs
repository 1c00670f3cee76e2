//! Blackjack sessions: escrow, actions, timeouts and settlement.

use alice_core::{
    blackjack::{BlackjackAction, BlackjackResult, BlackjackStatus, HandOutcome},
    engine::GameEngine,
    store::BalanceField,
};
use chrono::Duration;

fn funded(seed: u64, wallet: i64) -> GameEngine {
    let engine = GameEngine::build_test(seed).expect("build test engine");
    engine.grant(1, wallet, BalanceField::Wallet).unwrap();
    engine
}

/// An engine whose first hand for user 1 is still in play.
fn open_hand(wallet: i64, bet: i64) -> (GameEngine, BlackjackResult) {
    for seed in 0..100 {
        let engine = funded(seed, wallet);
        let hand = engine.blackjack_start(1, bet).unwrap();
        if !hand.is_settled() {
            return (engine, hand);
        }
    }
    panic!("no seed dealt an open hand");
}

fn payout(result: &BlackjackResult) -> i64 {
    match &result.status {
        BlackjackStatus::Settled { payout, .. } => *payout,
        BlackjackStatus::PlayerTurn { .. } => panic!("hand not settled"),
    }
}

#[test]
fn stake_is_escrowed_at_deal() {
    let (engine, hand) = open_hand(100, 30);
    assert_eq!(hand.wallet, 70);
    assert_eq!(hand.player.len(), 2);
    assert!(hand.player_score < 21);
    assert_eq!(engine.balance(1).unwrap().wallet, 70);
}

#[test]
fn stand_settles_with_escrow_returned_per_outcome() {
    let (engine, _) = open_hand(100, 30);
    let result = engine.blackjack_act(1, BlackjackAction::Stand).unwrap();

    let BlackjackStatus::Settled { outcome, dealer_score, net, .. } = &result.status else {
        panic!("stand must settle");
    };
    assert_eq!(*outcome, HandOutcome::judge(result.player_score, *dealer_score));
    assert!(*dealer_score >= 17);
    assert_eq!(*net, payout(&result) - 30);
    assert_eq!(result.wallet, 70 + payout(&result));
    assert_eq!(engine.blackjack_act(1, BlackjackAction::Stand).unwrap_err().kind(), "precondition");
}

#[test]
fn hitting_until_done_settles_bust_as_loss() {
    let (engine, _) = open_hand(100, 30);
    let mut result = engine.blackjack_act(1, BlackjackAction::Hit).unwrap();
    while !result.is_settled() {
        assert!(result.player_score < 21);
        result = engine.blackjack_act(1, BlackjackAction::Hit).unwrap();
    }
    assert!(result.player_score >= 21);
    if result.player_score > 21 {
        assert_eq!(payout(&result), 0);
        let BlackjackStatus::Settled { dealer, .. } = &result.status else { unreachable!() };
        assert_eq!(dealer.len(), 2, "dealer does not draw against a bust");
    }
    assert_eq!(engine.balance(1).unwrap().wallet, 70 + payout(&result));
}

#[test]
fn one_open_hand_per_user() {
    let (engine, _) = open_hand(100, 30);
    assert_eq!(engine.blackjack_start(1, 10).unwrap_err().kind(), "precondition");
    assert_eq!(engine.balance(1).unwrap().wallet, 70);

    engine.grant(2, 50, BalanceField::Wallet).unwrap();
    assert!(engine.blackjack_start(2, 10).is_ok(), "other users may play");
}

#[test]
fn bets_are_validated() {
    let engine = funded(50, 20);
    assert_eq!(engine.blackjack_start(1, 0).unwrap_err().kind(), "validation");
    assert_eq!(engine.blackjack_start(1, 21).unwrap_err().kind(), "insufficient_funds");
    assert_eq!(engine.balance(1).unwrap().wallet, 20);
    assert_eq!(engine.blackjack_act(1, BlackjackAction::Hit).unwrap_err().kind(), "precondition");
}

#[test]
fn bets_the_wallet_could_not_be_paid_are_refused_before_dealing() {
    let half = i64::MAX / 2 + 1;
    let engine = funded(51, half);
    assert_eq!(engine.blackjack_start(1, half).unwrap_err().kind(), "balance_limit");
    assert_eq!(engine.balance(1).unwrap().wallet, half);
    assert_eq!(engine.blackjack_act(1, BlackjackAction::Stand).unwrap_err().kind(), "precondition");

    // A win of `bet` on top of this wallet would not fit either.
    let engine = funded(52, i64::MAX - 100);
    assert_eq!(engine.blackjack_start(1, 200).unwrap_err().kind(), "balance_limit");
    assert_eq!(engine.balance(1).unwrap().wallet, i64::MAX - 100);

    // Largest bet that can still be paid settles normally.
    let bet = i64::MAX / 4;
    let engine = funded(53, bet);
    let hand = engine.blackjack_start(1, bet).unwrap();
    let settled = if hand.is_settled() {
        hand
    } else {
        engine.blackjack_act(1, BlackjackAction::Stand).unwrap()
    };
    assert_eq!(settled.wallet, payout(&settled));
}

#[test]
fn idle_hand_is_swept_as_stand() {
    let (engine, hand) = open_hand(100, 30);
    engine.clock().advance(Duration::seconds(61));

    let expired = engine.expire_sessions().unwrap();
    assert_eq!(expired.blackjack.len(), 1);
    let result = &expired.blackjack[0];
    assert!(result.timed_out);
    assert_eq!(result.player, hand.player, "no card drawn for the player");
    assert_eq!(engine.balance(1).unwrap().wallet, 70 + payout(result));
}

#[test]
fn late_action_is_ignored_and_hand_stands() {
    let (engine, hand) = open_hand(100, 30);
    engine.clock().advance(Duration::seconds(90));

    let result = engine.blackjack_act(1, BlackjackAction::Hit).unwrap();
    assert!(result.timed_out);
    assert_eq!(result.player, hand.player);
    assert!(result.is_settled());
}

#[test]
fn activity_keeps_hand_alive() {
    let (engine, _) = open_hand(100, 30);
    engine.clock().advance(Duration::seconds(59));
    assert!(engine.expire_sessions().unwrap().blackjack.is_empty());

    let hit = engine.blackjack_act(1, BlackjackAction::Hit).unwrap();
    assert!(!hit.timed_out);
    if hit.is_settled() {
        return;
    }
    engine.clock().advance(Duration::seconds(59));
    let result = engine.blackjack_act(1, BlackjackAction::Stand).unwrap();
    assert!(!result.timed_out, "each action restarts the idle window");
}
