//! Ledger tests: registration, guarded balance updates, the event trail.

use alice_core::{
    engine::GameEngine,
    store::BalanceField,
};

fn build(seed: u64) -> GameEngine {
    GameEngine::build_test(seed).expect("build test engine")
}

fn replayed_wallet(engine: &GameEngine, user: u64) -> i64 {
    engine
        .events_for_user(user)
        .unwrap()
        .iter()
        .map(|e| e.decode().expect("decode event").wallet_delta())
        .sum()
}

#[test]
fn first_touch_registers_with_defaults() {
    let engine = build(1);
    assert_eq!(engine.store().user_count().unwrap(), 0);

    let balance = engine.balance(42).unwrap();
    assert_eq!((balance.wallet, balance.bank, balance.net_worth), (0, 0, 0));

    let profile = engine.profile(42).unwrap();
    assert_eq!(profile.class.label(), "Novice");
    assert_eq!((profile.hp, profile.max_hp, profile.atk, profile.def), (100, 100, 10, 5));

    let account = engine.store().account(42).unwrap();
    assert_eq!(account.level, 1);
    assert_eq!(account.bio, "A mysterious user.");
    assert!(engine.store().cooldown_record(42).unwrap().is_some());
    assert_eq!(engine.store().user_count().unwrap(), 1);
}

#[test]
fn registration_is_idempotent() {
    let engine = build(1);
    engine.grant(7, 300, BalanceField::Wallet).unwrap();
    let now = engine.clock().now();
    assert!(!engine.store().register_if_absent(7, now).unwrap());
    assert_eq!(engine.balance(7).unwrap().wallet, 300, "re-registration must not reset");
    assert_eq!(engine.store().user_count().unwrap(), 1);
}

#[test]
fn deposit_then_withdraw_restores_balances() {
    let engine = build(2);
    engine.grant(1, 500, BalanceField::Wallet).unwrap();
    engine.grant(1, 20, BalanceField::Bank).unwrap();

    for x in [1, 250, 500] {
        let before = engine.balance(1).unwrap();
        engine.deposit(1, x).unwrap();
        let after = engine.withdraw(1, x).unwrap();
        assert_eq!((after.wallet, after.bank), (before.wallet, before.bank), "x = {x}");
    }
}

#[test]
fn deposit_rejects_bad_amounts_without_writing() {
    let engine = build(3);
    engine.grant(1, 100, BalanceField::Wallet).unwrap();

    assert_eq!(engine.deposit(1, 0).unwrap_err().kind(), "validation");
    assert_eq!(engine.deposit(1, -5).unwrap_err().kind(), "validation");
    assert_eq!(engine.deposit(1, 101).unwrap_err().kind(), "insufficient_funds");
    assert_eq!(engine.withdraw(1, 1).unwrap_err().kind(), "insufficient_funds");

    let b = engine.balance(1).unwrap();
    assert_eq!((b.wallet, b.bank), (100, 0));
}

#[test]
fn guarded_adjustment_refuses_to_go_negative() {
    let engine = build(4);
    engine.grant(9, 40, BalanceField::Wallet).unwrap();
    let store = engine.store();

    assert!(!store.try_adjust_balance(9, -50, BalanceField::Wallet, 50).unwrap());
    assert_eq!(store.balance(9).unwrap().wallet, 40);

    assert!(store.try_adjust_balance(9, -40, BalanceField::Wallet, 40).unwrap());
    assert_eq!(store.balance(9).unwrap().wallet, 0);

    assert_eq!(store.debit_capped(9, 75).unwrap(), 0);
    assert_eq!(store.balance(9).unwrap().wallet, 0);
}

#[test]
fn combat_profile_writes_clamp_hp() {
    let engine = build(6);
    let mut profile = engine.profile(3).unwrap();
    profile.hp = 500;
    profile.dungeon_depth = 4;
    engine.store().set_combat_profile(3, &profile).unwrap();

    let stored = engine.profile(3).unwrap();
    assert_eq!(stored.hp, stored.max_hp);
    assert_eq!(stored.dungeon_depth, 4);

    engine.store().set_hp(3, -20).unwrap();
    assert_eq!(engine.profile(3).unwrap().hp, 0);
}

#[test]
fn credits_past_the_balance_limit_write_nothing() {
    let engine = build(8);
    engine.grant(1, i64::MAX - 10, BalanceField::Wallet).unwrap();
    let events = engine.events_for_user(1).unwrap().len();

    assert_eq!(engine.work(1).unwrap_err().kind(), "balance_limit");
    assert_eq!(engine.grant(1, 11, BalanceField::Wallet).unwrap_err().kind(), "balance_limit");

    let b = engine.balance(1).unwrap();
    assert_eq!((b.wallet, b.bank), (i64::MAX - 10, 0));
    assert_eq!(engine.events_for_user(1).unwrap().len(), events);

    // Exactly up to the limit is fine.
    let b = engine.grant(1, 10, BalanceField::Wallet).unwrap();
    assert_eq!(b.wallet, i64::MAX);
    assert_eq!(replayed_wallet(&engine, 1), i64::MAX);
}

#[test]
fn transfer_into_a_full_balance_rolls_back() {
    let engine = build(9);
    engine.grant(2, 100, BalanceField::Wallet).unwrap();
    engine.grant(2, i64::MAX - 5, BalanceField::Bank).unwrap();

    assert_eq!(engine.deposit(2, 50).unwrap_err().kind(), "balance_limit");
    let b = engine.balance(2).unwrap();
    assert_eq!((b.wallet, b.bank), (100, i64::MAX - 5), "debit must not survive the failed credit");

    engine.deposit(2, 5).unwrap();
    assert_eq!(engine.balance(2).unwrap().bank, i64::MAX);
}

#[test]
fn store_adjustments_stay_integral_near_the_limit() {
    let engine = build(10);
    engine.grant(3, i64::MAX - 1, BalanceField::Wallet).unwrap();
    let store = engine.store();

    assert_eq!(store.adjust_balance(3, 2, BalanceField::Wallet).unwrap_err().kind(), "balance_limit");
    assert!(!store.try_adjust_balance(3, 2, BalanceField::Wallet, 0).unwrap());
    assert!(store.record_victory(3, 50, 2).is_err());
    assert_eq!(store.balance(3).unwrap().wallet, i64::MAX - 1);
    assert_eq!(store.account(3).unwrap().wallet, i64::MAX - 1);
    assert_eq!(store.combat_profile(3).unwrap().battles_won, 0, "victory rolled back");

    store.adjust_balance(3, -(i64::MAX - 1), BalanceField::Wallet).unwrap();
    assert_eq!(store.balance(3).unwrap().wallet, 0);
}

#[test]
fn grant_must_be_positive() {
    let engine = build(5);
    assert_eq!(engine.grant(1, 0, BalanceField::Bank).unwrap_err().kind(), "validation");
    assert!(engine.events_for_user(1).unwrap().is_empty());
}

/// The wallet equals the sum of every recorded adjustment, whatever mix
/// of operations produced it.
#[test]
fn event_trail_replays_the_wallet() {
    let engine = build(0xA11CE);
    let user = 77;
    engine.grant(user, 5_000, BalanceField::Wallet).unwrap();

    for round in 0..25 {
        engine.work(user).unwrap();
        engine.crime(user).unwrap();
        let _ = engine.coinflip(user, 25, if round % 2 == 0 { "heads" } else { "tails" });
        let _ = engine.slots(user, 10);
        let _ = engine.deposit(user, 15);
        let _ = engine.withdraw(user, 10);
        let _ = engine.buy_stock(user, "MEM", 1);
        if let Ok(hand) = engine.blackjack_start(user, 20) {
            if !hand.is_settled() {
                engine.blackjack_act(user, alice_core::blackjack::BlackjackAction::Stand).unwrap();
            }
        }
        let _ = engine.dungeon(user);
        let _ = engine.heal(user);
    }

    let balance = engine.balance(user).unwrap();
    assert!(balance.wallet >= 0 && balance.bank >= 0);
    assert_eq!(replayed_wallet(&engine, user), balance.wallet);
}
