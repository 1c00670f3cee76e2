//! One engine shared by several threads, as the runner shares it with the
//! housekeeping loop.

use alice_core::{engine::GameEngine, error::GameError, store::BalanceField};
use std::{sync::Arc, thread};

const THREADS: u64 = 8;
const ROUNDS: u64 = 150;

fn assert_send_sync<T: Send + Sync>() {}

/// Errors a contended round may legitimately hit; anything else fails the test.
fn tolerate(result: Result<impl Sized, GameError>) {
    if let Err(e) = result {
        assert!(e.is_user_facing(), "unexpected engine error: {e}");
    }
}

#[test]
fn engine_is_shareable() {
    assert_send_sync::<GameEngine>();
}

#[test]
fn concurrent_play_on_one_account_keeps_the_ledger_whole() {
    let engine = Arc::new(GameEngine::build_test(0x5EED).expect("build test engine"));
    let user = 1;
    engine.grant(user, 20_000, BalanceField::Wallet).unwrap();

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for round in 0..ROUNDS {
                    let side = if (t + round) % 2 == 0 { "heads" } else { "tails" };
                    tolerate(engine.coinflip(user, 40, side));
                    tolerate(engine.deposit(user, 25));
                    tolerate(engine.withdraw(user, 20));
                    tolerate(engine.crime(user));
                    tolerate(engine.buy_stock(user, "MEM", 1));
                    if round % 10 == 0 {
                        engine.tick_market();
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked");
    }

    let balance = engine.balance(user).unwrap();
    assert!(balance.wallet >= 0, "wallet {}", balance.wallet);
    assert!(balance.bank >= 0, "bank {}", balance.bank);

    let replayed: i64 = engine
        .events_for_user(user)
        .unwrap()
        .iter()
        .map(|e| e.decode().expect("decode event").wallet_delta())
        .sum();
    assert_eq!(replayed, balance.wallet);

    let shares: i64 = engine.portfolio(user).unwrap().positions.iter().map(|p| p.shares).sum();
    let bought = engine
        .events_for_user(user)
        .unwrap()
        .iter()
        .filter(|e| e.kind == "stock_purchased")
        .count() as i64;
    assert_eq!(shares, bought);
}

#[test]
fn racing_debits_never_overdraw() {
    let engine = Arc::new(GameEngine::build_test(77).expect("build test engine"));
    engine.grant(2, 1_000, BalanceField::Wallet).unwrap();

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || (0..50).filter(|_| engine.deposit(2, 10).is_ok()).count())
        })
        .collect();
    let moved: usize = workers.into_iter().map(|w| w.join().expect("worker panicked")).sum();

    assert_eq!(moved, 100, "exactly the wallet's worth of deposits succeed");
    let b = engine.balance(2).unwrap();
    assert_eq!((b.wallet, b.bank), (0, 1_000));
}
