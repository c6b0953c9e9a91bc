//! Concurrent operations on the same objects: the first commit wins and
//! every loser fails with a retryable conflict, leaving no partial state.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::{charge, dec, ledger, wallet_total};
use pinledger_engine::{ChargeObjects, DivideObject, charge::charge_objects, combination};
use pinledger_store::{LedgerStore, LedgerTx, fixtures::World};
use pinledger_types::{AccessState, CallContext, LedgerConfig, LedgerError, MetaUpdate};

#[test]
fn second_charge_of_the_same_object_conflicts() {
    let world = World::new(dec(0));
    let seeded = world.seed_objects(&world.issuer, world.holder_wallet.id, &[dec(10)], &AccessState::OpenDefault);
    let cfg = LedgerConfig::fast_hashing();
    let ctx = CallContext::for_service(world.issuer.service.id);
    let cmd: ChargeObjects = charge(&seeded, world.issuer.wallet.id, dec(4));

    let mut first = world.store.begin().unwrap();
    let mut second = world.store.begin().unwrap();
    charge_objects(&mut first, &cfg, &ctx, cmd.clone()).unwrap();
    charge_objects(&mut second, &cfg, &ctx, cmd).unwrap();

    first.commit().unwrap();
    let err = second.commit().unwrap_err();
    assert!(matches!(err, LedgerError::WriteConflict { .. }));
    assert!(err.is_retryable());
    assert_eq!(err.status_code(), 409);

    assert_eq!(world.object(&seeded[0]).unwrap().balance, dec(6));
    assert_eq!(world.balances(world.issuer.wallet.id), vec![dec(4)]);
}

#[test]
fn divide_racing_a_charge_conflicts() {
    let world = World::new(dec(0));
    let wallet = world.holder_wallet.id;
    let seeded = world.seed_objects(&world.issuer, wallet, &[dec(10)], &AccessState::OpenDefault);
    let cfg = LedgerConfig::fast_hashing();

    let mut divide = world.store.begin().unwrap();
    let mut spend = world.store.begin().unwrap();
    combination::divide_object(
        &mut divide,
        &cfg,
        &CallContext::for_wallet(wallet),
        DivideObject { id: seeded[0].id, parts: 2, meta: MetaUpdate::Inherit },
    )
    .unwrap();
    charge_objects(
        &mut spend,
        &cfg,
        &CallContext::for_service(world.issuer.service.id),
        charge(&seeded, world.issuer.wallet.id, dec(10)),
    )
    .unwrap();

    spend.commit().unwrap();
    assert!(divide.commit().unwrap_err().is_retryable());
    assert!(world.object(&seeded[0]).is_none());
    assert!(world.balances(wallet).is_empty());
}

#[test]
fn threaded_charges_settle_exactly_once() {
    const THREADS: usize = 8;

    let world = World::new(dec(0));
    let holder = world.holder_wallet.id;
    let merchant = world.issuer.wallet.id;
    let seeded = world.seed_objects(&world.issuer, holder, &[dec(3), dec(4)], &AccessState::OpenDefault);
    let ledger = Arc::new(ledger(&world));
    let before = wallet_total(&world, &[holder, merchant]);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let barrier = Arc::clone(&barrier);
            let cmd = charge(&seeded, merchant, dec(7));
            let ctx = CallContext::for_service(world.issuer.service.id);
            thread::spawn(move || {
                barrier.wait();
                ledger.charge_objects(&ctx, cmd)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            matches!(err, LedgerError::WriteConflict { .. } | LedgerError::ObjectsNotFound { .. }),
            "unexpected error: {err}"
        );
    }
    assert!(world.balances(holder).is_empty());
    assert_eq!(world.balances(merchant), vec![dec(7)]);
    assert_eq!(wallet_total(&world, &[holder, merchant]), before);
}
