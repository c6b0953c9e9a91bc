//! Issuance: minting new objects against an issuer's soul balance.
//!
//! ```text
//!   soul_before ──▶ reserve = count × balance_per_object
//!                   soul_after = soul_before − reserve
//!                   Σ new.balance = reserve
//! ```
//!
//! The reserve debit and every insert share one transaction, so a failure
//! while minting the n-th object leaves neither objects nor a debit behind.

use pinledger_store::LedgerTx;
use pinledger_types::{
    CallContext, Identity, LedgerConfig, LedgerError, Object, ObjectKind, Result, WalletId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    mint::{self, NewObject},
    validation,
};

/// Command to mint `count` objects into `wallet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueObjects {
    pub wallet: WalletId,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub count: usize,
    /// Required for value objects; ignored for valueless ones.
    #[serde(default)]
    pub balance_per_object: Option<Decimal>,
    #[serde(default)]
    pub meta: String,
}

/// Result of a successful issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuance {
    /// Created objects, in creation order.
    pub objects: Vec<Object>,
    /// The issuer after the reserve debit.
    pub issuer: Identity,
}

/// Mint objects for the calling service's issuer.
///
/// Preconditions are checked in order and the first failure wins: issuer
/// status, wallet existence and ownership, count, balance per object, meta
/// size, then the reserve.
pub fn issue_objects<T: LedgerTx>(
    tx: &mut T,
    config: &LedgerConfig,
    ctx: &CallContext,
    cmd: IssueObjects,
) -> Result<Issuance> {
    let service_id = ctx.calling_service()?;
    let service = tx
        .service(service_id)?
        .ok_or_else(|| LedgerError::ServiceNotFound(service_id.to_string()))?;
    let mut issuer = tx
        .identity(service.identity_id)?
        .ok_or_else(|| LedgerError::IdentityNotFound(service.identity_id.to_string()))?;
    let call_code = issuer.issuer_profile()?.call_code()?.to_string();

    let wallet = tx
        .wallet(cmd.wallet)?
        .ok_or_else(|| LedgerError::WalletNotFound(cmd.wallet.to_string()))?;
    if !wallet.is_owned_by(issuer.id) {
        return Err(LedgerError::WalletNotOwned(wallet.id));
    }

    validation::check_count("count", cmd.count, 1, config.max_batch)?;

    let balance = match cmd.kind {
        ObjectKind::Value => {
            let balance = cmd.balance_per_object.ok_or(LedgerError::MissingParameter {
                field: "balance_per_object",
            })?;
            validation::require_amount("balance_per_object", balance, config)?;
            balance
        }
        ObjectKind::Valueless => Decimal::ZERO,
    };

    validation::check_meta(&cmd.meta, config)?;

    let count = Decimal::from(cmd.count);
    let reserve = balance
        .checked_mul(count)
        .ok_or_else(|| LedgerError::invalid("balance_per_object", "issuance total overflows"))?;
    let profile = issuer.issuer_profile_mut()?;
    if profile.soul_balance < reserve {
        return Err(LedgerError::InsufficientReserve {
            needed: reserve,
            available: profile.soul_balance,
        });
    }
    if !reserve.is_zero() {
        profile.debit_soul(reserve)?;
        issuer.updated_at = ctx.now;
        tx.update_identity(&issuer)?;
    }

    let mut objects = Vec::with_capacity(cmd.count);
    for _ in 0..cmd.count {
        objects.push(mint::mint(
            tx,
            &call_code,
            NewObject {
                kind: cmd.kind,
                wallet: wallet.id,
                service: service.id,
                balance,
                meta: cmd.meta.clone(),
            },
            ctx.now,
        )?);
    }

    info!(
        service = %service.id,
        wallet = %wallet.id,
        kind = %cmd.kind,
        count = cmd.count,
        reserve = %reserve,
        "Objects issued"
    );

    Ok(Issuance { objects, issuer })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinledger_store::{LedgerStore, fixtures::World};
    use pinledger_types::ErrorKind;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn value_cmd(world: &World, count: usize, balance: Decimal) -> IssueObjects {
        IssueObjects {
            wallet: world.issuer.wallet.id,
            kind: ObjectKind::Value,
            count,
            balance_per_object: Some(balance),
            meta: String::new(),
        }
    }

    fn issuer_ctx(world: &World) -> CallContext {
        CallContext::for_service(world.issuer.service.id)
    }

    #[test]
    fn issues_and_debits_reserve() {
        let world = World::new(dec(50));
        let mut tx = world.store.begin().unwrap();
        let out = issue_objects(
            &mut tx,
            &LedgerConfig::default(),
            &issuer_ctx(&world),
            value_cmd(&world, 3, dec(10)),
        )
        .unwrap();
        assert_eq!(out.objects.len(), 3);
        assert!(out.objects.iter().all(|o| o.balance == dec(10)));
        assert_eq!(out.issuer.issuer_profile().unwrap().soul_balance, dec(20));
        tx.commit().unwrap();
        assert_eq!(
            world
                .identity(&world.issuer.identity)
                .issuer_profile()
                .unwrap()
                .soul_balance,
            dec(20)
        );
    }

    #[test]
    fn valueless_leaves_reserve_untouched() {
        let world = World::new(dec(0));
        let mut tx = world.store.begin().unwrap();
        let out = issue_objects(
            &mut tx,
            &LedgerConfig::default(),
            &issuer_ctx(&world),
            IssueObjects {
                kind: ObjectKind::Valueless,
                balance_per_object: None,
                ..value_cmd(&world, 2, dec(0))
            },
        )
        .unwrap();
        assert!(out.objects.iter().all(|o| o.balance.is_zero()));
        assert_eq!(out.issuer.issuer_profile().unwrap().soul_balance, dec(0));
    }

    #[test]
    fn insufficient_reserve() {
        let world = World::new(dec(29));
        let mut tx = world.store.begin().unwrap();
        let err = issue_objects(
            &mut tx,
            &LedgerConfig::default(),
            &issuer_ctx(&world),
            value_cmd(&world, 3, dec(10)),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientReserve);
        assert!(tx.wallet_objects(world.issuer.wallet.id).unwrap().is_empty());
    }

    #[test]
    fn non_issuer_is_rejected_first() {
        let world = World::new(dec(50));
        let mut tx = world.store.begin().unwrap();
        let svc = pinledger_types::Service::dummy(world.holder.id);
        tx.insert_service(svc.clone()).unwrap();
        let mut cmd = value_cmd(&world, 0, dec(0));
        cmd.balance_per_object = None;
        let err = issue_objects(
            &mut tx,
            &LedgerConfig::default(),
            &CallContext::for_service(svc.id),
            cmd,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::NotIssuer));
    }

    #[test]
    fn foreign_wallet_rejected_before_count() {
        let world = World::new(dec(50));
        let mut tx = world.store.begin().unwrap();
        let mut cmd = value_cmd(&world, 0, dec(1));
        cmd.wallet = world.holder_wallet.id;
        let err = issue_objects(&mut tx, &LedgerConfig::default(), &issuer_ctx(&world), cmd)
            .unwrap_err();
        assert!(matches!(err, LedgerError::WalletNotOwned(_)));
    }

    #[test]
    fn count_and_balance_bounds() {
        let world = World::new(dec(1_000));
        let cfg = LedgerConfig::default();
        let ctx = issuer_ctx(&world);
        let mut tx = world.store.begin().unwrap();

        for count in [0, 101] {
            let err = issue_objects(&mut tx, &cfg, &ctx, value_cmd(&world, count, dec(1)))
                .unwrap_err();
            assert_eq!(err.field(), Some("count"));
        }

        let err = issue_objects(&mut tx, &cfg, &ctx, value_cmd(&world, 1, Decimal::new(1, 9)))
            .unwrap_err();
        assert_eq!(err.field(), Some("balance_per_object"));

        let mut cmd = value_cmd(&world, 1, dec(1));
        cmd.balance_per_object = None;
        let err = issue_objects(&mut tx, &cfg, &ctx, cmd).unwrap_err();
        assert!(matches!(err, LedgerError::MissingParameter { .. }));
    }

    #[test]
    fn oversized_meta_rejected() {
        let world = World::new(dec(10));
        let cfg = LedgerConfig {
            max_meta_bytes: 8,
            ..LedgerConfig::default()
        };
        let mut cmd = value_cmd(&world, 1, dec(1));
        cmd.meta = "x".repeat(9);
        let mut tx = world.store.begin().unwrap();
        let err = issue_objects(&mut tx, &cfg, &issuer_ctx(&world), cmd).unwrap_err();
        assert!(matches!(err, LedgerError::MetaTooLarge { .. }));
    }

    #[test]
    fn missing_service_principal() {
        let world = World::new(dec(10));
        let mut tx = world.store.begin().unwrap();
        let err = issue_objects(
            &mut tx,
            &LedgerConfig::default(),
            &CallContext::anonymous(),
            value_cmd(&world, 1, dec(1)),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::MissingPrincipal("service")));
    }
}
