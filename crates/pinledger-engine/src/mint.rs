//! Creating object rows: pin assignment and insertion.

use chrono::{DateTime, Utc};
use pinledger_store::LedgerTx;
use pinledger_types::{
    AccessState, LedgerError, Object, ObjectId, ObjectKind, Pin, Result, ServiceId, WalletId,
    constants,
};
use rust_decimal::Decimal;

/// Everything needed to create one object except its id and pin.
#[derive(Debug, Clone)]
pub struct NewObject {
    pub kind: ObjectKind,
    pub wallet: WalletId,
    pub service: ServiceId,
    pub balance: Decimal,
    pub meta: String,
}

/// The pin prefix for objects issued through `service`: the call code of
/// the owning issuer's base currency.
pub fn issuer_call_code<T: LedgerTx>(tx: &T, service: ServiceId) -> Result<String> {
    let svc = tx
        .service(service)?
        .ok_or_else(|| LedgerError::ServiceNotFound(service.to_string()))?;
    let identity = tx
        .identity(svc.identity_id)?
        .ok_or_else(|| LedgerError::IdentityNotFound(svc.identity_id.to_string()))?;
    Ok(identity.issuer_profile()?.call_code()?.to_string())
}

/// Generate a pin that no stored object uses yet.
pub fn fresh_pin<T: LedgerTx>(tx: &T, call_code: &str) -> Result<Pin> {
    for _ in 0..constants::MAX_PIN_ATTEMPTS {
        let pin = Pin::generate(call_code)?;
        if tx.object_by_pin(pin.as_str())?.is_none() {
            return Ok(pin);
        }
        tracing::debug!(prefix = call_code, "pin collision, regenerating");
    }
    Err(LedgerError::DuplicateKey {
        entity: "pin",
        key: format!(
            "no free pin after {} attempts",
            constants::MAX_PIN_ATTEMPTS
        ),
    })
}

/// Insert a locked object with a fresh pin.
pub fn mint<T: LedgerTx>(
    tx: &mut T,
    call_code: &str,
    spec: NewObject,
    now: DateTime<Utc>,
) -> Result<Object> {
    let pin = fresh_pin(tx, call_code)?;
    let object = Object {
        id: ObjectId::new(),
        pin,
        kind: spec.kind,
        wallet_id: spec.wallet,
        service_id: spec.service,
        balance: match spec.kind {
            ObjectKind::Value => spec.balance,
            ObjectKind::Valueless => Decimal::ZERO,
        },
        meta: spec.meta,
        access: AccessState::Locked,
        created_at: now,
        updated_at: now,
    };
    tx.insert_object(object.clone())?;
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinledger_store::{LedgerStore, fixtures::World};

    #[test]
    fn minted_object_is_locked_and_prefixed() {
        let world = World::new(Decimal::ZERO);
        let mut tx = world.store.begin().unwrap();
        let code = issuer_call_code(&tx, world.issuer.service.id).unwrap();
        assert_eq!(code, "263");

        let obj = mint(
            &mut tx,
            &code,
            NewObject {
                kind: ObjectKind::Value,
                wallet: world.holder_wallet.id,
                service: world.issuer.service.id,
                balance: Decimal::new(5, 0),
                meta: "gift".into(),
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(obj.access, AccessState::Locked);
        assert_eq!(obj.pin.country_code(), "0263");
        assert_eq!(tx.object_by_pin(obj.pin.as_str()).unwrap(), Some(obj));
    }

    #[test]
    fn valueless_mint_forces_zero_balance() {
        let world = World::new(Decimal::ZERO);
        let mut tx = world.store.begin().unwrap();
        let obj = mint(
            &mut tx,
            "263",
            NewObject {
                kind: ObjectKind::Valueless,
                wallet: world.holder_wallet.id,
                service: world.issuer.service.id,
                balance: Decimal::new(5, 0),
                meta: String::new(),
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(obj.balance, Decimal::ZERO);
    }

    #[test]
    fn non_issuer_service_has_no_call_code() {
        let world = World::new(Decimal::ZERO);
        let mut tx = world.store.begin().unwrap();
        let svc = pinledger_types::Service::dummy(world.holder.id);
        tx.insert_service(svc.clone()).unwrap();
        assert!(matches!(
            issuer_call_code(&tx, svc.id),
            Err(LedgerError::NotIssuer)
        ));
    }
}
