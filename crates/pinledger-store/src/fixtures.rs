//! Seeded worlds for tests: an issuer with a service and wallet, and a
//! holder with a wallet, committed to a fresh [`MemoryStore`].

use chrono::Utc;
use pinledger_types::{
    AccessState, Identity, Object, ObjectKind, Pin, Service, Wallet, WalletId,
};
use rust_decimal::Decimal;

use crate::{LedgerStore, LedgerTx, MemoryStore};

/// An issuer and its service and wallet.
#[derive(Debug, Clone)]
pub struct IssuerSeat {
    pub identity: Identity,
    pub service: Service,
    pub wallet: Wallet,
}

/// A store pre-populated with one issuer and one holder.
#[derive(Debug, Clone)]
pub struct World {
    pub store: MemoryStore,
    pub issuer: IssuerSeat,
    pub holder: Identity,
    pub holder_wallet: Wallet,
}

impl World {
    /// A world whose issuer (`acme`, USD) holds `soul_balance` in reserve.
    pub fn new(soul_balance: Decimal) -> Self {
        let store = MemoryStore::new();
        let issuer = seat(&store, "acme", "USD", soul_balance);
        let holder = Identity::dummy_standard("Holder One");
        let holder_wallet = Wallet::dummy(holder.id);

        let mut tx = begin(&store);
        ok(tx.insert_identity(holder.clone()));
        ok(tx.insert_wallet(holder_wallet.clone()));
        ok(tx.commit());

        Self {
            store,
            issuer,
            holder,
            holder_wallet,
        }
    }

    /// Register another issuer in the same store.
    pub fn add_issuer(&self, object_name: &str, currency: &str, soul_balance: Decimal) -> IssuerSeat {
        seat(&self.store, object_name, currency, soul_balance)
    }

    /// Commit value objects with the given balances and access state into
    /// `wallet`, issued by `issuer`. Returned in the order given.
    pub fn seed_objects(
        &self,
        issuer: &IssuerSeat,
        wallet: WalletId,
        balances: &[Decimal],
        access: &AccessState,
    ) -> Vec<Object> {
        let code = issuer
            .identity
            .issuer_profile()
            .and_then(pinledger_types::IssuerProfile::call_code)
            .unwrap_or_else(|e| panic!("seed issuer: {e}"));
        let mut tx = begin(&self.store);
        let objects: Vec<Object> = balances
            .iter()
            .map(|balance| {
                let mut obj = Object::dummy(wallet, issuer.service.id, *balance)
                    .with_access(access.clone());
                obj.pin = ok(Pin::generate(&code.to_string()));
                ok(tx.insert_object(obj.clone()));
                obj
            })
            .collect();
        ok(tx.commit());
        objects
    }

    /// Commit one valueless object.
    pub fn seed_valueless(&self, issuer: &IssuerSeat, wallet: WalletId) -> Object {
        let mut obj = Object::dummy(wallet, issuer.service.id, Decimal::ZERO);
        obj.kind = ObjectKind::Valueless;
        obj.updated_at = Utc::now();
        let mut tx = begin(&self.store);
        ok(tx.insert_object(obj.clone()));
        ok(tx.commit());
        obj
    }

    /// Read the committed state of an object.
    pub fn object(&self, obj: &Object) -> Option<Object> {
        ok(begin(&self.store).object(obj.id))
    }

    /// Read the committed state of an identity.
    pub fn identity(&self, identity: &Identity) -> Identity {
        ok(begin(&self.store).identity(identity.id))
            .unwrap_or_else(|| panic!("identity {} missing", identity.id))
    }

    /// Committed balances of every object in `wallet`, oldest first.
    pub fn balances(&self, wallet: WalletId) -> Vec<Decimal> {
        ok(begin(&self.store).wallet_objects(wallet))
            .into_iter()
            .map(|o| o.balance)
            .collect()
    }
}

fn seat(store: &MemoryStore, object_name: &str, currency: &str, soul_balance: Decimal) -> IssuerSeat {
    let identity = Identity::dummy_issuer(object_name, currency, soul_balance);
    let service = Service::dummy(identity.id);
    let wallet = Wallet::dummy(identity.id);
    let mut tx = begin(store);
    ok(tx.insert_identity(identity.clone()));
    ok(tx.insert_service(service.clone()));
    ok(tx.insert_wallet(wallet.clone()));
    ok(tx.commit());
    IssuerSeat {
        identity,
        service,
        wallet,
    }
}

fn begin(store: &MemoryStore) -> crate::MemoryTx {
    ok(store.begin())
}

fn ok<T>(res: pinledger_types::Result<T>) -> T {
    res.unwrap_or_else(|e| panic!("fixture setup failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_is_committed() {
        let world = World::new(Decimal::new(50, 0));
        let tx = world.store.begin().unwrap();
        let issuer = tx.identity(world.issuer.identity.id).unwrap().unwrap();
        assert_eq!(issuer.issuer_profile().unwrap().soul_balance, Decimal::new(50, 0));
        assert!(tx.wallet(world.holder_wallet.id).unwrap().is_some());
    }

    #[test]
    fn seeded_objects_carry_issuer_prefix() {
        let world = World::new(Decimal::ZERO);
        let objs = world.seed_objects(
            &world.issuer,
            world.holder_wallet.id,
            &[Decimal::ONE, Decimal::TWO],
            &AccessState::OpenDefault,
        );
        assert_eq!(objs.len(), 2);
        assert!(objs.iter().all(|o| o.pin.country_code() == "0263"));
        assert_eq!(world.balances(world.holder_wallet.id).len(), 2);
    }
}
