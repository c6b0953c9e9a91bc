#![allow(dead_code)]

use std::collections::HashMap;

use pinledger_engine::{ChargeObjects, Ledger};
use pinledger_store::{LedgerStore, LedgerTx, MemoryStore, MemoryTx, fixtures::World};
use pinledger_types::{
    Identity, IdentityId, LedgerConfig, LedgerError, Object, ObjectId, Result, Service, ServiceId,
    Wallet, WalletId,
};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

/// Route engine events to the test writer; `RUST_LOG=debug` shows them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

/// A ledger over the world's store with cheap pin hashing.
pub fn ledger(world: &World) -> Ledger<MemoryStore> {
    init_tracing();
    Ledger::new(world.store.clone(), LedgerConfig::fast_hashing()).unwrap()
}

pub fn ids(objects: &[Object]) -> Vec<pinledger_types::ObjectId> {
    objects.iter().map(|o| o.id).collect()
}

pub fn charge(objects: &[Object], destination: WalletId, amount: Decimal) -> ChargeObjects {
    ChargeObjects {
        ids: ids(objects),
        wallet: destination,
        amount,
        pins: HashMap::new(),
        meta: String::new(),
    }
}

/// Sum of every committed balance across the given wallets.
pub fn wallet_total(world: &World, wallets: &[WalletId]) -> Decimal {
    wallets
        .iter()
        .flat_map(|w| world.balances(*w))
        .sum()
}

/// A [`MemoryStore`] whose transactions fail the `fail_on`-th object insert
/// (1-based). Every other call passes straight through.
#[derive(Debug, Clone)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_on: usize,
}

impl FailingStore {
    pub fn new(inner: MemoryStore, fail_on: usize) -> Self {
        Self { inner, fail_on }
    }
}

impl LedgerStore for FailingStore {
    type Tx = FailingTx;

    fn begin(&self) -> Result<FailingTx> {
        Ok(FailingTx {
            inner: self.inner.begin()?,
            inserts: 0,
            fail_on: self.fail_on,
        })
    }
}

pub struct FailingTx {
    inner: MemoryTx,
    inserts: usize,
    fail_on: usize,
}

impl LedgerTx for FailingTx {
    fn identity(&self, id: IdentityId) -> Result<Option<Identity>> {
        self.inner.identity(id)
    }
    fn identity_by_object_name(&self, object_name: &str) -> Result<Option<Identity>> {
        self.inner.identity_by_object_name(object_name)
    }
    fn insert_identity(&mut self, identity: Identity) -> Result<()> {
        self.inner.insert_identity(identity)
    }
    fn update_identity(&mut self, identity: &Identity) -> Result<()> {
        self.inner.update_identity(identity)
    }

    fn service(&self, id: ServiceId) -> Result<Option<Service>> {
        self.inner.service(id)
    }
    fn service_by_client_id(&self, client_id: &str) -> Result<Option<Service>> {
        self.inner.service_by_client_id(client_id)
    }
    fn insert_service(&mut self, service: Service) -> Result<()> {
        self.inner.insert_service(service)
    }

    fn wallet(&self, id: WalletId) -> Result<Option<Wallet>> {
        self.inner.wallet(id)
    }
    fn wallet_by_handle(&self, handle: &str) -> Result<Option<Wallet>> {
        self.inner.wallet_by_handle(handle)
    }
    fn insert_wallet(&mut self, wallet: Wallet) -> Result<()> {
        self.inner.insert_wallet(wallet)
    }
    fn update_wallet(&mut self, wallet: &Wallet) -> Result<()> {
        self.inner.update_wallet(wallet)
    }

    fn object(&self, id: ObjectId) -> Result<Option<Object>> {
        self.inner.object(id)
    }
    fn object_by_pin(&self, pin: &str) -> Result<Option<Object>> {
        self.inner.object_by_pin(pin)
    }
    fn objects(&self, ids: &[ObjectId]) -> Result<Vec<Object>> {
        self.inner.objects(ids)
    }
    fn wallet_objects(&self, wallet: WalletId) -> Result<Vec<Object>> {
        self.inner.wallet_objects(wallet)
    }
    fn insert_object(&mut self, object: Object) -> Result<()> {
        self.inserts += 1;
        if self.inserts == self.fail_on {
            return Err(LedgerError::Internal("object insert failed".into()));
        }
        self.inner.insert_object(object)
    }
    fn update_object(&mut self, object: &Object) -> Result<()> {
        self.inner.update_object(object)
    }
    fn delete_object(&mut self, id: ObjectId) -> Result<()> {
        self.inner.delete_object(id)
    }

    fn commit(self) -> Result<()> {
        self.inner.commit()
    }
    fn rollback(self) {
        self.inner.rollback();
    }
}
