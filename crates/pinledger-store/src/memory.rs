//! In-memory store with snapshot isolation and optimistic write-write
//! conflict detection.
//!
//! ```text
//!   begin ──▶ clone committed tables into a private working copy
//!   read  ──▶ working copy (snapshot + own writes)
//!   write ──▶ working copy; remember the row's version at first touch
//!   commit ─▶ lock committed tables
//!             ├─ any touched row whose committed version moved ─▶ WriteConflict
//!             ├─ any unique key now taken by a concurrent row  ─▶ DuplicateKey
//!             └─ publish touched rows with version + 1
//! ```
//!
//! Two transactions that both charge the same object therefore cannot both
//! commit: the second one to reach commit sees the bumped version and fails.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    hash::Hash,
    sync::{Arc, Mutex, MutexGuard},
};

use pinledger_types::{
    Identity, IdentityId, LedgerError, Object, ObjectId, Result, Service, ServiceId, Wallet,
    WalletId,
};
use tracing::debug;

use crate::{LedgerStore, LedgerTx};

#[derive(Debug, Clone)]
struct Versioned<T> {
    row: T,
    /// Committed version. Rows inserted by an open transaction carry 0.
    version: u64,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    identities: HashMap<IdentityId, Versioned<Identity>>,
    services: HashMap<ServiceId, Versioned<Service>>,
    wallets: HashMap<WalletId, Versioned<Wallet>>,
    objects: HashMap<ObjectId, Versioned<Object>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum RowKey {
    Identity(IdentityId),
    Service(ServiceId),
    Wallet(WalletId),
    Object(ObjectId),
}

/// Per-entity table access used by the generic transaction plumbing.
trait Row: Clone {
    type Id: Copy + Eq + Hash + fmt::Display;
    const ENTITY: &'static str;

    fn id(&self) -> Self::Id;
    /// The secondary unique key, if the row has one.
    fn unique_key(&self) -> Option<(&'static str, String)>;
    fn row_key(id: Self::Id) -> RowKey;
    fn not_found(id: Self::Id) -> LedgerError;
    fn table(tables: &Tables) -> &HashMap<Self::Id, Versioned<Self>>;
    fn table_mut(tables: &mut Tables) -> &mut HashMap<Self::Id, Versioned<Self>>;
}

impl Row for Identity {
    type Id = IdentityId;
    const ENTITY: &'static str = "identity";

    fn id(&self) -> IdentityId {
        self.id
    }
    fn unique_key(&self) -> Option<(&'static str, String)> {
        self.object_name()
            .map(|name| ("object_name", name.to_lowercase()))
    }
    fn row_key(id: IdentityId) -> RowKey {
        RowKey::Identity(id)
    }
    fn not_found(id: IdentityId) -> LedgerError {
        LedgerError::IdentityNotFound(id.to_string())
    }
    fn table(tables: &Tables) -> &HashMap<IdentityId, Versioned<Self>> {
        &tables.identities
    }
    fn table_mut(tables: &mut Tables) -> &mut HashMap<IdentityId, Versioned<Self>> {
        &mut tables.identities
    }
}

impl Row for Service {
    type Id = ServiceId;
    const ENTITY: &'static str = "service";

    fn id(&self) -> ServiceId {
        self.id
    }
    fn unique_key(&self) -> Option<(&'static str, String)> {
        Some(("client_id", self.client_id.clone()))
    }
    fn row_key(id: ServiceId) -> RowKey {
        RowKey::Service(id)
    }
    fn not_found(id: ServiceId) -> LedgerError {
        LedgerError::ServiceNotFound(id.to_string())
    }
    fn table(tables: &Tables) -> &HashMap<ServiceId, Versioned<Self>> {
        &tables.services
    }
    fn table_mut(tables: &mut Tables) -> &mut HashMap<ServiceId, Versioned<Self>> {
        &mut tables.services
    }
}

impl Row for Wallet {
    type Id = WalletId;
    const ENTITY: &'static str = "wallet";

    fn id(&self) -> WalletId {
        self.id
    }
    fn unique_key(&self) -> Option<(&'static str, String)> {
        Some(("handle", self.handle.clone()))
    }
    fn row_key(id: WalletId) -> RowKey {
        RowKey::Wallet(id)
    }
    fn not_found(id: WalletId) -> LedgerError {
        LedgerError::WalletNotFound(id.to_string())
    }
    fn table(tables: &Tables) -> &HashMap<WalletId, Versioned<Self>> {
        &tables.wallets
    }
    fn table_mut(tables: &mut Tables) -> &mut HashMap<WalletId, Versioned<Self>> {
        &mut tables.wallets
    }
}

impl Row for Object {
    type Id = ObjectId;
    const ENTITY: &'static str = "object";

    fn id(&self) -> ObjectId {
        self.id
    }
    fn unique_key(&self) -> Option<(&'static str, String)> {
        Some(("pin", self.pin.as_str().to_string()))
    }
    fn row_key(id: ObjectId) -> RowKey {
        RowKey::Object(id)
    }
    fn not_found(id: ObjectId) -> LedgerError {
        LedgerError::ObjectNotFound(id.to_string())
    }
    fn table(tables: &Tables) -> &HashMap<ObjectId, Versioned<Self>> {
        &tables.objects
    }
    fn table_mut(tables: &mut Tables) -> &mut HashMap<ObjectId, Versioned<Self>> {
        &mut tables.objects
    }
}

fn lock(tables: &Mutex<Tables>) -> Result<MutexGuard<'_, Tables>> {
    tables
        .lock()
        .map_err(|_| LedgerError::Storage("memory store lock poisoned".into()))
}

/// Shared in-memory store. Clones share the same committed state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    committed: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed objects.
    pub fn object_count(&self) -> Result<usize> {
        Ok(lock(&self.committed)?.objects.len())
    }
}

impl LedgerStore for MemoryStore {
    type Tx = MemoryTx;

    fn begin(&self) -> Result<MemoryTx> {
        let work = lock(&self.committed)?.clone();
        Ok(MemoryTx {
            committed: Arc::clone(&self.committed),
            work,
            touched: BTreeMap::new(),
        })
    }
}

/// A transaction over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTx {
    committed: Arc<Mutex<Tables>>,
    work: Tables,
    /// Rows written by this transaction and their committed version at
    /// first touch (`None` if the row did not exist).
    touched: BTreeMap<RowKey, Option<u64>>,
}

impl MemoryTx {
    fn get<R: Row>(&self, id: R::Id) -> Option<R> {
        R::table(&self.work).get(&id).map(|v| v.row.clone())
    }

    fn find<R: Row>(&self, pred: impl Fn(&R) -> bool) -> Option<R> {
        R::table(&self.work)
            .values()
            .find(|v| pred(&v.row))
            .map(|v| v.row.clone())
    }

    fn check_local_unique<R: Row>(&self, row: &R) -> Result<()> {
        let Some((label, key)) = row.unique_key() else {
            return Ok(());
        };
        let taken = R::table(&self.work).values().any(|v| {
            v.row.id() != row.id() && v.row.unique_key().is_some_and(|(_, k)| k == key)
        });
        if taken {
            return Err(LedgerError::DuplicateKey { entity: label, key });
        }
        Ok(())
    }

    fn insert<R: Row>(&mut self, row: R) -> Result<()> {
        let id = row.id();
        if R::table(&self.work).contains_key(&id) {
            return Err(LedgerError::DuplicateKey {
                entity: R::ENTITY,
                key: id.to_string(),
            });
        }
        self.check_local_unique(&row)?;
        self.touched.entry(R::row_key(id)).or_insert(None);
        R::table_mut(&mut self.work).insert(id, Versioned { row, version: 0 });
        Ok(())
    }

    fn update<R: Row>(&mut self, row: &R) -> Result<()> {
        let id = row.id();
        let Some(version) = R::table(&self.work).get(&id).map(|v| v.version) else {
            return Err(R::not_found(id));
        };
        self.check_local_unique(row)?;
        self.touched.entry(R::row_key(id)).or_insert(Some(version));
        if let Some(slot) = R::table_mut(&mut self.work).get_mut(&id) {
            slot.row = row.clone();
        }
        Ok(())
    }

    fn delete<R: Row>(&mut self, id: R::Id) -> Result<()> {
        let Some(removed) = R::table_mut(&mut self.work).remove(&id) else {
            return Err(R::not_found(id));
        };
        self.touched
            .entry(R::row_key(id))
            .or_insert(Some(removed.version));
        Ok(())
    }

    /// Check one touched row against committed state.
    fn validate<R: Row>(&self, committed: &Tables, id: R::Id, base: Option<u64>) -> Result<()> {
        let current = R::table(committed).get(&id).map(|v| v.version);
        if current != base {
            return Err(LedgerError::WriteConflict {
                entity: R::ENTITY,
                key: id.to_string(),
            });
        }
        let Some((label, key)) = R::table(&self.work)
            .get(&id)
            .and_then(|v| v.row.unique_key())
        else {
            return Ok(());
        };
        let taken = R::table(committed).iter().any(|(other, v)| {
            *other != id
                && !self.touched.contains_key(&R::row_key(*other))
                && v.row.unique_key().is_some_and(|(_, k)| k == key)
        });
        if taken {
            return Err(LedgerError::DuplicateKey { entity: label, key });
        }
        Ok(())
    }

    fn publish<R: Row>(&self, committed: &mut Tables, id: R::Id, base: Option<u64>) {
        let table = R::table_mut(committed);
        match R::table(&self.work).get(&id) {
            Some(v) => {
                table.insert(
                    id,
                    Versioned {
                        row: v.row.clone(),
                        version: base.unwrap_or(0) + 1,
                    },
                );
            }
            None => {
                table.remove(&id);
            }
        }
    }
}

impl LedgerTx for MemoryTx {
    fn identity(&self, id: IdentityId) -> Result<Option<Identity>> {
        Ok(self.get(id))
    }

    fn identity_by_object_name(&self, object_name: &str) -> Result<Option<Identity>> {
        let wanted = object_name.trim().to_lowercase();
        Ok(self.find(|i: &Identity| {
            i.object_name()
                .is_some_and(|name| name.to_lowercase() == wanted)
        }))
    }

    fn insert_identity(&mut self, identity: Identity) -> Result<()> {
        self.insert(identity)
    }

    fn update_identity(&mut self, identity: &Identity) -> Result<()> {
        self.update(identity)
    }

    fn service(&self, id: ServiceId) -> Result<Option<Service>> {
        Ok(self.get(id))
    }

    fn service_by_client_id(&self, client_id: &str) -> Result<Option<Service>> {
        Ok(self.find(|s: &Service| s.client_id == client_id))
    }

    fn insert_service(&mut self, service: Service) -> Result<()> {
        self.insert(service)
    }

    fn wallet(&self, id: WalletId) -> Result<Option<Wallet>> {
        Ok(self.get(id))
    }

    fn wallet_by_handle(&self, handle: &str) -> Result<Option<Wallet>> {
        let wanted = handle.trim().to_ascii_lowercase();
        Ok(self.find(|w: &Wallet| w.handle == wanted))
    }

    fn insert_wallet(&mut self, wallet: Wallet) -> Result<()> {
        self.insert(wallet)
    }

    fn update_wallet(&mut self, wallet: &Wallet) -> Result<()> {
        self.update(wallet)
    }

    fn object(&self, id: ObjectId) -> Result<Option<Object>> {
        Ok(self.get(id))
    }

    fn object_by_pin(&self, pin: &str) -> Result<Option<Object>> {
        Ok(self.find(|o: &Object| o.pin.as_str() == pin))
    }

    fn objects(&self, ids: &[ObjectId]) -> Result<Vec<Object>> {
        Ok(ids.iter().filter_map(|id| self.get::<Object>(*id)).collect())
    }

    fn wallet_objects(&self, wallet: WalletId) -> Result<Vec<Object>> {
        let mut held: Vec<Object> = self
            .work
            .objects
            .values()
            .filter(|v| v.row.wallet_id == wallet)
            .map(|v| v.row.clone())
            .collect();
        held.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(held)
    }

    fn insert_object(&mut self, object: Object) -> Result<()> {
        self.insert(object)
    }

    fn update_object(&mut self, object: &Object) -> Result<()> {
        self.update(object)
    }

    fn delete_object(&mut self, id: ObjectId) -> Result<()> {
        self.delete::<Object>(id)
    }

    fn commit(self) -> Result<()> {
        let shared = Arc::clone(&self.committed);
        let mut committed = lock(&shared)?;

        for (&key, &base) in &self.touched {
            match key {
                RowKey::Identity(id) => self.validate::<Identity>(&committed, id, base)?,
                RowKey::Service(id) => self.validate::<Service>(&committed, id, base)?,
                RowKey::Wallet(id) => self.validate::<Wallet>(&committed, id, base)?,
                RowKey::Object(id) => self.validate::<Object>(&committed, id, base)?,
            }
        }

        for (&key, &base) in &self.touched {
            match key {
                RowKey::Identity(id) => self.publish::<Identity>(&mut committed, id, base),
                RowKey::Service(id) => self.publish::<Service>(&mut committed, id, base),
                RowKey::Wallet(id) => self.publish::<Wallet>(&mut committed, id, base),
                RowKey::Object(id) => self.publish::<Object>(&mut committed, id, base),
            }
        }

        debug!(rows = self.touched.len(), "memory transaction committed");
        Ok(())
    }

    fn rollback(self) {
        debug!(rows = self.touched.len(), "memory transaction rolled back");
    }
}
