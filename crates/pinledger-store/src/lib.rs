//! # pinledger-store
//!
//! The transactional seam between the ledger engines and persistence.
//!
//! Every ledger operation runs inside exactly one [`LedgerTx`] obtained from
//! a [`LedgerStore`]. Reads inside a transaction observe a stable snapshot
//! plus the transaction's own writes (repeatable read). A transaction that
//! wrote a row which a concurrent transaction committed first must fail at
//! commit with [`LedgerError::WriteConflict`](pinledger_types::LedgerError)
//! rather than overwrite it.
//!
//! [`MemoryStore`] is the reference implementation.

pub mod memory;

#[cfg(any(test, feature = "test-helpers"))]
pub mod fixtures;

pub use memory::{MemoryStore, MemoryTx};

use pinledger_types::{
    Identity, IdentityId, Object, ObjectId, Result, Service, ServiceId, Wallet, WalletId,
};

/// A store that hands out transactions.
pub trait LedgerStore: Send + Sync {
    type Tx: LedgerTx;

    /// Open a transaction.
    fn begin(&self) -> Result<Self::Tx>;
}

/// One open transaction. Dropping it without [`commit`](LedgerTx::commit)
/// discards every write.
pub trait LedgerTx {
    // ── identities ──────────────────────────────────────────────────
    fn identity(&self, id: IdentityId) -> Result<Option<Identity>>;
    fn identity_by_object_name(&self, object_name: &str) -> Result<Option<Identity>>;
    fn insert_identity(&mut self, identity: Identity) -> Result<()>;
    fn update_identity(&mut self, identity: &Identity) -> Result<()>;

    // ── services ────────────────────────────────────────────────────
    fn service(&self, id: ServiceId) -> Result<Option<Service>>;
    fn service_by_client_id(&self, client_id: &str) -> Result<Option<Service>>;
    fn insert_service(&mut self, service: Service) -> Result<()>;

    // ── wallets ─────────────────────────────────────────────────────
    fn wallet(&self, id: WalletId) -> Result<Option<Wallet>>;
    fn wallet_by_handle(&self, handle: &str) -> Result<Option<Wallet>>;
    fn insert_wallet(&mut self, wallet: Wallet) -> Result<()>;
    fn update_wallet(&mut self, wallet: &Wallet) -> Result<()>;

    // ── objects ─────────────────────────────────────────────────────
    fn object(&self, id: ObjectId) -> Result<Option<Object>>;
    fn object_by_pin(&self, pin: &str) -> Result<Option<Object>>;
    /// The objects among `ids` that exist, in the order requested.
    fn objects(&self, ids: &[ObjectId]) -> Result<Vec<Object>>;
    /// Every object held by `wallet`, oldest first.
    fn wallet_objects(&self, wallet: WalletId) -> Result<Vec<Object>>;
    fn insert_object(&mut self, object: Object) -> Result<()>;
    fn update_object(&mut self, object: &Object) -> Result<()>;
    fn delete_object(&mut self, id: ObjectId) -> Result<()>;

    /// Publish every write atomically.
    fn commit(self) -> Result<()>;

    /// Discard every write.
    fn rollback(self);
}
