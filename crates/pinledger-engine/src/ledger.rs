//! The `Ledger` facade: one operation, one transaction.
//!
//! Every method opens a transaction, runs the engine function, commits on
//! success and rolls back on any error. Nothing is retried here; a
//! [`LedgerError::WriteConflict`] is returned to the caller, who may retry
//! the whole operation.

use pinledger_store::{LedgerStore, LedgerTx};
use pinledger_types::{
    CallContext, CreateIdentity, CreateService, Identity, IdentityId, LedgerConfig, LedgerError,
    Object, ObjectId, OpenRequest, Result, Service, Wallet, WalletId,
};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::{
    access,
    adjustment::{self, SubtractObject, Subtraction},
    charge::{self, ChargeObjects, ChargeReceipt},
    combination::{self, DivideObject, MergeObjects},
    inspect::{self, ObjectFilter, ObjectPage, Page, WalletNumbers},
    issuance::{self, IssueObjects, Issuance},
    registry,
};

/// Transaction-scoped entry point over a store.
#[derive(Debug, Clone)]
pub struct Ledger<S: LedgerStore> {
    store: S,
    config: LedgerConfig,
}

impl<S: LedgerStore> Ledger<S> {
    /// # Errors
    /// `Configuration` if `config` is inconsistent.
    pub fn new(store: S, config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run `op` inside a fresh transaction.
    pub fn run<R>(
        &self,
        name: &'static str,
        op: impl FnOnce(&mut S::Tx, &LedgerConfig) -> Result<R>,
    ) -> Result<R> {
        let mut tx = self.store.begin()?;
        match op(&mut tx, &self.config) {
            Ok(out) => match tx.commit() {
                Ok(()) => {
                    debug!(op = name, "transaction committed");
                    Ok(out)
                }
                Err(err) => {
                    if err.is_retryable() {
                        warn!(op = name, error = %err, "transaction conflict");
                    }
                    Err(err)
                }
            },
            Err(err) => {
                tx.rollback();
                debug!(op = name, error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }

    // =================================================================
    // Object operations
    // =================================================================

    pub fn issue_objects(&self, ctx: &CallContext, cmd: IssueObjects) -> Result<Issuance> {
        self.run("issue_objects", |tx, cfg| {
            issuance::issue_objects(tx, cfg, ctx, cmd)
        })
    }

    pub fn merge_objects(&self, ctx: &CallContext, cmd: MergeObjects) -> Result<Object> {
        self.run("merge_objects", |tx, cfg| {
            combination::merge_objects(tx, cfg, ctx, cmd)
        })
    }

    pub fn divide_object(&self, ctx: &CallContext, cmd: DivideObject) -> Result<Vec<Object>> {
        self.run("divide_object", |tx, cfg| {
            combination::divide_object(tx, cfg, ctx, cmd)
        })
    }

    pub fn subtract_object(&self, ctx: &CallContext, cmd: SubtractObject) -> Result<Subtraction> {
        self.run("subtract_object", |tx, cfg| {
            adjustment::subtract_object(tx, cfg, ctx, cmd)
        })
    }

    pub fn open_object(
        &self,
        ctx: &CallContext,
        id: ObjectId,
        request: &OpenRequest,
    ) -> Result<Object> {
        self.run("open_object", |tx, cfg| {
            access::open_object(tx, cfg, ctx, id, request)
        })
    }

    pub fn lock_object(&self, ctx: &CallContext, id: ObjectId) -> Result<Object> {
        self.run("lock_object", |tx, _| access::lock_object(tx, ctx, id))
    }

    pub fn charge_objects(&self, ctx: &CallContext, cmd: ChargeObjects) -> Result<ChargeReceipt> {
        self.run("charge_objects", |tx, cfg| {
            charge::charge_objects(tx, cfg, ctx, cmd)
        })
    }

    // =================================================================
    // Registry
    // =================================================================

    pub fn create_identity(&self, ctx: &CallContext, cmd: CreateIdentity) -> Result<Identity> {
        self.run("create_identity", |tx, _| {
            registry::create_identity(tx, ctx, cmd)
        })
    }

    pub fn renew_soul(
        &self,
        ctx: &CallContext,
        identity: IdentityId,
        amount: Decimal,
    ) -> Result<Identity> {
        self.run("renew_soul", |tx, cfg| {
            registry::renew_soul(tx, cfg, ctx, identity, amount)
        })
    }

    pub fn create_service(&self, ctx: &CallContext, cmd: CreateService) -> Result<Service> {
        self.run("create_service", |tx, _| {
            registry::create_service(tx, ctx, cmd)
        })
    }

    pub fn create_wallet(
        &self,
        ctx: &CallContext,
        identity: IdentityId,
        handle: &str,
    ) -> Result<Wallet> {
        self.run("create_wallet", |tx, _| {
            registry::create_wallet(tx, ctx, identity, handle)
        })
    }

    pub fn lock_wallet(&self, ctx: &CallContext, wallet: WalletId) -> Result<Wallet> {
        self.run("lock_wallet", |tx, _| registry::lock_wallet(tx, ctx, wallet))
    }

    pub fn open_wallet(&self, ctx: &CallContext, wallet: WalletId) -> Result<Wallet> {
        self.run("open_wallet", |tx, _| registry::open_wallet(tx, ctx, wallet))
    }

    // =================================================================
    // Inspection
    // =================================================================

    pub fn get_object(&self, id_or_pin: &str) -> Result<Object> {
        self.run("get_object", |tx, _| inspect::get_object(tx, id_or_pin))
    }

    pub fn get_identity(&self, id: IdentityId) -> Result<Identity> {
        self.run("get_identity", |tx, _| inspect::get_identity(tx, id))
    }

    pub fn get_wallet(&self, id: WalletId) -> Result<Wallet> {
        self.run("get_wallet", |tx, _| inspect::get_wallet(tx, id))
    }

    pub fn wallet_numbers(&self, ctx: &CallContext, wallet: WalletId) -> Result<WalletNumbers> {
        self.run("wallet_numbers", |tx, _| {
            inspect::wallet_numbers(tx, ctx, wallet)
        })
    }

    pub fn list_wallet_objects(
        &self,
        ctx: &CallContext,
        wallet: WalletId,
        filter: &ObjectFilter,
        page: Page,
    ) -> Result<ObjectPage> {
        self.run("list_wallet_objects", |tx, _| {
            inspect::list_wallet_objects(tx, ctx, wallet, filter, page)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinledger_store::MemoryStore;

    #[test]
    fn rejects_invalid_config() {
        let cfg = LedgerConfig {
            max_batch: 0,
            ..LedgerConfig::default()
        };
        assert!(matches!(
            Ledger::new(MemoryStore::new(), cfg),
            Err(LedgerError::Configuration(_))
        ));
    }

    #[test]
    fn failed_operation_rolls_back() {
        let ledger = Ledger::new(MemoryStore::new(), LedgerConfig::default()).unwrap();
        let ctx = CallContext::anonymous();
        let mut created = None;
        let result: Result<()> = ledger.run("test", |tx, _| {
            let identity = registry::create_identity(
                tx,
                &ctx,
                CreateIdentity::Standard {
                    full_name: "Ada".into(),
                    email: "ada@example.com".into(),
                },
            )?;
            created = Some(identity.id);
            Err(LedgerError::Internal("boom".into()))
        });
        assert!(result.is_err());
        let id = created.unwrap();
        assert!(matches!(
            ledger.get_identity(id),
            Err(LedgerError::IdentityNotFound(_))
        ));
    }

    #[test]
    fn successful_operation_commits() {
        let ledger = Ledger::new(MemoryStore::new(), LedgerConfig::default()).unwrap();
        let ctx = CallContext::anonymous();
        let identity = ledger
            .create_identity(
                &ctx,
                CreateIdentity::Standard {
                    full_name: "Ada".into(),
                    email: "ada@example.com".into(),
                },
            )
            .unwrap();
        assert_eq!(ledger.get_identity(identity.id).unwrap(), identity);
        let wallet = ledger.create_wallet(&ctx, identity.id, "ada-main").unwrap();
        assert_eq!(ledger.get_wallet(wallet.id).unwrap().handle, "ada-main");
    }
}
