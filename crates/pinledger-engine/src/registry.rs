//! Identities, services and wallets: creation, soul renewal, wallet lock.

use pinledger_store::LedgerTx;
use pinledger_types::{
    CallContext, CreateIdentity, CreateService, Identity, IdentityId, LedgerConfig, LedgerError,
    Result, Service, Wallet, WalletId,
};
use rust_decimal::Decimal;
use tracing::info;

use crate::validation;

/// Register a standard or issuer identity. Issuer object names are unique
/// case-insensitively.
pub fn create_identity<T: LedgerTx>(
    tx: &mut T,
    ctx: &CallContext,
    cmd: CreateIdentity,
) -> Result<Identity> {
    cmd.validate()?;
    if let CreateIdentity::Issuer { object_name, .. } = &cmd {
        if tx.identity_by_object_name(object_name)?.is_some() {
            return Err(LedgerError::DuplicateKey {
                entity: "object_name",
                key: object_name.trim().to_string(),
            });
        }
    }
    let identity = cmd.into_identity(ctx.now)?;
    tx.insert_identity(identity.clone())?;
    info!(
        identity = %identity.id,
        issuer = identity.is_issuer(),
        "Identity created"
    );
    Ok(identity)
}

/// Credit an issuer's soul balance.
pub fn renew_soul<T: LedgerTx>(
    tx: &mut T,
    config: &LedgerConfig,
    ctx: &CallContext,
    identity_id: IdentityId,
    amount: Decimal,
) -> Result<Identity> {
    validation::require_amount("amount", amount, config)?;
    let mut identity = tx
        .identity(identity_id)?
        .ok_or_else(|| LedgerError::IdentityNotFound(identity_id.to_string()))?;
    let profile = identity.issuer_profile_mut()?;
    profile.credit_soul(amount)?;
    let soul_balance = profile.soul_balance;
    identity.updated_at = ctx.now;
    tx.update_identity(&identity)?;
    info!(
        identity = %identity.id,
        amount = %amount,
        soul_balance = %soul_balance,
        "Soul balance renewed"
    );
    Ok(identity)
}

pub fn create_service<T: LedgerTx>(
    tx: &mut T,
    ctx: &CallContext,
    cmd: CreateService,
) -> Result<Service> {
    cmd.validate()?;
    if tx.identity(cmd.identity_id)?.is_none() {
        return Err(LedgerError::IdentityNotFound(cmd.identity_id.to_string()));
    }
    if tx.service_by_client_id(cmd.client_id.trim())?.is_some() {
        return Err(LedgerError::DuplicateKey {
            entity: "client_id",
            key: cmd.client_id.trim().to_string(),
        });
    }
    let service = cmd.into_service(ctx.now)?;
    tx.insert_service(service.clone())?;
    info!(service = %service.id, identity = %service.identity_id, "Service created");
    Ok(service)
}

pub fn create_wallet<T: LedgerTx>(
    tx: &mut T,
    ctx: &CallContext,
    identity_id: IdentityId,
    handle: &str,
) -> Result<Wallet> {
    if tx.identity(identity_id)?.is_none() {
        return Err(LedgerError::IdentityNotFound(identity_id.to_string()));
    }
    let wallet = Wallet::new(identity_id, handle, ctx.now)?;
    if tx.wallet_by_handle(&wallet.handle)?.is_some() {
        return Err(LedgerError::DuplicateKey {
            entity: "handle",
            key: wallet.handle,
        });
    }
    tx.insert_wallet(wallet.clone())?;
    info!(wallet = %wallet.id, identity = %identity_id, "Wallet created");
    Ok(wallet)
}

/// Stop every object in the wallet from being charged.
pub fn lock_wallet<T: LedgerTx>(tx: &mut T, ctx: &CallContext, wallet: WalletId) -> Result<Wallet> {
    set_wallet_lock(tx, ctx, wallet, true)
}

pub fn open_wallet<T: LedgerTx>(tx: &mut T, ctx: &CallContext, wallet: WalletId) -> Result<Wallet> {
    set_wallet_lock(tx, ctx, wallet, false)
}

fn set_wallet_lock<T: LedgerTx>(
    tx: &mut T,
    ctx: &CallContext,
    wallet_id: WalletId,
    locked: bool,
) -> Result<Wallet> {
    let authorizing = ctx.authorizing_wallet()?;
    if authorizing != wallet_id {
        return Err(LedgerError::ForeignWallet(wallet_id));
    }
    let mut wallet = tx
        .wallet(wallet_id)?
        .ok_or_else(|| LedgerError::WalletNotFound(wallet_id.to_string()))?;
    if wallet.locked != locked {
        wallet.locked = locked;
        wallet.updated_at = ctx.now;
        tx.update_wallet(&wallet)?;
    }
    info!(wallet = %wallet.id, locked, "Wallet lock updated");
    Ok(wallet)
}
