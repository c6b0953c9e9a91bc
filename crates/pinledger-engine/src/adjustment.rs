//! Subtract: carve an exact amount out of an object into a new object.

use pinledger_store::LedgerTx;
use pinledger_types::{
    CallContext, LedgerConfig, LedgerError, MetaUpdate, Object, ObjectId, ObjectKind, Result,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    mint::{self, NewObject},
    validation,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtractObject {
    pub id: ObjectId,
    pub amount: Decimal,
    #[serde(default)]
    pub meta: MetaUpdate,
}

/// The reduced source and the newly created object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtraction {
    pub source: Object,
    pub deducted: Object,
}

/// `source.balance_before == source.balance_after + deducted.balance`.
/// The source may be reduced to zero and survives either way.
pub fn subtract_object<T: LedgerTx>(
    tx: &mut T,
    config: &LedgerConfig,
    ctx: &CallContext,
    cmd: SubtractObject,
) -> Result<Subtraction> {
    let wallet = ctx.authorizing_wallet()?;
    validation::require_amount("amount", cmd.amount, config)?;
    if let MetaUpdate::Replace(meta) = &cmd.meta {
        validation::check_meta(meta, config)?;
    }

    let mut source = validation::resolve_one(tx, cmd.id)?;
    validation::require_value("id", &source)?;
    validation::require_held_by(&source, wallet)?;
    if source.balance < cmd.amount {
        return Err(LedgerError::InsufficientBalance {
            needed: cmd.amount,
            available: source.balance,
        });
    }

    let call_code = mint::issuer_call_code(tx, source.service_id)?;
    source.balance -= cmd.amount;
    source.updated_at = ctx.now;
    tx.update_object(&source)?;

    let deducted = mint::mint(
        tx,
        &call_code,
        NewObject {
            kind: ObjectKind::Value,
            wallet,
            service: source.service_id,
            balance: cmd.amount,
            meta: cmd.meta.resolve(&source.meta),
        },
        ctx.now,
    )?;

    info!(
        wallet = %wallet,
        source = %source.id,
        deducted = %deducted.id,
        amount = %cmd.amount,
        remaining = %source.balance,
        "Object subtracted"
    );
    Ok(Subtraction { source, deducted })
}
