//! Merge (N objects → 1) and divide (1 object → N), both balance-preserving.

use std::collections::HashMap;

use pinledger_store::LedgerTx;
use pinledger_types::{
    CallContext, LedgerConfig, LedgerError, MetaUpdate, Object, ObjectId, ObjectKind, Result,
    ServiceId, constants, total_balance,
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    mint::{self, NewObject},
    validation,
};

/// Command to merge value objects held by the authorizing wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeObjects {
    pub ids: Vec<ObjectId>,
    /// Meta of the merged object. Source metas are discarded.
    #[serde(default)]
    pub meta: String,
}

/// Command to split one value object into `parts` equal objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivideObject {
    pub id: ObjectId,
    pub parts: usize,
    #[serde(default)]
    pub meta: MetaUpdate,
}

/// Merge the referenced objects into one. Every precondition is checked
/// before the first delete.
pub fn merge_objects<T: LedgerTx>(
    tx: &mut T,
    config: &LedgerConfig,
    ctx: &CallContext,
    cmd: MergeObjects,
) -> Result<Object> {
    let wallet = ctx.authorizing_wallet()?;
    validation::check_count("ids", cmd.ids.len(), constants::MIN_MERGE_OBJECTS, config.max_batch)?;
    validation::check_distinct("ids", &cmd.ids)?;

    let sources = validation::resolve_all(tx, &cmd.ids)?;
    for obj in &sources {
        validation::require_value("ids", obj)?;
    }
    for obj in &sources {
        validation::require_held_by(obj, wallet)?;
    }
    require_single_issuer(tx, &sources)?;
    validation::check_meta(&cmd.meta, config)?;

    let total = total_balance(&sources)?;
    let first = &sources[0];
    let call_code = mint::issuer_call_code(tx, first.service_id)?;
    for obj in &sources {
        tx.delete_object(obj.id)?;
    }
    let merged = mint::mint(
        tx,
        &call_code,
        NewObject {
            kind: ObjectKind::Value,
            wallet,
            service: first.service_id,
            balance: total,
            meta: cmd.meta,
        },
        ctx.now,
    )?;

    info!(
        wallet = %wallet,
        sources = sources.len(),
        merged = %merged.id,
        balance = %total,
        "Objects merged"
    );
    Ok(merged)
}

/// Objects from different services of the same issuer may merge; objects
/// from different issuers may not.
fn require_single_issuer<T: LedgerTx>(tx: &T, objects: &[Object]) -> Result<()> {
    let mut names: HashMap<ServiceId, String> = HashMap::new();
    let mut expected: Option<String> = None;
    for obj in objects {
        let name = match names.get(&obj.service_id) {
            Some(name) => name.clone(),
            None => {
                let name = issuer_object_name(tx, obj.service_id)?;
                names.insert(obj.service_id, name.clone());
                name
            }
        };
        match &expected {
            None => expected = Some(name),
            Some(want) if want.eq_ignore_ascii_case(&name) => {}
            Some(_) => {
                return Err(LedgerError::invalid(
                    "ids",
                    "objects must share the same issuer",
                ));
            }
        }
    }
    Ok(())
}

fn issuer_object_name<T: LedgerTx>(tx: &T, service: ServiceId) -> Result<String> {
    let svc = tx
        .service(service)?
        .ok_or_else(|| LedgerError::ServiceNotFound(service.to_string()))?;
    let identity = tx
        .identity(svc.identity_id)?
        .ok_or_else(|| LedgerError::IdentityNotFound(svc.identity_id.to_string()))?;
    Ok(identity.issuer_profile()?.object_name.clone())
}

/// Divide an object into `parts` objects whose balances sum exactly to the
/// source balance.
pub fn divide_object<T: LedgerTx>(
    tx: &mut T,
    config: &LedgerConfig,
    ctx: &CallContext,
    cmd: DivideObject,
) -> Result<Vec<Object>> {
    let wallet = ctx.authorizing_wallet()?;
    validation::check_count("parts", cmd.parts, constants::MIN_DIVIDE_PARTS, config.max_batch)?;

    let source = validation::resolve_one(tx, cmd.id)?;
    validation::require_value("id", &source)?;
    if source.balance < config.min_divisible_balance {
        return Err(LedgerError::invalid(
            "id",
            format!(
                "object balance must be at least {} to divide",
                config.min_divisible_balance.normalize()
            ),
        ));
    }
    validation::require_held_by(&source, wallet)?;
    if let MetaUpdate::Replace(meta) = &cmd.meta {
        validation::check_meta(meta, config)?;
    }

    let balances = split_evenly(source.balance, cmd.parts, config.min_object_unit)?;
    let meta = cmd.meta.resolve(&source.meta);
    let call_code = mint::issuer_call_code(tx, source.service_id)?;

    tx.delete_object(source.id)?;
    let mut parts = Vec::with_capacity(balances.len());
    for balance in balances {
        parts.push(mint::mint(
            tx,
            &call_code,
            NewObject {
                kind: ObjectKind::Value,
                wallet,
                service: source.service_id,
                balance,
                meta: meta.clone(),
            },
            ctx.now,
        )?);
    }

    info!(
        wallet = %wallet,
        source = %source.id,
        parts = parts.len(),
        balance = %source.balance,
        "Object divided"
    );
    Ok(parts)
}

/// Split `balance` into `parts` amounts that are multiples of `unit` (except
/// for any sub-unit dust, which goes to the first part), differ by at most
/// one unit, and sum to exactly `balance`.
pub fn split_evenly(balance: Decimal, parts: usize, unit: Decimal) -> Result<Vec<Decimal>> {
    let n = Decimal::from(parts);
    let units_per_part = balance
        .checked_div(n)
        .and_then(|share| share.checked_div(unit))
        .map(|u| u.floor())
        .ok_or_else(|| LedgerError::invalid("id", "balance cannot be divided"))?;
    if units_per_part < Decimal::ONE {
        return Err(LedgerError::invalid(
            "parts",
            format!("balance {balance} is too small to divide into {parts} parts"),
        ));
    }
    let per_part = units_per_part * unit;
    let remainder = balance - per_part * n;
    let extra_units = (remainder / unit)
        .floor()
        .to_usize()
        .ok_or_else(|| LedgerError::Internal("divide remainder out of range".into()))?;
    let dust = remainder - Decimal::from(extra_units) * unit;

    let mut out: Vec<Decimal> = (0..parts)
        .map(|i| if i < extra_units { per_part + unit } else { per_part })
        .collect();
    out[0] += dust;
    Ok(out)
}
