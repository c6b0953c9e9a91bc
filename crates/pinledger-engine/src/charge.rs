//! # Charge: consuming open objects to settle a payment
//!
//! ```text
//!   resolve ids ──▶ sort by balance desc (stable)
//!        │
//!        ▼
//!   authorize every candidate ──✗──▶ ObjectNotChargeable (nothing mutated)
//!        │
//!        ▼
//!   greedy prefix while Σ < amount ──▶ Σ < amount ──▶ InsufficientBalance
//!        │
//!        ├─ Σ == amount: delete every selected object
//!        └─ Σ >  amount: delete all but the last; last keeps Σ − amount
//!        │
//!        ▼
//!   mint settlement(amount) into the destination wallet
//! ```
//!
//! Authorization runs over the full candidate list before accumulation, so
//! an ineligible object fails the charge even when the objects ahead of it
//! already cover the amount.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pinledger_store::LedgerTx;
use pinledger_types::{
    AccessState, CallContext, ChargeRejection, LedgerConfig, LedgerError, Object, ObjectId,
    ObjectKind, Result, ServiceId, WalletId, verify_open_pin,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    mint::{self, NewObject},
    validation,
};

/// Command to charge `amount` from the referenced objects into `wallet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeObjects {
    pub ids: Vec<ObjectId>,
    /// Destination wallet of the settlement object.
    pub wallet: WalletId,
    pub amount: Decimal,
    /// Numeric pins for pin-opened objects, keyed by object id.
    #[serde(default)]
    pub pins: HashMap<ObjectId, String>,
    #[serde(default)]
    pub meta: String,
}

/// Outcome of a successful charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeReceipt {
    /// The new object holding exactly the charged amount.
    pub settlement: Object,
    /// Objects deleted by the charge, in selection order.
    pub consumed: Vec<ObjectId>,
    /// The last selected object, if it absorbed the excess.
    pub supplement: Option<Object>,
}

pub fn charge_objects<T: LedgerTx>(
    tx: &mut T,
    config: &LedgerConfig,
    ctx: &CallContext,
    cmd: ChargeObjects,
) -> Result<ChargeReceipt> {
    let service_id = ctx.calling_service()?;
    let service = tx
        .service(service_id)?
        .ok_or_else(|| LedgerError::ServiceNotFound(service_id.to_string()))?;
    validation::check_count("ids", cmd.ids.len(), 1, config.max_batch)?;
    validation::check_distinct("ids", &cmd.ids)?;
    validation::require_amount("amount", cmd.amount, config)?;
    validation::check_meta(&cmd.meta, config)?;

    let destination = tx
        .wallet(cmd.wallet)?
        .ok_or_else(|| LedgerError::WalletNotFound(cmd.wallet.to_string()))?;

    let mut candidates = validation::resolve_all(tx, &cmd.ids)?;
    for obj in &candidates {
        validation::require_value("ids", obj)?;
    }
    candidates.sort_by(|a, b| b.balance.cmp(&a.balance));

    let mut wallet_locked: HashMap<WalletId, bool> = HashMap::new();
    for obj in &candidates {
        let locked = match wallet_locked.get(&obj.wallet_id) {
            Some(locked) => *locked,
            None => {
                let locked = tx
                    .wallet(obj.wallet_id)?
                    .ok_or_else(|| LedgerError::WalletNotFound(obj.wallet_id.to_string()))?
                    .locked;
                wallet_locked.insert(obj.wallet_id, locked);
                locked
            }
        };
        if let Err(reason) = authorize(obj, service.id, locked, &cmd.pins, ctx.now) {
            warn!(object = %obj.id, service = %service.id, %reason, "Charge rejected");
            return Err(LedgerError::ObjectNotChargeable {
                object: obj.id,
                reason,
            });
        }
    }

    let (selected, total) = select_greedy(&candidates, cmd.amount)?;
    debug!(
        candidates = candidates.len(),
        selected = selected.len(),
        total = %total,
        amount = %cmd.amount,
        "Charge selection"
    );
    if total < cmd.amount {
        return Err(LedgerError::InsufficientBalance {
            needed: cmd.amount,
            available: total,
        });
    }
    let Some((last, rest)) = selected.split_last() else {
        return Err(LedgerError::Internal("charge selected no objects".into()));
    };

    let call_code = mint::issuer_call_code(tx, service.id)?;
    let mut consumed = Vec::with_capacity(selected.len());
    let supplement = if total > cmd.amount {
        for obj in rest {
            tx.delete_object(obj.id)?;
            consumed.push(obj.id);
        }
        let mut supplement = last.clone();
        supplement.balance = total - cmd.amount;
        supplement.updated_at = ctx.now;
        tx.update_object(&supplement)?;
        Some(supplement)
    } else {
        for obj in selected {
            tx.delete_object(obj.id)?;
            consumed.push(obj.id);
        }
        None
    };

    let settlement = mint::mint(
        tx,
        &call_code,
        NewObject {
            kind: ObjectKind::Value,
            wallet: destination.id,
            service: service.id,
            balance: cmd.amount,
            meta: cmd.meta,
        },
        ctx.now,
    )?;

    info!(
        service = %service.id,
        destination = %destination.id,
        amount = %cmd.amount,
        consumed = consumed.len(),
        supplement = ?supplement.as_ref().map(|s| s.id),
        settlement = %settlement.id,
        "Objects charged"
    );

    Ok(ChargeReceipt {
        settlement,
        consumed,
        supplement,
    })
}

/// Per-object charge eligibility.
pub fn authorize(
    object: &Object,
    service: ServiceId,
    wallet_locked: bool,
    pins: &HashMap<ObjectId, String>,
    now: DateTime<Utc>,
) -> std::result::Result<(), ChargeRejection> {
    if object.service_id != service {
        return Err(ChargeRejection::ForeignIssuer);
    }
    if wallet_locked {
        return Err(ChargeRejection::WalletLocked);
    }
    match &object.access {
        AccessState::Locked => Err(ChargeRejection::NotOpen),
        AccessState::OpenDefault => Ok(()),
        AccessState::OpenTimed { .. } => {
            if object.access.is_consumable_at(now) {
                Ok(())
            } else {
                Err(ChargeRejection::OpenWindowExpired)
            }
        }
        AccessState::OpenPin { pin_hash } => match pins.get(&object.id) {
            None => Err(ChargeRejection::PinMissing),
            Some(pin) if verify_open_pin(pin, pin_hash) => Ok(()),
            Some(_) => Err(ChargeRejection::PinMismatch),
        },
    }
}

/// The shortest prefix of `sorted` whose balance reaches `amount`, or all of
/// it when the whole list falls short, with the prefix's total.
///
/// # Errors
/// `InvalidParameter` on `ids` if the running total overflows.
pub fn select_greedy(sorted: &[Object], amount: Decimal) -> Result<(&[Object], Decimal)> {
    let mut total = Decimal::ZERO;
    let mut take = 0;
    for obj in sorted {
        if total >= amount {
            break;
        }
        total = total
            .checked_add(obj.balance)
            .ok_or_else(|| LedgerError::invalid("ids", "combined balance overflows"))?;
        take += 1;
    }
    Ok((&sorted[..take], total))
}
