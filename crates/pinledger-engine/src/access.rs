//! Open and lock transitions, restricted to the holding wallet.

use pinledger_store::LedgerTx;
use pinledger_types::{
    AccessState, CallContext, LedgerConfig, Object, ObjectId, OpenRequest, Result,
};
use tracing::info;

use crate::validation;

/// Open an object with the requested method. Any previous open state is
/// replaced wholesale.
pub fn open_object<T: LedgerTx>(
    tx: &mut T,
    config: &LedgerConfig,
    ctx: &CallContext,
    id: ObjectId,
    request: &OpenRequest,
) -> Result<Object> {
    let wallet = ctx.authorizing_wallet()?;
    let mut object = validation::resolve_one(tx, id)?;
    validation::require_held_by(&object, wallet)?;

    object.access = AccessState::open(request, ctx.now, config)?;
    object.updated_at = ctx.now;
    tx.update_object(&object)?;

    info!(
        object = %object.id,
        method = %request.method(),
        until = ?object.access.open_time(),
        "Object opened"
    );
    Ok(object)
}

/// Lock an object, clearing every open field.
pub fn lock_object<T: LedgerTx>(tx: &mut T, ctx: &CallContext, id: ObjectId) -> Result<Object> {
    let wallet = ctx.authorizing_wallet()?;
    let mut object = validation::resolve_one(tx, id)?;
    validation::require_held_by(&object, wallet)?;

    object.access = AccessState::lock();
    object.updated_at = ctx.now;
    tx.update_object(&object)?;

    info!(object = %object.id, "Object locked");
    Ok(object)
}
