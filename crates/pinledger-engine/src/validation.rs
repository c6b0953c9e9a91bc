//! Shared parameter checks used by every engine before it mutates anything.

use std::collections::HashSet;

use pinledger_store::LedgerTx;
use pinledger_types::{LedgerConfig, LedgerError, Object, ObjectId, Result, WalletId};
use rust_decimal::Decimal;

/// A caller-supplied amount must be at least one unit and carry no more
/// fractional digits than the unit does.
pub fn require_amount(field: &'static str, amount: Decimal, config: &LedgerConfig) -> Result<()> {
    if amount < config.min_object_unit {
        return Err(LedgerError::invalid(
            field,
            format!("must be at least {}", config.min_object_unit.normalize()),
        ));
    }
    if amount.normalize().scale() > config.unit_scale() {
        return Err(LedgerError::invalid(
            field,
            format!("at most {} decimal places are allowed", config.unit_scale()),
        ));
    }
    Ok(())
}

pub fn check_meta(meta: &str, config: &LedgerConfig) -> Result<()> {
    if meta.len() > config.max_meta_bytes {
        return Err(LedgerError::MetaTooLarge {
            size: meta.len(),
            max: config.max_meta_bytes,
        });
    }
    Ok(())
}

/// `min..=max` items.
pub fn check_count(field: &'static str, count: usize, min: usize, max: usize) -> Result<()> {
    if count < min || count > max {
        return Err(LedgerError::invalid(
            field,
            format!("must be between {min} and {max}, got {count}"),
        ));
    }
    Ok(())
}

pub fn check_distinct(field: &'static str, ids: &[ObjectId]) -> Result<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    if let Some(dup) = ids.iter().find(|id| !seen.insert(**id)) {
        return Err(LedgerError::invalid(
            field,
            format!("object {dup} is referenced more than once"),
        ));
    }
    Ok(())
}

/// Load every object in `ids`, failing if any is missing.
pub fn resolve_all<T: LedgerTx>(tx: &T, ids: &[ObjectId]) -> Result<Vec<Object>> {
    let found = tx.objects(ids)?;
    if found.len() != ids.len() {
        return Err(LedgerError::ObjectsNotFound {
            requested: ids.len(),
            missing: ids.len() - found.len(),
        });
    }
    Ok(found)
}

pub fn resolve_one<T: LedgerTx>(tx: &T, id: ObjectId) -> Result<Object> {
    tx.object(id)?
        .ok_or_else(|| LedgerError::ObjectNotFound(id.to_string()))
}

pub fn require_value(field: &'static str, object: &Object) -> Result<()> {
    if !object.is_value() {
        return Err(LedgerError::invalid(
            field,
            format!("object {} is not a value object", object.id),
        ));
    }
    Ok(())
}

pub fn require_held_by(object: &Object, wallet: WalletId) -> Result<()> {
    if !object.is_held_by(wallet) {
        return Err(LedgerError::ForeignObject(object.id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinledger_types::{ErrorKind, ServiceId};

    #[test]
    fn amount_bounds() {
        let cfg = LedgerConfig::default();
        assert!(require_amount("amount", Decimal::new(1, 8), &cfg).is_ok());
        assert!(require_amount("amount", Decimal::new(10, 0), &cfg).is_ok());
        assert!(require_amount("amount", Decimal::new(100_000_000, 8), &cfg).is_ok());

        let err = require_amount("amount", Decimal::ZERO, &cfg).unwrap_err();
        assert_eq!(err.field(), Some("amount"));
        assert!(require_amount("amount", Decimal::new(-5, 0), &cfg).is_err());
        assert!(require_amount("amount", Decimal::new(15, 9), &cfg).is_err());
    }

    #[test]
    fn meta_bound() {
        let cfg = LedgerConfig {
            max_meta_bytes: 4,
            ..LedgerConfig::default()
        };
        assert!(check_meta("abcd", &cfg).is_ok());
        let err = check_meta("abcde", &cfg).unwrap_err();
        assert!(matches!(err, LedgerError::MetaTooLarge { size: 5, max: 4 }));
        assert_eq!(err.field(), Some("meta"));
    }

    #[test]
    fn count_bounds() {
        assert!(check_count("count", 1, 1, 100).is_ok());
        assert!(check_count("count", 100, 1, 100).is_ok());
        assert!(check_count("count", 0, 1, 100).is_err());
        assert_eq!(
            check_count("count", 101, 1, 100).unwrap_err().kind(),
            ErrorKind::InvalidParameter
        );
    }

    #[test]
    fn duplicates_detected() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert!(check_distinct("objects", &[a, b]).is_ok());
        assert!(check_distinct("objects", &[a, b, a]).is_err());
    }

    #[test]
    fn ownership_and_kind() {
        let wallet = WalletId::new();
        let mut obj = Object::dummy(wallet, ServiceId::new(), Decimal::ONE);
        assert!(require_held_by(&obj, wallet).is_ok());
        assert!(matches!(
            require_held_by(&obj, WalletId::new()),
            Err(LedgerError::ForeignObject(_))
        ));
        assert!(require_value("object", &obj).is_ok());
        obj.kind = pinledger_types::ObjectKind::Valueless;
        assert!(require_value("object", &obj).is_err());
    }
}
