//! Value objects: the unit the ledger issues, splits, merges and consumes.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccessState, LedgerError, ObjectId, Pin, ServiceId, WalletId};

/// Whether an object carries a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Fungible; carries a positive balance.
    Value,
    /// A token with no balance (tickets, vouchers). Balance is always zero.
    Valueless,
}

impl ObjectKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Valueless => "valueless",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = LedgerError;

    /// Accepts both the short names and the `obj_` prefixed forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "value" | "obj_value" => Ok(Self::Value),
            "valueless" | "obj_valueless" => Ok(Self::Valueless),
            "" => Err(LedgerError::MissingParameter { field: "type" }),
            other => Err(LedgerError::invalid(
                "type",
                format!("unknown object type {other}"),
            )),
        }
    }
}

/// How a derived object's meta is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "meta", rename_all = "snake_case")]
pub enum MetaUpdate {
    /// Copy the source object's meta.
    #[default]
    Inherit,
    /// Use the given meta.
    Replace(String),
}

impl MetaUpdate {
    /// Resolve against the source object's meta.
    #[must_use]
    pub fn resolve(&self, source: &str) -> String {
        match self {
            Self::Inherit => source.to_string(),
            Self::Replace(meta) => meta.clone(),
        }
    }
}

/// A ledger object.
///
/// The serde form is the outward view: an open pin's hash is redacted, so a
/// deserialized pin-opened object verifies no pin. Persist the value, not
/// its JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub id: ObjectId,
    pub pin: Pin,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    /// Holding wallet.
    pub wallet_id: WalletId,
    /// Issuing service.
    pub service_id: ServiceId,
    pub balance: Decimal,
    pub meta: String,
    pub access: AccessState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Object {
    #[must_use]
    pub fn is_value(&self) -> bool {
        self.kind == ObjectKind::Value
    }

    #[must_use]
    pub fn is_held_by(&self, wallet: WalletId) -> bool {
        self.wallet_id == wallet
    }
}

/// Sum of balances.
///
/// # Errors
/// `InvalidParameter` on `ids` if the sum overflows.
pub fn total_balance<'a>(objects: impl IntoIterator<Item = &'a Object>) -> Result<Decimal, LedgerError> {
    objects.into_iter().try_fold(Decimal::ZERO, |total, o| {
        total
            .checked_add(o.balance)
            .ok_or_else(|| LedgerError::invalid("ids", "combined balance overflows"))
    })
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Object {
    pub fn dummy(wallet_id: WalletId, service_id: ServiceId, balance: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            pin: Pin::generate("44").unwrap_or_else(|e| panic!("dummy pin: {e}")),
            kind: ObjectKind::Value,
            wallet_id,
            service_id,
            balance,
            meta: String::new(),
            access: AccessState::Locked,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_access(mut self, access: AccessState) -> Self {
        self.access = access;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_both_spellings() {
        assert_eq!("value".parse::<ObjectKind>().unwrap(), ObjectKind::Value);
        assert_eq!("obj_value".parse::<ObjectKind>().unwrap(), ObjectKind::Value);
        assert_eq!(
            "OBJ_VALUELESS".parse::<ObjectKind>().unwrap(),
            ObjectKind::Valueless
        );
    }

    #[test]
    fn kind_rejects_unknown() {
        let err = "gold".parse::<ObjectKind>().unwrap_err();
        assert_eq!(err.field(), Some("type"));
        assert!(matches!(
            "".parse::<ObjectKind>().unwrap_err(),
            LedgerError::MissingParameter { field: "type" }
        ));
    }

    #[test]
    fn meta_update_resolution() {
        assert_eq!(MetaUpdate::Inherit.resolve("old"), "old");
        assert_eq!(MetaUpdate::Replace("new".into()).resolve("old"), "new");
    }

    #[test]
    fn total_balance_sums() {
        let w = WalletId::new();
        let s = ServiceId::new();
        let objs = [
            Object::dummy(w, s, Decimal::new(7, 0)),
            Object::dummy(w, s, Decimal::new(5, 0)),
        ];
        assert_eq!(total_balance(&objs).unwrap(), Decimal::new(12, 0));
        assert_eq!(total_balance(&[]).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn total_balance_overflow_is_an_error() {
        let w = WalletId::new();
        let s = ServiceId::new();
        let objs = [Object::dummy(w, s, Decimal::MAX), Object::dummy(w, s, Decimal::ONE)];
        assert_eq!(total_balance(&objs).unwrap_err().field(), Some("ids"));
    }

    #[test]
    fn json_view_redacts_open_pin_hash() {
        let cfg = crate::LedgerConfig::fast_hashing();
        let access = AccessState::open(
            &crate::OpenRequest::Pin { pin: "2468".into() },
            Utc::now(),
            &cfg,
        )
        .unwrap();
        let obj = Object::dummy(WalletId::new(), ServiceId::new(), Decimal::ONE).with_access(access);
        let AccessState::OpenPin { pin_hash } = &obj.access else {
            panic!("expected pin access");
        };
        assert!(crate::verify_open_pin("2468", pin_hash));

        let json = serde_json::to_string(&obj).unwrap();
        assert!(!json.contains(pin_hash.as_str()));
        let back: Object = serde_json::from_str(&json).unwrap();
        assert_eq!(back.access.method(), Some(crate::OpenMethod::Pin));
        let AccessState::OpenPin { pin_hash: restored } = &back.access else {
            panic!("expected pin access");
        };
        assert!(restored.is_empty());
        assert!(!crate::verify_open_pin("2468", restored));
    }

    #[test]
    fn serde_uses_type_key() {
        let obj = Object::dummy(WalletId::new(), ServiceId::new(), Decimal::ONE);
        let json = serde_json::to_value(&obj).unwrap();
        assert_eq!(json["type"], "value");
        assert_eq!(json["access"]["state"], "locked");
    }
}
