//! Globally unique identifiers used throughout pinledger.
//!
//! All entity IDs use UUIDv7 for time-ordered lexicographic sorting.
//! Object *pins* are a separate, checksum-validated public identifier;
//! see [`crate::Pin`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            #[must_use]
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }

            /// Parse the hyphenated (or simple) UUID form.
            pub fn parse_str(s: &str) -> crate::Result<Self> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| LedgerError::invalid($label, e.to_string()))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> crate::Result<Self> {
                Self::parse_str(s)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a person or issuing organisation.
    IdentityId,
    "identity_id"
);

entity_id!(
    /// Unique identifier for an API client bound to an identity.
    ServiceId,
    "service_id"
);

entity_id!(
    /// Unique identifier for a wallet.
    WalletId,
    "wallet_id"
);

entity_id!(
    /// Unique identifier for a value object.
    ObjectId,
    "object"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_uniqueness() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn object_id_ordering() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert!(a < b);
    }

    #[test]
    fn parse_roundtrips_display() {
        let id = WalletId::new();
        let back: WalletId = id.to_string().parse().unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn parse_rejects_garbage_with_field() {
        let err = ObjectId::parse_str("not-a-uuid").unwrap_err();
        assert_eq!(err.field(), Some("object"));
    }

    #[test]
    fn serde_is_transparent_uuid() {
        let id = ServiceId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }
}
