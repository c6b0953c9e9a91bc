//! Wallets: containers of objects owned by one identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{IdentityId, LedgerError, Result, WalletId};

/// A wallet holds objects for a single identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub identity_id: IdentityId,
    /// Unique handle used to address the wallet.
    pub handle: String,
    /// While set, no object held by this wallet may be charged.
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// A new, unlocked wallet.
    pub fn new(identity_id: IdentityId, handle: &str, now: DateTime<Utc>) -> Result<Self> {
        let handle = normalize_handle(handle)?;
        Ok(Self {
            id: WalletId::new(),
            identity_id,
            handle,
            locked: false,
            created_at: now,
            updated_at: now,
        })
    }

    #[must_use]
    pub fn is_owned_by(&self, identity_id: IdentityId) -> bool {
        self.identity_id == identity_id
    }
}

/// Lowercase a handle and check it is 3 to 32 characters of
/// `[a-z0-9_.-]`.
pub fn normalize_handle(handle: &str) -> Result<String> {
    let handle = handle.trim().to_ascii_lowercase();
    if handle.is_empty() {
        return Err(LedgerError::MissingParameter { field: "handle" });
    }
    if !(3..=32).contains(&handle.len()) {
        return Err(LedgerError::invalid(
            "handle",
            "handle must be between 3 and 32 characters",
        ));
    }
    if !handle
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
    {
        return Err(LedgerError::invalid(
            "handle",
            "handle may only contain letters, digits, '_', '.' and '-'",
        ));
    }
    Ok(handle)
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Wallet {
    pub fn dummy(identity_id: IdentityId) -> Self {
        let id = WalletId::new();
        let now = Utc::now();
        Self {
            id,
            identity_id,
            handle: format!("w-{}", id.0.simple()),
            locked: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_wallet_is_unlocked_and_owned() {
        let owner = IdentityId::new();
        let wallet = Wallet::new(owner, "  Ada.Main ", Utc::now()).unwrap();
        assert!(!wallet.locked);
        assert_eq!(wallet.handle, "ada.main");
        assert!(wallet.is_owned_by(owner));
        assert!(!wallet.is_owned_by(IdentityId::new()));
    }

    #[test]
    fn handle_rules() {
        assert!(matches!(
            normalize_handle(""),
            Err(LedgerError::MissingParameter { field: "handle" })
        ));
        assert!(normalize_handle("ab").is_err());
        assert!(normalize_handle("has space").is_err());
        assert!(normalize_handle(&"x".repeat(33)).is_err());
        assert_eq!(normalize_handle("A_b-1").unwrap(), "a_b-1");
    }

    #[test]
    fn dummy_handle_is_valid() {
        let wallet = Wallet::dummy(IdentityId::new());
        assert!(normalize_handle(&wallet.handle).is_ok());
    }
}
