//! Identities: people and issuing organisations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{IdentityId, LedgerError, Result, currency};

/// Issuer-only attributes of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerProfile {
    /// Unique human label stamped on every object the issuer mints.
    pub object_name: String,
    /// ISO currency code; selects the pin prefix of minted objects.
    pub base_currency: String,
    /// Reserve backing issuance. Never negative.
    pub soul_balance: Decimal,
}

impl IssuerProfile {
    /// The numeric call code of the base currency.
    pub fn call_code(&self) -> Result<u16> {
        currency::call_code(&self.base_currency)
            .ok_or_else(|| LedgerError::UnsupportedCurrency(self.base_currency.clone()))
    }

    /// Debit the reserve. The caller must have checked sufficiency; this
    /// only refuses to go negative.
    pub fn debit_soul(&mut self, amount: Decimal) -> Result<()> {
        if self.soul_balance < amount {
            return Err(LedgerError::InsufficientReserve {
                needed: amount,
                available: self.soul_balance,
            });
        }
        self.soul_balance -= amount;
        Ok(())
    }

    /// Credit the reserve.
    ///
    /// # Errors
    /// `InvalidParameter` on `amount` if the reserve would overflow.
    pub fn credit_soul(&mut self, amount: Decimal) -> Result<()> {
        self.soul_balance = self
            .soul_balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::invalid("amount", "soul balance would overflow"))?;
        Ok(())
    }
}

/// A person or issuing organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub full_name: String,
    pub email: String,
    /// Present only for issuers.
    pub issuer: Option<IssuerProfile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    #[must_use]
    pub fn is_issuer(&self) -> bool {
        self.issuer.is_some()
    }

    /// The issuer profile, or [`LedgerError::NotIssuer`].
    pub fn issuer_profile(&self) -> Result<&IssuerProfile> {
        self.issuer.as_ref().ok_or(LedgerError::NotIssuer)
    }

    pub fn issuer_profile_mut(&mut self) -> Result<&mut IssuerProfile> {
        self.issuer.as_mut().ok_or(LedgerError::NotIssuer)
    }

    /// The issuer's object name, if this identity issues objects.
    #[must_use]
    pub fn object_name(&self) -> Option<&str> {
        self.issuer.as_ref().map(|p| p.object_name.as_str())
    }
}

/// Command to create an identity. Issuers carry their issuing attributes
/// in the variant itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CreateIdentity {
    Standard {
        full_name: String,
        email: String,
    },
    Issuer {
        full_name: String,
        email: String,
        object_name: String,
        base_currency: String,
    },
}

impl CreateIdentity {
    #[must_use]
    pub fn full_name(&self) -> &str {
        match self {
            Self::Standard { full_name, .. } | Self::Issuer { full_name, .. } => full_name,
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        match self {
            Self::Standard { email, .. } | Self::Issuer { email, .. } => email,
        }
    }

    /// Check required fields and formats, without touching the store.
    pub fn validate(&self) -> Result<()> {
        if self.full_name().trim().is_empty() {
            return Err(LedgerError::MissingParameter { field: "full_name" });
        }
        if self.email().trim().is_empty() {
            return Err(LedgerError::MissingParameter { field: "email" });
        }
        if !looks_like_email(self.email()) {
            return Err(LedgerError::invalid("email", "email address is malformed"));
        }
        if let Self::Issuer {
            object_name,
            base_currency,
            ..
        } = self
        {
            if object_name.trim().is_empty() {
                return Err(LedgerError::MissingParameter {
                    field: "object_name",
                });
            }
            if base_currency.trim().is_empty() {
                return Err(LedgerError::MissingParameter {
                    field: "base_currency",
                });
            }
            if !currency::is_supported(base_currency) {
                return Err(LedgerError::UnsupportedCurrency(base_currency.clone()));
            }
        }
        Ok(())
    }

    /// Build the identity row. Issuers start with an empty reserve.
    pub fn into_identity(self, now: DateTime<Utc>) -> Result<Identity> {
        self.validate()?;
        let (full_name, email, issuer) = match self {
            Self::Standard { full_name, email } => (full_name, email, None),
            Self::Issuer {
                full_name,
                email,
                object_name,
                base_currency,
            } => (
                full_name,
                email,
                Some(IssuerProfile {
                    object_name: object_name.trim().to_string(),
                    base_currency: base_currency.trim().to_ascii_uppercase(),
                    soul_balance: Decimal::ZERO,
                }),
            ),
        };
        Ok(Identity {
            id: IdentityId::new(),
            full_name: full_name.trim().to_string(),
            email: email.trim().to_ascii_lowercase(),
            issuer,
            created_at: now,
            updated_at: now,
        })
    }
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.trim().split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !s.chars().any(char::is_whitespace)
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Identity {
    pub fn dummy_standard(full_name: &str) -> Self {
        CreateIdentity::Standard {
            full_name: full_name.to_string(),
            email: format!("{}@example.com", full_name.to_ascii_lowercase().replace(' ', ".")),
        }
        .into_identity(Utc::now())
        .unwrap_or_else(|e| panic!("dummy identity: {e}"))
    }

    pub fn dummy_issuer(object_name: &str, base_currency: &str, soul_balance: Decimal) -> Self {
        let mut identity = CreateIdentity::Issuer {
            full_name: format!("{object_name} Issuer"),
            email: format!("{}@issuer.example.com", object_name.to_ascii_lowercase()),
            object_name: object_name.to_string(),
            base_currency: base_currency.to_string(),
        }
        .into_identity(Utc::now())
        .unwrap_or_else(|e| panic!("dummy issuer: {e}"));
        if let Some(profile) = identity.issuer.as_mut() {
            profile.soul_balance = soul_balance;
        }
        identity
    }
}
