//! Services: API clients bound to an identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{IdentityId, LedgerError, Result, ServiceId};

/// An API client acting on behalf of one identity. Objects record the
/// service that issued them; only that service may charge them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub identity_id: IdentityId,
    pub name: String,
    pub description: String,
    /// Unique public client identifier.
    pub client_id: String,
    pub created_at: DateTime<Utc>,
}

/// Command to register a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateService {
    pub identity_id: IdentityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub client_id: String,
}

impl CreateService {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::MissingParameter { field: "name" });
        }
        if self.client_id.trim().is_empty() {
            return Err(LedgerError::MissingParameter { field: "client_id" });
        }
        if self.client_id.trim().chars().any(char::is_whitespace) {
            return Err(LedgerError::invalid(
                "client_id",
                "client id must not contain whitespace",
            ));
        }
        Ok(())
    }

    pub fn into_service(self, now: DateTime<Utc>) -> Result<Service> {
        self.validate()?;
        Ok(Service {
            id: ServiceId::new(),
            identity_id: self.identity_id,
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            client_id: self.client_id.trim().to_string(),
            created_at: now,
        })
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Service {
    pub fn dummy(identity_id: IdentityId) -> Self {
        let id = ServiceId::new();
        Self {
            id,
            identity_id,
            name: "dummy service".into(),
            description: String::new(),
            client_id: format!("client-{}", id.0.simple()),
            created_at: Utc::now(),
        }
    }
}
