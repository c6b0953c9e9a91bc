//! Per-call context: who is asking, and when.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result, ServiceId, WalletId};

/// Principals and clock reading attached to a single ledger call.
///
/// Operations acting on a holder's objects require the authorizing wallet;
/// issuance and charge require the calling service. A required principal
/// that is absent fails with [`LedgerError::MissingPrincipal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub wallet: Option<WalletId>,
    pub service: Option<ServiceId>,
    pub now: DateTime<Utc>,
}

impl CallContext {
    /// A context with no principals, read at the current time.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            wallet: None,
            service: None,
            now: Utc::now(),
        }
    }

    /// A context authorized by a wallet holder.
    #[must_use]
    pub fn for_wallet(wallet: WalletId) -> Self {
        Self {
            wallet: Some(wallet),
            ..Self::anonymous()
        }
    }

    /// A context authorized by a service client.
    #[must_use]
    pub fn for_service(service: ServiceId) -> Self {
        Self {
            service: Some(service),
            ..Self::anonymous()
        }
    }

    #[must_use]
    pub fn with_wallet(mut self, wallet: WalletId) -> Self {
        self.wallet = Some(wallet);
        self
    }

    #[must_use]
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn authorizing_wallet(&self) -> Result<WalletId> {
        self.wallet.ok_or(LedgerError::MissingPrincipal("wallet"))
    }

    pub fn calling_service(&self) -> Result<ServiceId> {
        self.service.ok_or(LedgerError::MissingPrincipal("service"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn anonymous_has_no_principals() {
        let ctx = CallContext::anonymous();
        let err = ctx.authorizing_wallet().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(matches!(
            ctx.calling_service().unwrap_err(),
            LedgerError::MissingPrincipal("service")
        ));
    }

    #[test]
    fn builders_set_principals() {
        let wallet = WalletId::new();
        let service = ServiceId::new();
        let ctx = CallContext::for_service(service).with_wallet(wallet);
        assert_eq!(ctx.calling_service().unwrap(), service);
        assert_eq!(ctx.authorizing_wallet().unwrap(), wallet);
    }

    #[test]
    fn at_overrides_clock() {
        let then = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let ctx = CallContext::anonymous().at(then);
        assert_eq!(ctx.now.timestamp(), 1_700_000_000);
    }
}
