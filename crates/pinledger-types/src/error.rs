//! Error types for the pinledger value-object ledger.
//!
//! All errors use the `PL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Validation errors (missing / malformed parameters)
//! - 2xx: Authorization errors (wrong owner, wrong issuer, closed object)
//! - 3xx: Not-found and conflict errors
//! - 4xx: Reserve / balance insufficiency
//! - 9xx: Infrastructure / internal errors
//!
//! Every variant maps onto a machine-readable [`ErrorKind`] and, where one
//! applies, the name of the offending field. The request layer turns those
//! into transport status codes via [`LedgerError::status_code`].

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{ObjectId, WalletId};

/// Machine-readable failure category handed back to the request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingParameter,
    InvalidParameter,
    Unauthorized,
    NotFound,
    InsufficientReserve,
    InsufficientBalance,
    Conflict,
    ServerError,
}

impl ErrorKind {
    /// The snake_case kind string used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingParameter => "missing_parameter",
            Self::InvalidParameter => "invalid_parameter",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::InsufficientReserve => "insufficient_reserve",
            Self::InsufficientBalance => "insufficient_balance",
            Self::Conflict => "conflict",
            Self::ServerError => "server_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a charge refused to consume a particular object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChargeRejection {
    /// The charging service did not issue the object.
    ForeignIssuer,
    /// The object is locked.
    NotOpen,
    /// The object was opened with a time window that has elapsed.
    OpenWindowExpired,
    /// The object is pin-opened and no pin was supplied for it.
    PinMissing,
    /// The supplied pin does not match the stored hash.
    PinMismatch,
    /// The wallet holding the object is locked.
    WalletLocked,
}

impl fmt::Display for ChargeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::ForeignIssuer => "service cannot charge an object not issued by it",
            Self::NotOpen => "object is not opened and cannot be charged",
            Self::OpenWindowExpired => "object open time period has expired",
            Self::PinMissing => "object pin not found in pins parameter",
            Self::PinMismatch => "pin provided to open object is invalid",
            Self::WalletLocked => "wallet holding the object is locked",
        };
        f.write_str(msg)
    }
}

/// Central error enum for all ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// A required parameter was not supplied.
    #[error("PL_ERR_100: Missing required field: {field}")]
    MissingParameter { field: &'static str },

    /// A parameter was supplied but is out of range or malformed.
    #[error("PL_ERR_101: Invalid {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    /// Meta exceeds the configured byte limit.
    #[error("PL_ERR_102: Meta contains too much data: {size} bytes (max {max})")]
    MetaTooLarge { size: usize, max: usize },

    /// A pin failed its format or checksum validation.
    #[error("PL_ERR_103: Invalid pin: {0}")]
    InvalidPin(String),

    /// The currency code has no call-code mapping.
    #[error("PL_ERR_104: Unsupported base currency: {0}")]
    UnsupportedCurrency(String),

    // =================================================================
    // Authorization Errors (2xx)
    // =================================================================
    /// The calling service's identity is not an issuer.
    #[error("PL_ERR_200: Service is not an issuer")]
    NotIssuer,

    /// The destination wallet of an issuance belongs to another identity.
    #[error("PL_ERR_201: Wallet {0} is not owned by the issuing identity")]
    WalletNotOwned(WalletId),

    /// The object is held in a wallet other than the authorizing wallet.
    #[error("PL_ERR_202: Object {0} does not belong to the authorizing wallet")]
    ForeignObject(ObjectId),

    /// The call context lacks a principal the operation requires.
    #[error("PL_ERR_203: Missing authorizing {0}")]
    MissingPrincipal(&'static str),

    /// The authorizing wallet is not the wallet being acted upon.
    #[error("PL_ERR_204: Client does not have permission to access wallet {0}")]
    ForeignWallet(WalletId),

    /// A charge refused to consume one of the referenced objects.
    #[error("PL_ERR_205: {object}: {reason}")]
    ObjectNotChargeable {
        object: ObjectId,
        reason: ChargeRejection,
    },

    // =================================================================
    // Not-found / Conflict Errors (3xx)
    // =================================================================
    /// No object matches the given id or pin.
    #[error("PL_ERR_300: Object not found: {0}")]
    ObjectNotFound(String),

    /// Some of the referenced objects do not exist.
    #[error("PL_ERR_301: {missing} of {requested} referenced objects do not exist")]
    ObjectsNotFound { requested: usize, missing: usize },

    /// The wallet does not exist.
    #[error("PL_ERR_302: Wallet not found: {0}")]
    WalletNotFound(String),

    /// The identity does not exist.
    #[error("PL_ERR_303: Identity not found: {0}")]
    IdentityNotFound(String),

    /// The service does not exist.
    #[error("PL_ERR_304: Service not found: {0}")]
    ServiceNotFound(String),

    /// A unique constraint was violated.
    #[error("PL_ERR_305: Duplicate {entity}: {key}")]
    DuplicateKey { entity: &'static str, key: String },

    /// A concurrently committed transaction modified a row this
    /// transaction also wrote. The caller may retry the whole operation.
    #[error("PL_ERR_306: Write conflict on {entity} {key}; retry the operation")]
    WriteConflict { entity: &'static str, key: String },

    // =================================================================
    // Reserve / Balance Errors (4xx)
    // =================================================================
    /// The issuer's soul balance cannot back the requested issuance.
    #[error("PL_ERR_400: Insufficient soul balance: need {needed}, have {available}")]
    InsufficientReserve { needed: Decimal, available: Decimal },

    /// The referenced objects cannot cover the requested amount.
    #[error("PL_ERR_401: Insufficient object balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// The backing store failed.
    #[error("PL_ERR_900: Storage error: {0}")]
    Storage(String),

    /// Unrecoverable internal error.
    #[error("PL_ERR_901: Internal error: {0}")]
    Internal(String),

    /// Configuration error (invalid values, inconsistent limits).
    #[error("PL_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// Hashing or verifying an open pin failed.
    #[error("PL_ERR_903: Pin hashing error: {0}")]
    PinHash(String),

    /// Serialization / deserialization error.
    #[error("PL_ERR_904: Serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    /// Shorthand for [`LedgerError::InvalidParameter`].
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// The machine-readable failure category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingParameter { .. } => ErrorKind::MissingParameter,
            Self::InvalidParameter { .. }
            | Self::MetaTooLarge { .. }
            | Self::InvalidPin(_)
            | Self::UnsupportedCurrency(_) => ErrorKind::InvalidParameter,
            Self::NotIssuer
            | Self::WalletNotOwned(_)
            | Self::ForeignObject(_)
            | Self::MissingPrincipal(_)
            | Self::ForeignWallet(_)
            | Self::ObjectNotChargeable { .. } => ErrorKind::Unauthorized,
            Self::ObjectNotFound(_)
            | Self::ObjectsNotFound { .. }
            | Self::WalletNotFound(_)
            | Self::IdentityNotFound(_)
            | Self::ServiceNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateKey { .. } | Self::WriteConflict { .. } => ErrorKind::Conflict,
            Self::InsufficientReserve { .. } => ErrorKind::InsufficientReserve,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::Storage(_)
            | Self::Internal(_)
            | Self::Configuration(_)
            | Self::PinHash(_)
            | Self::Serialization(_) => ErrorKind::ServerError,
        }
    }

    /// The request field the failure is attributed to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingParameter { field } | Self::InvalidParameter { field, .. } => {
                Some(*field)
            }
            Self::MetaTooLarge { .. } => Some("meta"),
            Self::InvalidPin(_) => Some("pin"),
            Self::UnsupportedCurrency(_) => Some("base_currency"),
            Self::WalletNotOwned(_) | Self::WalletNotFound(_) | Self::ForeignWallet(_) => {
                Some("wallet_id")
            }
            Self::ForeignObject(_) | Self::ObjectNotFound(_) => Some("object"),
            Self::ObjectNotChargeable { .. } | Self::ObjectsNotFound { .. } => Some("ids"),
            Self::IdentityNotFound(_) => Some("identity_id"),
            Self::InsufficientBalance { .. } => Some("amount"),
            _ => None,
        }
    }

    /// Transport status code used by the reference request layer.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ObjectNotChargeable { .. } => 402,
            _ => match self.kind() {
                ErrorKind::MissingParameter | ErrorKind::InvalidParameter => 400,
                ErrorKind::Unauthorized => 401,
                ErrorKind::InsufficientReserve | ErrorKind::InsufficientBalance => 402,
                ErrorKind::NotFound => 404,
                ErrorKind::Conflict => 409,
                ErrorKind::ServerError => 500,
            },
        }
    }

    /// True for write-write conflicts only.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::WriteConflict { .. })
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
