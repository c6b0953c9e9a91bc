//! # Access state: whether, how, and until when an object may be charged
//!
//! ## State Machine
//!
//! ```text
//!                open(default)     ┌──────────────┐
//!           ┌─────────────────────▶│ OPEN_DEFAULT │──┐
//!           │    open(timed, t)    ├──────────────┤  │
//!   ┌───────┴┐ ───────────────────▶│ OPEN_TIMED   │──┤ lock()
//!   │ LOCKED │     open(pin, p)    ├──────────────┤  │
//!   └───────▲┘ ───────────────────▶│ OPEN_PIN     │──┤
//!           │                      └──────────────┘  │
//!           └────────────────────────────────────────┘
//! ```
//!
//! - `open` is legal from every state; it always starts from a cleared
//!   state, so re-opening with a different method never leaks the previous
//!   method's fields.
//! - `lock` is legal from every state and returns to `LOCKED`.
//! - A timed object is never auto-locked: expiry is a predicate evaluated at
//!   charge time ([`AccessState::is_consumable_at`]).
//! - Pin-opened objects only ever store an Argon2 hash of the pin.

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{LedgerConfig, LedgerError, Result};

/// The method an object was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMethod {
    /// Consumable without restriction.
    Default,
    /// Consumable until a unix timestamp.
    Timed,
    /// Consumable by a charge that presents the matching numeric pin.
    Pin,
}

impl fmt::Display for OpenMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "OPEN"),
            Self::Timed => write!(f, "OPEN_TIMED"),
            Self::Pin => write!(f, "OPEN_PIN"),
        }
    }
}

/// Consumability state of an object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AccessState {
    /// Initial state. Not consumable.
    #[default]
    Locked,
    /// Consumable without restriction.
    OpenDefault,
    /// Consumable while `now < until` (unix seconds).
    OpenTimed { until: i64 },
    /// Consumable when the charge presents a pin matching `pin_hash`.
    ///
    /// The hash is never serialized and deserializes as empty, so the serde
    /// form is a redacted view. Stores keep the value itself.
    OpenPin {
        #[serde(skip_serializing)]
        #[serde(default)]
        pin_hash: String,
    },
}

impl AccessState {
    #[must_use]
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Locked)
    }

    /// The open method, or `None` while locked.
    #[must_use]
    pub fn method(&self) -> Option<OpenMethod> {
        match self {
            Self::Locked => None,
            Self::OpenDefault => Some(OpenMethod::Default),
            Self::OpenTimed { .. } => Some(OpenMethod::Timed),
            Self::OpenPin { .. } => Some(OpenMethod::Pin),
        }
    }

    /// The end of the open window for timed objects.
    #[must_use]
    pub fn open_time(&self) -> Option<i64> {
        match self {
            Self::OpenTimed { until } => Some(*until),
            _ => None,
        }
    }

    /// Whether the object can be consumed at `now`, ignoring pin checks.
    #[must_use]
    pub fn is_consumable_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Locked => false,
            Self::OpenDefault | Self::OpenPin { .. } => true,
            Self::OpenTimed { until } => now.timestamp() < *until,
        }
    }

    /// Transition to an open state. Validates the request first, so an
    /// invalid request never changes the state.
    ///
    /// # Errors
    /// - `MissingParameter` if a timed request has no time or a pin request has no pin
    /// - `InvalidParameter` if the time is not in the future or the pin is malformed
    /// - `PinHash` if hashing the pin fails
    pub fn open(request: &OpenRequest, now: DateTime<Utc>, config: &LedgerConfig) -> Result<Self> {
        request.validate(now, config)?;
        match request {
            OpenRequest::Default => Ok(Self::OpenDefault),
            OpenRequest::Timed { until } => Ok(Self::OpenTimed { until: *until }),
            OpenRequest::Pin { pin } => Ok(Self::OpenPin {
                pin_hash: hash_open_pin(pin, config)?,
            }),
        }
    }

    /// Transition back to `Locked`, clearing every method-specific field.
    #[must_use]
    pub fn lock() -> Self {
        Self::Locked
    }
}

impl fmt::Display for AccessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.method() {
            None => write!(f, "LOCKED"),
            Some(m) => write!(f, "{m}"),
        }
    }
}

/// A request to open an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "open_method", rename_all = "snake_case")]
pub enum OpenRequest {
    Default,
    Timed { until: i64 },
    Pin { pin: String },
}

impl OpenRequest {
    #[must_use]
    pub fn method(&self) -> OpenMethod {
        match self {
            Self::Default => OpenMethod::Default,
            Self::Timed { .. } => OpenMethod::Timed,
            Self::Pin { .. } => OpenMethod::Pin,
        }
    }

    /// Check the method-specific parameters.
    pub fn validate(&self, now: DateTime<Utc>, config: &LedgerConfig) -> Result<()> {
        match self {
            Self::Default => Ok(()),
            Self::Timed { until } => {
                if *until == 0 {
                    return Err(LedgerError::MissingParameter { field: "time" });
                }
                if now.timestamp() >= *until {
                    return Err(LedgerError::invalid(
                        "time",
                        "use a unix time pointing to a period in the future",
                    ));
                }
                Ok(())
            }
            Self::Pin { pin } => {
                if pin.is_empty() {
                    return Err(LedgerError::MissingParameter { field: "pin" });
                }
                if !pin.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(LedgerError::invalid(
                        "pin",
                        "pin must contain only numeric characters",
                    ));
                }
                if !config.open_pin_len.contains(&pin.len()) {
                    return Err(LedgerError::invalid(
                        "pin",
                        format!(
                            "pin must be between {} and {} characters",
                            config.open_pin_len.start(),
                            config.open_pin_len.end()
                        ),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Hash a numeric open pin into a PHC string using Argon2id with the
/// configured cost.
pub fn hash_open_pin(pin: &str, config: &LedgerConfig) -> Result<String> {
    let params = Params::new(
        config.pin_hash.memory_kib,
        config.pin_hash.iterations,
        1,
        None,
    )
    .map_err(|e| LedgerError::PinHash(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(pin.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LedgerError::PinHash(e.to_string()))
}

/// Verify a presented pin against a stored PHC hash. A malformed stored hash
/// never verifies.
#[must_use]
pub fn verify_open_pin(pin: &str, pin_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(pin_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(pin.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn cfg() -> LedgerConfig {
        LedgerConfig::fast_hashing()
    }

    #[test]
    fn default_state_is_locked() {
        let state = AccessState::default();
        assert!(!state.is_open());
        assert_eq!(state.method(), None);
        assert!(!state.is_consumable_at(Utc::now()));
    }

    #[test]
    fn open_default_is_always_consumable() {
        let state = AccessState::open(&OpenRequest::Default, Utc::now(), &cfg()).unwrap();
        assert_eq!(state, AccessState::OpenDefault);
        assert!(state.is_consumable_at(Utc::now() + Duration::days(365)));
    }

    #[test]
    fn open_timed_requires_future_time() {
        let now = Utc::now();
        let past = OpenRequest::Timed {
            until: now.timestamp() - 10,
        };
        let err = AccessState::open(&past, now, &cfg()).unwrap_err();
        assert_eq!(err.field(), Some("time"));

        let same = OpenRequest::Timed {
            until: now.timestamp(),
        };
        assert!(AccessState::open(&same, now, &cfg()).is_err());

        let missing = OpenRequest::Timed { until: 0 };
        assert!(matches!(
            AccessState::open(&missing, now, &cfg()).unwrap_err(),
            LedgerError::MissingParameter { field: "time" }
        ));
    }

    #[test]
    fn timed_expiry_is_a_consumption_predicate() {
        let now = Utc::now();
        let until = now.timestamp() + 60;
        let state = AccessState::open(&OpenRequest::Timed { until }, now, &cfg()).unwrap();
        assert_eq!(state.open_time(), Some(until));
        assert!(state.is_consumable_at(now));
        let later = now + Duration::seconds(61);
        assert!(!state.is_consumable_at(later));
        // Still open: the state itself never auto-locks.
        assert!(state.is_open());
    }

    #[test]
    fn open_pin_stores_hash_not_pin() {
        let state =
            AccessState::open(&OpenRequest::Pin { pin: "4345".into() }, Utc::now(), &cfg())
                .unwrap();
        let AccessState::OpenPin { pin_hash } = &state else {
            panic!("expected OpenPin, got {state:?}");
        };
        assert!(!pin_hash.contains("4345"));
        assert!(pin_hash.starts_with("$argon2id$"));
        assert!(verify_open_pin("4345", pin_hash));
        assert!(!verify_open_pin("4346", pin_hash));
    }

    #[test]
    fn open_pin_validates_format() {
        let now = Utc::now();
        for bad in ["123", "1234567890123", "12a4"] {
            let req = OpenRequest::Pin { pin: bad.into() };
            let err = AccessState::open(&req, now, &cfg()).unwrap_err();
            assert_eq!(err.field(), Some("pin"), "pin {bad} should be rejected");
        }
        let empty = OpenRequest::Pin { pin: String::new() };
        assert!(matches!(
            AccessState::open(&empty, now, &cfg()).unwrap_err(),
            LedgerError::MissingParameter { field: "pin" }
        ));
    }

    #[test]
    fn lock_clears_everything() {
        let state = AccessState::lock();
        assert_eq!(state, AccessState::Locked);
        assert_eq!(state.open_time(), None);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_open_pin("1234", "not-a-phc-string"));
    }

    #[test]
    fn pin_hash_is_not_serialized() {
        let state = AccessState::OpenPin {
            pin_hash: "$argon2id$secret".into(),
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("open_pin"));
    }
}
