//! Configuration for the ledger engines.

use std::ops::RangeInclusive;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result, constants};

/// Argon2 cost parameters for open-pin hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinHashConfig {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
}

impl Default for PinHashConfig {
    fn default() -> Self {
        Self {
            memory_kib: constants::DEFAULT_PIN_HASH_MEMORY_KIB,
            iterations: constants::DEFAULT_PIN_HASH_ITERATIONS,
        }
    }
}

/// Limits and tunables consulted by every ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Smallest balance an object may hold and smallest amount a caller may
    /// supply.
    pub min_object_unit: Decimal,
    /// Maximum meta size in bytes.
    pub max_meta_bytes: usize,
    /// Upper bound on objects per issuance, merge, divide and charge.
    pub max_batch: usize,
    /// Balance an object must reach before it may be divided.
    pub min_divisible_balance: Decimal,
    /// Accepted lengths for open-pin pins.
    pub open_pin_len: RangeInclusive<usize>,
    /// Argon2 cost for open-pin hashes.
    pub pin_hash: PinHashConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_object_unit: constants::MIN_OBJECT_UNIT,
            max_meta_bytes: constants::MAX_META_BYTES,
            max_batch: constants::MAX_BATCH,
            min_divisible_balance: constants::MIN_DIVISIBLE_BALANCE,
            open_pin_len: constants::MIN_OPEN_PIN_LEN..=constants::MAX_OPEN_PIN_LEN,
            pin_hash: PinHashConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Parse a JSON config document; absent fields take their defaults.
    ///
    /// # Errors
    /// `Serialization` if the document is malformed, `Configuration` if the
    /// values are inconsistent.
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject inconsistent limits.
    pub fn validate(&self) -> Result<()> {
        if self.min_object_unit <= Decimal::ZERO {
            return Err(LedgerError::Configuration(
                "min_object_unit must be positive".into(),
            ));
        }
        if self.min_object_unit.normalize().scale() > constants::BALANCE_PRECISION {
            return Err(LedgerError::Configuration(format!(
                "min_object_unit cannot be finer than {} decimal places",
                constants::BALANCE_PRECISION
            )));
        }
        if self.min_divisible_balance < self.min_object_unit {
            return Err(LedgerError::Configuration(
                "min_divisible_balance must be at least min_object_unit".into(),
            ));
        }
        if self.max_batch < constants::MIN_MERGE_OBJECTS {
            return Err(LedgerError::Configuration(format!(
                "max_batch must be at least {}",
                constants::MIN_MERGE_OBJECTS
            )));
        }
        if self.max_meta_bytes == 0 {
            return Err(LedgerError::Configuration(
                "max_meta_bytes must be positive".into(),
            ));
        }
        if self.open_pin_len.is_empty() || *self.open_pin_len.start() == 0 {
            return Err(LedgerError::Configuration(
                "open_pin_len must be a non-empty range of positive lengths".into(),
            ));
        }
        if self.pin_hash.iterations == 0 || self.pin_hash.memory_kib < 8 {
            return Err(LedgerError::Configuration(
                "pin_hash needs at least 1 iteration and 8 KiB".into(),
            ));
        }
        Ok(())
    }

    /// Number of fractional digits balances are quantized to.
    #[must_use]
    pub fn unit_scale(&self) -> u32 {
        self.min_object_unit.normalize().scale()
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl LedgerConfig {
    /// Default limits with the cheapest Argon2 cost, so pin-heavy tests run
    /// quickly.
    #[must_use]
    pub fn fast_hashing() -> Self {
        Self {
            pin_hash: PinHashConfig {
                memory_kib: 8,
                iterations: 1,
            },
            ..Self::default()
        }
    }
}
