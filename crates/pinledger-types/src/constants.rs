//! System-wide constants for the pinledger value-object ledger.

use rust_decimal::Decimal;

/// Smallest representable object balance (0.00000001).
pub const MIN_OBJECT_UNIT: Decimal = Decimal::from_parts(1, 0, 0, false, 8);

/// Number of fractional digits a balance may carry.
pub const BALANCE_PRECISION: u32 = 8;

/// Smallest balance an object must hold before it can be divided (0.000001).
pub const MIN_DIVISIBLE_BALANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// Maximum size of an object's free-form meta, in bytes.
pub const MAX_META_BYTES: usize = 51_200;

/// Maximum number of objects in one issuance, merge, divide or charge.
pub const MAX_BATCH: usize = 100;

/// Minimum number of objects a merge consumes.
pub const MIN_MERGE_OBJECTS: usize = 2;

/// Minimum number of parts a divide produces.
pub const MIN_DIVIDE_PARTS: usize = 2;

/// Shortest numeric pin accepted by the open-pin method.
pub const MIN_OPEN_PIN_LEN: usize = 4;

/// Longest numeric pin accepted by the open-pin method.
pub const MAX_OPEN_PIN_LEN: usize = 12;

/// Width of the zero-padded country/currency prefix of an object pin.
pub const PIN_PREFIX_LEN: usize = 4;

/// Number of random digits in the body of an object pin.
pub const PIN_BODY_LEN: usize = 11;

/// Total object pin length: prefix + body + one Luhn check digit.
pub const PIN_LEN: usize = PIN_PREFIX_LEN + PIN_BODY_LEN + 1;

/// Times a freshly generated pin is re-rolled when it collides with a
/// stored one before the operation gives up.
pub const MAX_PIN_ATTEMPTS: usize = 5;

/// Default page size when listing a wallet's objects.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Hard cap on the page size when listing a wallet's objects.
pub const MAX_PAGE_SIZE: usize = 100;

/// Default Argon2 memory cost (KiB) for open-pin hashes.
pub const DEFAULT_PIN_HASH_MEMORY_KIB: u32 = 19_456;

/// Default Argon2 iteration count for open-pin hashes.
pub const DEFAULT_PIN_HASH_ITERATIONS: u32 = 2;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_constants_have_expected_values() {
        assert_eq!(MIN_OBJECT_UNIT, Decimal::new(1, 8));
        assert_eq!(MIN_DIVISIBLE_BALANCE, Decimal::new(1, 6));
        assert_eq!(MIN_OBJECT_UNIT.scale(), BALANCE_PRECISION);
    }

    #[test]
    fn pin_length_is_sixteen() {
        assert_eq!(PIN_LEN, 16);
    }
}
