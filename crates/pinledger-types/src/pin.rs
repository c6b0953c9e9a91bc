//! Object pins: the checksum-validated public identifier of an object.
//!
//! ```text
//!   ┌──────────────┬───────────────────────────┬───────┐
//!   │ call code(4) │ random body (11 digits)   │ Luhn  │
//!   └──────────────┴───────────────────────────┴───────┘
//! ```
//!
//! The prefix is the issuer's currency call code, zero-padded on the left to
//! four digits. The body is drawn from the operating system CSPRNG: pins
//! double as lookup keys as sensitive as an account number, so they must
//! not be guessable from previously seen pins.

use std::fmt;

use rand::{CryptoRng, Rng, RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result, constants};

/// A 16-digit object pin whose last digit is a Luhn check digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pin(String);

impl Pin {
    /// Generate a fresh pin for the given numeric call code using the OS RNG.
    ///
    /// # Errors
    /// Returns [`LedgerError::InvalidPin`] if the call code is empty,
    /// non-numeric, or longer than four digits.
    pub fn generate(call_code: &str) -> Result<Self> {
        Self::generate_with(&mut OsRng, call_code)
    }

    /// Generate a pin drawing the body from `rng`.
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R, call_code: &str) -> Result<Self> {
        let prefix = pad_call_code(call_code)?;

        let mut digits = String::with_capacity(constants::PIN_LEN);
        digits.push_str(&prefix);
        for _ in 0..constants::PIN_BODY_LEN {
            let d: u8 = rng.gen_range(0..10);
            digits.push(char::from(b'0' + d));
        }
        digits.push(luhn_check_digit(&digits));
        Ok(Self(digits))
    }

    /// Parse and validate a pin string.
    ///
    /// # Errors
    /// Returns [`LedgerError::InvalidPin`] unless `s` is exactly 16 ASCII
    /// digits with a valid Luhn checksum.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != constants::PIN_LEN {
            return Err(LedgerError::InvalidPin(format!(
                "expected {} digits, got {}",
                constants::PIN_LEN,
                s.len()
            )));
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LedgerError::InvalidPin("pin must be numeric".into()));
        }
        if !luhn_valid(s) {
            return Err(LedgerError::InvalidPin("checksum mismatch".into()));
        }
        Ok(Self(s.to_string()))
    }

    /// The four-digit call-code prefix.
    #[must_use]
    pub fn country_code(&self) -> &str {
        &self.0[..constants::PIN_PREFIX_LEN]
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Pin {
    type Error = LedgerError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Pin> for String {
    fn from(pin: Pin) -> Self {
        pin.0
    }
}

fn pad_call_code(call_code: &str) -> Result<String> {
    if call_code.is_empty() {
        return Err(LedgerError::InvalidPin("provide country code".into()));
    }
    if !call_code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::InvalidPin(format!(
            "country code {call_code} is not numeric"
        )));
    }
    if call_code.len() > constants::PIN_PREFIX_LEN {
        return Err(LedgerError::InvalidPin(format!(
            "country code {call_code} is longer than {} digits",
            constants::PIN_PREFIX_LEN
        )));
    }
    Ok(format!(
        "{call_code:0>width$}",
        width = constants::PIN_PREFIX_LEN
    ))
}

/// Weighted Luhn sum of an ASCII digit string. `double_rightmost` selects
/// whether the rightmost digit is doubled (true when computing a check digit
/// for a payload, false when validating a complete number).
fn luhn_sum(digits: &str, double_rightmost: bool) -> u32 {
    digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if (i % 2 == 0) == double_rightmost {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum()
}

/// Luhn check digit for an ASCII digit payload.
fn luhn_check_digit(payload: &str) -> char {
    let sum = luhn_sum(payload, true);
    char::from_digit((10 - sum % 10) % 10, 10).unwrap_or('0')
}

/// Whether a complete ASCII digit string passes the Luhn check.
fn luhn_valid(number: &str) -> bool {
    luhn_sum(number, false) % 10 == 0
}
