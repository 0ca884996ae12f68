//! Exact decimal money amounts.
//!
//! Balances and transfer amounts are stored as `DECIMAL(20, 10)`: up to ten
//! integer digits and exactly ten fractional digits. [`Amount`] mirrors that
//! range in memory and never goes through binary floating point, so repeated
//! transfers cannot drift.
//!
//! On every boundary (JSON, SQL, logs) an amount is an exact base-10 string
//! with ten fractional digits, e.g. `"69.5000000000"`.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of fractional digits every amount carries.
pub const AMOUNT_SCALE: u32 = 10;

/// Maximum number of integer digits an amount may have.
pub const AMOUNT_INTEGER_DIGITS: u32 = 10;

/// A non-negative, exact decimal amount with a fixed scale of ten.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// The zero amount (`0.0000000000`).
    #[must_use]
    pub fn zero() -> Self {
        Self(Decimal::new(0, AMOUNT_SCALE))
    }

    /// Build an amount from a decimal value.
    ///
    /// Trailing zeros beyond the tenth fractional digit are accepted; any other
    /// loss of precision is rejected rather than rounded.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative, has more than ten significant
    /// fractional digits, or does not fit in ten integer digits.
    pub fn try_from_decimal(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative);
        }

        let normalized = value.normalize();
        if normalized.scale() > AMOUNT_SCALE {
            return Err(AmountError::TooPrecise {
                scale: normalized.scale(),
            });
        }

        if normalized.abs() >= upper_bound() {
            return Err(AmountError::OutOfRange);
        }

        let mut scaled = normalized.abs();
        scaled.rescale(AMOUNT_SCALE);
        Ok(Self(scaled))
    }

    /// Return the underlying decimal (always at scale ten).
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whether the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        !self.0.is_zero()
    }

    /// Exact addition. Returns `None` if the sum leaves the representable range.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        let sum = self.0.checked_add(other.0)?;
        Self::try_from_decimal(sum).ok()
    }

    /// Exact subtraction. Returns `None` if the result would be negative.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        if other.0 > self.0 {
            return None;
        }
        let difference = self.0.checked_sub(other.0)?;
        Self::try_from_decimal(difference).ok()
    }
}

/// Exclusive upper bound: `10^AMOUNT_INTEGER_DIGITS`.
fn upper_bound() -> Decimal {
    Decimal::from(10_i64.pow(AMOUNT_INTEGER_DIGITS))
}

impl Default for Amount {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse a plain decimal string.
    ///
    /// Accepted: `"100"`, `"30.5"`, `"0.0000000001"`.
    /// Rejected: `""`, `".5"`, `"5."`, `"+5"`, `"-5"`, `"1e3"`, `" 5"`, `"1_000"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        if s.starts_with('-') {
            return Err(AmountError::Negative);
        }
        if s.starts_with('.') || s.ends_with('.') {
            return Err(AmountError::Malformed(s.to_string()));
        }

        let mut dots = 0;
        for c in s.chars() {
            match c {
                '0'..='9' => {}
                '.' => dots += 1,
                _ => return Err(AmountError::Malformed(s.to_string())),
            }
        }
        if dots > 1 {
            return Err(AmountError::Malformed(s.to_string()));
        }

        // Checked on the text: `Decimal::from_str` rounds past 28 fractional digits.
        let (integer, fraction) = s.split_once('.').unwrap_or((s, ""));
        let fraction = fraction.trim_end_matches('0');
        let fraction_digits = fraction.len();
        if fraction_digits > AMOUNT_SCALE as usize {
            return Err(AmountError::TooPrecise {
                scale: u32::try_from(fraction_digits).unwrap_or(u32::MAX),
            });
        }
        if integer.trim_start_matches('0').len() > AMOUNT_INTEGER_DIGITS as usize {
            return Err(AmountError::OutOfRange);
        }

        let exact = if fraction.is_empty() {
            integer.to_string()
        } else {
            format!("{integer}.{fraction}")
        };
        let value =
            Decimal::from_str(&exact).map_err(|_| AmountError::Malformed(s.to_string()))?;
        Self::try_from_decimal(value)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::try_from_decimal(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        // JSON numbers would already have gone through f64, so only strings are accepted.
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Errors that can occur when constructing an [`Amount`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// Empty input.
    #[error("amount cannot be empty")]
    Empty,

    /// Not a plain decimal string.
    #[error("invalid amount format: {0:?}")]
    Malformed(String),

    /// Negative value.
    #[error("amount cannot be negative")]
    Negative,

    /// More fractional digits than the ledger stores.
    #[error("amount has {scale} fractional digits, at most {AMOUNT_SCALE} are allowed")]
    TooPrecise {
        /// Number of significant fractional digits in the input.
        scale: u32,
    },

    /// Too many integer digits.
    #[error("amount exceeds {AMOUNT_INTEGER_DIGITS} integer digits")]
    OutOfRange,
}
