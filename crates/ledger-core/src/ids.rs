//! Identifier types for the ledger.
//!
//! Both accounts and transactions are identified by positive 64-bit integers.
//! Account IDs are chosen by the caller at creation time; transaction IDs are
//! assigned by the store and increase monotonically.
//!
//! # Macro-based ID Types
//!
//! The `int_id_type!` macro reduces boilerplate for integer identifier types,
//! ensuring consistent implementation of serialization, parsing, and display traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macro to define a positive integer identifier type with standard trait implementations.
///
/// This macro generates a newtype wrapper around `i64` with implementations for:
/// - `Clone`, `Copy`, `PartialEq`, `Eq`, `PartialOrd`, `Ord`, `Hash`
/// - `Serialize`, `Deserialize` (as a JSON number, validated on the way in)
/// - `FromStr`, `Display`, `Debug`
/// - `TryFrom<i64>`, `Into<i64>`
///
/// # Example
///
/// ```ignore
/// int_id_type!(MyId, "A custom identifier type.");
/// let id = MyId::new(7).unwrap();
/// let parsed: MyId = id.to_string().parse().unwrap();
/// ```
macro_rules! int_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(i64);

        impl $name {
            /// Create an identifier, rejecting zero and negative values.
            ///
            /// # Errors
            ///
            /// Returns `IdError::NotPositive` if `value <= 0`.
            pub fn new(value: i64) -> Result<Self, IdError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(IdError::NotPositive(value))
                }
            }

            /// Return the raw integer value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value: i64 = s.parse().map_err(|_| IdError::Malformed(s.to_string()))?;
                Self::new(value)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i64> for $name {
            type Error = IdError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

int_id_type!(AccountId, "An account identifier.\n\nChosen by the caller when the account is created and immutable afterwards.");
int_id_type!(TransactionId, "A transaction identifier.\n\nAssigned by the store; later transactions always receive larger IDs.");

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The value is zero or negative.
    #[error("identifier must be a positive integer, got {0}")]
    NotPositive(i64),

    /// The input is not an integer at all.
    #[error("identifier is not an integer: {0:?}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_rejects_non_positive() {
        assert_eq!(AccountId::new(0), Err(IdError::NotPositive(0)));
        assert_eq!(AccountId::new(-3), Err(IdError::NotPositive(-3)));
        assert_eq!(AccountId::new(42).unwrap().get(), 42);
    }

    #[test]
    fn account_id_from_str() {
        assert_eq!("17".parse::<AccountId>().unwrap().get(), 17);
        assert!(matches!(
            "abc".parse::<AccountId>(),
            Err(IdError::Malformed(_))
        ));
        assert!(matches!(
            "-1".parse::<AccountId>(),
            Err(IdError::NotPositive(-1))
        ));
    }

    #[test]
    fn account_id_serde_json() {
        let id = AccountId::new(123).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "123");
        let parsed: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn account_id_deserialize_rejects_zero() {
        let result: Result<AccountId, _> = serde_json::from_str("0");
        assert!(result.is_err());
    }

    #[test]
    fn transaction_ids_order_numerically() {
        let a = TransactionId::new(9).unwrap();
        let b = TransactionId::new(10).unwrap();
        assert!(a < b);
        assert_eq!(format!("{b}"), "10");
        assert_eq!(format!("{b:?}"), "TransactionId(10)");
    }
}
