//! Exact currency arithmetic.
//!
//! Node balances are denominated in base units of 10^24 per coin and routinely
//! exceed what a float (or even a u64) can hold without rounding. All currency
//! values therefore flow through [`Currency`], a thin wrapper over `BigUint`
//! that only ever renders as exact decimal text.

use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Base units per coin.
const COIN_EXP: u32 = 24;

#[derive(Debug, Error)]
#[error("invalid currency value {0:?}")]
pub struct CurrencyParseError(String);

/// An unsigned, arbitrary-precision currency amount in base units.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Currency(BigUint);

impl Currency {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Render as whole coins with three decimal places, for progress output.
    /// The CSV sink always uses the exact base-unit form instead.
    pub fn to_coins_string(&self) -> String {
        let coin = BigUint::from(10u32).pow(COIN_EXP);
        let whole = &self.0 / &coin;
        let milli = ((&self.0 % &coin) / BigUint::from(10u32).pow(COIN_EXP - 3))
            .to_u64()
            .unwrap_or(0);
        format!("{whole}.{milli:03}")
    }
}

impl From<u64> for Currency {
    fn from(v: u64) -> Self {
        Self(BigUint::from(v))
    }
}

impl FromStr for Currency {
    type Err = CurrencyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CurrencyParseError(s.to_string()));
        }
        BigUint::parse_bytes(s.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| CurrencyParseError(s.to_string()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AddAssign<&Currency> for Currency {
    fn add_assign(&mut self, rhs: &Currency) {
        self.0 += &rhs.0;
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

// The node API serializes currency as a decimal string, but some endpoints
// emit small amounts as plain JSON integers; accept both.
impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CurrencyVisitor;

        impl Visitor<'_> for CurrencyVisitor {
            type Value = Currency;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal string or unsigned integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Currency, E> {
                v.parse().map_err(de::Error::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Currency, E> {
                Ok(Currency::from(v))
            }
        }

        deserializer.deserialize_any(CurrencyVisitor)
    }
}
