use std::{
    fmt::Display,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// The currency that all store prices are quoted in.
pub const STORE_CURRENCY_CODE: &str = "GHS";

//--------------------------------------     Pesewas       ---------------------------------------------------------
/// An amount of money in the smallest unit of the Ghanaian cedi (1 GHS = 100 pesewas).
///
/// Prices are stored and compared as integers so that no rounding ever happens between the catalog, the order
/// snapshot and the amount the payment gateway reports back.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Pesewas(i64);

op!(binary Pesewas, Add, add);
op!(binary Pesewas, Sub, sub);
op!(inplace Pesewas, AddAssign, add_assign);
op!(inplace Pesewas, SubAssign, sub_assign);
op!(unary Pesewas, Neg, neg);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented in pesewas: {0}")]
pub struct PesewasConversionError(String);

impl From<i64> for Pesewas {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Pesewas {
    type Error = PesewasConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(PesewasConversionError(format!("Value {value} is too large to convert to Pesewas")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

/// Parses a decimal cedi amount, e.g. `"12.50"`, `"12.5"` or `"12"`. At most two decimal places are accepted and the
/// amount may not be negative.
impl FromStr for Pesewas {
    type Err = PesewasConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || PesewasConversionError(format!("'{s}' is not a valid cedi amount"));
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || frac.len() > 2 || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        if !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let cedis = whole.parse::<i64>().map_err(|_| err())?;
        let pesewas = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| err())? * 10,
            _ => frac.parse::<i64>().map_err(|_| err())?,
        };
        cedis.checked_mul(100).and_then(|v| v.checked_add(pesewas)).map(Self).ok_or_else(err)
    }
}

impl Display for Pesewas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GH₵{}", self.to_decimal_string())
    }
}

impl Pesewas {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_cedis(cedis: i64) -> Self {
        Self(cedis * 100)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// The price of `quantity` units, or `None` if the result does not fit.
    pub fn checked_mul(self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(quantity).map(Self)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Sums the amounts, returning `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Option<Self> {
        amounts.into_iter().try_fold(Self::default(), Self::checked_add)
    }

    /// The amount as a plain decimal string with two places, e.g. `"12.50"`.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }
}
