//! Arbitrary-precision unsigned amounts.
//!
//! Used for both token balances (locked amounts, vote weights) and the
//! native value attached to messages. Amounts never go negative: subtraction
//! is checked and surfaces [`TypesError::CoinsUnderflow`].

use crate::error::TypesError;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// Number of decimal places in one whole unit.
pub const DECIMALS: u32 = 9;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Coins(BigUint);

impl Coins {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn from_units(units: u128) -> Self {
        Self(BigUint::from(units))
    }

    /// Whole units scaled by [`DECIMALS`], e.g. `Coins::whole(100_500)`.
    pub fn whole(amount: u64) -> Self {
        Self(BigUint::from(amount) * BigUint::from(10u32).pow(DECIMALS))
    }

    /// Parse a decimal string with up to [`DECIMALS`] fractional digits
    /// ("0.05" -> 50_000_000 base units).
    pub fn parse_decimal(s: &str) -> Result<Self, TypesError> {
        let s = s.trim();
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(TypesError::InvalidCoins(s.to_string()));
        }
        if frac_part.len() > DECIMALS as usize {
            return Err(TypesError::InvalidCoins(format!(
                "too many fractional digits in '{}'",
                s
            )));
        }
        let digits = format!("{}{:0<width$}", int_part, frac_part, width = DECIMALS as usize);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypesError::InvalidCoins(s.to_string()));
        }
        BigUint::parse_bytes(digits.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| TypesError::InvalidCoins(s.to_string()))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_sub(&self, rhs: &Self) -> Result<Self, TypesError> {
        if self.0 < rhs.0 {
            return Err(TypesError::CoinsUnderflow);
        }
        Ok(Self(&self.0 - &rhs.0))
    }

    pub fn saturating_sub(&self, rhs: &Self) -> Self {
        self.checked_sub(rhs).unwrap_or_default()
    }

    pub fn mul_u32(&self, factor: u32) -> Self {
        Self(&self.0 * factor)
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn to_u128(&self) -> Option<u128> {
        self.0.to_u128()
    }

    pub fn to_bytes_le(&self) -> Vec<u8> {
        self.0.to_bytes_le()
    }

    pub fn from_bytes_le(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_le(bytes))
    }

    /// Render as a decimal with [`DECIMALS`] places, trailing zeros trimmed.
    pub fn to_decimal_string(&self) -> String {
        let scale = BigUint::from(10u32).pow(DECIMALS);
        let int = &self.0 / &scale;
        let frac = &self.0 % &scale;
        if frac.is_zero() {
            return int.to_string();
        }
        let frac = format!("{:0>width$}", frac.to_string(), width = DECIMALS as usize);
        format!("{}.{}", int, frac.trim_end_matches('0'))
    }
}

impl From<u64> for Coins {
    fn from(v: u64) -> Self {
        Self(BigUint::from(v))
    }
}

impl From<BigUint> for Coins {
    fn from(v: BigUint) -> Self {
        Self(v)
    }
}

impl Add for Coins {
    type Output = Coins;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Coins> for &'a Coins {
    type Output = Coins;

    fn add(self, rhs: &'a Coins) -> Self::Output {
        Coins(&self.0 + &rhs.0)
    }
}

impl AddAssign<&Coins> for Coins {
    fn add_assign(&mut self, rhs: &Coins) {
        self.0 += &rhs.0;
    }
}

impl AddAssign for Coins {
    fn add_assign(&mut self, rhs: Coins) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Coins {
    fn sum<I: Iterator<Item = Coins>>(iter: I) -> Self {
        iter.fold(Coins::zero(), |acc, c| acc + c)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coins({})", self.0)
    }
}

impl FromStr for Coins {
    type Err = TypesError;

    /// Parse a base-unit integer string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BigUint::from_str(s)
            .map(Self)
            .map_err(|e| TypesError::InvalidCoins(format!("{}: {}", s, e)))
    }
}
