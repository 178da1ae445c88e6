use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::cell::CellValue;

/// Exact decimal transaction amount in currency units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(decimal: Decimal) -> Self {
        Amount(decimal)
    }

    pub fn zero() -> Self {
        Amount(Decimal::ZERO)
    }

    /// Coerces a cell to an amount. Anything that is not numeric counts as zero.
    pub fn from_cell(cell: &CellValue) -> Self {
        Amount(cell.to_decimal().unwrap_or(Decimal::ZERO))
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Rounds up to the next whole unit. Saturates at the `i64` bounds.
    pub fn ceil_units(self) -> i64 {
        let ceiled = self.0.ceil();
        ceiled.to_i64().unwrap_or(if ceiled.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl From<i64> for Amount {
    fn from(units: i64) -> Self {
        Amount(Decimal::from(units))
    }
}

/// Saturates at the `Decimal` bounds instead of overflowing.
impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |a, b| a + b)
    }
}
