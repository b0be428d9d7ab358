//! Unsigned fixed point with 96 fractional bits.
//!
//! A value `x` is stored as `x * 2^96` in a `U256`. Products and quotients
//! are computed in `U512` and truncated back, so every operation floors.

use primitive_types::{U256, U512};

use super::errors::RewardError;

/// Number of fractional bits.
pub const FRACTION_BITS: usize = 96;

/// Unsigned Q160.96 fixed-point number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Q96(U256);

impl Q96 {
    pub const ZERO: Q96 = Q96(U256([0; 4]));

    /// Exact conversion of an integer.
    pub fn from_int(value: u64) -> Self {
        Q96(U256::from(value) << FRACTION_BITS)
    }

    /// Exact conversion of a wide integer; fails above 160 bits.
    pub fn from_u256(value: U256) -> Result<Self, RewardError> {
        if value.bits() > 256 - FRACTION_BITS {
            return Err(RewardError::Overflow("q96 conversion"));
        }
        Ok(Q96(value << FRACTION_BITS))
    }

    /// Raw scaled representation.
    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(self, other: Q96) -> Result<Q96, RewardError> {
        self.0
            .checked_add(other.0)
            .map(Q96)
            .ok_or(RewardError::Overflow("q96 add"))
    }

    pub fn sub(self, other: Q96) -> Result<Q96, RewardError> {
        self.0
            .checked_sub(other.0)
            .map(Q96)
            .ok_or(RewardError::Overflow("q96 sub"))
    }

    /// `(a * b) >> 96`, truncated.
    pub fn mul(self, other: Q96) -> Result<Q96, RewardError> {
        let product: U512 = self.0.full_mul(other.0) >> FRACTION_BITS;
        narrow(product, "q96 mul").map(Q96)
    }

    /// `(a << 96) / b`, truncated.
    pub fn div(self, other: Q96) -> Result<Q96, RewardError> {
        if other.is_zero() {
            return Err(RewardError::DivisionByZero);
        }
        let numerator = U512::from(self.0) << FRACTION_BITS;
        narrow(numerator / U512::from(other.0), "q96 div").map(Q96)
    }

    /// Integer part (truncation toward zero).
    pub fn floor(self) -> U256 {
        self.0 >> FRACTION_BITS
    }

    /// Integer part as `u64`.
    pub fn floor_u64(self) -> Result<u64, RewardError> {
        let int = self.floor();
        if int > U256::from(u64::MAX) {
            return Err(RewardError::Overflow("q96 floor"));
        }
        Ok(int.low_u64())
    }
}

fn narrow(value: U512, op: &'static str) -> Result<U256, RewardError> {
    U256::try_from(value).map_err(|_| RewardError::Overflow(op))
}
