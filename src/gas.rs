//! Gas quantity.

use core::fmt;
use core::ops::{Add, AddAssign, Div, Mul, Rem, Sub, SubAssign};
use primitive_types::U256;

/// Amount of gas. Represented as a 256-bit unsigned integer, but kept as a
/// distinct type so that gas and plain values are never mixed up.
///
/// Gas never goes negative and never wraps. Addition, multiplication and
/// subtraction saturate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
pub struct Gas(U256);

impl Gas {
	/// Zero gas.
	pub fn zero() -> Self {
		Gas(U256::zero())
	}

	/// Maximum representable gas.
	pub fn max_value() -> Self {
		Gas(U256::max_value())
	}

	pub fn is_zero(&self) -> bool {
		self.0.is_zero()
	}

	/// Underlying 256-bit value.
	pub fn as_u256(&self) -> U256 {
		self.0
	}

	/// Lower 64 bits, saturating at `u64::MAX`.
	pub fn as_u64(&self) -> u64 {
		if self.0 > U256::from(u64::max_value()) {
			u64::max_value()
		} else {
			self.0.as_u64()
		}
	}

	pub fn checked_sub(self, other: Gas) -> Option<Gas> {
		self.0.checked_sub(other.0).map(Gas)
	}

	/// Number of bits needed to represent the value, used for EXP pricing.
	pub fn bits(&self) -> usize {
		self.0.bits()
	}
}

impl From<u64> for Gas {
	fn from(val: u64) -> Gas {
		Gas(U256::from(val))
	}
}

impl From<usize> for Gas {
	fn from(val: usize) -> Gas {
		Gas(U256::from(val))
	}
}

impl From<U256> for Gas {
	fn from(val: U256) -> Gas {
		Gas(val)
	}
}

impl From<Gas> for U256 {
	fn from(val: Gas) -> U256 {
		val.0
	}
}

impl Add for Gas {
	type Output = Gas;

	fn add(self, other: Gas) -> Gas {
		Gas(self.0.saturating_add(other.0))
	}
}

impl AddAssign for Gas {
	fn add_assign(&mut self, other: Gas) {
		*self = *self + other;
	}
}

impl Sub for Gas {
	type Output = Gas;

	fn sub(self, other: Gas) -> Gas {
		Gas(self.0.saturating_sub(other.0))
	}
}

impl SubAssign for Gas {
	fn sub_assign(&mut self, other: Gas) {
		*self = *self - other;
	}
}

impl Mul for Gas {
	type Output = Gas;

	fn mul(self, other: Gas) -> Gas {
		Gas(self.0.saturating_mul(other.0))
	}
}

impl Div for Gas {
	type Output = Gas;

	fn div(self, other: Gas) -> Gas {
		Gas(self.0 / other.0)
	}
}

impl Rem for Gas {
	type Output = Gas;

	fn rem(self, other: Gas) -> Gas {
		Gas(self.0 % other.0)
	}
}

impl fmt::Display for Gas {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}
