//! Precompiled contracts.
//!
//! A precompiled contract runs native code instead of bytecode. It is
//! charged a deterministic amount of gas computed from its input, and
//! fails the whole frame when the gas limit cannot cover it.

mod bn128;
mod modexp;
mod simple;

pub use self::bn128::{Bn128Add, Bn128Mul, Bn128Pairing};
pub use self::modexp::ModExp;
pub use self::simple::{ECRecover, Identity, Ripemd160, Sha256};

use crate::Gas;
use alloc::vec::Vec;
use primitive_types::H160;
use sputnikvm_core::ExitError;

/// Represent a precompiled contract.
#[auto_impl::auto_impl(&, Box)]
pub trait Precompiled: Sync {
	/// Gas needed for a given input.
	fn gas(&self, data: &[u8]) -> Gas;
	/// Run the contract on the given input.
	fn step(&self, data: &[u8]) -> Result<Vec<u8>, ExitError>;
	/// Combine step and gas together, given the gas limit.
	fn gas_and_step(&self, data: &[u8], gas_limit: Gas) -> Result<(Gas, Vec<u8>), ExitError> {
		let gas = self.gas(data);
		if gas > gas_limit {
			Err(ExitError::OutOfGas)
		} else {
			Ok((gas, self.step(data)?))
		}
	}
}

pub static ECREC_PRECOMPILED: ECRecover = ECRecover;
pub static SHA256_PRECOMPILED: Sha256 = Sha256;
pub static RIP160_PRECOMPILED: Ripemd160 = Ripemd160;
pub static ID_PRECOMPILED: Identity = Identity;
pub static MODEXP_PRECOMPILED: ModExp = ModExp;
pub static BN128_ADD_PRECOMPILED: Bn128Add = Bn128Add;
pub static BN128_MUL_PRECOMPILED: Bn128Mul = Bn128Mul;
pub static BN128_PAIRING_PRECOMPILED: Bn128Pairing = Bn128Pairing;

/// Address of the `n`-th precompiled contract.
pub fn precompiled_address(n: u64) -> H160 {
	H160::from_low_u64_be(n)
}

/// Look up the implementation living at the given address, regardless of
/// whether a patch enables it.
pub fn precompiled(address: &H160) -> Option<&'static dyn Precompiled> {
	if address[..19] != [0u8; 19] {
		return None;
	}

	match address[19] {
		0x01 => Some(&ECREC_PRECOMPILED),
		0x02 => Some(&SHA256_PRECOMPILED),
		0x03 => Some(&RIP160_PRECOMPILED),
		0x04 => Some(&ID_PRECOMPILED),
		0x05 => Some(&MODEXP_PRECOMPILED),
		0x06 => Some(&BN128_ADD_PRECOMPILED),
		0x07 => Some(&BN128_MUL_PRECOMPILED),
		0x08 => Some(&BN128_PAIRING_PRECOMPILED),
		_ => None,
	}
}

/// Ceiling division of a byte length into 32-byte words.
pub(crate) fn words(len: usize) -> Gas {
	let words = len / 32 + if len % 32 == 0 { 0 } else { 1 };
	Gas::from(words)
}

/// Linear cost `base + word * words(len)`.
pub(crate) fn linear_cost(len: usize, base: u64, word: u64) -> Gas {
	Gas::from(base) + Gas::from(word) * words(len)
}
