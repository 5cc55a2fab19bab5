use super::Precompiled;
use crate::Gas;
use alloc::{vec, vec::Vec};
use core::cmp::{max, min};
use num::{BigUint, One, Zero};
use primitive_types::U256;
use sputnikvm_core::ExitError;

/// Lengths beyond this are priced out of any reachable gas limit.
const MAX_LEN: u64 = 1 << 32;

/// MODEXP precompiled contract at `0x05`, priced as in EIP-198.
pub struct ModExp;

/// Read `len` bytes starting at `offset`, zero-padding past the end of the
/// input.
fn read_padded(data: &[u8], offset: usize, len: usize) -> Vec<u8> {
	let mut ret = vec![0u8; len];
	if offset < data.len() {
		let end = min(data.len(), offset.saturating_add(len));
		ret[..(end - offset)].copy_from_slice(&data[offset..end]);
	}
	ret
}

fn read_len(data: &[u8], offset: usize) -> U256 {
	U256::from_big_endian(&read_padded(data, offset, 32))
}

fn mult_complexity(x: u64) -> U256 {
	let x = U256::from(x);
	if x <= U256::from(64u64) {
		x * x
	} else if x <= U256::from(1024u64) {
		x * x / U256::from(4u64) + U256::from(96u64) * x - U256::from(3072u64)
	} else {
		x * x / U256::from(16u64) + U256::from(480u64) * x - U256::from(199_680u64)
	}
}

fn adjusted_exp_len(exp_len: u64, exp_head: U256) -> u64 {
	let head_bits = if exp_head.is_zero() {
		0
	} else {
		exp_head.bits() as u64 - 1
	};

	if exp_len <= 32 {
		head_bits
	} else {
		8 * (exp_len - 32) + head_bits
	}
}

impl Precompiled for ModExp {
	fn gas(&self, data: &[u8]) -> Gas {
		let base_len = read_len(data, 0);
		let exp_len = read_len(data, 32);
		let mod_len = read_len(data, 64);

		let limit = U256::from(MAX_LEN);
		if base_len > limit || exp_len > limit || mod_len > limit {
			return Gas::max_value();
		}
		let (base_len, exp_len, mod_len) = (base_len.as_u64(), exp_len.as_u64(), mod_len.as_u64());

		let head_len = min(exp_len, 32) as usize;
		let head = read_padded(data, 96 + base_len as usize, head_len);
		let exp_head = U256::from_big_endian(&head);

		let complexity = mult_complexity(max(base_len, mod_len));
		let iterations = max(adjusted_exp_len(exp_len, exp_head), 1);

		Gas::from(complexity.saturating_mul(U256::from(iterations)) / U256::from(20u64))
	}

	fn step(&self, data: &[u8]) -> Result<Vec<u8>, ExitError> {
		let limit = U256::from(MAX_LEN);
		let base_len = read_len(data, 0);
		let exp_len = read_len(data, 32);
		let mod_len = read_len(data, 64);
		if base_len > limit || exp_len > limit || mod_len > limit {
			return Err(ExitError::OutOfGas);
		}
		let (base_len, exp_len, mod_len) = (
			base_len.as_usize(),
			exp_len.as_usize(),
			mod_len.as_usize(),
		);

		if mod_len == 0 {
			return Ok(Vec::new());
		}

		let base = BigUint::from_bytes_be(&read_padded(data, 96, base_len));
		let exponent = BigUint::from_bytes_be(&read_padded(data, 96 + base_len, exp_len));
		let modulus = BigUint::from_bytes_be(&read_padded(
			data,
			96 + base_len + exp_len,
			mod_len,
		));

		let result = if modulus.is_zero() || modulus.is_one() {
			BigUint::zero()
		} else {
			base.modpow(&exponent, &modulus)
		};

		let bytes = result.to_bytes_be();
		let mut ret = vec![0u8; mod_len];
		if bytes.len() <= mod_len && !result.is_zero() {
			ret[(mod_len - bytes.len())..].copy_from_slice(&bytes);
		}
		Ok(ret)
	}
}
