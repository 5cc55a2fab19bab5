//! Eval utilities

use crate::Gas;
use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};
use sputnikvm_core::{Memory, USIZE_MAX};

/// All but one 64th of the given gas (EIP-150).
pub fn l64(gas: Gas) -> Gas {
	gas - gas / Gas::from(64u64)
}

pub fn u256_to_address(value: U256) -> H160 {
	H160::from(u256_to_h256(value))
}

pub fn u256_to_h256(value: U256) -> H256 {
	let mut ret = H256::default();
	value.to_big_endian(&mut ret[..]);
	ret
}

pub fn h256_to_u256(value: H256) -> U256 {
	U256::from_big_endian(&value[..])
}

pub fn address_to_u256(address: H160) -> U256 {
	U256::from_big_endian(&address[..])
}

/// Read a memory region whose expansion has already been paid for. An
/// empty region is empty regardless of its offset.
pub fn read_memory(memory: &Memory, offset: U256, len: U256) -> Vec<u8> {
	if len.is_zero() || offset > USIZE_MAX || len > USIZE_MAX {
		return Vec::new();
	}

	memory.get(offset.as_usize(), len.as_usize())
}
