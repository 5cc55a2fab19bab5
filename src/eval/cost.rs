//! Cost calculation logic

use super::util::u256_to_address;
use super::{Runtime, State};
use crate::errors::RequireError;
use crate::Gas;
use core::cmp::max;
use log::trace;
use primitive_types::U256;
use sputnikvm_core::Opcode;

const G_ZERO: u64 = 0;
const G_BASE: u64 = 2;
const G_VERYLOW: u64 = 3;
const G_LOW: u64 = 5;
const G_MID: u64 = 8;
const G_HIGH: u64 = 10;
const G_JUMPDEST: u64 = 1;
const G_SNOOP: u64 = 200;
const G_SSET: u64 = 20000;
const G_SRESET: u64 = 5000;
const R_SRESET: i64 = 15000;
const R_SCLEAR: i64 = 19800;
const R_SNOOP: i64 = 4800;
const R_SUICIDE: i64 = 24000;
const G_CREATE: u64 = 32000;
const G_CODEDEPOSIT: u64 = 200;
const G_CALLVALUE: u64 = 9000;
const G_CALLSTIPEND: u64 = 2300;
const G_NEWACCOUNT: u64 = 25000;
const G_EXP: u64 = 10;
const G_MEMORY: u64 = 3;
const G_LOG: u64 = 375;
const G_LOGDATA: u64 = 8;
const G_LOGTOPIC: u64 = 375;
const G_SHA3: u64 = 30;
const G_SHA3WORD: u64 = 6;
const G_COPY: u64 = 3;
const G_BLOCKHASH: u64 = 20;
const G_EXTCODEHASH: u64 = 400;

/// Stack item `n` from the top. Only used after the stack has been checked.
fn peek(state: &State, n: usize) -> U256 {
	state.machine.stack().peek(n).unwrap_or_default()
}

fn words(len: U256) -> Gas {
	let len = Gas::from(len);
	let wordd = len / Gas::from(32u64);
	let wordr = len % Gas::from(32u64);
	if wordr == Gas::zero() {
		wordd
	} else {
		wordd + Gas::from(1u64)
	}
}

fn sstore_cost(state: &State, runtime: &Runtime) -> Result<Gas, RequireError> {
	let index = peek(state, 0);
	let value = peek(state, 1);
	let address = state.context.address;
	let current = state.account_state.storage(address, index, &runtime.log)?;

	if runtime.patch.has_reduced_sstore_gas_metering() {
		trace!("using EIP1283 reduced SSTORE gas metering scheme");
		let original = state
			.account_state
			.original_storage(address, index, &runtime.log);
		Ok(if value == current {
			G_SNOOP.into()
		} else if original == current {
			if original.is_zero() {
				G_SSET.into()
			} else {
				G_SRESET.into()
			}
		} else {
			G_SNOOP.into()
		})
	} else if !value.is_zero() && current.is_zero() {
		Ok(G_SSET.into())
	} else {
		Ok(G_SRESET.into())
	}
}

fn call_cost(opcode: Opcode, state: &State, runtime: &Runtime) -> Result<Gas, RequireError> {
	Ok(runtime.patch.gas_call() + xfer_cost(opcode, state) + new_cost(opcode, state, runtime)?)
}

fn xfer_cost(opcode: Opcode, state: &State) -> Gas {
	if (opcode == Opcode::CALL || opcode == Opcode::CALLCODE) && !peek(state, 2).is_zero() {
		G_CALLVALUE.into()
	} else {
		Gas::zero()
	}
}

fn new_cost(opcode: Opcode, state: &State, runtime: &Runtime) -> Result<Gas, RequireError> {
	if opcode != Opcode::CALL {
		return Ok(Gas::zero());
	}

	let address = u256_to_address(peek(state, 1));
	let account_state = &state.account_state;
	let is_new = if runtime.patch.account_patch().empty_considered_exists {
		!account_state.exists(address, &runtime.log)?
	} else {
		!peek(state, 2).is_zero() && account_state.is_empty(address, &runtime.log)?
	};

	Ok(if is_new {
		G_NEWACCOUNT.into()
	} else {
		Gas::zero()
	})
}

fn suicide_cost(state: &State, runtime: &Runtime) -> Result<Gas, RequireError> {
	let address = u256_to_address(peek(state, 0));
	let patch = &runtime.patch;
	let account_state = &state.account_state;

	let topup = if patch.account_patch().empty_considered_exists {
		!account_state.exists(address, &runtime.log)?
	} else {
		let balance = account_state.balance(state.context.address, &runtime.log)?;
		!balance.is_zero() && account_state.is_empty(address, &runtime.log)?
	};

	if topup {
		trace!("suicide with new account gas topup");
		Ok(patch.gas_suicide() + patch.gas_suicide_new_account())
	} else {
		Ok(patch.gas_suicide())
	}
}

fn memory_expand(current: Gas, from: U256, len: U256) -> Gas {
	if len.is_zero() {
		return current;
	}

	let end = Gas::from(from) + Gas::from(len);
	max(current, words(end.as_u256()))
}

/// Calculate code deposit cost for a ContractCreation transaction.
pub fn code_deposit_gas(len: usize) -> Gas {
	Gas::from(G_CODEDEPOSIT) * Gas::from(len)
}

/// Calculate the memory gas from the memory cost.
pub fn memory_gas(a: Gas) -> Gas {
	Gas::from(G_MEMORY) * a + a * a / Gas::from(512u64)
}

/// Calculate the memory cost. This is the same as the active memory
/// length in words in the Yellow Paper.
pub fn memory_cost(opcode: Opcode, state: &State) -> Gas {
	let current = state.memory_cost;
	match opcode {
		Opcode::SHA3 | Opcode::RETURN | Opcode::REVERT => {
			memory_expand(current, peek(state, 0), peek(state, 1))
		}
		Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => {
			memory_expand(current, peek(state, 0), peek(state, 1))
		}
		Opcode::CODECOPY | Opcode::CALLDATACOPY | Opcode::RETURNDATACOPY => {
			memory_expand(current, peek(state, 0), peek(state, 2))
		}
		Opcode::EXTCODECOPY => memory_expand(current, peek(state, 1), peek(state, 3)),
		Opcode::MLOAD | Opcode::MSTORE => {
			memory_expand(current, peek(state, 0), U256::from(32u64))
		}
		Opcode::MSTORE8 => memory_expand(current, peek(state, 0), U256::one()),
		Opcode::CREATE | Opcode::CREATE2 => memory_expand(current, peek(state, 1), peek(state, 2)),
		Opcode::CALL | Opcode::CALLCODE => memory_expand(
			memory_expand(current, peek(state, 3), peek(state, 4)),
			peek(state, 5),
			peek(state, 6),
		),
		Opcode::DELEGATECALL | Opcode::STATICCALL => memory_expand(
			memory_expand(current, peek(state, 2), peek(state, 3)),
			peek(state, 4),
			peek(state, 5),
		),
		_ => current,
	}
}

/// Calculate the gas cost.
pub fn gas_cost(opcode: Opcode, state: &State, runtime: &Runtime) -> Result<Gas, RequireError> {
	let patch = &runtime.patch;

	Ok(match opcode {
		Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL | Opcode::STATICCALL => {
			call_cost(opcode, state, runtime)?
		}
		Opcode::SUICIDE => suicide_cost(state, runtime)?,
		Opcode::SSTORE => sstore_cost(state, runtime)?,

		Opcode::SHA3 => Gas::from(G_SHA3) + Gas::from(G_SHA3WORD) * words(peek(state, 1)),

		Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => {
			let topics = (opcode.as_u8() - Opcode::LOG0.as_u8()) as u64;
			Gas::from(G_LOG)
				+ Gas::from(G_LOGDATA) * Gas::from(peek(state, 1))
				+ Gas::from(G_LOGTOPIC) * Gas::from(topics)
		}

		Opcode::EXTCODECOPY => patch.gas_extcode() + Gas::from(G_COPY) * words(peek(state, 3)),
		Opcode::CALLDATACOPY | Opcode::CODECOPY | Opcode::RETURNDATACOPY => {
			Gas::from(G_VERYLOW) + Gas::from(G_COPY) * words(peek(state, 2))
		}

		Opcode::EXP => {
			let exponent = peek(state, 1);
			let bytes = (exponent.bits() + 7) / 8;
			Gas::from(G_EXP) + patch.gas_expbyte() * Gas::from(bytes)
		}

		Opcode::CREATE => G_CREATE.into(),
		Opcode::CREATE2 => Gas::from(G_CREATE) + Gas::from(G_SHA3WORD) * words(peek(state, 2)),
		Opcode::JUMPDEST => G_JUMPDEST.into(),
		Opcode::SLOAD => patch.gas_sload(),

		// W_zero
		Opcode::STOP | Opcode::RETURN | Opcode::REVERT | Opcode::INVALID => G_ZERO.into(),

		// W_base
		Opcode::ADDRESS
		| Opcode::ORIGIN
		| Opcode::CALLER
		| Opcode::CALLVALUE
		| Opcode::CALLDATASIZE
		| Opcode::RETURNDATASIZE
		| Opcode::CODESIZE
		| Opcode::GASPRICE
		| Opcode::COINBASE
		| Opcode::TIMESTAMP
		| Opcode::NUMBER
		| Opcode::DIFFICULTY
		| Opcode::GASLIMIT
		| Opcode::POP
		| Opcode::PC
		| Opcode::MSIZE
		| Opcode::GAS => G_BASE.into(),

		// W_low
		Opcode::MUL
		| Opcode::DIV
		| Opcode::SDIV
		| Opcode::MOD
		| Opcode::SMOD
		| Opcode::SIGNEXTEND => G_LOW.into(),

		// W_mid
		Opcode::ADDMOD | Opcode::MULMOD | Opcode::JUMP => G_MID.into(),

		// W_high
		Opcode::JUMPI => G_HIGH.into(),

		Opcode::EXTCODESIZE => patch.gas_extcode(),
		Opcode::BALANCE => patch.gas_balance(),
		Opcode::BLOCKHASH => G_BLOCKHASH.into(),
		Opcode::EXTCODEHASH => G_EXTCODEHASH.into(),

		// W_verylow: arithmetic, comparison, bitwise, shifts, CALLDATALOAD,
		// MLOAD, MSTORE, MSTORE8, PUSH, DUP and SWAP.
		_ => G_VERYLOW.into(),
	})
}

/// Raise gas stipend for CALL and CALLCODE instruction.
pub fn gas_stipend(opcode: Opcode, state: &State) -> Gas {
	match opcode {
		Opcode::CALL | Opcode::CALLCODE if !peek(state, 2).is_zero() => G_CALLSTIPEND.into(),
		_ => Gas::zero(),
	}
}

/// Calculate the refunded gas.
pub fn gas_refund(opcode: Opcode, state: &State, runtime: &Runtime) -> Result<i64, RequireError> {
	match opcode {
		Opcode::SSTORE => {
			let index = peek(state, 0);
			let value = peek(state, 1);
			let address = state.context.address;
			let current = state.account_state.storage(address, index, &runtime.log)?;

			if runtime.patch.has_reduced_sstore_gas_metering() {
				let original = state
					.account_state
					.original_storage(address, index, &runtime.log);
				let mut refund = 0;

				if value != current {
					if original == current {
						if !original.is_zero() && value.is_zero() {
							refund += R_SRESET;
						}
					} else {
						if !original.is_zero() {
							if current.is_zero() {
								refund -= R_SRESET;
							}
							if value.is_zero() {
								refund += R_SRESET;
							}
						}
						if original == value {
							if original.is_zero() {
								refund += R_SCLEAR;
							} else {
								refund += R_SNOOP;
							}
						}
					}
				}

				Ok(refund)
			} else if value.is_zero() && !current.is_zero() {
				Ok(R_SRESET)
			} else {
				Ok(0)
			}
		}
		Opcode::SUICIDE => {
			if state.removed.contains(&state.context.address) {
				Ok(0)
			} else {
				Ok(R_SUICIDE)
			}
		}
		_ => Ok(0),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn memory_gas_is_quadratic() {
		assert_eq!(memory_gas(Gas::zero()), Gas::zero());
		assert_eq!(memory_gas(Gas::from(1u64)), Gas::from(3u64));
		// 3 * 1024 + 1024 * 1024 / 512
		assert_eq!(memory_gas(Gas::from(1024u64)), Gas::from(5120u64));
	}

	#[test]
	fn memory_expands_in_words() {
		let current = Gas::from(2u64);
		assert_eq!(
			memory_expand(current, U256::from(1000u64), U256::zero()),
			current
		);
		assert_eq!(
			memory_expand(current, U256::zero(), U256::from(33u64)),
			current
		);
		assert_eq!(
			memory_expand(current, U256::from(64u64), U256::from(1u64)),
			Gas::from(3u64)
		);
		assert_eq!(
			memory_expand(current, U256::max_value(), U256::max_value()),
			words(U256::max_value())
		);
	}

	#[test]
	fn code_deposit_is_per_byte() {
		assert_eq!(code_deposit_gas(0), Gas::zero());
		assert_eq!(code_deposit_gas(10), Gas::from(2000u64));
	}
}
