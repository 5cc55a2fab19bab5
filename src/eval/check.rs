//! Check logic for instructions. Nothing here mutates the machine, so a
//! requirement raised by a check leaves the frame exactly where it was.

use super::util::{u256_to_address, u256_to_h256};
use super::{Runtime, State};
use crate::errors::EvalOnChainError;
use crate::params::{create2_address, create_address};
use crate::patch::Patch;
use primitive_types::{H160, U256};
use sputnikvm_core::{ExitError, Opcode, USIZE_MAX};

fn peek(state: &State, n: usize) -> U256 {
	state.machine.stack().peek(n).unwrap_or_default()
}

/// Whether the opcode exists under the given patch.
pub fn is_enabled(opcode: Opcode, patch: &Patch) -> bool {
	match opcode {
		Opcode::DELEGATECALL => patch.has_delegate_call(),
		Opcode::STATICCALL => patch.has_static_call(),
		Opcode::REVERT => patch.has_revert(),
		Opcode::RETURNDATASIZE | Opcode::RETURNDATACOPY => patch.has_return_data(),
		Opcode::SHL | Opcode::SHR | Opcode::SAR => patch.has_bitwise_shift(),
		Opcode::EXTCODEHASH => patch.has_extcodehash(),
		Opcode::CREATE2 => patch.has_create2(),
		_ => stack_io(opcode).is_some(),
	}
}

/// Number of items popped and pushed, or `None` for an undefined opcode.
pub fn stack_io(opcode: Opcode) -> Option<(usize, usize)> {
	if let Some(n) = opcode.is_push() {
		debug_assert!(n > 0);
		return Some((0, 1));
	}
	if let Some(n) = opcode.is_dup() {
		let n = n as usize;
		return Some((n, n + 1));
	}
	if let Some(n) = opcode.is_swap() {
		let n = n as usize;
		return Some((n + 1, n + 1));
	}
	if let Some(n) = opcode.is_log() {
		return Some((n as usize + 2, 0));
	}

	Some(match opcode {
		Opcode::STOP | Opcode::JUMPDEST | Opcode::INVALID => (0, 0),

		Opcode::ADD
		| Opcode::MUL
		| Opcode::SUB
		| Opcode::DIV
		| Opcode::SDIV
		| Opcode::MOD
		| Opcode::SMOD
		| Opcode::EXP
		| Opcode::SIGNEXTEND
		| Opcode::LT
		| Opcode::GT
		| Opcode::SLT
		| Opcode::SGT
		| Opcode::EQ
		| Opcode::AND
		| Opcode::OR
		| Opcode::XOR
		| Opcode::BYTE
		| Opcode::SHL
		| Opcode::SHR
		| Opcode::SAR
		| Opcode::SHA3 => (2, 1),
		Opcode::ADDMOD | Opcode::MULMOD => (3, 1),
		Opcode::ISZERO | Opcode::NOT => (1, 1),

		Opcode::ADDRESS
		| Opcode::ORIGIN
		| Opcode::CALLER
		| Opcode::CALLVALUE
		| Opcode::CALLDATASIZE
		| Opcode::CODESIZE
		| Opcode::GASPRICE
		| Opcode::RETURNDATASIZE
		| Opcode::COINBASE
		| Opcode::TIMESTAMP
		| Opcode::NUMBER
		| Opcode::DIFFICULTY
		| Opcode::GASLIMIT
		| Opcode::PC
		| Opcode::MSIZE
		| Opcode::GAS => (0, 1),
		Opcode::BALANCE
		| Opcode::CALLDATALOAD
		| Opcode::EXTCODESIZE
		| Opcode::EXTCODEHASH
		| Opcode::BLOCKHASH
		| Opcode::MLOAD
		| Opcode::SLOAD => (1, 1),
		Opcode::CALLDATACOPY | Opcode::CODECOPY | Opcode::RETURNDATACOPY => (3, 0),
		Opcode::EXTCODECOPY => (4, 0),

		Opcode::POP | Opcode::JUMP | Opcode::SUICIDE => (1, 0),
		Opcode::MSTORE
		| Opcode::MSTORE8
		| Opcode::SSTORE
		| Opcode::JUMPI
		| Opcode::RETURN
		| Opcode::REVERT => (2, 0),

		Opcode::CREATE => (3, 1),
		Opcode::CREATE2 => (4, 1),
		Opcode::CALL | Opcode::CALLCODE => (7, 1),
		Opcode::DELEGATECALL | Opcode::STATICCALL => (6, 1),

		_ => return None,
	})
}

/// Check whether the opcode may run inside a static frame.
pub fn check_static(opcode: Opcode, state: &State) -> Result<(), ExitError> {
	match opcode {
		Opcode::SSTORE
		| Opcode::LOG0
		| Opcode::LOG1
		| Opcode::LOG2
		| Opcode::LOG3
		| Opcode::LOG4
		| Opcode::CREATE
		| Opcode::CREATE2
		| Opcode::SUICIDE => Err(ExitError::NotStatic),
		Opcode::CALL if !peek(state, 2).is_zero() => Err(ExitError::NotStatic),
		_ => Ok(()),
	}
}

/// Address a CREATE or CREATE2 at the top of the stack would deploy to,
/// if the init code can be read at all.
pub fn created_address(opcode: Opcode, state: &State, runtime: &Runtime) -> Result<Option<H160>, EvalOnChainError> {
	let address = state.context.address;

	if opcode == Opcode::CREATE {
		let nonce = state.account_state.nonce(address, &runtime.log)?;
		return Ok(Some(create_address(address, nonce)));
	}

	let (offset, len) = (peek(state, 1), peek(state, 2));
	let limit = U256::from(runtime.patch.memory_limit());
	let readable = len.is_zero()
		|| (offset <= USIZE_MAX
			&& len <= USIZE_MAX
			&& offset.checked_add(len).map_or(false, |end| end <= limit));
	if !readable {
		return Ok(None);
	}

	let init_code = super::util::read_memory(state.machine.memory(), offset, len);
	Ok(Some(create2_address(
		address,
		u256_to_h256(peek(state, 3)),
		&init_code,
	)))
}

/// Make sure every account, code, storage slot or blockhash the opcode
/// reads is known.
pub fn check_require(opcode: Opcode, state: &State, runtime: &Runtime) -> Result<(), EvalOnChainError> {
	let log = &runtime.log;
	let accounts = &state.account_state;
	let address = state.context.address;

	match opcode {
		Opcode::BALANCE | Opcode::EXTCODEHASH => {
			accounts.require(u256_to_address(peek(state, 0)), log)?;
		}
		Opcode::EXTCODESIZE | Opcode::EXTCODECOPY => {
			accounts.require_code(u256_to_address(peek(state, 0)), log)?;
		}
		Opcode::SLOAD | Opcode::SSTORE => {
			accounts.require(address, log)?;
			accounts.storage(address, peek(state, 0), log)?;
		}
		Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL | Opcode::STATICCALL => {
			accounts.require(address, log)?;
			accounts.require(u256_to_address(peek(state, 1)), log)?;
		}
		Opcode::CREATE | Opcode::CREATE2 => {
			accounts.require(address, log)?;
			if let Some(created) = created_address(opcode, state, runtime)? {
				accounts.require(created, log)?;
			}
		}
		Opcode::SUICIDE => {
			accounts.require(address, log)?;
			accounts.require(u256_to_address(peek(state, 0)), log)?;
		}
		Opcode::BLOCKHASH => {
			let number = peek(state, 0);
			let current = runtime.block.number;
			if number < current && current - number <= U256::from(256u64) {
				log.blockhash(number)?;
			}
		}
		Opcode::RETURNDATACOPY => {
			let end = peek(state, 1).checked_add(peek(state, 2));
			if end.map_or(true, |end| end > U256::from(state.ret.len())) {
				return Err(ExitError::InvalidRange.into());
			}
		}
		_ => (),
	}

	Ok(())
}

/// Check whether the opcode would fail without mutating any of the
/// machine state.
pub fn check_opcode(opcode: Opcode, state: &State, runtime: &Runtime) -> Result<(), EvalOnChainError> {
	if !is_enabled(opcode, &runtime.patch) {
		return Err(ExitError::InvalidCode(opcode).into());
	}

	if let Some((pop, push)) = stack_io(opcode) {
		state.machine.stack().check_pop_push(pop, push)?;
	}

	if state.context.is_static {
		check_static(opcode, state)?;
	}

	check_require(opcode, state, runtime)
}
