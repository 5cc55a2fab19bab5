//! Opcodes the bytecode machine traps on: state access, environment
//! queries, logs, calls and creates.

use super::util::{address_to_u256, h256_to_u256, l64, read_memory, u256_to_address, u256_to_h256};
use super::{Control, Runtime, State};
use crate::errors::EvalOnChainError;
use crate::output::Log;
use crate::params::{create2_address, create_address, Context};
use crate::Gas;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cmp::min;
use log::trace;
use primitive_types::{H160, U256};
use sha3::{Digest, Keccak256};
use sputnikvm_core::{ExitError, ExitSucceed, Opcode};

macro_rules! pop {
	( $state:expr, $( $x:ident ),* ) => (
		$(
			let $x = $state.machine.stack_mut().pop()?;
		)*
	);
}

macro_rules! push {
	( $state:expr, $( $x:expr ),* ) => ({
		$(
			$state.machine.stack_mut().push($x)?;
		)*
	})
}

macro_rules! try_fatal {
	( $e:expr ) => {
		if let Err(e) = $e {
			return Ok(Some(Control::Exit(e.into())));
		}
	};
}

/// Run an opcode the machine trapped on. Operands have been checked, gas
/// and memory paid for, and every requirement satisfied.
pub fn run_opcode(
	opcode: Opcode,
	state: &mut State,
	runtime: &Runtime,
	stipend_gas: Gas,
	after_gas: Gas,
) -> Result<Option<Control>, EvalOnChainError> {
	let log = &runtime.log;

	match opcode {
		Opcode::SHA3 => {
			pop!(state, offset, len);
			let data = read_memory(state.machine.memory(), offset, len);
			let ret = Keccak256::digest(&data[..]);
			push!(state, U256::from_big_endian(ret.as_slice()));
		}

		Opcode::ADDRESS => push!(state, address_to_u256(state.context.address)),
		Opcode::BALANCE => {
			pop!(state, address);
			let balance = state
				.account_state
				.balance(u256_to_address(address), log)?;
			push!(state, balance);
		}
		Opcode::ORIGIN => push!(state, address_to_u256(state.context.origin)),
		Opcode::CALLER => push!(state, address_to_u256(state.context.caller)),
		Opcode::CALLVALUE => push!(state, state.context.apparent_value),
		Opcode::GASPRICE => push!(state, state.context.gas_price.into()),
		Opcode::EXTCODESIZE => {
			pop!(state, address);
			let code = state.account_state.code(u256_to_address(address), log)?;
			push!(state, U256::from(code.len()));
		}
		Opcode::EXTCODECOPY => {
			pop!(state, address, memory_offset, code_offset, len);
			let code = state.account_state.code(u256_to_address(address), log)?;
			try_fatal!(state
				.machine
				.memory_mut()
				.copy_large(memory_offset, code_offset, len, &code));
		}
		Opcode::EXTCODEHASH => {
			pop!(state, address);
			let address = u256_to_address(address);
			let account_state = &state.account_state;
			let hash = if !account_state.exists(address, log)? || account_state.is_empty(address, log)? {
				U256::zero()
			} else {
				let code = account_state.code(address, log)?;
				U256::from_big_endian(Keccak256::digest(&code[..]).as_slice())
			};
			push!(state, hash);
		}
		Opcode::RETURNDATASIZE => push!(state, U256::from(state.ret.len())),
		Opcode::RETURNDATACOPY => {
			pop!(state, memory_offset, data_offset, len);
			let ret = state.ret.clone();
			try_fatal!(state
				.machine
				.memory_mut()
				.copy_large(memory_offset, data_offset, len, &ret));
		}

		Opcode::BLOCKHASH => {
			pop!(state, number);
			let current = runtime.block.number;
			let hash = if number < current && current - number <= U256::from(256u64) {
				h256_to_u256(log.blockhash(number)?)
			} else {
				U256::zero()
			};
			push!(state, hash);
		}
		Opcode::COINBASE => push!(state, address_to_u256(runtime.block.beneficiary)),
		Opcode::TIMESTAMP => push!(state, U256::from(runtime.block.timestamp)),
		Opcode::NUMBER => push!(state, runtime.block.number),
		Opcode::DIFFICULTY => push!(state, runtime.block.difficulty),
		Opcode::GASLIMIT => push!(state, runtime.block.gas_limit.into()),

		Opcode::SLOAD => {
			pop!(state, index);
			let value = state
				.account_state
				.storage(state.context.address, index, log)?;
			push!(state, value);
		}
		Opcode::SSTORE => {
			pop!(state, index, value);
			let address = state.context.address;
			state.account_state.storage_write(address, index, value, log)?;
		}
		Opcode::GAS => push!(state, after_gas.into()),

		Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => {
			let topic_len = (opcode.as_u8() - Opcode::LOG0.as_u8()) as usize;
			pop!(state, offset, len);
			let data = read_memory(state.machine.memory(), offset, len);
			let mut topics = Vec::with_capacity(topic_len);
			for _ in 0..topic_len {
				topics.push(u256_to_h256(state.machine.stack_mut().pop()?));
			}

			state.logs.push(Log {
				address: state.context.address,
				topics,
				data,
			});
		}

		Opcode::CREATE | Opcode::CREATE2 => return create(opcode, state, runtime, after_gas),
		Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL | Opcode::STATICCALL => {
			return call(opcode, state, runtime, stipend_gas, after_gas)
		}
		Opcode::SUICIDE => return suicide(state, runtime),

		_ => return Err(ExitError::InvalidCode(opcode).into()),
	}

	Ok(None)
}

fn forwardable(runtime: &Runtime, after_gas: Gas) -> Gas {
	if runtime.patch.call_create_l64_after_gas() {
		l64(after_gas)
	} else {
		after_gas
	}
}

/// Whether a new frame may not be entered: the call stack is full or the
/// transferred value exceeds the balance.
fn cannot_enter(state: &State, runtime: &Runtime, value: U256) -> Result<bool, EvalOnChainError> {
	if state.depth >= runtime.patch.callstack_limit() {
		trace!("call stack limit reached at depth {}", state.depth);
		return Ok(true);
	}

	let balance = state
		.account_state
		.balance(state.context.address, &runtime.log)?;
	Ok(balance < value)
}

fn create(
	opcode: Opcode,
	state: &mut State,
	runtime: &Runtime,
	after_gas: Gas,
) -> Result<Option<Control>, EvalOnChainError> {
	let log = &runtime.log;
	let gas_limit = forwardable(runtime, after_gas);

	pop!(state, value, offset, len);
	let salt = if opcode == Opcode::CREATE2 {
		Some(u256_to_h256(state.machine.stack_mut().pop()?))
	} else {
		None
	};

	state.ret = Rc::new(Vec::new());
	if cannot_enter(state, runtime, value)? {
		push!(state, U256::zero());
		return Ok(None);
	}

	let caller = state.context.address;
	let init_code = Rc::new(read_memory(state.machine.memory(), offset, len));
	let nonce = state.account_state.nonce(caller, log)?;
	let address = match salt {
		Some(salt) => create2_address(caller, salt, &init_code),
		None => create_address(caller, nonce),
	};
	state.account_state.set_nonce(caller, nonce + U256::one(), log)?;

	event!(Create {
		caller,
		address,
		value,
		init_code: &init_code,
		target_gas: gas_limit.into(),
	});

	let context = Context {
		address,
		code_address: address,
		caller,
		code: init_code,
		data: Rc::new(Vec::new()),
		gas_limit,
		gas_price: state.context.gas_price,
		origin: state.context.origin,
		value,
		apparent_value: value,
		is_static: state.context.is_static,
	};

	push!(state, address_to_u256(address));
	Ok(Some(Control::InvokeCreate(context)))
}

fn call(
	opcode: Opcode,
	state: &mut State,
	runtime: &Runtime,
	stipend_gas: Gas,
	after_gas: Gas,
) -> Result<Option<Control>, EvalOnChainError> {
	let log = &runtime.log;

	pop!(state, gas, to);
	let value = match opcode {
		Opcode::CALL | Opcode::CALLCODE => state.machine.stack_mut().pop()?,
		_ => U256::zero(),
	};
	pop!(state, in_offset, in_len, out_offset, out_len);

	let to: H160 = u256_to_address(to);
	let gas_limit = min(Gas::from(gas), forwardable(runtime, after_gas)) + stipend_gas;

	state.ret = Rc::new(Vec::new());
	if cannot_enter(state, runtime, value)? {
		push!(state, U256::zero());
		return Ok(None);
	}

	let input = Rc::new(read_memory(state.machine.memory(), in_offset, in_len));
	let code = state.account_state.code(to, log)?;
	let parent = &state.context;

	let context = match opcode {
		Opcode::CALL => Context {
			address: to,
			code_address: to,
			caller: parent.address,
			code,
			data: input,
			gas_limit,
			gas_price: parent.gas_price,
			origin: parent.origin,
			value,
			apparent_value: value,
			is_static: parent.is_static,
		},
		Opcode::CALLCODE => Context {
			address: parent.address,
			code_address: to,
			caller: parent.address,
			code,
			data: input,
			gas_limit,
			gas_price: parent.gas_price,
			origin: parent.origin,
			value,
			apparent_value: value,
			is_static: parent.is_static,
		},
		Opcode::DELEGATECALL => Context {
			address: parent.address,
			code_address: to,
			caller: parent.caller,
			code,
			data: input,
			gas_limit,
			gas_price: parent.gas_price,
			origin: parent.origin,
			value: U256::zero(),
			apparent_value: parent.apparent_value,
			is_static: parent.is_static,
		},
		_ => Context {
			address: to,
			code_address: to,
			caller: parent.address,
			code,
			data: input,
			gas_limit,
			gas_price: parent.gas_price,
			origin: parent.origin,
			value: U256::zero(),
			apparent_value: U256::zero(),
			is_static: true,
		},
	};

	event!(Call {
		code_address: to,
		input: &context.data,
		target_gas: gas_limit.into(),
		is_static: context.is_static,
		context: &context,
	});

	push!(state, U256::one());
	Ok(Some(Control::InvokeCall(context, (out_offset, out_len))))
}

fn suicide(state: &mut State, runtime: &Runtime) -> Result<Option<Control>, EvalOnChainError> {
	let log = &runtime.log;

	pop!(state, target);
	let target = u256_to_address(target);
	let address = state.context.address;
	let balance = state.account_state.balance(address, log)?;

	event!(Suicide {
		address,
		target,
		balance,
	});

	if !state.removed.contains(&address) {
		state.removed.push(address);
	}
	state.account_state.increase_balance(target, balance, log)?;
	let remaining = state.account_state.balance(address, log)?;
	state.account_state.decrease_balance(address, remaining, log)?;
	state.account_state.touch(target);

	Ok(Some(Control::Exit(ExitSucceed::Suicided.into())))
}
