#[macro_use]
mod macros;
mod arithmetic;
mod bitwise;
mod misc;

use crate::{ExitError, ExitReason, ExitSucceed, Machine, Opcode};
use core::ops::{BitAnd, BitOr, BitXor};
use primitive_types::U256;

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Control {
	Continue(usize),
	Exit(ExitReason),
	Jump(usize),
	Trap(Opcode),
}

type Handler = fn(&mut Machine, Opcode, usize) -> Control;

fn eval_external(_state: &mut Machine, opcode: Opcode, _position: usize) -> Control {
	Control::Trap(opcode)
}

fn eval_push(state: &mut Machine, opcode: Opcode, position: usize) -> Control {
	let n = opcode.as_usize() - Opcode::PUSH1.as_usize() + 1;
	self::misc::push(state, n, position)
}

fn eval_dup(state: &mut Machine, opcode: Opcode, _position: usize) -> Control {
	let n = opcode.as_usize() - Opcode::DUP1.as_usize() + 1;
	self::misc::dup(state, n)
}

fn eval_swap(state: &mut Machine, opcode: Opcode, _position: usize) -> Control {
	let n = opcode.as_usize() - Opcode::SWAP1.as_usize() + 1;
	self::misc::swap(state, n)
}

// Opcodes without an entry trap to the caller, which also owns the decision
// of whether an unknown opcode is invalid.
static TABLE: [Handler; 256] = {
	let mut table = [eval_external as Handler; 256];

	macro_rules! table_elem {
		($operation:ident, $state:ident, $definition:expr) => {
			table_elem!($operation, $state, _position, $definition)
		};
		($operation:ident, $state:ident, $position:ident, $definition:expr) => {
			#[allow(non_snake_case)]
			fn $operation($state: &mut Machine, _opcode: Opcode, $position: usize) -> Control {
				$definition
			}
			table[Opcode::$operation.as_usize()] = $operation as Handler;
		};
	}

	table_elem!(STOP, _state, Control::Exit(ExitSucceed::Stopped.into()));
	table_elem!(ADD, state, op2_u256_tuple!(state, overflowing_add));
	table_elem!(MUL, state, op2_u256_tuple!(state, overflowing_mul));
	table_elem!(SUB, state, op2_u256_tuple!(state, overflowing_sub));
	table_elem!(DIV, state, op2_u256_fn!(state, self::arithmetic::div));
	table_elem!(SDIV, state, op2_u256_fn!(state, self::arithmetic::sdiv));
	table_elem!(MOD, state, op2_u256_fn!(state, self::arithmetic::rem));
	table_elem!(SMOD, state, op2_u256_fn!(state, self::arithmetic::srem));
	table_elem!(ADDMOD, state, op3_u256_fn!(state, self::arithmetic::addmod));
	table_elem!(MULMOD, state, op3_u256_fn!(state, self::arithmetic::mulmod));
	table_elem!(EXP, state, op2_u256_fn!(state, self::arithmetic::exp));
	table_elem!(
		SIGNEXTEND,
		state,
		op2_u256_fn!(state, self::arithmetic::signextend)
	);
	table_elem!(LT, state, op2_u256_bool_ref!(state, lt));
	table_elem!(GT, state, op2_u256_bool_ref!(state, gt));
	table_elem!(SLT, state, op2_u256_fn!(state, self::bitwise::slt));
	table_elem!(SGT, state, op2_u256_fn!(state, self::bitwise::sgt));
	table_elem!(EQ, state, op2_u256_bool_ref!(state, eq));
	table_elem!(ISZERO, state, op1_u256_fn!(state, self::bitwise::iszero));
	table_elem!(AND, state, op2_u256!(state, bitand));
	table_elem!(OR, state, op2_u256!(state, bitor));
	table_elem!(XOR, state, op2_u256!(state, bitxor));
	table_elem!(NOT, state, op1_u256_fn!(state, self::bitwise::not));
	table_elem!(BYTE, state, op2_u256_fn!(state, self::bitwise::byte));
	table_elem!(SHL, state, op2_u256_fn!(state, self::bitwise::shl));
	table_elem!(SHR, state, op2_u256_fn!(state, self::bitwise::shr));
	table_elem!(SAR, state, op2_u256_fn!(state, self::bitwise::sar));
	table_elem!(CODESIZE, state, self::misc::codesize(state));
	table_elem!(CODECOPY, state, self::misc::codecopy(state));
	table_elem!(CALLDATALOAD, state, self::misc::calldataload(state));
	table_elem!(CALLDATASIZE, state, self::misc::calldatasize(state));
	table_elem!(CALLDATACOPY, state, self::misc::calldatacopy(state));
	table_elem!(POP, state, self::misc::pop(state));
	table_elem!(MLOAD, state, self::misc::mload(state));
	table_elem!(MSTORE, state, self::misc::mstore(state));
	table_elem!(MSTORE8, state, self::misc::mstore8(state));
	table_elem!(JUMP, state, self::misc::jump(state));
	table_elem!(JUMPI, state, self::misc::jumpi(state));
	table_elem!(PC, state, position, self::misc::pc(state, position));
	table_elem!(MSIZE, state, self::misc::msize(state));
	table_elem!(JUMPDEST, _state, Control::Continue(1));
	table_elem!(RETURN, state, self::misc::ret(state));
	table_elem!(REVERT, state, self::misc::revert(state));
	table_elem!(
		INVALID,
		_state,
		Control::Exit(ExitError::DesignatedInvalid.into())
	);

	let mut i = Opcode::PUSH1.as_usize();
	while i <= Opcode::PUSH32.as_usize() {
		table[i] = eval_push as Handler;
		i += 1;
	}
	let mut i = Opcode::DUP1.as_usize();
	while i <= Opcode::DUP16.as_usize() {
		table[i] = eval_dup as Handler;
		i += 1;
	}
	let mut i = Opcode::SWAP1.as_usize();
	while i <= Opcode::SWAP16.as_usize() {
		table[i] = eval_swap as Handler;
		i += 1;
	}

	table
};

#[inline]
pub fn eval(state: &mut Machine, opcode: Opcode, position: usize) -> Control {
	TABLE[opcode.as_usize()](state, opcode, position)
}
