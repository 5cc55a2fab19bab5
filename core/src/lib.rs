//! Bytecode machine of SputnikVM.
//!
//! The machine evaluates every opcode that only needs the operand stack,
//! memory, code and call data. Everything else (state access, calls,
//! environment queries, gas) traps back to the caller, which decides how
//! to continue.

#![deny(unused_import_braces)]
#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod error;
mod eval;
mod memory;
mod opcode;
mod stack;
mod utils;
mod valids;

pub use crate::error::{Capture, ExitError, ExitFatal, ExitReason, ExitSucceed, Trap};
pub use crate::memory::Memory;
pub use crate::opcode::Opcode;
pub use crate::stack::Stack;
pub use crate::utils::USIZE_MAX;
pub use crate::valids::Valids;

use crate::eval::{eval, Control};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::ops::Range;
use primitive_types::U256;

/// Core execution layer for EVM.
pub struct Machine {
	/// Program data.
	data: Rc<Vec<u8>>,
	/// Program code.
	code: Rc<Vec<u8>>,
	/// Program counter.
	position: Result<usize, ExitReason>,
	/// Return value.
	return_range: Range<U256>,
	/// Code validity maps.
	valids: Valids,
	/// Memory.
	memory: Memory,
	/// Stack.
	stack: Stack,
}

impl Machine {
	/// Reference of machine stack.
	pub fn stack(&self) -> &Stack {
		&self.stack
	}
	/// Mutable reference of machine stack.
	pub fn stack_mut(&mut self) -> &mut Stack {
		&mut self.stack
	}
	/// Reference of machine memory.
	pub fn memory(&self) -> &Memory {
		&self.memory
	}
	/// Mutable reference of machine memory.
	pub fn memory_mut(&mut self) -> &mut Memory {
		&mut self.memory
	}
	/// Program code.
	pub fn code(&self) -> &Rc<Vec<u8>> {
		&self.code
	}
	/// Call data.
	pub fn data(&self) -> &Rc<Vec<u8>> {
		&self.data
	}
	/// Current program counter, or the exit reason once the machine stopped.
	pub fn position(&self) -> &Result<usize, ExitReason> {
		&self.position
	}

	/// Create a new machine with given code and data.
	pub fn new(
		code: Rc<Vec<u8>>,
		data: Rc<Vec<u8>>,
		stack_limit: usize,
		memory_limit: usize,
	) -> Self {
		let valids = Valids::new(&code[..]);

		Self {
			data,
			code,
			position: Ok(0),
			return_range: U256::zero()..U256::zero(),
			valids,
			memory: Memory::new(memory_limit),
			stack: Stack::new(stack_limit),
		}
	}

	/// Explicit exit of the machine. Further step will return error.
	pub fn exit(&mut self, reason: ExitReason) {
		self.position = Err(reason);
	}

	/// Inspect the machine's next opcode and current stack.
	pub fn inspect(&self) -> Option<(Opcode, &Stack)> {
		let position = match self.position {
			Ok(position) => position,
			Err(_) => return None,
		};
		self.code.get(position).map(|v| (Opcode(*v), &self.stack))
	}

	/// Copy and get the return value of the machine, if any.
	pub fn return_value(&self) -> Vec<u8> {
		if self.return_range.start >= self.return_range.end {
			return Vec::new();
		}

		// RETURN and REVERT reject ranges ending past `usize::MAX`.
		let start = self.return_range.start.as_usize();
		let end = self.return_range.end.as_usize();
		self.memory.get(start, end - start)
	}

	/// Loop stepping the machine, until it stops.
	pub fn run(&mut self) -> Capture<ExitReason, Trap> {
		loop {
			match self.step() {
				Ok(()) => (),
				Err(res) => return res,
			}
		}
	}

	/// Step the machine, executing one opcode. It then returns.
	pub fn step(&mut self) -> Result<(), Capture<ExitReason, Trap>> {
		let position = match self.position {
			Ok(position) => position,
			Err(reason) => return Err(Capture::Exit(reason)),
		};

		let opcode = match self.code.get(position) {
			Some(v) => Opcode(*v),
			None => {
				self.position = Err(ExitSucceed::Stopped.into());
				return Err(Capture::Exit(ExitSucceed::Stopped.into()));
			}
		};

		match eval(self, opcode, position) {
			Control::Continue(p) => {
				self.position = Ok(position + p);
				Ok(())
			}
			Control::Exit(e) => {
				self.position = Err(e);
				Err(Capture::Exit(e))
			}
			Control::Jump(p) => {
				if self.valids.is_valid(p) {
					self.position = Ok(p);
					Ok(())
				} else {
					self.position = Err(ExitError::InvalidJump.into());
					Err(Capture::Exit(ExitError::InvalidJump.into()))
				}
			}
			Control::Trap(opcode) => {
				self.position = Ok(position + 1);
				Err(Capture::Trap(opcode))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn machine(code: &str, data: &[u8]) -> Machine {
		Machine::new(
			Rc::new(hex::decode(code).unwrap()),
			Rc::new(data.to_vec()),
			1024,
			usize::MAX,
		)
	}

	#[test]
	fn returns_sum_from_memory() {
		// PUSH1 2, PUSH1 3, ADD, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
		let mut vm = machine("600260030160005260206000f3", &[]);
		assert_eq!(vm.run(), Capture::Exit(ExitSucceed::Returned.into()));

		let mut expected = [0u8; 32];
		expected[31] = 5;
		assert_eq!(vm.return_value(), expected.to_vec());
	}

	#[test]
	fn traps_on_external_opcode() {
		// PUSH1 0, SLOAD
		let mut vm = machine("600054", &[]);
		assert_eq!(vm.run(), Capture::Trap(Opcode::SLOAD));
		assert_eq!(vm.position(), &Ok(3));
		assert_eq!(vm.stack().len(), 1);
	}

	#[test]
	fn rejects_jump_into_push_data() {
		// PUSH1 3, JUMP, PUSH1 0x5b
		let mut vm = machine("600356605b", &[]);
		assert_eq!(vm.run(), Capture::Exit(ExitError::InvalidJump.into()));
	}

	#[test]
	fn loads_call_data_with_zero_padding() {
		// PUSH1 1, CALLDATALOAD, STOP
		let mut vm = machine("60013500", &[0xaa, 0xbb, 0xcc]);
		assert_eq!(vm.run(), Capture::Exit(ExitSucceed::Stopped.into()));

		let mut expected = [0u8; 32];
		expected[0] = 0xbb;
		expected[1] = 0xcc;
		assert_eq!(
			vm.stack().peek(0),
			Ok(U256::from_big_endian(&expected[..]))
		);
	}

	#[test]
	fn designated_invalid_exits_with_error() {
		let mut vm = machine("fe", &[]);
		assert_eq!(
			vm.run(),
			Capture::Exit(ExitError::DesignatedInvalid.into())
		);
	}

	#[test]
	fn running_off_the_end_stops() {
		let mut vm = machine("6001", &[]);
		assert_eq!(vm.run(), Capture::Exit(ExitSucceed::Stopped.into()));
		assert_eq!(vm.stack().peek(0), Ok(U256::one()));
	}
}
