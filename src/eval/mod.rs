//! Frame runtime. A `Machine` wraps the bytecode machine with gas
//! accounting, account state and the trapped opcodes.

use crate::commit::CommitLog;
use crate::errors::{EvalOnChainError, RequireError};
use crate::output::Log;
use crate::params::{Context, HeaderParams};
use crate::patch::Patch;
use crate::state::AccountState;
use crate::Gas;
use alloc::rc::Rc;
use alloc::vec::Vec;
use log::{debug, trace};
use primitive_types::{H160, U256};
use sputnikvm_core::{Capture, ExitError, ExitFatal, ExitReason, Opcode};

use self::check::check_opcode;
use self::cost::{gas_cost, gas_refund, gas_stipend, memory_cost, memory_gas};
use self::system::run_opcode;

mod check;
mod cost;
mod lifecycle;
mod system;
mod util;

/// Stack limit of every frame.
pub const STACK_LIMIT: usize = 1024;

/// A VM state without the status.
pub struct State {
	/// Bytecode machine, holding the stack, memory and program counter.
	pub machine: sputnikvm_core::Machine,
	/// Context.
	pub context: Context,

	/// Output of this frame, set once it exits.
	pub out: Rc<Vec<u8>>,
	/// Return data of the last finished sub-frame.
	pub ret: Rc<Vec<u8>>,

	/// The current memory cost in words. Note that this is different
	/// from memory gas.
	pub memory_cost: Gas,
	/// Used gas excluding memory gas.
	pub used_gas: Gas,
	/// Refunded gas. May go negative in the middle of a transaction under
	/// reduced SSTORE metering.
	pub refunded_gas: i64,

	/// The current account state.
	pub account_state: AccountState,
	/// Logs appended.
	pub logs: Vec<Log>,
	/// Removed accounts using the SUICIDE opcode.
	pub removed: Vec<H160>,

	/// Depth of this frame.
	pub depth: usize,
}

impl State {
	/// Memory gas, part of the total used gas.
	pub fn memory_gas(&self) -> Gas {
		memory_gas(self.memory_cost)
	}

	/// Available gas at this moment.
	pub fn available_gas(&self) -> Gas {
		self.context.gas_limit - self.memory_gas() - self.used_gas
	}
}

/// Information shared by every frame of one transaction.
pub struct Runtime {
	pub patch: Patch,
	pub block: HeaderParams,
	pub log: CommitLog,
}

impl Runtime {
	pub fn new(patch: Patch, block: HeaderParams) -> Self {
		Self {
			patch,
			block,
			log: CommitLog::default(),
		}
	}
}

/// Status of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineStatus {
	/// Running.
	Running,
	/// The frame exited successfully.
	ExitedOk,
	/// The frame exited with an error. Unless it reverted, the whole gas
	/// limit is consumed.
	ExitedErr(ExitError),
	/// The frame hit a condition the configuration cannot represent.
	ExitedNotSupported(ExitFatal),
	/// The frame wants a sub-call; the tuple is the output memory range.
	InvokeCall(Context, (U256, U256)),
	/// The frame wants a sub-create.
	InvokeCreate(Context),
}

/// Control returned by a trapped opcode.
pub enum Control {
	Exit(ExitReason),
	InvokeCall(Context, (U256, U256)),
	InvokeCreate(Context),
}

/// A frame.
pub struct Machine {
	state: State,
	status: MachineStatus,
}

impl Machine {
	/// Create a new frame.
	pub fn new(context: Context, depth: usize, account_state: AccountState, patch: &Patch) -> Self {
		let machine = sputnikvm_core::Machine::new(
			context.code.clone(),
			context.data.clone(),
			STACK_LIMIT,
			patch.memory_limit(),
		);

		Machine {
			state: State {
				machine,
				context,
				out: Rc::new(Vec::new()),
				ret: Rc::new(Vec::new()),
				memory_cost: Gas::zero(),
				used_gas: Gas::zero(),
				refunded_gas: 0,
				account_state,
				logs: Vec::new(),
				removed: Vec::new(),
				depth,
			},
			status: MachineStatus::Running,
		}
	}

	/// Derive a sub-frame. It starts from this frame's account state and
	/// removals, with no logs.
	pub fn derive(&self, context: Context, patch: &Patch) -> Self {
		let mut sub = Machine::new(
			context,
			self.state.depth + 1,
			self.state.account_state.clone(),
			patch,
		);
		sub.state.removed = self.state.removed.clone();
		sub
	}

	pub fn state(&self) -> &State {
		&self.state
	}

	pub fn status(&self) -> MachineStatus {
		self.status.clone()
	}

	/// Total used gas of this frame. A frame that failed without reverting
	/// consumes its whole gas limit.
	pub fn total_used_gas(&self) -> Gas {
		match self.status {
			MachineStatus::ExitedErr(ExitError::Reverted) => {
				self.state.memory_gas() + self.state.used_gas
			}
			MachineStatus::ExitedErr(_) => self.state.context.gas_limit,
			_ => self.state.memory_gas() + self.state.used_gas,
		}
	}

	/// Available gas of this frame.
	pub fn available_gas(&self) -> Gas {
		self.state.context.gas_limit - self.total_used_gas()
	}

	fn exit(&mut self, reason: ExitReason) {
		self.state.machine.exit(reason);
		self.status = match reason {
			ExitReason::Succeed(_) => MachineStatus::ExitedOk,
			ExitReason::Error(error) => MachineStatus::ExitedErr(error),
			ExitReason::Fatal(fatal) => MachineStatus::ExitedNotSupported(fatal),
		};
		trace!("frame at depth {} exited: {:?}", self.state.depth, reason);
	}

	/// Exit the frame with the given error.
	pub(crate) fn exit_err(&mut self, error: ExitError) {
		self.exit(ExitReason::Error(error));
	}

	fn step_precompiled(&mut self, runtime: &Runtime) -> bool {
		let precompiled = match runtime.patch.precompiled(&self.state.context.code_address) {
			Some(precompiled) => precompiled,
			None => return false,
		};

		let data = self.state.context.data.clone();
		match precompiled.gas_and_step(&data, self.state.context.gas_limit) {
			Ok((gas, out)) => {
				self.state.used_gas = gas;
				self.state.out = Rc::new(out);
				self.status = MachineStatus::ExitedOk;
			}
			Err(error) => {
				debug!(
					"precompiled contract {:?} failed: {:?}",
					self.state.context.code_address, error
				);
				self.exit_err(error);
			}
		}
		true
	}

	/// Step one instruction. A requirement leaves the frame unchanged, so
	/// the step can be retried once the host committed the datum.
	pub fn step(&mut self, runtime: &Runtime) -> Result<(), RequireError> {
		if self.status != MachineStatus::Running {
			return Ok(());
		}

		if self.step_precompiled(runtime) {
			return Ok(());
		}

		let opcode = match self.state.machine.inspect() {
			Some((opcode, _)) => opcode,
			None => {
				self.status = MachineStatus::ExitedOk;
				return Ok(());
			}
		};

		match check_opcode(opcode, &self.state, runtime) {
			Ok(()) => (),
			Err(EvalOnChainError::OnChain(error)) => {
				self.exit_err(error);
				return Ok(());
			}
			Err(EvalOnChainError::Require(require)) => return Err(require),
		}

		let state = &self.state;
		let new_memory_cost = memory_cost(opcode, state);
		let new_memory_gas = memory_gas(new_memory_cost);
		let gas_cost = gas_cost(opcode, state, runtime)?;
		let gas_stipend = gas_stipend(opcode, state);
		let gas_refund = gas_refund(opcode, state, runtime)?;

		let all_gas_cost = new_memory_gas + state.used_gas + gas_cost;
		if state.context.gas_limit < all_gas_cost {
			trace!("out of gas running {:?}", opcode);
			self.exit_err(ExitError::OutOfGas);
			return Ok(());
		}

		let memory_end = new_memory_cost * Gas::from(32u64);
		if memory_end > Gas::from(runtime.patch.memory_limit()) {
			self.exit(ExitFatal::NotSupported.into());
			return Ok(());
		}

		let after_gas = state.context.gas_limit - all_gas_cost;
		if runtime.patch.err_on_call_with_more_gas() {
			match opcode {
				Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL => {
					let requested = Gas::from(state.machine.stack().peek(0).unwrap_or_default());
					if requested > after_gas {
						self.exit_err(ExitError::OutOfGas);
						return Ok(());
					}
				}
				_ => (),
			}
		}

		if let Err(error) = self
			.state
			.machine
			.memory_mut()
			.resize_end(memory_end.as_u256())
		{
			self.exit_err(error);
			return Ok(());
		}

		let control = match self.state.machine.step() {
			Ok(()) => None,
			Err(Capture::Exit(reason)) => Some(Control::Exit(reason)),
			Err(Capture::Trap(opcode)) => {
				match run_opcode(opcode, &mut self.state, runtime, gas_stipend, after_gas) {
					Ok(control) => control,
					Err(EvalOnChainError::OnChain(error)) => Some(Control::Exit(error.into())),
					Err(EvalOnChainError::Require(require)) => return Err(require),
				}
			}
		};

		self.state.used_gas += gas_cost - gas_stipend;
		self.state.memory_cost = new_memory_cost;
		self.state.refunded_gas += gas_refund;

		match control {
			None => (),
			Some(Control::Exit(reason)) => {
				match reason {
					ExitReason::Succeed(_) | ExitReason::Error(ExitError::Reverted) => {
						self.state.out = Rc::new(self.state.machine.return_value());
					}
					_ => (),
				}
				self.exit(reason);
			}
			Some(Control::InvokeCall(context, range)) => {
				self.status = MachineStatus::InvokeCall(context, range);
			}
			Some(Control::InvokeCreate(context)) => {
				self.status = MachineStatus::InvokeCreate(context);
			}
		}

		Ok(())
	}
}
