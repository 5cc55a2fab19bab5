//! Call stack of one execution.

use crate::errors::RequireError;
use crate::eval::{Machine, MachineStatus, Runtime};
use crate::Gas;
use alloc::vec::Vec;
use log::debug;
#[cfg(feature = "tracing")]
use sputnikvm_core::{ExitReason, ExitSucceed};

/// A VM that executes a context and every frame it invokes. The last
/// machine is the one currently running; the first one is the root.
pub struct ContextVM {
	machines: Vec<Machine>,
}

impl ContextVM {
	/// Create a VM from an initialized root frame.
	pub fn new(machine: Machine) -> Self {
		let mut machines = Vec::with_capacity(4);
		machines.push(machine);
		Self { machines }
	}

	/// The root frame.
	pub fn root(&self) -> &Machine {
		&self.machines[0]
	}

	pub(crate) fn root_mut(&mut self) -> &mut Machine {
		&mut self.machines[0]
	}

	/// The frame currently executing.
	pub fn current(&self) -> &Machine {
		&self.machines[self.machines.len() - 1]
	}

	/// Every frame, root first.
	pub fn machines(&self) -> &[Machine] {
		&self.machines
	}

	/// Whether the root frame has exited and every sub-frame has been
	/// applied.
	pub fn is_exited(&self) -> bool {
		self.machines.len() == 1
			&& matches!(
				self.root().status(),
				MachineStatus::ExitedOk
					| MachineStatus::ExitedErr(_)
					| MachineStatus::ExitedNotSupported(_)
			)
	}

	/// Status of the whole execution. Pending invocations count as running.
	pub fn status(&self) -> MachineStatus {
		if self.is_exited() {
			self.root().status()
		} else {
			MachineStatus::Running
		}
	}

	/// Gas used so far, before refunds, across every frame.
	pub fn used_gas(&self) -> Gas {
		self.machines
			.iter()
			.fold(Gas::zero(), |acc, machine| acc + machine.total_used_gas())
	}

	/// Step one instruction of the current frame, enter an invoked
	/// frame, or apply a finished one to its parent.
	pub fn step(&mut self, runtime: &Runtime) -> Result<(), RequireError> {
		let depth = self.machines.len() - 1;
		let current = &mut self.machines[depth];

		match current.status() {
			MachineStatus::Running => current.step(runtime),
			MachineStatus::InvokeCall(context, _) => {
				debug!(
					"call into {:?} at depth {}, gas limit {}",
					context.code_address,
					depth + 1,
					context.gas_limit
				);
				let mut sub = current.derive(context, &runtime.patch);
				sub.initialize_call(runtime)?;
				self.machines.push(sub);
				Ok(())
			}
			MachineStatus::InvokeCreate(context) => {
				debug!(
					"create {:?} at depth {}, gas limit {}",
					context.address,
					depth + 1,
					context.gas_limit
				);
				let mut sub = current.derive(context, &runtime.patch);
				sub.initialize_create(runtime)?;
				self.machines.push(sub);
				Ok(())
			}
			status => {
				if depth == 0 {
					return Ok(());
				}

				let mut sub = match self.machines.pop() {
					Some(sub) => sub,
					None => return Ok(()),
				};
				let parent = &mut self.machines[depth - 1];
				if let Err(require) = parent.apply_sub(&mut sub, runtime) {
					self.machines.push(sub);
					return Err(require);
				}

				debug!("frame at depth {} exited: {:?}", depth, status);
				event!(Exit {
					depth,
					reason: &exit_reason(&sub),
				});
				Ok(())
			}
		}
	}

	/// Step until the root frame exits or a requirement is raised.
	pub fn fire(&mut self, runtime: &Runtime) -> Result<(), RequireError> {
		while !self.is_exited() {
			self.step(runtime)?;
		}
		Ok(())
	}
}

#[cfg(feature = "tracing")]
fn exit_reason(machine: &Machine) -> ExitReason {
	match machine.status() {
		MachineStatus::ExitedErr(error) => ExitReason::Error(error),
		MachineStatus::ExitedNotSupported(fatal) => ExitReason::Fatal(fatal),
		_ => match machine.state().machine.position() {
			Err(reason) => *reason,
			Ok(_) if machine.state().machine.code().is_empty() => {
				ExitReason::Succeed(ExitSucceed::Returned)
			}
			Ok(_) => ExitReason::Succeed(ExitSucceed::Stopped),
		},
	}
}
