//! Frame lifecycle related functionality.

use super::cost::code_deposit_gas;
use super::{Machine, MachineStatus, Runtime};
use crate::errors::RequireError;
use crate::state::AccountState;
use crate::Gas;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cmp::min;
use core::mem;
use log::{debug, trace};
use primitive_types::{H160, U256};
use sputnikvm_core::ExitError;

/// # Lifecycle of a Machine
///
/// A top-level frame is set up with `initialize_call` or
/// `initialize_create`, and can then be stepped as normal. When it meets
/// a CALL family or CREATE instruction, a sub-frame is derived and
/// initialized the same way. Once the sub-frame exits, the parent takes
/// it back through `apply_sub`. When the top-level frame exits, a
/// contract creation first runs `code_deposit`, and every transaction
/// ends with `finalize_transaction`.
///
/// All of these return a requirement before mutating anything, so they
/// can be called again once the host committed the missing datum.
impl Machine {
	/// Transfer the value of a message call and touch the target.
	pub fn initialize_call(&mut self, runtime: &Runtime) -> Result<(), RequireError> {
		let log = &runtime.log;
		let context = &self.state.context;
		let (caller, address, value) = (context.caller, context.address, context.value);
		let account_state = &mut self.state.account_state;

		account_state.require(caller, log)?;
		account_state.require(address, log)?;

		account_state.decrease_balance(caller, value, log)?;
		account_state.increase_balance(address, value, log)?;
		account_state.touch(address);

		Ok(())
	}

	/// Transfer the endowment of a contract creation and reset the new
	/// account. Creating over an account in use exits with
	/// `CreateCollision`.
	pub fn initialize_create(&mut self, runtime: &Runtime) -> Result<(), RequireError> {
		let log = &runtime.log;
		let context = &self.state.context;
		let (caller, address, value) = (context.caller, context.address, context.value);
		let account_state = &mut self.state.account_state;

		account_state.require(caller, log)?;
		account_state.require(address, log)?;

		let initial_nonce = account_state.patch().initial_nonce;
		if !account_state.code(address, log)?.is_empty()
			|| account_state.nonce(address, log)? != initial_nonce
		{
			debug!("create collision at {:?}", address);
			self.exit_err(ExitError::CreateCollision);
			return Ok(());
		}

		account_state.decrease_balance(caller, value, log)?;
		account_state.increase_balance(address, value, log)?;
		account_state.create(address, log)?;
		account_state.touch(address);

		Ok(())
	}

	/// Deposit the output of a successful create frame as the code of
	/// the new account.
	///
	/// Output over the deposit limit always fails a nested CREATE. For a
	/// create transaction it fails only with `force_code_deposit`; without
	/// it the transaction succeeds and the new account keeps empty code.
	pub fn code_deposit(&mut self, runtime: &Runtime) -> Result<(), RequireError> {
		if self.status != MachineStatus::ExitedOk {
			return Ok(());
		}

		let patch = &runtime.patch;
		let address = self.state.context.address;
		let out = self.state.out.clone();

		if let Some(limit) = patch.code_deposit_limit() {
			if out.len() > limit {
				trace!("code of {} bytes over deposit limit {}", out.len(), limit);
				if patch.force_code_deposit() || self.state.depth > 0 {
					self.exit_err(ExitError::CreateContractLimit);
				}
				return Ok(());
			}
		}

		let deposit_cost = code_deposit_gas(out.len());
		if deposit_cost > self.state.available_gas() {
			if patch.force_code_deposit() {
				self.state
					.account_state
					.code_deposit(address, Rc::new(Vec::new()), &runtime.log)?;
			} else {
				self.exit_err(ExitError::OutOfGas);
			}
			return Ok(());
		}

		self.state
			.account_state
			.code_deposit(address, out, &runtime.log)?;
		self.state.used_gas += deposit_cost;

		Ok(())
	}

	/// Apply a finished sub-frame, derived from this one through
	/// `derive`, back into this frame.
	pub fn apply_sub(&mut self, sub: &mut Machine, runtime: &Runtime) -> Result<(), RequireError> {
		let out_range = match &self.status {
			MachineStatus::InvokeCreate(_) => {
				sub.code_deposit(runtime)?;
				None
			}
			MachineStatus::InvokeCall(_, range) => Some(*range),
			_ => return Ok(()),
		};
		self.status = MachineStatus::Running;

		self.state.used_gas += sub.total_used_gas();

		match sub.status() {
			MachineStatus::ExitedOk => {
				let sub_state = &mut sub.state;
				mem::swap(&mut self.state.account_state, &mut sub_state.account_state);
				self.state.logs.append(&mut sub_state.logs);
				self.state.removed = mem::take(&mut sub_state.removed);
				self.state.refunded_gas += sub_state.refunded_gas;
				self.state.ret = match out_range {
					Some(_) => sub_state.out.clone(),
					None => Rc::new(Vec::new()),
				};
			}
			MachineStatus::ExitedErr(ExitError::Reverted) => {
				self.fail_top();
				self.state.ret = sub.state.out.clone();
			}
			MachineStatus::ExitedErr(_) => {
				self.fail_top();
				self.state.ret = Rc::new(Vec::new());
			}
			MachineStatus::ExitedNotSupported(fatal) => {
				self.exit(fatal.into());
				return Ok(());
			}
			_ => return Ok(()),
		}

		if let Some((out_offset, out_len)) = out_range {
			match sub.status() {
				MachineStatus::ExitedOk | MachineStatus::ExitedErr(ExitError::Reverted) => {
					let out = sub.state.out.clone();
					let len = min(out_len, U256::from(out.len()));
					if let Err(fatal) = self
						.state
						.machine
						.memory_mut()
						.copy_large(out_offset, U256::zero(), len, &out)
					{
						self.exit(fatal.into());
					}
				}
				_ => (),
			}
		}

		Ok(())
	}

	/// Replace the optimistic result of a CALL or CREATE with zero.
	fn fail_top(&mut self) {
		if let Err(error) = self.state.machine.stack_mut().set(0, U256::zero()) {
			self.exit_err(error);
		}
	}

	/// Finalize a transaction: refund the unused gas to the caller, pay
	/// the beneficiary, and remove self-destructed and (EIP-161) touched
	/// empty accounts. A failed transaction starts over from
	/// `fresh_account_state`, the state right after the nonce increment.
	///
	/// Should only be used on the top-level frame.
	pub fn finalize_transaction(
		&mut self,
		runtime: &Runtime,
		real_used_gas: Gas,
		preclaimed_value: U256,
		fresh_account_state: &AccountState,
		beneficiary: H160,
	) -> Result<(), RequireError> {
		let log = &runtime.log;
		let caller = self.state.context.caller;
		let succeeded = self.status == MachineStatus::ExitedOk;

		let mut account_state = if succeeded {
			self.state.account_state.clone()
		} else {
			let mut account_state = fresh_account_state.clone();
			account_state.decrease_balance(caller, preclaimed_value, log)?;
			account_state
		};

		let gas_dec = real_used_gas
			.as_u256()
			.saturating_mul(self.state.context.gas_price.as_u256());
		account_state.increase_balance(caller, preclaimed_value, log)?;
		account_state.decrease_balance(caller, gas_dec, log)?;

		if !account_state.patch().allow_partial_change {
			account_state.require(beneficiary, log)?;
		}
		account_state.increase_balance(beneficiary, gas_dec, log)?;

		if succeeded {
			for address in &self.state.removed {
				account_state.remove(*address);
			}
		}

		if !account_state.patch().empty_considered_exists {
			let touched: Vec<H160> = account_state.touched().cloned().collect();
			for address in touched {
				if account_state.exists(address, log)? && account_state.is_empty(address, log)? {
					trace!("removing touched empty account {:?}", address);
					account_state.remove(address);
				}
			}
		}

		self.state.account_state = account_state;
		if !succeeded {
			self.state.removed.clear();
			self.state.logs.clear();
		}

		Ok(())
	}
}
