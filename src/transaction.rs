//! Transaction engine: the host-facing side of the requirement protocol.

use crate::commit::AccountCommitment;
use crate::errors::{CommitError, CopyError, PreExecutionError, RequireError};
use crate::eval::{Machine, MachineStatus, Runtime};
use crate::output::{copy_into, copy_storage_into, AccountChange, Log};
use crate::params::{Context, HeaderParams, Transaction, TransactionAction};
use crate::patch::Patch;
use crate::state::AccountState;
use crate::vm::ContextVM;
use crate::Gas;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cmp::{max, min};
use log::debug;
use primitive_types::{H160, H256, U256};
use sputnikvm_core::{ExitError, ExitFatal};

/// Status of a transaction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VMStatus {
	/// Still running, or waiting for a requirement to be committed.
	Running,
	/// Exited successfully.
	ExitedOk,
	/// Exited with an error.
	ExitedErr(ExitError),
	/// Exited on a condition the patch cannot represent.
	ExitedNotSupported(ExitFatal),
	/// The transaction was rejected before execution.
	ExitedInvalid(PreExecutionError),
}

struct Execution {
	vm: ContextVM,
	transaction_gas_limit: Gas,
	intrinsic_gas: Gas,
	preclaimed_value: U256,
	beneficiary: H160,
	/// Top-level create whose code has not been deposited yet.
	code_deposit: bool,
	/// Account state right after the caller nonce increment.
	fresh_account_state: AccountState,
	finalized: bool,
}

enum Phase {
	Constructing(Transaction),
	Running(Box<Execution>),
	Invalid(PreExecutionError),
}

/// A VM that executes one transaction, asking the host for every piece
/// of state it needs.
pub struct TransactionVM {
	runtime: Runtime,
	phase: Phase,
	pending: Option<RequireError>,
	logs: Vec<Log>,
	changes: Vec<AccountChange>,
}

impl TransactionVM {
	/// Create a new engine. Nothing runs until the first `fire`.
	pub fn new(patch: Patch, transaction: Transaction, block: HeaderParams) -> Self {
		Self {
			runtime: Runtime::new(patch, block),
			phase: Phase::Constructing(transaction),
			pending: None,
			logs: Vec::new(),
			changes: Vec::new(),
		}
	}

	/// Patch this engine runs under.
	pub fn patch(&self) -> &Patch {
		&self.runtime.patch
	}

	/// Block header of the execution.
	pub fn block(&self) -> &HeaderParams {
		&self.runtime.block
	}

	/// The outstanding requirement, if any.
	pub fn pending(&self) -> Option<RequireError> {
		self.pending
	}

	/// Run until the engine exits or needs a piece of state. Calling it
	/// again without committing returns the same requirement.
	pub fn fire(&mut self) -> Result<(), RequireError> {
		while self.status() == VMStatus::Running {
			self.step()?;
		}
		Ok(())
	}

	/// Run one internal step.
	pub fn step(&mut self) -> Result<(), RequireError> {
		if let Some(require) = self.pending {
			return Err(require);
		}

		match self.step_inner() {
			Ok(()) => Ok(()),
			Err(require) => {
				debug!("requirement raised: {:?}", require);
				event!(Require(require));
				self.pending = Some(require);
				Err(require)
			}
		}
	}

	fn step_inner(&mut self) -> Result<(), RequireError> {
		let runtime = &self.runtime;

		let execution = match &mut self.phase {
			Phase::Invalid(_) => return Ok(()),
			Phase::Constructing(transaction) => {
				let phase = construct(runtime, transaction)?;
				self.phase = phase;
				return Ok(());
			}
			Phase::Running(execution) => execution,
		};

		if execution.finalized {
			return Ok(());
		}
		if !execution.vm.is_exited() {
			return execution.vm.step(runtime);
		}

		if execution.code_deposit {
			execution.vm.root_mut().code_deposit(runtime)?;
			execution.code_deposit = false;
		}

		let real_used_gas = real_used_gas(execution);
		let root = execution.vm.root_mut();
		root.finalize_transaction(
			runtime,
			real_used_gas,
			execution.preclaimed_value,
			&execution.fresh_account_state,
			execution.beneficiary,
		)?;

		debug!(
			"transaction finalized with {:?}, used gas {}",
			root.status(),
			real_used_gas
		);
		self.logs = root.state().logs.clone();
		self.changes = root.state().account_state.changes(&runtime.log);
		execution.finalized = true;

		Ok(())
	}

	/// Commit an account, its code or one of its storage slots.
	pub fn commit_account(&mut self, commitment: AccountCommitment) -> Result<(), CommitError> {
		if self.runtime.log.accounts.contains_key(&commitment) {
			debug!("rejected repeated commitment for {:?}", commitment.address());
			return Err(CommitError::AlreadyCommitted);
		}
		match self.pending {
			Some(ref require) if commitment.satisfies(require) => (),
			_ => {
				debug!("rejected commitment {:?}, pending {:?}", commitment, self.pending);
				return Err(CommitError::InvalidCommitment);
			}
		}

		self.runtime.log.commit_account(commitment.clone())?;
		debug!("accepted commitment for {:?}", commitment.address());
		event!(Commit(&commitment));
		self.pending = None;
		Ok(())
	}

	/// Commit only the code of an account.
	pub fn commit_account_code(&mut self, address: H160, code: Vec<u8>) -> Result<(), CommitError> {
		self.commit_account(AccountCommitment::Code {
			address,
			code: Rc::new(code),
		})
	}

	/// Commit one storage slot of an already committed account.
	pub fn commit_account_storage(&mut self, address: H160, index: U256, value: U256) -> Result<(), CommitError> {
		self.commit_account(AccountCommitment::Storage {
			address,
			index,
			value,
		})
	}

	/// Commit that an account does not exist.
	pub fn commit_nonexist(&mut self, address: H160) -> Result<(), CommitError> {
		self.commit_account(AccountCommitment::Nonexist(address))
	}

	/// Commit a block hash.
	pub fn commit_blockhash(&mut self, number: U256, hash: H256) -> Result<(), CommitError> {
		if self.runtime.log.blockhashes.contains(number) {
			debug!("rejected repeated block hash for {}", number);
			return Err(CommitError::AlreadyCommitted);
		}
		if self.pending != Some(RequireError::Blockhash(number)) {
			debug!("rejected block hash for {}, pending {:?}", number, self.pending);
			return Err(CommitError::InvalidCommitment);
		}

		self.runtime.log.commit_blockhash(number, hash)?;
		debug!("accepted block hash for {}", number);
		event!(CommitBlockhash { number, hash });
		self.pending = None;
		Ok(())
	}

	/// Status of the engine. It only leaves `Running` once finalization
	/// is done.
	pub fn status(&self) -> VMStatus {
		match &self.phase {
			Phase::Constructing(_) => VMStatus::Running,
			Phase::Invalid(error) => VMStatus::ExitedInvalid(*error),
			Phase::Running(execution) if !execution.finalized => VMStatus::Running,
			Phase::Running(execution) => match execution.vm.root().status() {
				MachineStatus::ExitedOk => VMStatus::ExitedOk,
				MachineStatus::ExitedErr(error) => VMStatus::ExitedErr(error),
				MachineStatus::ExitedNotSupported(fatal) => VMStatus::ExitedNotSupported(fatal),
				_ => VMStatus::Running,
			},
		}
	}

	fn is_exited(&self) -> bool {
		self.status() != VMStatus::Running
	}

	/// Whether the engine exited with anything but success.
	pub fn status_failed(&self) -> bool {
		!matches!(self.status(), VMStatus::Running | VMStatus::ExitedOk)
	}

	/// Gas consumed so far before refunds, intrinsic gas included.
	pub fn consumed_gas(&self) -> Gas {
		match &self.phase {
			Phase::Running(execution) => execution.intrinsic_gas + execution.vm.used_gas(),
			_ => Gas::zero(),
		}
	}

	/// Gas used by the transaction after refunds. Zero until the engine
	/// exits.
	pub fn used_gas(&self) -> Gas {
		match &self.phase {
			Phase::Running(execution) if execution.finalized => real_used_gas(execution),
			_ => Gas::zero(),
		}
	}

	/// Gas refunded to the caller, as counted by the root frame.
	pub fn refunded_gas(&self) -> Gas {
		match &self.phase {
			Phase::Running(execution) if execution.finalized => refund(execution),
			_ => Gas::zero(),
		}
	}

	/// Return data of the top-level frame.
	pub fn out(&self) -> &[u8] {
		match &self.phase {
			Phase::Running(execution) if execution.finalized => &execution.vm.root().state().out[..],
			_ => &[],
		}
	}

	/// Logs, in emission order. Empty until the engine exits.
	pub fn logs(&self) -> &[Log] {
		&self.logs
	}

	pub fn logs_len(&self) -> usize {
		self.logs.len()
	}

	pub fn log(&self, index: usize) -> Option<&Log> {
		self.logs.get(index)
	}

	fn exited_log(&self, index: usize) -> Result<&Log, CopyError> {
		if !self.is_exited() {
			return Err(CopyError::NotExited);
		}
		self.logs.get(index).ok_or(CopyError::NotFound)
	}

	pub fn log_topics_len(&self, index: usize) -> Result<usize, CopyError> {
		Ok(self.exited_log(index)?.topics.len())
	}

	pub fn log_topic(&self, index: usize, topic_index: usize) -> Result<H256, CopyError> {
		self.exited_log(index)?
			.topics
			.get(topic_index)
			.copied()
			.ok_or(CopyError::NotFound)
	}

	pub fn log_data_len(&self, index: usize) -> Result<usize, CopyError> {
		Ok(self.exited_log(index)?.data.len())
	}

	/// Copy the data of a log into `buffer`, which must hold all of it.
	pub fn copy_log_data(&self, index: usize, buffer: &mut [u8]) -> Result<usize, CopyError> {
		copy_into(&self.exited_log(index)?.data, buffer)
	}

	/// Account changes, in ascending address order. Empty until the
	/// engine exits.
	pub fn account_changes(&self) -> &[AccountChange] {
		&self.changes
	}

	pub fn account_changes_len(&self) -> usize {
		self.changes.len()
	}

	pub fn account_change(&self, index: usize) -> Option<&AccountChange> {
		self.changes.get(index)
	}

	fn exited_change(&self, address: H160) -> Result<&AccountChange, CopyError> {
		if !self.is_exited() {
			return Err(CopyError::NotExited);
		}
		self.changes
			.iter()
			.find(|change| change.address() == address)
			.ok_or(CopyError::NotFound)
	}

	/// Number of storage entries of the change at `address`; zero for
	/// balance-only changes and removals.
	pub fn account_change_storage_len(&self, address: H160) -> Result<usize, CopyError> {
		Ok(self
			.exited_change(address)?
			.storage()
			.map_or(0, |storage| storage.len()))
	}

	/// Copy the storage entries of the change at `address`, in no
	/// particular order.
	pub fn copy_account_change_storage(
		&self,
		address: H160,
		buffer: &mut [(U256, U256)],
	) -> Result<usize, CopyError> {
		match self.exited_change(address)?.storage() {
			Some(storage) => copy_storage_into(storage, buffer),
			None => Ok(0),
		}
	}

	pub fn account_change_code_len(&self, address: H160) -> Result<usize, CopyError> {
		Ok(self
			.exited_change(address)?
			.code()
			.map_or(0, |code| code.len()))
	}

	pub fn copy_account_change_code(&self, address: H160, buffer: &mut [u8]) -> Result<usize, CopyError> {
		match self.exited_change(address)?.code() {
			Some(code) => copy_into(code, buffer),
			None => Ok(0),
		}
	}
}

fn refund(execution: &Execution) -> Gas {
	Gas::from(max(execution.vm.root().state().refunded_gas, 0) as u64)
}

/// Gas charged to the caller: refunds apply only on success, a failure
/// other than revert consumes the whole gas limit.
fn real_used_gas(execution: &Execution) -> Gas {
	let consumed = execution.intrinsic_gas + execution.vm.used_gas();
	match execution.vm.root().status() {
		MachineStatus::ExitedOk => consumed - min(consumed / Gas::from(2u64), refund(execution)),
		MachineStatus::ExitedNotSupported(_) => execution.transaction_gas_limit,
		_ => consumed,
	}
}

/// Validate the transaction against the caller account and set up the
/// root frame. Any requirement leaves the engine in `Constructing`.
fn construct(runtime: &Runtime, transaction: &Transaction) -> Result<Phase, RequireError> {
	let patch = &runtime.patch;
	let log = &runtime.log;
	let caller = transaction.caller;

	let mut account_state = AccountState::new(*patch.account_patch());
	account_state.require(caller, log)?;

	let nonce = account_state.nonce(caller, log)?;
	if nonce != transaction.nonce {
		debug!("invalid nonce {}, expected {}", transaction.nonce, nonce);
		return Ok(Phase::Invalid(PreExecutionError::InvalidNonce));
	}

	let balance = account_state.balance(caller, log)?;
	let preclaimed_value = transaction.preclaimed_value();
	match preclaimed_value.checked_add(transaction.value) {
		Some(total) if total <= balance => (),
		_ => {
			debug!("insufficient balance {} of {:?}", balance, caller);
			return Ok(Phase::Invalid(PreExecutionError::InsufficientBalance));
		}
	}

	let intrinsic_gas = transaction.intrinsic_gas(patch);
	if transaction.gas_limit < intrinsic_gas {
		debug!("gas limit {} below intrinsic gas {}", transaction.gas_limit, intrinsic_gas);
		return Ok(Phase::Invalid(PreExecutionError::InsufficientGasLimit));
	}

	let address = transaction.address();
	account_state.require(address, log)?;
	let (code, data) = match transaction.action {
		TransactionAction::Call(address) => (account_state.code(address, log)?, transaction.input.clone()),
		TransactionAction::Create => (transaction.input.clone(), Rc::new(Vec::new())),
	};

	account_state.set_nonce(caller, nonce + U256::one(), log)?;
	let fresh_account_state = account_state.clone();
	account_state.decrease_balance(caller, preclaimed_value, log)?;

	let context = Context {
		address,
		code_address: address,
		caller,
		code,
		data,
		gas_limit: transaction.gas_limit - intrinsic_gas,
		gas_price: transaction.gas_price,
		origin: caller,
		value: transaction.value,
		apparent_value: transaction.value,
		is_static: false,
	};

	let mut machine = Machine::new(context, 0, account_state, patch);
	let code_deposit = match transaction.action {
		TransactionAction::Call(_) => {
			machine.initialize_call(runtime)?;
			false
		}
		TransactionAction::Create => {
			machine.initialize_create(runtime)?;
			true
		}
	};

	Ok(Phase::Running(Box::new(Execution {
		vm: ContextVM::new(machine),
		transaction_gas_limit: transaction.gas_limit,
		intrinsic_gas,
		preclaimed_value,
		beneficiary: runtime.block.beneficiary,
		code_deposit,
		fresh_account_state,
		finalized: false,
	})))
}
