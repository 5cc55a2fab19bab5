//! SputnikVM, a resumable Ethereum Virtual Machine.
//!
//! The VM never owns state. Whenever it needs an account, a piece of code,
//! a storage slot or a block hash it has not been given, `fire` returns a
//! [`RequireError`] describing exactly that datum. The host commits it and
//! fires again. Once the VM exits, the host reads used gas, logs and the
//! account changes to apply.

#![deny(unused_import_braces)]
#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "tracing")]
pub mod tracing;

#[cfg(feature = "tracing")]
macro_rules! event {
	($x:expr) => {{
		use crate::tracing::Event::*;
		$x.emit();
	}};
}

#[cfg(not(feature = "tracing"))]
macro_rules! event {
	($x:expr) => {};
}

mod commit;
mod errors;
mod eval;
mod gas;
mod output;
mod params;
mod patch;
pub mod precompiled;
mod state;
mod transaction;
mod vm;

pub use crate::commit::{AccountCommitment, AccountLog, BlockhashLog, CommitLog, CommittedAccount};
pub use crate::errors::{
	CommitError, CopyError, EvalOnChainError, PatchError, PreExecutionError, RequireError,
};
pub use crate::eval::{Machine, MachineStatus, Runtime, State};
pub use crate::gas::Gas;
pub use crate::output::{AccountChange, Log, Storage};
pub use crate::params::{
	create2_address, create_address, Context, HeaderParams, Transaction, TransactionAction,
};
pub use crate::patch::{AccountPatch, Patch, PatchBuilder, PrecompiledSet};
pub use crate::state::AccountState;
pub use crate::transaction::{TransactionVM, VMStatus};
pub use crate::vm::ContextVM;
pub use sputnikvm_core::{
	Capture, ExitError, ExitFatal, ExitReason, ExitSucceed, Memory, Opcode, Stack, Valids,
};
