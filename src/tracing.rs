//! Allows to listen to runtime events.

use crate::commit::AccountCommitment;
use crate::errors::RequireError;
use crate::params::Context;
use primitive_types::{H160, H256, U256};
use sputnikvm_core::ExitReason;

environmental::environmental!(listener: dyn EventListener + 'static);

pub trait EventListener {
	fn event(&mut self, event: Event);
}

#[derive(Debug, Copy, Clone)]
pub enum Event<'a> {
	/// Execution stopped to ask the host for data.
	Require(RequireError),
	/// The host supplied an account.
	Commit(&'a AccountCommitment),
	/// The host supplied a block hash.
	CommitBlockhash {
		number: U256,
		hash: H256,
	},
	Call {
		code_address: H160,
		input: &'a [u8],
		target_gas: U256,
		is_static: bool,
		context: &'a Context,
	},
	Create {
		caller: H160,
		address: H160,
		value: U256,
		init_code: &'a [u8],
		target_gas: U256,
	},
	Suicide {
		address: H160,
		target: H160,
		balance: U256,
	},
	/// A frame at the given depth exited.
	Exit {
		depth: usize,
		reason: &'a ExitReason,
	},
}

impl<'a> Event<'a> {
	pub(crate) fn emit(self) {
		listener::with(|listener| listener.event(self));
	}
}

/// Run closure with provided listener.
pub fn using<R, F: FnOnce() -> R>(new: &mut (dyn EventListener + 'static), f: F) -> R {
	listener::using(new, f)
}
