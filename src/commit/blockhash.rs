//! Blockhash commitment management

use crate::errors::{CommitError, RequireError};
use alloc::collections::BTreeMap;
use primitive_types::{H256, U256};

#[derive(Clone, Debug, Default)]
/// Blockhashes committed for one EVM.
pub struct BlockhashLog(BTreeMap<U256, H256>);

impl BlockhashLog {
	pub fn contains(&self, number: U256) -> bool {
		self.0.contains_key(&number)
	}

	/// Commit a new blockhash. Blockhashes are immutable so the
	/// client should be able to use this for other concurrently
	/// running EVMs.
	pub fn commit(&mut self, number: U256, hash: H256) -> Result<(), CommitError> {
		if self.0.contains_key(&number) {
			return Err(CommitError::AlreadyCommitted);
		}

		self.0.insert(number, hash);
		Ok(())
	}

	/// Get a blockhash by its number.
	pub fn get(&self, number: U256) -> Result<H256, RequireError> {
		match self.0.get(&number) {
			Some(value) => Ok(*value),
			None => Err(RequireError::Blockhash(number)),
		}
	}
}
