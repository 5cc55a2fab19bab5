//! Commitment management

mod account;
mod blockhash;

pub use self::account::{AccountCommitment, AccountLog, CommittedAccount};
pub use self::blockhash::BlockhashLog;

use crate::errors::{CommitError, RequireError};
use primitive_types::{H256, U256};

/// Everything the host supplied in response to requirements.
#[derive(Clone, Debug, Default)]
pub struct CommitLog {
	pub accounts: AccountLog,
	pub blockhashes: BlockhashLog,
}

impl CommitLog {
	pub fn commit_account(&mut self, commitment: AccountCommitment) -> Result<(), CommitError> {
		self.accounts.commit(commitment)
	}

	pub fn commit_blockhash(&mut self, number: U256, hash: H256) -> Result<(), CommitError> {
		self.blockhashes.commit(number, hash)
	}

	pub fn blockhash(&self, number: U256) -> Result<H256, RequireError> {
		self.blockhashes.get(number)
	}
}
