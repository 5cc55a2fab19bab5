//! Account commitment managment

use crate::errors::{CommitError, RequireError};
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use primitive_types::{H160, U256};

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
/// A single account commitment.
pub enum AccountCommitment {
	/// Full account commitment. The client that committed account
	/// should not change the account in other EVMs if it decides to
	/// accept the result.
	Full {
		/// Nonce of the account.
		nonce: U256,
		/// Account address.
		address: H160,
		/// Account balance.
		balance: U256,
		/// Code associated with this account.
		code: Rc<Vec<u8>>,
	},
	/// Commit only code of the account. The client can keep changing
	/// it in other EVMs if the code remains unchanged.
	Code {
		/// Account address.
		address: H160,
		/// Code associated with this account.
		code: Rc<Vec<u8>>,
	},
	/// Commit a storage. Must be used given a full account.
	Storage {
		/// Account address.
		address: H160,
		/// Account storage index.
		index: U256,
		/// Value at the given account storage index.
		value: U256,
	},
	/// Indicate that an account does not exist, or is a suicided
	/// account.
	Nonexist(H160),
}

impl AccountCommitment {
	/// Address of this account commitment.
	pub fn address(&self) -> H160 {
		match self {
			AccountCommitment::Full { address, .. } => *address,
			AccountCommitment::Code { address, .. } => *address,
			AccountCommitment::Storage { address, .. } => *address,
			AccountCommitment::Nonexist(address) => *address,
		}
	}

	/// Whether this commitment answers the given requirement. A full or
	/// nonexist commitment also answers a code requirement.
	pub fn satisfies(&self, require: &RequireError) -> bool {
		match (self, require) {
			(AccountCommitment::Full { address, .. }, RequireError::Account(required))
			| (AccountCommitment::Full { address, .. }, RequireError::AccountCode(required))
			| (AccountCommitment::Nonexist(address), RequireError::Account(required))
			| (AccountCommitment::Nonexist(address), RequireError::AccountCode(required))
			| (AccountCommitment::Code { address, .. }, RequireError::AccountCode(required)) => {
				address == required
			}
			(
				AccountCommitment::Storage { address, index, .. },
				RequireError::AccountStorage(required, required_index),
			) => address == required && index == required_index,
			_ => false,
		}
	}
}

/// Account as the host committed it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CommittedAccount {
	Full {
		nonce: U256,
		balance: U256,
		code: Rc<Vec<u8>>,
	},
	Nonexist,
}

#[derive(Clone, Debug, Default)]
/// Everything the host committed about accounts. Entries are never
/// overwritten.
pub struct AccountLog {
	accounts: BTreeMap<H160, CommittedAccount>,
	codes: BTreeMap<H160, Rc<Vec<u8>>>,
	storages: BTreeMap<(H160, U256), U256>,
}

impl AccountLog {
	/// Whether the key of this commitment is already in the log.
	pub fn contains_key(&self, commitment: &AccountCommitment) -> bool {
		match commitment {
			AccountCommitment::Full { address, .. } | AccountCommitment::Nonexist(address) => {
				self.accounts.contains_key(address)
			}
			AccountCommitment::Code { address, .. } => {
				self.accounts.contains_key(address) || self.codes.contains_key(address)
			}
			AccountCommitment::Storage { address, index, .. } => {
				self.storages.contains_key(&(*address, *index))
			}
		}
	}

	/// Commit an account commitment into this log.
	pub fn commit(&mut self, commitment: AccountCommitment) -> Result<(), CommitError> {
		if self.contains_key(&commitment) {
			return Err(CommitError::AlreadyCommitted);
		}

		match commitment {
			AccountCommitment::Full {
				nonce,
				address,
				balance,
				code,
			} => {
				if self.codes.get(&address).map_or(false, |known| known != &code) {
					return Err(CommitError::AlreadyCommitted);
				}
				self.accounts.insert(
					address,
					CommittedAccount::Full {
						nonce,
						balance,
						code,
					},
				);
			}
			AccountCommitment::Code { address, code } => {
				self.codes.insert(address, code);
			}
			AccountCommitment::Storage {
				address,
				index,
				value,
			} => match self.accounts.get(&address) {
				Some(CommittedAccount::Full { .. }) => {
					self.storages.insert((address, index), value);
				}
				_ => return Err(CommitError::InvalidCommitment),
			},
			AccountCommitment::Nonexist(address) => {
				if self.codes.get(&address).map_or(false, |known| !known.is_empty()) {
					return Err(CommitError::AlreadyCommitted);
				}
				self.accounts.insert(address, CommittedAccount::Nonexist);
			}
		}

		Ok(())
	}

	/// Committed account, or require it.
	pub fn account(&self, address: H160) -> Result<&CommittedAccount, RequireError> {
		self.accounts
			.get(&address)
			.ok_or(RequireError::Account(address))
	}

	pub fn exists(&self, address: H160) -> Result<bool, RequireError> {
		Ok(matches!(
			self.account(address)?,
			CommittedAccount::Full { .. }
		))
	}

	pub fn nonce(&self, address: H160) -> Result<Option<U256>, RequireError> {
		Ok(match self.account(address)? {
			CommittedAccount::Full { nonce, .. } => Some(*nonce),
			CommittedAccount::Nonexist => None,
		})
	}

	pub fn balance(&self, address: H160) -> Result<U256, RequireError> {
		Ok(match self.account(address)? {
			CommittedAccount::Full { balance, .. } => *balance,
			CommittedAccount::Nonexist => U256::zero(),
		})
	}

	/// Committed code, from either an account or a code-only commitment.
	pub fn code(&self, address: H160) -> Result<Rc<Vec<u8>>, RequireError> {
		if let Some(code) = self.codes.get(&address) {
			return Ok(code.clone());
		}

		match self.accounts.get(&address) {
			Some(CommittedAccount::Full { code, .. }) => Ok(code.clone()),
			Some(CommittedAccount::Nonexist) => Ok(Rc::new(Vec::new())),
			None => Err(RequireError::AccountCode(address)),
		}
	}

	/// Committed storage value. The account must be known first.
	pub fn storage(&self, address: H160, index: U256) -> Result<U256, RequireError> {
		match self.account(address)? {
			CommittedAccount::Nonexist => Ok(U256::zero()),
			CommittedAccount::Full { .. } => self
				.storages
				.get(&(address, index))
				.copied()
				.ok_or(RequireError::AccountStorage(address, index)),
		}
	}
}
