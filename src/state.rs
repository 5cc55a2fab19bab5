//! Account state of one execution, layered over the commit log.
//!
//! Reads go through the in-flight changes first, then the commit log, and
//! only then raise a requirement. Every frame works on its own clone, which
//! is merged back into the parent only when the frame succeeds.

use crate::commit::{CommitLog, CommittedAccount};
use crate::errors::RequireError;
use crate::output::{AccountChange, Storage};
use crate::patch::AccountPatch;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::rc::Rc;
use alloc::vec::Vec;
use primitive_types::{H160, U256};

/// Balance movement on an account whose baseline has not been committed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum BalanceDelta {
	Increase(U256),
	Decrease(U256),
}

impl BalanceDelta {
	fn increase(self, value: U256) -> Self {
		match self {
			BalanceDelta::Increase(current) => BalanceDelta::Increase(current.saturating_add(value)),
			BalanceDelta::Decrease(current) if current > value => {
				BalanceDelta::Decrease(current - value)
			}
			BalanceDelta::Decrease(current) => BalanceDelta::Increase(value - current),
		}
	}

	fn decrease(self, value: U256) -> Self {
		match self {
			BalanceDelta::Decrease(current) => BalanceDelta::Decrease(current.saturating_add(value)),
			BalanceDelta::Increase(current) if current >= value => {
				BalanceDelta::Increase(current - value)
			}
			BalanceDelta::Increase(current) => BalanceDelta::Decrease(value - current),
		}
	}

	fn apply(self, balance: U256) -> U256 {
		match self {
			BalanceDelta::Increase(value) => balance.saturating_add(value),
			BalanceDelta::Decrease(value) => balance.saturating_sub(value),
		}
	}
}

#[derive(Clone, Debug)]
struct LiveAccount {
	nonce: U256,
	balance: U256,
	code: Rc<Vec<u8>>,
	/// Written slots only.
	storage: BTreeMap<U256, U256>,
	/// Committed storage no longer applies; unwritten slots read as zero.
	reset: bool,
}

#[derive(Clone, Debug)]
enum AccountEntry {
	Delta(BalanceDelta),
	Live(LiveAccount),
	Dead,
}

/// In-flight account changes of one frame.
#[derive(Clone, Debug)]
pub struct AccountState {
	patch: AccountPatch,
	accounts: BTreeMap<H160, AccountEntry>,
	touched: BTreeSet<H160>,
}

impl AccountState {
	pub fn new(patch: AccountPatch) -> Self {
		Self {
			patch,
			accounts: BTreeMap::new(),
			touched: BTreeSet::new(),
		}
	}

	/// Account patch this state follows.
	pub fn patch(&self) -> &AccountPatch {
		&self.patch
	}

	/// Make sure the account at `address` is known, either through the
	/// changes made so far or through the commit log.
	pub fn require(&self, address: H160, log: &CommitLog) -> Result<(), RequireError> {
		match self.accounts.get(&address) {
			Some(AccountEntry::Live(_)) | Some(AccountEntry::Dead) => Ok(()),
			_ => log.accounts.account(address).map(|_| ()),
		}
	}

	/// Make sure the code at `address` is known.
	pub fn require_code(&self, address: H160, log: &CommitLog) -> Result<(), RequireError> {
		self.code(address, log).map(|_| ())
	}

	pub fn exists(&self, address: H160, log: &CommitLog) -> Result<bool, RequireError> {
		match self.accounts.get(&address) {
			Some(AccountEntry::Live(_)) | Some(AccountEntry::Delta(_)) => Ok(true),
			Some(AccountEntry::Dead) => Ok(false),
			None => log.accounts.exists(address),
		}
	}

	/// Whether the account has zero nonce, zero balance and no code.
	pub fn is_empty(&self, address: H160, log: &CommitLog) -> Result<bool, RequireError> {
		Ok(self.nonce(address, log)? == self.patch.initial_nonce
			&& self.balance(address, log)?.is_zero()
			&& self.code(address, log)?.is_empty())
	}

	pub fn balance(&self, address: H160, log: &CommitLog) -> Result<U256, RequireError> {
		match self.accounts.get(&address) {
			Some(AccountEntry::Live(account)) => Ok(account.balance),
			Some(AccountEntry::Dead) => Ok(U256::zero()),
			Some(AccountEntry::Delta(delta)) => Ok(delta.apply(log.accounts.balance(address)?)),
			None => log.accounts.balance(address),
		}
	}

	pub fn nonce(&self, address: H160, log: &CommitLog) -> Result<U256, RequireError> {
		match self.accounts.get(&address) {
			Some(AccountEntry::Live(account)) => Ok(account.nonce),
			Some(AccountEntry::Dead) => Ok(self.patch.initial_nonce),
			_ => Ok(log
				.accounts
				.nonce(address)?
				.unwrap_or(self.patch.initial_nonce)),
		}
	}

	pub fn code(&self, address: H160, log: &CommitLog) -> Result<Rc<Vec<u8>>, RequireError> {
		match self.accounts.get(&address) {
			Some(AccountEntry::Live(account)) => Ok(account.code.clone()),
			Some(AccountEntry::Dead) => Ok(Rc::new(Vec::new())),
			_ => log.accounts.code(address),
		}
	}

	/// Current value of a storage slot.
	pub fn storage(&self, address: H160, index: U256, log: &CommitLog) -> Result<U256, RequireError> {
		match self.accounts.get(&address) {
			Some(AccountEntry::Live(account)) => match account.storage.get(&index) {
				Some(value) => Ok(*value),
				None if account.reset => Ok(U256::zero()),
				None => log.accounts.storage(address, index),
			},
			Some(AccountEntry::Dead) => Ok(U256::zero()),
			_ => log.accounts.storage(address, index),
		}
	}

	/// Value of a storage slot before the transaction started.
	pub fn original_storage(&self, address: H160, index: U256, log: &CommitLog) -> U256 {
		match self.accounts.get(&address) {
			Some(AccountEntry::Live(LiveAccount { reset: true, .. })) => U256::zero(),
			_ => log.accounts.storage(address, index).unwrap_or_default(),
		}
	}

	fn live(&mut self, address: H160, log: &CommitLog) -> Result<&mut LiveAccount, RequireError> {
		let delta = match self.accounts.get(&address) {
			Some(AccountEntry::Live(_)) => None,
			Some(AccountEntry::Delta(delta)) => Some(*delta),
			Some(AccountEntry::Dead) | None => None,
		};

		let materialized = match self.accounts.get(&address) {
			Some(AccountEntry::Live(_)) => None,
			Some(AccountEntry::Dead) => Some(self.fresh()),
			_ => {
				let mut account = match log.accounts.account(address)? {
					CommittedAccount::Full {
						nonce,
						balance,
						code,
					} => LiveAccount {
						nonce: *nonce,
						balance: *balance,
						code: code.clone(),
						storage: BTreeMap::new(),
						reset: false,
					},
					CommittedAccount::Nonexist => self.fresh(),
				};
				if let Some(delta) = delta {
					account.balance = delta.apply(account.balance);
				}
				Some(account)
			}
		};

		if let Some(account) = materialized {
			self.accounts.insert(address, AccountEntry::Live(account));
		}

		match self.accounts.get_mut(&address) {
			Some(AccountEntry::Live(account)) => Ok(account),
			_ => Err(RequireError::Account(address)),
		}
	}

	fn fresh(&self) -> LiveAccount {
		LiveAccount {
			nonce: self.patch.initial_nonce,
			balance: U256::zero(),
			code: Rc::new(Vec::new()),
			storage: BTreeMap::new(),
			reset: true,
		}
	}

	fn is_committed(&self, address: H160, log: &CommitLog) -> bool {
		match self.accounts.get(&address) {
			Some(AccountEntry::Live(_)) | Some(AccountEntry::Dead) => true,
			_ => log.accounts.account(address).is_ok(),
		}
	}

	/// Increase the balance of an account. Unknown accounts only record the
	/// delta when the patch allows partial changes.
	pub fn increase_balance(
		&mut self,
		address: H160,
		value: U256,
		log: &CommitLog,
	) -> Result<(), RequireError> {
		if value.is_zero() {
			return Ok(());
		}

		if !self.is_committed(address, log) && self.patch.allow_partial_change {
			let delta = match self.accounts.get(&address) {
				Some(AccountEntry::Delta(delta)) => delta.increase(value),
				_ => BalanceDelta::Increase(value),
			};
			self.accounts.insert(address, AccountEntry::Delta(delta));
			return Ok(());
		}

		let account = self.live(address, log)?;
		account.balance = account.balance.saturating_add(value);
		Ok(())
	}

	/// Decrease the balance of an account.
	pub fn decrease_balance(
		&mut self,
		address: H160,
		value: U256,
		log: &CommitLog,
	) -> Result<(), RequireError> {
		if value.is_zero() {
			return Ok(());
		}

		if !self.is_committed(address, log) && self.patch.allow_partial_change {
			let delta = match self.accounts.get(&address) {
				Some(AccountEntry::Delta(delta)) => delta.decrease(value),
				_ => BalanceDelta::Decrease(value),
			};
			self.accounts.insert(address, AccountEntry::Delta(delta));
			return Ok(());
		}

		let account = self.live(address, log)?;
		account.balance = account.balance.saturating_sub(value);
		Ok(())
	}

	pub fn set_nonce(&mut self, address: H160, nonce: U256, log: &CommitLog) -> Result<(), RequireError> {
		self.live(address, log)?.nonce = nonce;
		Ok(())
	}

	pub fn storage_write(
		&mut self,
		address: H160,
		index: U256,
		value: U256,
		log: &CommitLog,
	) -> Result<(), RequireError> {
		self.live(address, log)?.storage.insert(index, value);
		Ok(())
	}

	/// Turn the account into a freshly created contract, keeping its
	/// balance.
	pub fn create(&mut self, address: H160, log: &CommitLog) -> Result<(), RequireError> {
		let initial_create_nonce = self.patch.initial_create_nonce;
		let account = self.live(address, log)?;
		account.nonce = initial_create_nonce;
		account.code = Rc::new(Vec::new());
		account.storage = BTreeMap::new();
		account.reset = true;
		Ok(())
	}

	pub fn code_deposit(&mut self, address: H160, code: Rc<Vec<u8>>, log: &CommitLog) -> Result<(), RequireError> {
		self.live(address, log)?.code = code;
		Ok(())
	}

	/// Mark the account as removed.
	pub fn remove(&mut self, address: H160) {
		self.accounts.insert(address, AccountEntry::Dead);
	}

	/// Record that the account was touched (EIP-161).
	pub fn touch(&mut self, address: H160) {
		self.touched.insert(address);
	}

	pub fn touched(&self) -> impl Iterator<Item = &H160> {
		self.touched.iter()
	}

	/// Diff every changed account against its committed baseline, in
	/// ascending address order.
	pub fn changes(&self, log: &CommitLog) -> Vec<AccountChange> {
		let mut changes = Vec::new();

		for (address, entry) in &self.accounts {
			let address = *address;
			let baseline = log.accounts.account(address).ok();

			match entry {
				AccountEntry::Delta(BalanceDelta::Increase(value)) => {
					if !value.is_zero() {
						changes.push(AccountChange::IncreaseBalance(address, *value));
					}
				}
				AccountEntry::Delta(BalanceDelta::Decrease(value)) => {
					if !value.is_zero() {
						changes.push(AccountChange::DecreaseBalance(address, *value));
					}
				}
				AccountEntry::Dead => match baseline {
					Some(CommittedAccount::Nonexist) => (),
					_ => changes.push(AccountChange::Removed(address)),
				},
				AccountEntry::Live(account) => match baseline {
					Some(CommittedAccount::Full {
						nonce,
						balance,
						code,
					}) if !account.reset => {
						let mut changing_storage = Storage::default();
						for (index, value) in &account.storage {
							if log.accounts.storage(address, *index).ok() != Some(*value) {
								changing_storage.insert(*index, *value);
							}
						}

						if account.nonce == *nonce
							&& account.code == *code
							&& changing_storage.is_empty()
						{
							if account.balance > *balance {
								changes.push(AccountChange::IncreaseBalance(
									address,
									account.balance - *balance,
								));
							} else if account.balance < *balance {
								changes.push(AccountChange::DecreaseBalance(
									address,
									*balance - account.balance,
								));
							}
						} else {
							changes.push(AccountChange::Full {
								nonce: account.nonce,
								address,
								balance: account.balance,
								changing_storage,
								code: account.code.clone(),
							});
						}
					}
					_ => {
						let mut storage = Storage::default();
						for (index, value) in &account.storage {
							if !value.is_zero() {
								storage.insert(*index, *value);
							}
						}

						changes.push(AccountChange::Create {
							nonce: account.nonce,
							address,
							balance: account.balance,
							storage,
							code: account.code.clone(),
						});
					}
				},
			}
		}

		changes
	}
}
