#![allow(dead_code)]

use std::collections::BTreeMap;
use std::rc::Rc;

use primitive_types::{H160, H256, U256};
use sputnikvm::{
	AccountCommitment, CommitError, Gas, HeaderParams, RequireError, Transaction,
	TransactionAction, TransactionVM,
};

#[derive(Default, Clone, Debug)]
pub struct MockAccount {
	pub balance: U256,
	pub code: Vec<u8>,
	pub nonce: U256,
	pub storage: BTreeMap<U256, U256>,
}

impl MockAccount {
	pub fn with_code(code: &str) -> Self {
		Self {
			code: hex::decode(code).unwrap(),
			..Default::default()
		}
	}

	pub fn with_balance(balance: u64) -> Self {
		Self {
			balance: U256::from(balance),
			..Default::default()
		}
	}

	pub fn storage(mut self, index: u64, value: u64) -> Self {
		self.storage.insert(U256::from(index), U256::from(value));
		self
	}
}

/// Host answering every requirement from an in-memory world state.
/// Accounts missing from `state` do not exist.
#[derive(Clone, Debug, Default)]
pub struct MockHost {
	pub state: BTreeMap<H160, MockAccount>,
	pub blockhashes: BTreeMap<U256, H256>,
}

impl MockHost {
	pub fn new() -> Self {
		let mut host = Self::default();
		host.state.insert(caller(), MockAccount::with_balance(1_000_000_000_000));
		host
	}

	pub fn insert(&mut self, address: H160, account: MockAccount) -> &mut Self {
		self.state.insert(address, account);
		self
	}

	pub fn answer(&self, vm: &mut TransactionVM, require: RequireError) -> Result<(), CommitError> {
		match require {
			RequireError::Account(address) => match self.state.get(&address) {
				Some(account) => vm.commit_account(AccountCommitment::Full {
					nonce: account.nonce,
					address,
					balance: account.balance,
					code: Rc::new(account.code.clone()),
				}),
				None => vm.commit_nonexist(address),
			},
			RequireError::AccountCode(address) => match self.state.get(&address) {
				Some(account) => vm.commit_account_code(address, account.code.clone()),
				None => vm.commit_nonexist(address),
			},
			RequireError::AccountStorage(address, index) => {
				let value = self
					.state
					.get(&address)
					.and_then(|account| account.storage.get(&index).copied())
					.unwrap_or_default();
				vm.commit_account_storage(address, index, value)
			}
			RequireError::Blockhash(number) => {
				let hash = self.blockhashes.get(&number).copied().unwrap_or_default();
				vm.commit_blockhash(number, hash)
			}
		}
	}

	/// Fire until the VM exits, answering every requirement. Returns the
	/// requirements in the order they were raised.
	pub fn run(&self, vm: &mut TransactionVM) -> Vec<RequireError> {
		let mut answered = Vec::new();
		while let Err(require) = vm.fire() {
			self.answer(vm, require).unwrap();
			answered.push(require);
		}
		answered
	}
}

pub fn caller() -> H160 {
	H160::from_low_u64_be(0xca11)
}

pub fn beneficiary() -> H160 {
	H160::from_low_u64_be(0xbe)
}

pub fn block() -> HeaderParams {
	HeaderParams {
		beneficiary: beneficiary(),
		timestamp: 1_500_000_000,
		number: U256::from(1000u64),
		difficulty: U256::from(131_072u64),
		gas_limit: Gas::from(8_000_000u64),
	}
}

/// Zero-value, zero-price message call from `caller()`.
pub fn call(to: H160, gas_limit: u64) -> Transaction {
	Transaction {
		caller: caller(),
		gas_price: Gas::zero(),
		gas_limit: Gas::from(gas_limit),
		action: TransactionAction::Call(to),
		value: U256::zero(),
		input: Rc::new(Vec::new()),
		nonce: U256::zero(),
	}
}

/// Zero-value, zero-price contract creation from `caller()`.
pub fn create(init_code: &str, gas_limit: u64) -> Transaction {
	Transaction {
		caller: caller(),
		gas_price: Gas::zero(),
		gas_limit: Gas::from(gas_limit),
		action: TransactionAction::Create,
		value: U256::zero(),
		input: Rc::new(hex::decode(init_code).unwrap()),
		nonce: U256::zero(),
	}
}
