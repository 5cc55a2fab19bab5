//! Patch of a VM, indicating different hard-fork of the Ethereum
//! block range.
//!
//! A patch is plain data. Named presets are values of the same type, and
//! custom patches are assembled field by field through [`PatchBuilder`].

mod account;

pub use self::account::AccountPatch;

use crate::errors::PatchError;
use crate::precompiled::{precompiled, precompiled_address, Precompiled};
use crate::Gas;
use alloc::vec::Vec;
use primitive_types::H160;

/// Which family of precompiled contracts a patch draws from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
pub enum PrecompiledSet {
	/// ECRECOVER, SHA256, RIPEMD160 and IDENTITY.
	Etc,
	/// `Etc` plus MODEXP and the three BN128 contracts.
	Byzantium,
}

impl PrecompiledSet {
	/// Addresses belonging to this set.
	pub fn addresses(&self) -> Vec<H160> {
		let count = match self {
			PrecompiledSet::Etc => 4,
			PrecompiledSet::Byzantium => 8,
		};
		(1..=count).map(precompiled_address).collect()
	}

	pub fn contains(&self, address: &H160) -> bool {
		self.addresses().contains(address)
	}
}

/// Field-by-field description of a patch.
///
/// A builder is validated and frozen into a [`Patch`] by one of
/// [`PatchBuilder::build`], [`PatchBuilder::mainnet`],
/// [`PatchBuilder::morden`] or [`Patch::dynamic`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
pub struct PatchBuilder {
	/// Maximum contract size. Zero means unlimited.
	pub code_deposit_limit: usize,
	/// Limit of the call stack.
	pub callstack_limit: usize,
	/// Gas paid for extcode.
	pub gas_extcode: Gas,
	/// Gas paid for BALANCE opcode.
	pub gas_balance: Gas,
	/// Gas paid for SLOAD opcode.
	pub gas_sload: Gas,
	/// Gas paid for SUICIDE opcode.
	pub gas_suicide: Gas,
	/// Gas paid for SUICIDE opcode when it hits a new account.
	pub gas_suicide_new_account: Gas,
	/// Gas paid for CALL opcode.
	pub gas_call: Gas,
	/// Gas paid for EXP opcode for every byte.
	pub gas_expbyte: Gas,
	/// Gas paid for a contract creation transaction.
	pub gas_transaction_create: Gas,
	/// Whether to force code deposit even if it does not have enough
	/// gas.
	pub force_code_deposit: bool,
	/// Whether the EVM has DELEGATECALL opcode.
	pub has_delegate_call: bool,
	/// Whether the EVM has STATICCALL opcode.
	pub has_static_call: bool,
	/// Whether the EVM has REVERT opcode.
	pub has_revert: bool,
	/// Whether the EVM has RETURNDATASIZE and RETURNDATACOPY opcode.
	pub has_return_data: bool,
	/// Whether the EVM has SHL, SHR and SAR
	pub has_bitwise_shift: bool,
	/// Whether the EVM has CREATE2
	pub has_create2: bool,
	/// Whether the EVM has EXTCODEHASH
	pub has_extcodehash: bool,
	/// Whether EVM should implement the EIP1283 gas metering scheme for SSTORE opcode
	pub has_reduced_sstore_gas_metering: bool,
	/// Whether to throw out of gas error when
	/// CALL/CALLCODE/DELEGATECALL requires more than maximum amount
	/// of gas.
	pub err_on_call_with_more_gas: bool,
	/// If true, only consume at maximum l64(after_gas) when
	/// CALL/CALLCODE/DELEGATECALL.
	pub call_create_l64_after_gas: bool,
	/// Maximum size of the memory, in bytes.
	pub memory_limit: usize,
	/// Enabled precompiled contracts. Empty enables the whole set.
	pub enabled_contracts: Vec<H160>,
	/// Account semantics.
	pub account_patch: AccountPatch,
}

impl PatchBuilder {
	/// Frontier rules.
	pub fn frontier() -> Self {
		Self {
			code_deposit_limit: 0,
			callstack_limit: 1024,
			gas_extcode: Gas::from(20u64),
			gas_balance: Gas::from(20u64),
			gas_sload: Gas::from(50u64),
			gas_suicide: Gas::zero(),
			gas_suicide_new_account: Gas::zero(),
			gas_call: Gas::from(40u64),
			gas_expbyte: Gas::from(10u64),
			gas_transaction_create: Gas::zero(),
			force_code_deposit: true,
			has_delegate_call: false,
			has_static_call: false,
			has_revert: false,
			has_return_data: false,
			has_bitwise_shift: false,
			has_create2: false,
			has_extcodehash: false,
			has_reduced_sstore_gas_metering: false,
			err_on_call_with_more_gas: true,
			call_create_l64_after_gas: false,
			memory_limit: usize::max_value(),
			enabled_contracts: Vec::new(),
			account_patch: AccountPatch::frontier(),
		}
	}

	/// Homestead rules (EIP-2, EIP-7).
	pub fn homestead() -> Self {
		Self {
			gas_transaction_create: Gas::from(32000u64),
			force_code_deposit: false,
			has_delegate_call: true,
			..Self::frontier()
		}
	}

	/// EIP-150 gas repricing.
	pub fn eip150() -> Self {
		Self {
			gas_extcode: Gas::from(700u64),
			gas_balance: Gas::from(400u64),
			gas_sload: Gas::from(200u64),
			gas_suicide: Gas::from(5000u64),
			gas_suicide_new_account: Gas::from(25000u64),
			gas_call: Gas::from(700u64),
			err_on_call_with_more_gas: false,
			call_create_l64_after_gas: true,
			..Self::homestead()
		}
	}

	/// EIP-160 EXP repricing, together with the EIP-161 account semantics
	/// and the EIP-170 contract size limit of the same fork.
	pub fn eip160() -> Self {
		Self {
			code_deposit_limit: 0x6000,
			gas_expbyte: Gas::from(50u64),
			account_patch: AccountPatch::mainnet(),
			..Self::eip150()
		}
	}

	/// Byzantium rules.
	pub fn byzantium() -> Self {
		Self {
			has_static_call: true,
			has_revert: true,
			has_return_data: true,
			..Self::eip160()
		}
	}

	/// Constantinople rules.
	pub fn constantinople() -> Self {
		Self {
			has_bitwise_shift: true,
			has_create2: true,
			has_extcodehash: true,
			has_reduced_sstore_gas_metering: true,
			..Self::byzantium()
		}
	}

	/// Validate and freeze with the builder's own account patch.
	pub fn build(self, contracts: PrecompiledSet) -> Result<Patch, PatchError> {
		let account_patch = self.account_patch;
		Patch::validated(self, account_patch, contracts)
	}

	/// Validate and freeze with the mainnet account patch.
	pub fn mainnet(self, contracts: PrecompiledSet) -> Result<Patch, PatchError> {
		Patch::validated(self, AccountPatch::mainnet(), contracts)
	}

	/// Validate and freeze with the morden account patch.
	pub fn morden(self, contracts: PrecompiledSet) -> Result<Patch, PatchError> {
		Patch::validated(self, AccountPatch::morden(), contracts)
	}
}

impl Default for PatchBuilder {
	fn default() -> Self {
		Self::byzantium()
	}
}

/// Immutable rule set for one execution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Patch {
	rules: PatchBuilder,
	contracts: PrecompiledSet,
	enabled: Vec<H160>,
}

impl Patch {
	fn validated(
		mut rules: PatchBuilder,
		account_patch: AccountPatch,
		contracts: PrecompiledSet,
	) -> Result<Patch, PatchError> {
		if rules.memory_limit == 0 {
			return Err(PatchError::ZeroMemoryLimit);
		}

		let mut enabled: Vec<H160> = Vec::new();
		for address in &rules.enabled_contracts {
			if !contracts.contains(address) {
				return Err(PatchError::UnknownPrecompiled(*address));
			}
			if enabled.contains(address) {
				return Err(PatchError::DuplicatePrecompiled(*address));
			}
			enabled.push(*address);
		}

		rules.account_patch = account_patch;
		Ok(Self::assemble(rules, contracts, enabled))
	}

	fn assemble(rules: PatchBuilder, contracts: PrecompiledSet, enabled: Vec<H160>) -> Patch {
		let enabled = if enabled.is_empty() {
			contracts.addresses()
		} else {
			enabled
		};

		Patch {
			rules,
			contracts,
			enabled,
		}
	}

	/// Custom patch drawing from the Byzantium precompiled set, filtered by
	/// the builder's enabled contracts.
	pub fn dynamic(builder: PatchBuilder, account_patch: AccountPatch) -> Result<Patch, PatchError> {
		Self::validated(builder, account_patch, PrecompiledSet::Byzantium)
	}

	pub fn frontier() -> Patch {
		Self::assemble(PatchBuilder::frontier(), PrecompiledSet::Etc, Vec::new())
	}

	pub fn homestead() -> Patch {
		Self::assemble(PatchBuilder::homestead(), PrecompiledSet::Etc, Vec::new())
	}

	pub fn eip150() -> Patch {
		Self::assemble(PatchBuilder::eip150(), PrecompiledSet::Etc, Vec::new())
	}

	pub fn eip160() -> Patch {
		Self::assemble(PatchBuilder::eip160(), PrecompiledSet::Etc, Vec::new())
	}

	pub fn byzantium() -> Patch {
		Self::assemble(PatchBuilder::byzantium(), PrecompiledSet::Byzantium, Vec::new())
	}

	pub fn constantinople() -> Patch {
		Self::assemble(
			PatchBuilder::constantinople(),
			PrecompiledSet::Byzantium,
			Vec::new(),
		)
	}

	/// The builder this patch was frozen from.
	pub fn rules(&self) -> &PatchBuilder {
		&self.rules
	}

	/// Account patch.
	pub fn account_patch(&self) -> &AccountPatch {
		&self.rules.account_patch
	}

	/// Maximum contract size, if limited.
	pub fn code_deposit_limit(&self) -> Option<usize> {
		match self.rules.code_deposit_limit {
			0 => None,
			limit => Some(limit),
		}
	}

	pub fn callstack_limit(&self) -> usize {
		self.rules.callstack_limit
	}

	pub fn gas_extcode(&self) -> Gas {
		self.rules.gas_extcode
	}

	pub fn gas_balance(&self) -> Gas {
		self.rules.gas_balance
	}

	pub fn gas_sload(&self) -> Gas {
		self.rules.gas_sload
	}

	pub fn gas_suicide(&self) -> Gas {
		self.rules.gas_suicide
	}

	pub fn gas_suicide_new_account(&self) -> Gas {
		self.rules.gas_suicide_new_account
	}

	pub fn gas_call(&self) -> Gas {
		self.rules.gas_call
	}

	pub fn gas_expbyte(&self) -> Gas {
		self.rules.gas_expbyte
	}

	pub fn gas_transaction_create(&self) -> Gas {
		self.rules.gas_transaction_create
	}

	pub fn force_code_deposit(&self) -> bool {
		self.rules.force_code_deposit
	}

	pub fn has_delegate_call(&self) -> bool {
		self.rules.has_delegate_call
	}

	pub fn has_static_call(&self) -> bool {
		self.rules.has_static_call
	}

	pub fn has_revert(&self) -> bool {
		self.rules.has_revert
	}

	pub fn has_return_data(&self) -> bool {
		self.rules.has_return_data
	}

	pub fn has_bitwise_shift(&self) -> bool {
		self.rules.has_bitwise_shift
	}

	pub fn has_create2(&self) -> bool {
		self.rules.has_create2
	}

	pub fn has_extcodehash(&self) -> bool {
		self.rules.has_extcodehash
	}

	pub fn has_reduced_sstore_gas_metering(&self) -> bool {
		self.rules.has_reduced_sstore_gas_metering
	}

	pub fn err_on_call_with_more_gas(&self) -> bool {
		self.rules.err_on_call_with_more_gas
	}

	pub fn call_create_l64_after_gas(&self) -> bool {
		self.rules.call_create_l64_after_gas
	}

	pub fn memory_limit(&self) -> usize {
		self.rules.memory_limit
	}

	/// Precompiled set this patch draws from.
	pub fn precompiled_set(&self) -> PrecompiledSet {
		self.contracts
	}

	/// Check if the precompiled contract is enabled.
	pub fn is_precompiled_contract_enabled(&self, address: &H160) -> bool {
		self.enabled.contains(address)
	}

	/// Enabled precompiled contract at the given address.
	pub fn precompiled(&self, address: &H160) -> Option<&'static dyn Precompiled> {
		if self.is_precompiled_contract_enabled(address) {
			precompiled(address)
		} else {
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn presets_enable_their_whole_set() {
		let frontier = Patch::frontier();
		assert!(frontier.is_precompiled_contract_enabled(&precompiled_address(4)));
		assert!(!frontier.is_precompiled_contract_enabled(&precompiled_address(5)));

		let byzantium = Patch::byzantium();
		assert!(byzantium.is_precompiled_contract_enabled(&precompiled_address(8)));
		assert!(byzantium.has_revert());
		assert!(!byzantium.has_create2());
		assert_eq!(byzantium.code_deposit_limit(), Some(0x6000));
		assert_eq!(frontier.code_deposit_limit(), None);
	}

	#[test]
	fn presets_follow_fork_order() {
		assert_eq!(Patch::homestead().gas_transaction_create(), Gas::from(32000u64));
		assert_eq!(Patch::eip150().gas_call(), Gas::from(700u64));
		assert!(Patch::eip150().call_create_l64_after_gas());
		assert_eq!(Patch::eip160().gas_expbyte(), Gas::from(50u64));
		assert!(!Patch::eip160().account_patch().empty_considered_exists);
		assert!(Patch::eip150().account_patch().empty_considered_exists);
		assert!(Patch::constantinople().has_reduced_sstore_gas_metering());
	}

	#[test]
	fn custom_patch_filters_contracts() {
		let mut builder = PatchBuilder::byzantium();
		builder.enabled_contracts = vec![precompiled_address(1), precompiled_address(6)];
		let patch = Patch::dynamic(builder, AccountPatch::mainnet()).unwrap();

		assert!(patch.precompiled(&precompiled_address(1)).is_some());
		assert!(patch.precompiled(&precompiled_address(6)).is_some());
		assert!(patch.precompiled(&precompiled_address(2)).is_none());
	}

	#[test]
	fn rejects_malformed_builders() {
		let mut builder = PatchBuilder::homestead();
		builder.enabled_contracts = vec![precompiled_address(5)];
		assert_eq!(
			builder.build(PrecompiledSet::Etc),
			Err(PatchError::UnknownPrecompiled(precompiled_address(5)))
		);

		let mut builder = PatchBuilder::homestead();
		builder.enabled_contracts = vec![precompiled_address(2), precompiled_address(2)];
		assert_eq!(
			builder.mainnet(PrecompiledSet::Etc),
			Err(PatchError::DuplicatePrecompiled(precompiled_address(2)))
		);

		let mut builder = PatchBuilder::homestead();
		builder.memory_limit = 0;
		assert_eq!(
			builder.morden(PrecompiledSet::Etc),
			Err(PatchError::ZeroMemoryLimit)
		);
	}

	#[test]
	fn named_account_patch_overrides_builder() {
		let patch = PatchBuilder::eip150().morden(PrecompiledSet::Etc).unwrap();
		assert_eq!(patch.account_patch(), &AccountPatch::morden());
	}

	#[test]
	fn patch_is_shareable_across_threads() {
		fn assert_send_sync<T: Send + Sync>() {}
		assert_send_sync::<Patch>();
	}
}
