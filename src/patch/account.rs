use primitive_types::U256;

/// Account semantics of a chain.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
pub struct AccountPatch {
	/// Initial nonce of a newly touched account.
	pub initial_nonce: U256,
	/// Initial nonce of an account created by CREATE or a create
	/// transaction.
	pub initial_create_nonce: U256,
	/// Whether an empty account is considered to exist. When false, empty
	/// touched accounts are removed at finalization (EIP-161).
	pub empty_considered_exists: bool,
	/// Whether balance changes to an unknown account may be reported
	/// without committing that account first.
	pub allow_partial_change: bool,
}

impl AccountPatch {
	pub fn mainnet() -> Self {
		Self {
			initial_nonce: U256::zero(),
			initial_create_nonce: U256::one(),
			empty_considered_exists: false,
			allow_partial_change: true,
		}
	}

	pub fn morden() -> Self {
		Self {
			initial_nonce: U256::from(1u64 << 20),
			initial_create_nonce: U256::from((1u64 << 20) + 1),
			empty_considered_exists: false,
			allow_partial_change: true,
		}
	}

	/// Pre-EIP-161 semantics.
	pub fn frontier() -> Self {
		Self {
			initial_nonce: U256::zero(),
			initial_create_nonce: U256::zero(),
			empty_considered_exists: true,
			allow_partial_change: true,
		}
	}
}

impl Default for AccountPatch {
	fn default() -> Self {
		Self::mainnet()
	}
}
