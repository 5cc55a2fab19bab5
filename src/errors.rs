//! VM errors

use core::fmt;
use primitive_types::{H160, U256};
use sputnikvm_core::ExitError;

/// Errors when trying to validate the transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PreExecutionError {
	/// Nonce of the caller does not equal.
	InvalidNonce,
	/// Balance from the caller is insufficient.
	InsufficientBalance,
	/// Gas limit is smaller than the intrinsic gas required.
	InsufficientGasLimit,
}

/// Errors stating that the VM requires additional information to
/// continue running.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
pub enum RequireError {
	/// Requires the account at address for the VM to continue
	/// running, this should usually be dealt by
	/// `vm.commit_account(AccountCommitment::Full { .. })` or
	/// `vm.commit_account(AccountCommitment::Nonexist(..))`.
	Account(H160),
	/// Requires the account code at address for the VM to continue
	/// running, this should usually be dealt by
	/// `vm.commit_account(AccountCommitment::Code { .. })`.
	AccountCode(H160),
	/// Requires the current value of the storage for the VM to
	/// continue running, this should usually be dealt by
	/// `vm.commit_account(AccountCommitment::Storage { .. }`.
	AccountStorage(H160, U256),
	/// Requires the blockhash for the VM to continue running, this
	/// should usually be dealt by `vm.commit_blockhash(..)`.
	Blockhash(U256),
}

/// Errors returned when committing a new information.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommitError {
	/// The commitment does not answer the outstanding requirement.
	InvalidCommitment,
	/// The commitment has already been committed.
	AlreadyCommitted,
}

/// Errors returned when copying output into a host buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CopyError {
	/// The VM has not exited yet, so there is no output to copy.
	NotExited,
	/// No log or account change matches the given index or address.
	NotFound,
	/// The provided buffer cannot hold the whole value.
	BufferTooSmall { required: usize, provided: usize },
}

/// Errors found when validating a custom patch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PatchError {
	/// The address is not a precompiled contract of the chosen set.
	UnknownPrecompiled(H160),
	/// The address is listed more than once.
	DuplicatePrecompiled(H160),
	/// Memory limit must allow at least one byte.
	ZeroMemoryLimit,
}

/// Eval on-chain error. Can either be an on-chain error or a require
/// error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EvalOnChainError {
	/// On chain error.
	OnChain(ExitError),
	/// Require error for additional accounts.
	Require(RequireError),
}

impl From<ExitError> for EvalOnChainError {
	fn from(val: ExitError) -> EvalOnChainError {
		EvalOnChainError::OnChain(val)
	}
}

impl From<RequireError> for EvalOnChainError {
	fn from(val: RequireError) -> EvalOnChainError {
		EvalOnChainError::Require(val)
	}
}

impl fmt::Display for PreExecutionError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			PreExecutionError::InvalidNonce => write!(f, "transaction nonce does not match"),
			PreExecutionError::InsufficientBalance => write!(f, "caller balance is insufficient"),
			PreExecutionError::InsufficientGasLimit => {
				write!(f, "gas limit is below the intrinsic gas")
			}
		}
	}
}

impl fmt::Display for RequireError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			RequireError::Account(address) => write!(f, "require account {:?}", address),
			RequireError::AccountCode(address) => write!(f, "require code of {:?}", address),
			RequireError::AccountStorage(address, index) => {
				write!(f, "require storage {:#x} of {:?}", index, address)
			}
			RequireError::Blockhash(number) => write!(f, "require blockhash of block {}", number),
		}
	}
}

impl fmt::Display for CommitError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			CommitError::InvalidCommitment => {
				write!(f, "commitment does not match the outstanding requirement")
			}
			CommitError::AlreadyCommitted => write!(f, "value has already been committed"),
		}
	}
}

impl fmt::Display for CopyError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			CopyError::NotExited => write!(f, "vm has not exited"),
			CopyError::NotFound => write!(f, "no such output entry"),
			CopyError::BufferTooSmall { required, provided } => write!(
				f,
				"buffer too small: {} bytes required, {} provided",
				required, provided
			),
		}
	}
}

impl fmt::Display for PatchError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			PatchError::UnknownPrecompiled(address) => {
				write!(f, "{:?} is not in the precompiled set", address)
			}
			PatchError::DuplicatePrecompiled(address) => {
				write!(f, "{:?} is enabled more than once", address)
			}
			PatchError::ZeroMemoryLimit => write!(f, "memory limit is zero"),
		}
	}
}

#[cfg(feature = "std")]
impl std::error::Error for PreExecutionError {}
#[cfg(feature = "std")]
impl std::error::Error for RequireError {}
#[cfg(feature = "std")]
impl std::error::Error for CommitError {}
#[cfg(feature = "std")]
impl std::error::Error for CopyError {}
#[cfg(feature = "std")]
impl std::error::Error for PatchError {}
