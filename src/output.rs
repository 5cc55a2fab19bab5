//! Results of an execution, readable once the VM has exited.

use crate::errors::CopyError;
use alloc::collections::{btree_map, BTreeMap};
use alloc::rc::Rc;
use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
/// Log emitted by LOG0 to LOG4.
pub struct Log {
	pub address: H160,
	pub topics: Vec<H256>,
	pub data: Vec<u8>,
}

/// Storage entries of an account change, looked up by key.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
pub struct Storage(BTreeMap<U256, U256>);

impl Storage {
	pub fn get(&self, index: &U256) -> Option<U256> {
		self.0.get(index).copied()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Entries in no particular order.
	pub fn iter(&self) -> btree_map::Iter<U256, U256> {
		self.0.iter()
	}

	pub(crate) fn insert(&mut self, index: U256, value: U256) {
		self.0.insert(index, value);
	}
}

impl From<BTreeMap<U256, U256>> for Storage {
	fn from(map: BTreeMap<U256, U256>) -> Self {
		Storage(map)
	}
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
/// Represents an account. This is usually returned by the EVM.
pub enum AccountChange {
	/// A full account. The client is expected to replace its own account state with this.
	Full {
		/// Account nonce.
		nonce: U256,
		/// Account address.
		address: H160,
		/// Account balance.
		balance: U256,
		/// Change storage with given indexes and values.
		changing_storage: Storage,
		/// Code associated with this account.
		code: Rc<Vec<u8>>,
	},
	/// Create or delete a (new) account.
	Create {
		/// Account nonce.
		nonce: U256,
		/// Account address.
		address: H160,
		/// Account balance.
		balance: U256,
		/// All storage values of this account, with given indexes and values.
		storage: Storage,
		/// Code associated with this account.
		code: Rc<Vec<u8>>,
	},
	/// Only balance is changed, and it is increasing for this address.
	IncreaseBalance(H160, U256),
	/// Only balance is changed, and it is decreasing for this address.
	DecreaseBalance(H160, U256),
	/// The account is removed.
	Removed(H160),
}

impl AccountChange {
	/// Address of this account.
	pub fn address(&self) -> H160 {
		match self {
			AccountChange::Full { address, .. } => *address,
			AccountChange::Create { address, .. } => *address,
			AccountChange::IncreaseBalance(address, _) => *address,
			AccountChange::DecreaseBalance(address, _) => *address,
			AccountChange::Removed(address) => *address,
		}
	}

	/// Storage carried by this change, if it carries any.
	pub fn storage(&self) -> Option<&Storage> {
		match self {
			AccountChange::Full {
				changing_storage, ..
			} => Some(changing_storage),
			AccountChange::Create { storage, .. } => Some(storage),
			_ => None,
		}
	}

	/// Code carried by this change, if it carries any.
	pub fn code(&self) -> Option<&Rc<Vec<u8>>> {
		match self {
			AccountChange::Full { code, .. } | AccountChange::Create { code, .. } => Some(code),
			_ => None,
		}
	}
}

/// Copy `value` into the front of `buffer`, refusing to truncate.
pub fn copy_into<T: Copy>(value: &[T], buffer: &mut [T]) -> Result<usize, CopyError> {
	if buffer.len() < value.len() {
		return Err(CopyError::BufferTooSmall {
			required: value.len(),
			provided: buffer.len(),
		});
	}

	buffer[..value.len()].copy_from_slice(value);
	Ok(value.len())
}

/// Copy the entries of `storage` into `buffer`, refusing to truncate.
pub fn copy_storage_into(storage: &Storage, buffer: &mut [(U256, U256)]) -> Result<usize, CopyError> {
	if buffer.len() < storage.len() {
		return Err(CopyError::BufferTooSmall {
			required: storage.len(),
			provided: buffer.len(),
		});
	}

	for (slot, (index, value)) in buffer.iter_mut().zip(storage.iter()) {
		*slot = (*index, *value);
	}
	Ok(storage.len())
}
