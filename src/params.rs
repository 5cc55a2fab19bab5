//! Parameters used by the VM.

use crate::patch::Patch;
use crate::Gas;
use alloc::rc::Rc;
use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

const G_TRANSACTION: u64 = 21000;
const G_TXDATAZERO: u64 = 4;
const G_TXDATANONZERO: u64 = 68;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
/// Block header.
pub struct HeaderParams {
	/// Block coinbase, the address that mines the block.
	pub beneficiary: H160,
	/// Block timestamp.
	pub timestamp: u64,
	/// The current block number.
	pub number: U256,
	/// Difficulty of the block.
	pub difficulty: U256,
	/// Total block gas limit.
	pub gas_limit: Gas,
}

#[derive(Clone, Debug, Eq, PartialEq)]
/// A VM context. See the Yellow Paper for more information.
pub struct Context {
	/// Address that is executing this runtime.
	pub address: H160,
	/// Address whose code is executed. Differs from `address` for
	/// CALLCODE and DELEGATECALL.
	pub code_address: H160,
	/// Caller of the runtime.
	pub caller: H160,
	/// Code to be executed.
	pub code: Rc<Vec<u8>>,
	/// Data associated with this execution.
	pub data: Rc<Vec<u8>>,
	/// Gas limit.
	pub gas_limit: Gas,
	/// Gas price.
	pub gas_price: Gas,
	/// The origin of the context. The same as caller when it is from
	/// a transaction.
	pub origin: H160,
	/// Value transferred into this runtime.
	pub value: U256,
	/// Value seen by CALLVALUE. Differs from `value` for DELEGATECALL.
	pub apparent_value: U256,
	/// Whether this call is static.
	pub is_static: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
/// Action of a transaction.
pub enum TransactionAction {
	/// Message call to the given address.
	Call(H160),
	/// Contract creation. The input is the init code.
	Create,
}

impl Default for TransactionAction {
	fn default() -> Self {
		TransactionAction::Call(H160::default())
	}
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-serde",
	derive(serde::Serialize, serde::Deserialize)
)]
/// Represents an Ethereum transaction.
pub struct Transaction {
	/// Caller of the transaction. Signature is not checked.
	pub caller: H160,
	/// Gas price.
	pub gas_price: Gas,
	/// Gas limit.
	pub gas_limit: Gas,
	/// Call or create.
	pub action: TransactionAction,
	/// Value transferred with the transaction.
	pub value: U256,
	/// Call data, or init code for a create transaction.
	pub input: Rc<Vec<u8>>,
	/// Nonce of the caller.
	pub nonce: U256,
}

impl Transaction {
	/// Gas charged before the first instruction runs.
	pub fn intrinsic_gas(&self, patch: &Patch) -> Gas {
		let mut gas = Gas::from(G_TRANSACTION);
		if self.action == TransactionAction::Create {
			gas += patch.gas_transaction_create();
		}
		for byte in self.input.iter() {
			gas += if *byte == 0 {
				Gas::from(G_TXDATAZERO)
			} else {
				Gas::from(G_TXDATANONZERO)
			};
		}
		gas
	}

	/// Value reserved from the caller for gas payment.
	pub fn preclaimed_value(&self) -> U256 {
		(self.gas_limit * self.gas_price).into()
	}

	/// Address the transaction runs against.
	pub fn address(&self) -> H160 {
		match self.action {
			TransactionAction::Call(address) => address,
			TransactionAction::Create => create_address(self.caller, self.nonce),
		}
	}
}

/// Address of a contract created by `caller` with the given nonce.
pub fn create_address(caller: H160, nonce: U256) -> H160 {
	let mut stream = rlp::RlpStream::new_list(2);
	stream.append(&caller);
	stream.append(&nonce);
	H256::from_slice(Keccak256::digest(&stream.out()[..]).as_slice()).into()
}

/// Address of a contract created through CREATE2.
pub fn create2_address(caller: H160, salt: H256, init_code: &[u8]) -> H160 {
	let code_hash = H256::from_slice(Keccak256::digest(init_code).as_slice());

	let mut hasher = Keccak256::new();
	hasher.update(&[0xffu8]);
	hasher.update(&caller[..]);
	hasher.update(&salt[..]);
	hasher.update(&code_hash[..]);
	H256::from_slice(hasher.finalize().as_slice()).into()
}
