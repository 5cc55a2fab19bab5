use super::{linear_cost, Precompiled};
use crate::Gas;
use alloc::vec::Vec;
use core::cmp::min;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};
use sputnikvm_core::ExitError;

/// ECRECOVER precompiled contract at `0x01`.
pub struct ECRecover;

impl Precompiled for ECRecover {
	fn gas(&self, _data: &[u8]) -> Gas {
		Gas::from(3000u64)
	}

	fn step(&self, data: &[u8]) -> Result<Vec<u8>, ExitError> {
		let mut input = [0u8; 128];
		input[..min(data.len(), 128)].copy_from_slice(&data[..min(data.len(), 128)]);

		// v is a full word and only 27 or 28 are accepted.
		if input[32..63] != [0u8; 31] || ![27, 28].contains(&input[63]) {
			return Ok(Vec::new());
		}

		let signature = match Signature::from_slice(&input[64..128]) {
			Ok(signature) => signature,
			Err(_) => return Ok(Vec::new()),
		};
		let recovery_id = match RecoveryId::from_byte(input[63] - 27) {
			Some(recovery_id) => recovery_id,
			None => return Ok(Vec::new()),
		};
		let public =
			match VerifyingKey::recover_from_prehash(&input[0..32], &signature, recovery_id) {
				Ok(public) => public,
				Err(_) => return Ok(Vec::new()),
			};

		// Uncompressed SEC1 encoding, without the leading 0x04 tag.
		let encoded = public.to_encoded_point(false);
		let hash = Keccak256::digest(&encoded.as_bytes()[1..]);

		let mut ret = [0u8; 32];
		ret[12..].copy_from_slice(&hash[12..]);
		Ok(ret.to_vec())
	}
}

/// SHA256 precompiled contract at `0x02`.
pub struct Sha256;

impl Precompiled for Sha256 {
	fn gas(&self, data: &[u8]) -> Gas {
		linear_cost(data.len(), 60, 12)
	}

	fn step(&self, data: &[u8]) -> Result<Vec<u8>, ExitError> {
		Ok(sha2::Sha256::digest(data).to_vec())
	}
}

/// RIPEMD160 precompiled contract at `0x03`. The 20-byte digest is
/// left-padded to a full word.
pub struct Ripemd160;

impl Precompiled for Ripemd160 {
	fn gas(&self, data: &[u8]) -> Gas {
		linear_cost(data.len(), 600, 120)
	}

	fn step(&self, data: &[u8]) -> Result<Vec<u8>, ExitError> {
		let mut ret = [0u8; 32];
		ret[12..].copy_from_slice(&ripemd::Ripemd160::digest(data));
		Ok(ret.to_vec())
	}
}

/// Identity precompiled contract at `0x04`.
pub struct Identity;

impl Precompiled for Identity {
	fn gas(&self, data: &[u8]) -> Gas {
		linear_cost(data.len(), 15, 3)
	}

	fn step(&self, data: &[u8]) -> Result<Vec<u8>, ExitError> {
		Ok(data.to_vec())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sha256_of_empty_input() {
		assert_eq!(
			Sha256.step(&[]).unwrap(),
			hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
				.unwrap()
		);
		assert_eq!(Sha256.gas(&[]), Gas::from(60u64));
		assert_eq!(Sha256.gas(&[0u8; 33]), Gas::from(84u64));
	}

	#[test]
	fn ripemd160_is_left_padded() {
		let out = Ripemd160.step(&[]).unwrap();
		assert_eq!(out.len(), 32);
		assert_eq!(&out[..12], &[0u8; 12]);
		assert_eq!(
			&out[12..],
			&hex::decode("9c1185a5c5e9fc54612808977ee8f548b2258d31").unwrap()[..]
		);
	}

	#[test]
	fn ecrecover_rejects_bad_v() {
		let mut input = [0u8; 128];
		input[63] = 29;
		assert_eq!(ECRecover.step(&input).unwrap(), Vec::<u8>::new());
	}

	#[test]
	fn ecrecover_recovers_signer() {
		use k256::ecdsa::SigningKey;

		let secret =
			hex::decode("45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8")
				.unwrap();
		let key = SigningKey::from_slice(&secret).unwrap();
		let hash = [0x42u8; 32];
		let (signature, recovery_id) = key.sign_prehash_recoverable(&hash).unwrap();

		let mut input = [0u8; 128];
		input[..32].copy_from_slice(&hash);
		input[63] = 27 + recovery_id.to_byte();
		input[64..].copy_from_slice(&signature.to_bytes());

		let out = ECRecover.step(&input).unwrap();
		assert_eq!(&out[..12], &[0u8; 12]);
		assert_eq!(
			&out[12..],
			&hex::decode("a94f5374fce5edbc8e2a8697c15331677e6ebf0b").unwrap()[..]
		);
	}
}
