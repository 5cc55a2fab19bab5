use super::Precompiled;
use crate::Gas;
use alloc::vec::Vec;
use bn::{AffineG1, AffineG2, Fq, Fq2, Fr, Group, Gt, G1, G2};
use core::cmp::min;
use sputnikvm_core::ExitError;

const FQ_LEN: usize = 32;
const G1_LEN: usize = 2 * FQ_LEN;
const G2_LEN: usize = 4 * FQ_LEN;
const PAIR_ELEMENT_LEN: usize = G1_LEN + G2_LEN;

/// BN128 point addition at `0x06`.
pub struct Bn128Add;

/// BN128 scalar multiplication at `0x07`.
pub struct Bn128Mul;

/// BN128 pairing check at `0x08`.
pub struct Bn128Pairing;

fn right_pad<const LEN: usize>(data: &[u8]) -> [u8; LEN] {
	let mut padded = [0u8; LEN];
	let len = min(data.len(), LEN);
	padded[..len].copy_from_slice(&data[..len]);
	padded
}

// Malformed points consume all gas given to the frame.
fn read_fq(input: &[u8]) -> Result<Fq, ExitError> {
	Fq::from_slice(&input[..FQ_LEN]).map_err(|_| ExitError::OutOfGas)
}

fn read_g1(input: &[u8]) -> Result<G1, ExitError> {
	let x = read_fq(&input[0..FQ_LEN])?;
	let y = read_fq(&input[FQ_LEN..G1_LEN])?;

	if x == Fq::zero() && y == Fq::zero() {
		Ok(G1::zero())
	} else {
		AffineG1::new(x, y)
			.map(Into::into)
			.map_err(|_| ExitError::OutOfGas)
	}
}

fn read_g2(input: &[u8]) -> Result<G2, ExitError> {
	// Each coordinate is encoded imaginary part first.
	let x = Fq2::new(
		read_fq(&input[FQ_LEN..2 * FQ_LEN])?,
		read_fq(&input[0..FQ_LEN])?,
	);
	let y = Fq2::new(
		read_fq(&input[3 * FQ_LEN..4 * FQ_LEN])?,
		read_fq(&input[2 * FQ_LEN..3 * FQ_LEN])?,
	);

	if x.is_zero() && y.is_zero() {
		Ok(G2::zero())
	} else {
		AffineG2::new(x, y)
			.map(Into::into)
			.map_err(|_| ExitError::OutOfGas)
	}
}

fn encode_g1(point: G1) -> Result<Vec<u8>, ExitError> {
	let mut out = [0u8; G1_LEN];
	if let Some(affine) = AffineG1::from_jacobian(point) {
		affine
			.x()
			.to_big_endian(&mut out[..FQ_LEN])
			.map_err(|_| ExitError::OutOfGas)?;
		affine
			.y()
			.to_big_endian(&mut out[FQ_LEN..])
			.map_err(|_| ExitError::OutOfGas)?;
	}
	Ok(out.to_vec())
}

impl Precompiled for Bn128Add {
	fn gas(&self, _data: &[u8]) -> Gas {
		Gas::from(500u64)
	}

	fn step(&self, data: &[u8]) -> Result<Vec<u8>, ExitError> {
		let input = right_pad::<{ 2 * G1_LEN }>(data);
		let p1 = read_g1(&input[..G1_LEN])?;
		let p2 = read_g1(&input[G1_LEN..])?;
		encode_g1(p1 + p2)
	}
}

impl Precompiled for Bn128Mul {
	fn gas(&self, _data: &[u8]) -> Gas {
		Gas::from(40_000u64)
	}

	fn step(&self, data: &[u8]) -> Result<Vec<u8>, ExitError> {
		let input = right_pad::<{ G1_LEN + 32 }>(data);
		let point = read_g1(&input[..G1_LEN])?;
		let scalar = Fr::from_slice(&input[G1_LEN..]).map_err(|_| ExitError::OutOfGas)?;
		encode_g1(point * scalar)
	}
}

impl Precompiled for Bn128Pairing {
	fn gas(&self, data: &[u8]) -> Gas {
		Gas::from(100_000u64) + Gas::from(80_000u64) * Gas::from(data.len() / PAIR_ELEMENT_LEN)
	}

	fn step(&self, data: &[u8]) -> Result<Vec<u8>, ExitError> {
		if data.len() % PAIR_ELEMENT_LEN != 0 {
			return Err(ExitError::OutOfGas);
		}

		let mut pairs = Vec::with_capacity(data.len() / PAIR_ELEMENT_LEN);
		for element in data.chunks(PAIR_ELEMENT_LEN) {
			let g1 = read_g1(&element[..G1_LEN])?;
			let g2 = read_g2(&element[G1_LEN..])?;
			if !g1.is_zero() && !g2.is_zero() {
				pairs.push((g1, g2));
			}
		}

		let success = pairs.is_empty() || bn::pairing_batch(&pairs) == Gt::one();

		let mut out = [0u8; 32];
		if success {
			out[31] = 1;
		}
		Ok(out.to_vec())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn generator() -> Vec<u8> {
		let mut input = [0u8; G1_LEN];
		input[31] = 1;
		input[63] = 2;
		input.to_vec()
	}

	#[test]
	fn adds_infinity_points() {
		assert_eq!(Bn128Add.step(&[]).unwrap(), vec![0u8; 64]);
	}

	#[test]
	fn doubling_matches_multiplication() {
		let mut add_input = generator();
		add_input.extend(generator());
		let doubled = Bn128Add.step(&add_input).unwrap();

		let mut mul_input = generator();
		let mut two = [0u8; 32];
		two[31] = 2;
		mul_input.extend_from_slice(&two);
		assert_eq!(Bn128Mul.step(&mul_input).unwrap(), doubled);
	}

	#[test]
	fn rejects_point_off_the_curve() {
		let mut input = [0u8; 128];
		input[31] = 1;
		input[63] = 1;
		assert_eq!(Bn128Add.step(&input), Err(ExitError::OutOfGas));
	}

	#[test]
	fn empty_pairing_succeeds() {
		let mut expected = vec![0u8; 32];
		expected[31] = 1;
		assert_eq!(Bn128Pairing.step(&[]).unwrap(), expected);
		assert_eq!(Bn128Pairing.gas(&[]), Gas::from(100_000u64));
		assert_eq!(Bn128Pairing.step(&[0u8; 10]), Err(ExitError::OutOfGas));
	}
}
