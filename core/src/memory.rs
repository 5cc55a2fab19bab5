use crate::{ExitError, ExitFatal};
use alloc::vec::Vec;
use core::cmp::min;
use primitive_types::U256;

/// A sequencial memory. It uses Rust's `Vec` for internal
/// representation.
///
/// `effective_len` is the active memory size that gas has been paid for,
/// always a multiple of 32. The backing vector grows lazily on writes.
#[derive(Clone, Debug)]
pub struct Memory {
	data: Vec<u8>,
	effective_len: U256,
	limit: usize,
}

impl Memory {
	/// Create a new memory with the given limit.
	pub fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			effective_len: U256::zero(),
			limit,
		}
	}

	/// Memory limit.
	pub fn limit(&self) -> usize {
		self.limit
	}

	/// Get the length of the backing buffer.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Get the effective length.
	pub fn effective_len(&self) -> U256 {
		self.effective_len
	}

	/// Return true if the backing buffer is empty.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Return the full memory.
	pub fn data(&self) -> &Vec<u8> {
		&self.data
	}

	/// Resize the memory, making it cover the memory region of `offset..(offset + len)`,
	/// with 32 bytes as the step. If the length is zero, this function does nothing.
	pub fn resize_offset(&mut self, offset: U256, len: U256) -> Result<(), ExitError> {
		if len == U256::zero() {
			return Ok(());
		}

		if let Some(end) = offset.checked_add(len) {
			self.resize_end(end)
		} else {
			Err(ExitError::InvalidRange)
		}
	}

	/// Resize the memory, making it cover to `end`, with 32 bytes as the step.
	pub fn resize_end(&mut self, end: U256) -> Result<(), ExitError> {
		if end > self.effective_len {
			let new_end = next_multiple_of_32(end).ok_or(ExitError::InvalidRange)?;
			self.effective_len = new_end;
		}

		Ok(())
	}

	/// Get memory region at given offset. Bytes past the backing buffer read
	/// as zero.
	///
	/// ## Panics
	///
	/// Value of `size` is considered trusted. If they're too large,
	/// the program can run out of memory, or it can overflow.
	pub fn get(&self, offset: usize, size: usize) -> Vec<u8> {
		let mut ret = Vec::new();
		ret.resize(size, 0);

		if offset < self.data.len() {
			let end = min(offset.saturating_add(size), self.data.len());
			ret[..(end - offset)].copy_from_slice(&self.data[offset..end]);
		}

		ret
	}

	/// Set memory region at given offset. The offset and value is considered
	/// untrusted. Writes that would end past the memory limit are refused.
	pub fn set(
		&mut self,
		offset: usize,
		value: &[u8],
		target_size: Option<usize>,
	) -> Result<(), ExitFatal> {
		let target_size = target_size.unwrap_or(value.len());
		if target_size == 0 {
			return Ok(());
		}

		if offset
			.checked_add(target_size)
			.map(|pos| pos > self.limit)
			.unwrap_or(true)
		{
			return Err(ExitFatal::NotSupported);
		}

		if self.data.len() < offset + target_size {
			self.data.resize(offset + target_size, 0);
		}

		if target_size > value.len() {
			self.data[offset..(value.len() + offset)].clone_from_slice(value);
			for byte in &mut self.data[(offset + value.len())..(offset + target_size)] {
				*byte = 0;
			}
		} else {
			self.data[offset..(target_size + offset)].clone_from_slice(&value[..target_size]);
		}

		Ok(())
	}

	/// Copy `len` bytes of `data` starting at `data_offset` into the memory,
	/// zero-filling whatever lies past the end of `data`.
	pub fn copy_large(
		&mut self,
		memory_offset: U256,
		data_offset: U256,
		len: U256,
		data: &[u8],
	) -> Result<(), ExitFatal> {
		// A zero-length copy is a no-op regardless of offsets.
		if len.is_zero() {
			return Ok(());
		}

		if memory_offset > crate::USIZE_MAX || len > crate::USIZE_MAX {
			return Err(ExitFatal::NotSupported);
		}
		let memory_offset = memory_offset.as_usize();
		let ulen = len.as_usize();

		let data = if data_offset > crate::USIZE_MAX {
			&[]
		} else {
			let data_offset = data_offset.as_usize();
			if data_offset > data.len() {
				&[]
			} else {
				&data[data_offset..min(data_offset.saturating_add(ulen), data.len())]
			}
		};

		self.set(memory_offset, data, Some(ulen))
	}
}

/// Rounds up `x` to the closest multiple of 32. If `x % 32 == 0` then `x` is returned.
#[inline]
fn next_multiple_of_32(x: U256) -> Option<U256> {
	let r = x.low_u32() & 31;
	if r == 0 {
		Some(x)
	} else {
		x.checked_add(U256::from(32 - r))
	}
}
