use crate::ExitError;
use alloc::vec::Vec;
use primitive_types::U256;

/// EVM stack.
#[derive(Clone, Debug)]
pub struct Stack {
	data: Vec<U256>,
	limit: usize,
}

impl Stack {
	/// Create a new stack with given limit.
	pub fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			limit,
		}
	}

	/// Stack limit.
	#[inline]
	pub fn limit(&self) -> usize {
		self.limit
	}

	/// Stack length.
	#[inline]
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Whether the stack is empty.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Stack data, bottom first.
	#[inline]
	pub fn data(&self) -> &Vec<U256> {
		&self.data
	}

	/// Pop a value from the stack. If the stack is already empty, returns the
	/// `StackUnderflow` error.
	#[inline]
	pub fn pop(&mut self) -> Result<U256, ExitError> {
		self.data.pop().ok_or(ExitError::StackUnderflow)
	}

	/// Push a new value into the stack. If it will exceed the stack limit,
	/// returns `StackOverflow` error and leaves the stack unchanged.
	#[inline]
	pub fn push(&mut self, value: U256) -> Result<(), ExitError> {
		if self.data.len() + 1 > self.limit {
			return Err(ExitError::StackOverflow);
		}
		self.data.push(value);
		Ok(())
	}

	/// Peek a value at given index for the stack, where the top of
	/// the stack is at index `0`. If the index is too large,
	/// `StackUnderflow` is returned.
	#[inline]
	pub fn peek(&self, no_from_top: usize) -> Result<U256, ExitError> {
		if self.data.len() > no_from_top {
			Ok(self.data[self.data.len() - no_from_top - 1])
		} else {
			Err(ExitError::StackUnderflow)
		}
	}

	/// Set a value at given index for the stack, where the top of the
	/// stack is at index `0`.
	#[inline]
	pub fn set(&mut self, no_from_top: usize, val: U256) -> Result<(), ExitError> {
		if self.data.len() > no_from_top {
			let len = self.data.len();
			self.data[len - no_from_top - 1] = val;
			Ok(())
		} else {
			Err(ExitError::StackUnderflow)
		}
	}

	/// Check that `pop` items can be removed and `push` items added
	/// afterwards, without touching the stack.
	pub fn check_pop_push(&self, pop: usize, push: usize) -> Result<(), ExitError> {
		if self.data.len() < pop {
			return Err(ExitError::StackUnderflow);
		}
		if self.data.len() - pop + push > self.limit {
			return Err(ExitError::StackOverflow);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn push_respects_limit() {
		let mut stack = Stack::new(2);
		stack.push(U256::one()).unwrap();
		stack.push(U256::from(2)).unwrap();
		assert_eq!(stack.push(U256::from(3)), Err(ExitError::StackOverflow));
		assert_eq!(stack.len(), 2);
	}

	#[test]
	fn peek_and_set_count_from_top() {
		let mut stack = Stack::new(16);
		stack.push(U256::from(10)).unwrap();
		stack.push(U256::from(20)).unwrap();
		assert_eq!(stack.peek(0), Ok(U256::from(20)));
		assert_eq!(stack.peek(1), Ok(U256::from(10)));
		assert_eq!(stack.peek(2), Err(ExitError::StackUnderflow));

		stack.set(1, U256::from(11)).unwrap();
		assert_eq!(stack.pop(), Ok(U256::from(20)));
		assert_eq!(stack.pop(), Ok(U256::from(11)));
		assert_eq!(stack.pop(), Err(ExitError::StackUnderflow));
	}

	#[test]
	fn check_pop_push_does_not_mutate() {
		let mut stack = Stack::new(2);
		stack.push(U256::one()).unwrap();
		assert_eq!(stack.check_pop_push(2, 1), Err(ExitError::StackUnderflow));
		assert_eq!(stack.check_pop_push(0, 2), Err(ExitError::StackOverflow));
		assert_eq!(stack.check_pop_push(1, 2), Ok(()));
		assert_eq!(stack.len(), 1);
	}
}
