use super::Control;
use crate::{ExitError, ExitFatal, ExitSucceed, Machine};
use core::cmp::min;
use primitive_types::U256;

#[inline]
pub fn codesize(state: &mut Machine) -> Control {
	let size = U256::from(state.code.len());
	push_u256!(state, size);
	Control::Continue(1)
}

#[inline]
pub fn codecopy(state: &mut Machine) -> Control {
	pop_u256!(state, memory_offset, code_offset, len);

	try_or_fail!(state.memory.resize_offset(memory_offset, len));
	match state
		.memory
		.copy_large(memory_offset, code_offset, len, &state.code)
	{
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

#[inline]
pub fn calldataload(state: &mut Machine) -> Control {
	pop_u256!(state, index);

	let mut load = [0u8; 32];
	if index <= crate::utils::USIZE_MAX {
		let index = index.as_usize();
		if index < state.data.len() {
			let end = min(index.saturating_add(32), state.data.len());
			load[..(end - index)].copy_from_slice(&state.data[index..end]);
		}
	}

	push_u256!(state, U256::from_big_endian(&load[..]));
	Control::Continue(1)
}

#[inline]
pub fn calldatasize(state: &mut Machine) -> Control {
	let len = U256::from(state.data.len());
	push_u256!(state, len);
	Control::Continue(1)
}

#[inline]
pub fn calldatacopy(state: &mut Machine) -> Control {
	pop_u256!(state, memory_offset, data_offset, len);

	try_or_fail!(state.memory.resize_offset(memory_offset, len));
	match state
		.memory
		.copy_large(memory_offset, data_offset, len, &state.data)
	{
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

#[inline]
pub fn pop(state: &mut Machine) -> Control {
	pop_u256!(state, _val);
	Control::Continue(1)
}

#[inline]
pub fn mload(state: &mut Machine) -> Control {
	pop_u256!(state, index);
	try_or_fail!(state.memory.resize_offset(index, U256::from(32)));
	let index = as_usize_or_fail!(index);
	let value = U256::from_big_endian(&state.memory.get(index, 32)[..]);
	push_u256!(state, value);
	Control::Continue(1)
}

#[inline]
pub fn mstore(state: &mut Machine) -> Control {
	pop_u256!(state, index, value);
	try_or_fail!(state.memory.resize_offset(index, U256::from(32)));
	let index = as_usize_or_fail!(index);
	let mut bytes = [0u8; 32];
	value.to_big_endian(&mut bytes[..]);
	match state.memory.set(index, &bytes[..], Some(32)) {
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

#[inline]
pub fn mstore8(state: &mut Machine) -> Control {
	pop_u256!(state, index, value);
	try_or_fail!(state.memory.resize_offset(index, U256::one()));
	let index = as_usize_or_fail!(index);
	let value = (value.low_u32() & 0xff) as u8;
	match state.memory.set(index, &[value], Some(1)) {
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

#[inline]
pub fn jump(state: &mut Machine) -> Control {
	pop_u256!(state, dest);
	let dest = as_usize_or_fail!(dest, ExitError::InvalidJump);

	Control::Jump(dest)
}

#[inline]
pub fn jumpi(state: &mut Machine) -> Control {
	pop_u256!(state, dest, value);

	if value != U256::zero() {
		let dest = as_usize_or_fail!(dest, ExitError::InvalidJump);
		Control::Jump(dest)
	} else {
		Control::Continue(1)
	}
}

#[inline]
pub fn pc(state: &mut Machine, position: usize) -> Control {
	push_u256!(state, U256::from(position));
	Control::Continue(1)
}

#[inline]
pub fn msize(state: &mut Machine) -> Control {
	let len = state.memory.effective_len();
	push_u256!(state, len);
	Control::Continue(1)
}

#[inline]
pub fn push(state: &mut Machine, n: usize, position: usize) -> Control {
	let end = min(position + 1 + n, state.code.len());
	let slice = &state.code[(position + 1)..end];
	let mut val = [0u8; 32];
	val[(32 - n)..(32 - n + slice.len())].copy_from_slice(slice);

	push_u256!(state, U256::from_big_endian(&val[..]));
	Control::Continue(1 + n)
}

#[inline]
pub fn dup(state: &mut Machine, n: usize) -> Control {
	let value = try_or_fail!(state.stack.peek(n - 1));
	push_u256!(state, value);
	Control::Continue(1)
}

#[inline]
pub fn swap(state: &mut Machine, n: usize) -> Control {
	let val1 = try_or_fail!(state.stack.peek(0));
	let val2 = try_or_fail!(state.stack.peek(n));
	try_or_fail!(state.stack.set(0, val2));
	try_or_fail!(state.stack.set(n, val1));
	Control::Continue(1)
}

#[inline]
pub fn ret(state: &mut Machine) -> Control {
	pop_u256!(state, start, len);
	try_or_fail!(set_return_range(state, start, len));
	Control::Exit(ExitSucceed::Returned.into())
}

#[inline]
pub fn revert(state: &mut Machine) -> Control {
	pop_u256!(state, start, len);
	try_or_fail!(set_return_range(state, start, len));
	Control::Exit(ExitError::Reverted.into())
}

fn set_return_range(state: &mut Machine, start: U256, len: U256) -> Result<(), ExitError> {
	if len.is_zero() {
		state.return_range = U256::zero()..U256::zero();
		return Ok(());
	}

	let end = start.checked_add(len).ok_or(ExitError::InvalidRange)?;
	if end > crate::utils::USIZE_MAX {
		return Err(ExitError::InvalidRange);
	}
	state.memory.resize_end(end)?;
	state.return_range = start..end;
	Ok(())
}

