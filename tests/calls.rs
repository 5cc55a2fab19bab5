mod mock;

use mock::{block, call, caller, MockAccount, MockHost};
use primitive_types::{H160, U256};
use sputnikvm::{
	AccountChange, CopyError, ExitError, Gas, Patch, PatchBuilder, PrecompiledSet, Transaction,
	TransactionVM, VMStatus,
};

const CALL: u8 = 0xf1;
const DELEGATECALL: u8 = 0xf4;
const STATICCALL: u8 = 0xfa;

// PUSH1 1, PUSH1 0, SSTORE, PUSH1 0, PUSH1 0, LOG0,
// PUSH1 0x2a, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
const CALLEE_CODE: &str = "600160005560006000a0602a60005260206000f3";
// Same as above, but ending with REVERT.
const REVERTING_CALLEE_CODE: &str = "600160005560006000a0602a60005260206000fd";
// JUMPDEST, PUSH1 0, JUMP
const LOOPING_CALLEE_CODE: &str = "5b600056";

fn outer() -> H160 {
	H160::from_low_u64_be(0xa0)
}

fn inner() -> H160 {
	H160::from_low_u64_be(0xb0)
}

/// Call `target` with all gas, store the success flag in slot 1 and return
/// the 32 bytes of output.
fn caller_code(opcode: u8, target: H160) -> String {
	// PUSH1 32, PUSH1 0, PUSH1 0, PUSH1 0
	let mut code = String::from("6020600060006000");
	if opcode == CALL {
		// value
		code.push_str("6000");
	}
	code.push_str(&format!("73{}", hex::encode(target.as_bytes())));
	// GAS, opcode
	code.push_str(&format!("5a{:02x}", opcode));
	// PUSH1 1, SSTORE, PUSH1 32, PUSH1 0, RETURN
	code.push_str("60015560206000f3");
	code
}

fn run(opcode: u8, callee: &str, outer_slot: Option<u64>) -> TransactionVM {
	run_with(Patch::byzantium(), opcode, callee, outer_slot)
}

fn run_with(patch: Patch, opcode: u8, callee: &str, outer_slot: Option<u64>) -> TransactionVM {
	let mut outer_account = MockAccount::with_code(&caller_code(opcode, inner()));
	if let Some(value) = outer_slot {
		outer_account = outer_account.storage(1, value);
	}

	let mut host = MockHost::new();
	host.insert(outer(), outer_account);
	host.insert(inner(), MockAccount::with_code(callee));

	let mut vm = TransactionVM::new(patch, call(outer(), 1_000_000), block());
	host.run(&mut vm);
	vm
}

fn storage_of(vm: &TransactionVM, address: H160) -> Vec<(U256, U256)> {
	let len = vm.account_change_storage_len(address).unwrap();
	let mut buffer = vec![(U256::zero(), U256::zero()); len];
	vm.copy_account_change_storage(address, &mut buffer).unwrap();
	buffer
}

fn pairs(entries: &[(u64, u64)]) -> Vec<(U256, U256)> {
	entries
		.iter()
		.map(|(index, value)| (U256::from(*index), U256::from(*value)))
		.collect()
}

#[test]
fn nested_call_keeps_effects_and_output() {
	let vm = run(CALL, CALLEE_CODE, None);

	assert_eq!(vm.status(), VMStatus::ExitedOk);
	assert_eq!(vm.out().len(), 32);
	assert_eq!(vm.out()[31], 0x2a);
	assert_eq!(vm.logs_len(), 1);
	assert_eq!(vm.log(0).map(|log| log.address), Some(inner()));
	assert_eq!(storage_of(&vm, outer()), pairs(&[(1, 1)]));
	assert_eq!(storage_of(&vm, inner()), pairs(&[(0, 1)]));
}

#[test]
fn reverted_call_discards_logs_and_state() {
	let vm = run(CALL, REVERTING_CALLEE_CODE, Some(7));

	assert_eq!(vm.status(), VMStatus::ExitedOk);
	// Revert data still reaches the caller's memory.
	assert_eq!(vm.out()[31], 0x2a);
	assert_eq!(vm.logs_len(), 0);
	assert_eq!(storage_of(&vm, outer()), pairs(&[(1, 0)]));
	assert_eq!(
		vm.account_change_storage_len(inner()),
		Err(CopyError::NotFound)
	);
}

#[test]
fn return_data_is_visible_after_call() {
	// CALL inner with all gas and no output area, POP,
	// RETURNDATASIZE, PUSH1 0, SSTORE,
	// PUSH1 32, PUSH1 0, PUSH1 0, RETURNDATACOPY,
	// PUSH1 0, MLOAD, PUSH1 1, SSTORE, STOP
	let code = format!(
		"6000600060006000600073{}5af150 3d600055 6020600060003e 600051600155 00",
		hex::encode(inner().as_bytes())
	)
	.replace(' ', "");

	let mut host = MockHost::new();
	host.insert(outer(), MockAccount::with_code(&code));
	host.insert(inner(), MockAccount::with_code(CALLEE_CODE));
	let mut vm = TransactionVM::new(Patch::byzantium(), call(outer(), 1_000_000), block());
	host.run(&mut vm);

	assert_eq!(vm.status(), VMStatus::ExitedOk);
	assert_eq!(storage_of(&vm, outer()), pairs(&[(0, 32), (1, 0x2a)]));
}

#[test]
fn failed_call_keeps_a_64th_of_the_gas() {
	let vm = run(CALL, LOOPING_CALLEE_CODE, Some(7));

	assert_eq!(vm.status(), VMStatus::ExitedOk);
	assert_eq!(storage_of(&vm, outer()), pairs(&[(1, 0)]));
	assert!(vm.used_gas() < Gas::from(1_000_000u64));
}

#[test]
fn forwarding_all_gas_starves_the_caller() {
	let patch = PatchBuilder {
		call_create_l64_after_gas: false,
		..PatchBuilder::byzantium()
	}
	.build(PrecompiledSet::Byzantium)
	.unwrap();
	let vm = run_with(patch, CALL, LOOPING_CALLEE_CODE, Some(7));

	assert_eq!(vm.status(), VMStatus::ExitedErr(ExitError::OutOfGas));
	assert_eq!(vm.used_gas(), Gas::from(1_000_000u64));
}

#[test]
fn requesting_more_gas_than_left_fails_the_frame() {
	// Homestead forwards the requested gas only if it is all there.
	let vm = run_with(Patch::homestead(), CALL, CALLEE_CODE, Some(7));

	assert_eq!(vm.status(), VMStatus::ExitedErr(ExitError::OutOfGas));
	assert!(vm.status_failed());
	assert_eq!(vm.used_gas(), Gas::from(1_000_000u64));
	assert_eq!(vm.logs_len(), 0);
}

#[test]
fn static_call_rejects_state_changes() {
	let vm = run(STATICCALL, CALLEE_CODE, Some(7));

	assert_eq!(vm.status(), VMStatus::ExitedOk);
	assert_eq!(vm.logs_len(), 0);
	assert_eq!(vm.out(), &[0u8; 32][..]);
	assert_eq!(storage_of(&vm, outer()), pairs(&[(1, 0)]));
	assert_eq!(
		vm.account_change_storage_len(inner()),
		Err(CopyError::NotFound)
	);
}

#[test]
fn delegatecall_runs_against_caller_storage() {
	let vm = run(DELEGATECALL, CALLEE_CODE, None);

	assert_eq!(vm.status(), VMStatus::ExitedOk);
	assert_eq!(vm.log(0).map(|log| log.address), Some(outer()));
	assert_eq!(storage_of(&vm, outer()), pairs(&[(0, 1), (1, 1)]));
	assert_eq!(
		vm.account_change_storage_len(inner()),
		Err(CopyError::NotFound)
	);
}

#[test]
fn call_depth_is_bounded_by_patch() {
	let patch = PatchBuilder {
		callstack_limit: 3,
		..PatchBuilder::byzantium()
	}
	.build(PrecompiledSet::Byzantium)
	.unwrap();
	let recursive = H160::from_low_u64_be(0xd0);

	// Bump slot 0, then CALL ADDRESS with all gas, POP, STOP.
	let code = "6000546001016000556000600060006000600030 5af15000".replace(' ', "");
	let mut host = MockHost::new();
	host.insert(recursive, MockAccount::with_code(&code));

	let mut vm = TransactionVM::new(patch, call(recursive, 1_000_000), block());
	host.run(&mut vm);

	assert_eq!(vm.status(), VMStatus::ExitedOk);
	// Frames at depth 0 to 3 ran; depth 3 could not call further.
	assert_eq!(storage_of(&vm, recursive), pairs(&[(0, 4)]));
}

#[test]
fn value_transfer_creates_missing_account() {
	let target = H160::from_low_u64_be(0x7a);
	let host = MockHost::new();
	let transaction = Transaction {
		value: U256::from(1000u64),
		..call(target, 21_000)
	};
	let mut vm = TransactionVM::new(Patch::byzantium(), transaction, block());
	host.run(&mut vm);

	assert_eq!(vm.status(), VMStatus::ExitedOk);
	let created = vm
		.account_changes()
		.iter()
		.find(|change| change.address() == target)
		.unwrap();
	match created {
		AccountChange::Create { balance, nonce, .. } => {
			assert_eq!(*balance, U256::from(1000u64));
			assert_eq!(*nonce, U256::zero());
		}
		other => panic!("unexpected change {:?}", other),
	}
	let sender = vm
		.account_changes()
		.iter()
		.find(|change| change.address() == caller())
		.unwrap();
	match sender {
		AccountChange::Full { balance, .. } => {
			assert_eq!(*balance, U256::from(1_000_000_000_000u64 - 1000));
		}
		other => panic!("unexpected change {:?}", other),
	}
}
