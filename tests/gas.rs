mod mock;

use mock::{beneficiary, block, call, caller, MockAccount, MockHost};
use primitive_types::{H160, U256};
use sputnikvm::{
	AccountChange, ExitError, ExitFatal, Gas, Patch, PatchBuilder, PreExecutionError,
	PrecompiledSet, Transaction, TransactionVM, VMStatus,
};

fn contract() -> H160 {
	H160::from_low_u64_be(0xc0)
}

fn host_with(code: &str) -> MockHost {
	let mut host = MockHost::new();
	host.insert(contract(), MockAccount::with_code(code));
	host
}

#[test]
fn consumed_gas_never_decreases() {
	let inner = H160::from_low_u64_be(0xb0);
	// CALL inner with all gas, then STOP.
	let outer_code = format!(
		"60006000600060006000 73{} 5af100",
		hex::encode(inner.as_bytes())
	)
	.replace(' ', "");
	let mut host = host_with(&outer_code);
	// PUSH1 1, PUSH1 0, SSTORE, STOP
	host.insert(inner, MockAccount::with_code("600160005500"));

	let mut vm = TransactionVM::new(Patch::byzantium(), call(contract(), 200_000), block());
	let mut last = Gas::zero();
	while vm.status() == VMStatus::Running {
		match vm.step() {
			Ok(()) => {
				let consumed = vm.consumed_gas();
				assert!(consumed >= last);
				last = consumed;
			}
			Err(require) => host.answer(&mut vm, require).unwrap(),
		}
	}

	assert_eq!(vm.status(), VMStatus::ExitedOk);
	assert!(last > Gas::from(41_000u64));
	assert_eq!(vm.used_gas(), last);
}

#[test]
fn refund_is_capped_at_half_of_consumed() {
	// PUSH1 0, PUSH1 0, SSTORE, STOP
	let mut host = MockHost::new();
	host.insert(
		contract(),
		MockAccount::with_code("600060005500").storage(0, 1),
	);
	let mut vm = TransactionVM::new(Patch::byzantium(), call(contract(), 100_000), block());
	host.run(&mut vm);

	assert_eq!(vm.status(), VMStatus::ExitedOk);
	assert_eq!(vm.consumed_gas(), Gas::from(26_006u64));
	assert_eq!(vm.refunded_gas(), Gas::from(15_000u64));
	assert_eq!(vm.used_gas(), Gas::from(13_003u64));
}

#[test]
fn reduced_sstore_metering_charges_dirty_slots_less() {
	// PUSH1 1, PUSH1 0, SSTORE, PUSH1 0, PUSH1 0, SSTORE, STOP
	let code = "60016000556000600055 00".replace(' ', "");

	let host = host_with(&code);
	let mut vm = TransactionVM::new(Patch::byzantium(), call(contract(), 100_000), block());
	host.run(&mut vm);
	assert_eq!(vm.status(), VMStatus::ExitedOk);
	assert_eq!(vm.consumed_gas(), Gas::from(46_012u64));
	assert_eq!(vm.refunded_gas(), Gas::from(15_000u64));
	assert_eq!(vm.used_gas(), Gas::from(31_012u64));

	// Setting a clean zero slot costs the full price, resetting it while
	// dirty costs 200 and refunds the rest.
	let host = host_with(&code);
	let mut vm = TransactionVM::new(Patch::constantinople(), call(contract(), 100_000), block());
	host.run(&mut vm);
	assert_eq!(vm.status(), VMStatus::ExitedOk);
	assert_eq!(vm.consumed_gas(), Gas::from(41_212u64));
	assert_eq!(vm.refunded_gas(), Gas::from(19_800u64));
	assert_eq!(vm.used_gas(), Gas::from(21_412u64));
	assert_eq!(vm.account_changes_len(), 1);
}

#[test]
fn reduced_sstore_metering_refunds_cleared_slots() {
	// PUSH1 0, PUSH1 0, SSTORE, PUSH1 2, PUSH1 0, SSTORE, STOP
	let mut host = MockHost::new();
	host.insert(
		contract(),
		MockAccount::with_code("60006000556002600055 00".replace(' ', "").as_str()).storage(0, 1),
	);
	let mut vm = TransactionVM::new(Patch::constantinople(), call(contract(), 100_000), block());
	host.run(&mut vm);

	assert_eq!(vm.status(), VMStatus::ExitedOk);
	// 5000 to clear, then 200 on the dirty slot. The clearing refund is
	// taken back once the slot is set again.
	assert_eq!(vm.consumed_gas(), Gas::from(26_212u64));
	assert_eq!(vm.refunded_gas(), Gas::zero());
	assert_eq!(vm.used_gas(), Gas::from(26_212u64));
}

#[test]
fn out_of_gas_consumes_gas_limit() {
	// JUMPDEST, PUSH1 0, JUMP
	let host = host_with("5b600056");
	let transaction = Transaction {
		gas_price: Gas::from(1u64),
		..call(contract(), 21_010)
	};
	let mut vm = TransactionVM::new(Patch::byzantium(), transaction, block());
	host.run(&mut vm);

	assert_eq!(vm.status(), VMStatus::ExitedErr(ExitError::OutOfGas));
	assert_eq!(vm.used_gas(), Gas::from(21_010u64));
	assert!(vm.account_changes().contains(&AccountChange::IncreaseBalance(
		beneficiary(),
		U256::from(21_010u64)
	)));
}

#[test]
fn revert_charges_only_used_gas() {
	// PUSH1 0xaa, PUSH1 0, MSTORE8, PUSH1 1, PUSH1 0, REVERT
	let host = host_with("60aa60005360016000fd");
	let mut vm = TransactionVM::new(Patch::byzantium(), call(contract(), 100_000), block());
	host.run(&mut vm);

	assert_eq!(vm.status(), VMStatus::ExitedErr(ExitError::Reverted));
	assert_eq!(vm.used_gas(), Gas::from(21_018u64));
	assert_eq!(vm.out(), &[0xaa]);
	// Only the nonce increment of the caller survives.
	assert_eq!(vm.account_changes_len(), 1);
	assert_eq!(vm.account_change(0).map(|change| change.address()), Some(caller()));
}

#[test]
fn memory_over_limit_is_not_supported() {
	let patch = PatchBuilder {
		memory_limit: 64,
		..PatchBuilder::byzantium()
	}
	.build(PrecompiledSet::Byzantium)
	.unwrap();
	// PUSH1 1, PUSH1 64, MSTORE, STOP
	let host = host_with("600160405200");
	let mut vm = TransactionVM::new(patch, call(contract(), 100_000), block());
	host.run(&mut vm);

	assert_eq!(
		vm.status(),
		VMStatus::ExitedNotSupported(ExitFatal::NotSupported)
	);
	assert_eq!(vm.used_gas(), Gas::from(100_000u64));
}

#[test]
fn invalid_transactions_use_no_gas() {
	let cases = [
		(
			Transaction {
				nonce: U256::from(5u64),
				..call(contract(), 100_000)
			},
			PreExecutionError::InvalidNonce,
		),
		(
			Transaction {
				value: U256::from(2_000_000_000_000u64),
				..call(contract(), 100_000)
			},
			PreExecutionError::InsufficientBalance,
		),
		(
			Transaction {
				gas_price: U256::MAX.into(),
				..call(contract(), 100_000)
			},
			PreExecutionError::InsufficientBalance,
		),
		(
			call(contract(), 20_000),
			PreExecutionError::InsufficientGasLimit,
		),
	];

	for (transaction, error) in cases.iter() {
		let host = host_with("00");
		let mut vm = TransactionVM::new(Patch::byzantium(), transaction.clone(), block());
		host.run(&mut vm);

		assert_eq!(vm.status(), VMStatus::ExitedInvalid(*error));
		assert!(vm.status_failed());
		assert_eq!(vm.used_gas(), Gas::zero());
		assert_eq!(vm.account_changes_len(), 0);
		assert_eq!(vm.logs_len(), 0);
	}
}
