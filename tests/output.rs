mod mock;

use mock::{beneficiary, block, call, caller, MockAccount, MockHost};
use primitive_types::{H160, H256, U256};
use sputnikvm::{create_address, CopyError, Gas, Patch, RequireError, Transaction, TransactionVM};

// PUSH4 0xdeadbeef, PUSH1 0, MSTORE, PUSH1 2, PUSH1 1, PUSH1 4, PUSH1 28,
// LOG2, STOP
const LOGGER_CODE: &str = "63deadbeef600052600260016004601ca200";

// Deploys PUSH1 0x2a, STOP.
//
// PUSH3 0x602a00, PUSH1 0, MSTORE, PUSH1 3, PUSH1 29, RETURN
const DEPLOYER_INIT_CODE: &str = "62602a006000526003601df3";

fn logger() -> H160 {
	H160::from_low_u64_be(0x10)
}

fn logged_vm() -> TransactionVM {
	let mut host = MockHost::new();
	host.insert(logger(), MockAccount::with_code(LOGGER_CODE));
	let mut vm = TransactionVM::new(Patch::byzantium(), call(logger(), 100_000), block());
	host.run(&mut vm);
	vm
}

#[test]
fn nothing_is_copied_before_exit() {
	let mut vm = TransactionVM::new(Patch::byzantium(), call(logger(), 100_000), block());
	assert_eq!(vm.fire(), Err(RequireError::Account(caller())));

	let mut buffer = [0u8; 8];
	assert_eq!(vm.copy_log_data(0, &mut buffer), Err(CopyError::NotExited));
	assert_eq!(vm.log_topics_len(0), Err(CopyError::NotExited));
	assert_eq!(
		vm.account_change_code_len(caller()),
		Err(CopyError::NotExited)
	);
	assert_eq!(vm.used_gas(), Gas::zero());
	assert!(vm.out().is_empty());
	assert_eq!(vm.logs_len(), 0);
}

#[test]
fn log_topics_and_data_are_copied() {
	let vm = logged_vm();

	assert_eq!(vm.logs_len(), 1);
	assert_eq!(vm.log_topics_len(0), Ok(2));
	assert_eq!(vm.log_topic(0, 0), Ok(H256::from_low_u64_be(1)));
	assert_eq!(vm.log_topic(0, 1), Ok(H256::from_low_u64_be(2)));
	assert_eq!(vm.log_topic(0, 2), Err(CopyError::NotFound));
	assert_eq!(vm.log_data_len(0), Ok(4));
	assert_eq!(vm.log_data_len(1), Err(CopyError::NotFound));

	let mut buffer = [0u8; 6];
	assert_eq!(vm.copy_log_data(0, &mut buffer), Ok(4));
	assert_eq!(&buffer[..4], &[0xde, 0xad, 0xbe, 0xef]);
}

#[test]
fn short_buffers_are_refused() {
	let vm = logged_vm();

	let mut buffer = [0u8; 3];
	assert_eq!(
		vm.copy_log_data(0, &mut buffer),
		Err(CopyError::BufferTooSmall {
			required: 4,
			provided: 3
		})
	);
	assert_eq!(buffer, [0, 0, 0]);
}

#[test]
fn deployed_code_is_copied() {
	let host = MockHost::new();
	let created = create_address(caller(), U256::zero());
	let mut vm = TransactionVM::new(
		Patch::byzantium(),
		mock::create(DEPLOYER_INIT_CODE, 200_000),
		block(),
	);
	host.run(&mut vm);

	assert_eq!(vm.account_change_code_len(created), Ok(3));
	assert_eq!(vm.account_change_storage_len(created), Ok(0));

	let mut code = [0u8; 3];
	assert_eq!(vm.copy_account_change_code(created, &mut code), Ok(3));
	assert_eq!(code, [0x60, 0x2a, 0x00]);

	let mut short = [0u8; 2];
	assert_eq!(
		vm.copy_account_change_code(created, &mut short),
		Err(CopyError::BufferTooSmall {
			required: 3,
			provided: 2
		})
	);

	let unknown = H160::from_low_u64_be(0xdead);
	assert_eq!(vm.account_change_code_len(unknown), Err(CopyError::NotFound));
}

#[test]
fn balance_only_changes_carry_no_code_or_storage() {
	let host = MockHost::new();
	let transaction = Transaction {
		gas_price: Gas::from(1u64),
		..call(H160::from_low_u64_be(0x7a), 21_000)
	};
	let mut vm = TransactionVM::new(Patch::byzantium(), transaction, block());
	host.run(&mut vm);

	assert_eq!(vm.account_change_storage_len(beneficiary()), Ok(0));
	assert_eq!(vm.account_change_code_len(beneficiary()), Ok(0));
	assert_eq!(vm.copy_account_change_code(beneficiary(), &mut []), Ok(0));
	assert_eq!(
		vm.copy_account_change_storage(beneficiary(), &mut []),
		Ok(0)
	);
}
