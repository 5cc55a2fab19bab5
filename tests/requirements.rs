mod mock;

use mock::{block, call, caller, MockAccount, MockHost};
use primitive_types::{H160, H256, U256};
use sputnikvm::{
	AccountCommitment, CommitError, Patch, RequireError, TransactionVM, VMStatus,
};
use std::rc::Rc;

// PUSH1 0, SLOAD, PUSH1 1, ADD, PUSH1 0, SSTORE, STOP
const COUNTER_CODE: &str = "60005460010160005500";

fn counter() -> H160 {
	H160::from_low_u64_be(0xc0)
}

fn external() -> H160 {
	H160::from_low_u64_be(0xe0)
}

fn probe() -> H160 {
	H160::from_low_u64_be(0xf0)
}

fn counter_host(initial: u64) -> MockHost {
	let mut host = MockHost::new();
	host.insert(counter(), MockAccount::with_code(COUNTER_CODE).storage(0, initial));
	host
}

fn storage_of(vm: &TransactionVM, address: H160) -> Vec<(U256, U256)> {
	let len = vm.account_change_storage_len(address).unwrap();
	let mut buffer = vec![(U256::zero(), U256::zero()); len];
	vm.copy_account_change_storage(address, &mut buffer).unwrap();
	buffer
}

#[test]
fn fire_repeats_the_outstanding_requirement() {
	let mut vm = TransactionVM::new(Patch::byzantium(), call(counter(), 100_000), block());

	assert_eq!(vm.fire(), Err(RequireError::Account(caller())));
	assert_eq!(vm.fire(), Err(RequireError::Account(caller())));
	assert_eq!(vm.step(), Err(RequireError::Account(caller())));
	assert_eq!(vm.pending(), Some(RequireError::Account(caller())));
	assert_eq!(vm.status(), VMStatus::Running);
}

#[test]
fn commitments_must_answer_the_requirement() {
	let host = counter_host(41);
	let mut vm = TransactionVM::new(Patch::byzantium(), call(counter(), 100_000), block());

	assert_eq!(vm.fire(), Err(RequireError::Account(caller())));
	assert_eq!(
		vm.commit_nonexist(counter()),
		Err(CommitError::InvalidCommitment)
	);
	assert_eq!(
		vm.commit_blockhash(U256::one(), H256::zero()),
		Err(CommitError::InvalidCommitment)
	);
	host.answer(&mut vm, RequireError::Account(caller())).unwrap();
	assert_eq!(vm.pending(), None);

	assert_eq!(vm.fire(), Err(RequireError::Account(counter())));
	assert_eq!(
		vm.commit_nonexist(caller()),
		Err(CommitError::AlreadyCommitted)
	);
	host.answer(&mut vm, RequireError::Account(counter())).unwrap();

	assert_eq!(
		vm.fire(),
		Err(RequireError::AccountStorage(counter(), U256::zero()))
	);
	assert_eq!(
		vm.commit_account_storage(counter(), U256::one(), U256::zero()),
		Err(CommitError::InvalidCommitment)
	);
	vm.commit_account_storage(counter(), U256::zero(), U256::from(41u64))
		.unwrap();

	assert_eq!(vm.fire(), Ok(()));
	assert_eq!(vm.status(), VMStatus::ExitedOk);
	assert_eq!(
		storage_of(&vm, counter()),
		vec![(U256::zero(), U256::from(42u64))]
	);

	// Nothing is pending once the engine exited.
	assert_eq!(
		vm.commit_account_storage(counter(), U256::from(5u64), U256::zero()),
		Err(CommitError::InvalidCommitment)
	);
}

/// Run a contract storing EXTCODESIZE of `external()` in slot 0, answering
/// the code requirement with `answer`.
fn extcodesize_with<F>(answer: F) -> TransactionVM
where
	F: Fn(&mut TransactionVM) -> Result<(), CommitError>,
{
	// PUSH20 external, EXTCODESIZE, PUSH1 0, SSTORE, STOP
	let code = format!("73{}3b60005500", hex::encode(external().as_bytes()));
	let mut host = MockHost::new();
	host.insert(probe(), MockAccount::with_code(&code));

	let mut vm = TransactionVM::new(Patch::byzantium(), call(probe(), 100_000), block());
	let mut asked = false;
	while let Err(require) = vm.fire() {
		if require == RequireError::AccountCode(external()) {
			asked = true;
			answer(&mut vm).unwrap();
		} else {
			host.answer(&mut vm, require).unwrap();
		}
	}
	assert!(asked);
	assert_eq!(vm.status(), VMStatus::ExitedOk);
	vm
}

#[test]
fn code_requirement_accepts_code_full_or_nonexist() {
	let vm = extcodesize_with(|vm| {
		assert_eq!(
			vm.commit_account_storage(external(), U256::zero(), U256::zero()),
			Err(CommitError::InvalidCommitment)
		);
		vm.commit_account_code(external(), vec![0x60, 0x00, 0x00])
	});
	assert_eq!(storage_of(&vm, probe()), vec![(U256::zero(), U256::from(3u64))]);
	assert!(vm.account_changes().iter().all(|change| change.address() != external()));

	let vm = extcodesize_with(|vm| {
		vm.commit_account(AccountCommitment::Full {
			nonce: U256::one(),
			address: external(),
			balance: U256::zero(),
			code: Rc::new(vec![0x00; 5]),
		})
	});
	assert_eq!(storage_of(&vm, probe()), vec![(U256::zero(), U256::from(5u64))]);

	// Storing zero over zero leaves the probe untouched.
	let vm = extcodesize_with(|vm| vm.commit_nonexist(external()));
	assert!(vm.account_changes().iter().all(|change| change.address() != probe()));
}

#[test]
fn blockhash_is_required_only_inside_the_window() {
	let hash = H256::repeat_byte(0xab);
	let run = |number: u16| {
		// PUSH2 number, BLOCKHASH, PUSH1 0, SSTORE, STOP
		let code = format!("61{:04x}4060005500", number);
		let mut host = MockHost::new();
		host.insert(probe(), MockAccount::with_code(&code));
		host.blockhashes.insert(U256::from(999u64), hash);

		let mut vm = TransactionVM::new(Patch::byzantium(), call(probe(), 100_000), block());
		let requirements = host.run(&mut vm);
		(vm, requirements)
	};

	let (vm, requirements) = run(999);
	assert!(requirements.contains(&RequireError::Blockhash(U256::from(999u64))));
	assert_eq!(
		storage_of(&vm, probe()),
		vec![(U256::zero(), U256::from_big_endian(hash.as_bytes()))]
	);

	// The current block is outside the window and reads as zero.
	let (vm, requirements) = run(1000);
	assert!(requirements
		.iter()
		.all(|require| !matches!(require, RequireError::Blockhash(_))));
	assert!(vm.account_changes().iter().all(|change| change.address() != probe()));
}

#[test]
fn blockhash_cannot_be_committed_twice() {
	// PUSH2 999, BLOCKHASH, PUSH2 999, BLOCKHASH, STOP
	let mut host = MockHost::new();
	host.insert(probe(), MockAccount::with_code("6103e7406103e74000"));
	let mut vm = TransactionVM::new(Patch::byzantium(), call(probe(), 100_000), block());

	let mut blockhash_requirements = 0;
	while let Err(require) = vm.fire() {
		if let RequireError::Blockhash(number) = require {
			blockhash_requirements += 1;
			vm.commit_blockhash(number, H256::repeat_byte(1)).unwrap();
			assert_eq!(
				vm.commit_blockhash(number, H256::repeat_byte(1)),
				Err(CommitError::AlreadyCommitted)
			);
		} else {
			host.answer(&mut vm, require).unwrap();
		}
	}

	assert_eq!(blockhash_requirements, 1);
	assert_eq!(vm.status(), VMStatus::ExitedOk);
}

#[test]
fn identical_commits_give_identical_results() {
	let host = counter_host(7);
	let run = || {
		let mut vm = TransactionVM::new(Patch::byzantium(), call(counter(), 100_000), block());
		let requirements = host.run(&mut vm);
		(
			requirements,
			vm.status(),
			vm.used_gas(),
			vm.logs().to_vec(),
			vm.account_changes().to_vec(),
		)
	};

	let first = run();
	let second = run();
	assert_eq!(first, second);
	assert_eq!(
		first.0,
		vec![
			RequireError::Account(caller()),
			RequireError::Account(counter()),
			RequireError::AccountStorage(counter(), U256::zero()),
		]
	);
}
