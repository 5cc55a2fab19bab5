#![cfg(feature = "tracing")]

mod mock;

use mock::{block, call, caller, MockAccount, MockHost};
use primitive_types::{H160, U256};
use sputnikvm::tracing::{self, Event, EventListener};
use sputnikvm::{Patch, RequireError, TransactionVM, VMStatus};

#[derive(Default)]
struct Recorder {
	requires: Vec<RequireError>,
	commits: usize,
	blockhashes: Vec<U256>,
	calls: Vec<H160>,
	exits: Vec<usize>,
}

impl EventListener for Recorder {
	fn event(&mut self, event: Event) {
		match event {
			Event::Require(require) => self.requires.push(require),
			Event::Commit(_) => self.commits += 1,
			Event::CommitBlockhash { number, .. } => self.blockhashes.push(number),
			Event::Call { code_address, .. } => self.calls.push(code_address),
			Event::Exit { depth, .. } => self.exits.push(depth),
			_ => (),
		}
	}
}

#[test]
fn events_follow_the_execution() {
	let outer = H160::from_low_u64_be(0xa0);
	let inner = H160::from_low_u64_be(0xb0);
	// CALL inner with all gas, then STOP.
	let code = format!(
		"6000600060006000600073{}5af100",
		hex::encode(inner.as_bytes())
	);

	let mut host = MockHost::new();
	host.insert(outer, MockAccount::with_code(&code));
	host.insert(inner, MockAccount::with_code("00"));
	let mut vm = TransactionVM::new(Patch::byzantium(), call(outer, 100_000), block());

	let mut recorder = Recorder::default();
	tracing::using(&mut recorder, || {
		host.run(&mut vm);
	});

	assert_eq!(vm.status(), VMStatus::ExitedOk);
	assert_eq!(
		recorder.requires,
		vec![
			RequireError::Account(caller()),
			RequireError::Account(outer),
			RequireError::Account(inner),
		]
	);
	assert_eq!(recorder.commits, 3);
	assert_eq!(recorder.calls, vec![inner]);
	assert_eq!(recorder.exits, vec![1]);
}

#[test]
fn block_hash_commits_are_reported() {
	let contract = H160::from_low_u64_be(0xc0);
	let mut host = MockHost::new();
	// PUSH2 999, BLOCKHASH, STOP
	host.insert(contract, MockAccount::with_code("6103e74000"));
	let mut vm = TransactionVM::new(Patch::byzantium(), call(contract, 100_000), block());

	let mut recorder = Recorder::default();
	tracing::using(&mut recorder, || {
		host.run(&mut vm);
	});

	assert_eq!(vm.status(), VMStatus::ExitedOk);
	assert_eq!(recorder.blockhashes, vec![U256::from(999u64)]);
	assert_eq!(recorder.commits, 2);
}
