use criterion::{black_box, criterion_group, criterion_main, Criterion};
use primitive_types::{H160, U256};
use sputnikvm::{
	AccountCommitment, Gas, HeaderParams, Patch, RequireError, Transaction, TransactionAction,
	TransactionVM,
};
use std::rc::Rc;

// Count down from 0x1000 and stop.
//
// PUSH2 0x1000, JUMPDEST, PUSH1 1, SWAP1, SUB, DUP1, PUSH1 3, JUMPI, STOP
const LOOP_CODE: &str = "6110005b600190038060035700";

fn caller() -> H160 {
	H160::from_low_u64_be(0x1000)
}

fn target() -> H160 {
	H160::from_low_u64_be(0x2000)
}

fn run_loop(code: Rc<Vec<u8>>) -> Gas {
	let transaction = Transaction {
		caller: caller(),
		gas_price: Gas::zero(),
		gas_limit: Gas::from(10_000_000u64),
		action: TransactionAction::Call(target()),
		value: U256::zero(),
		input: Rc::new(Vec::new()),
		nonce: U256::zero(),
	};
	let mut vm = TransactionVM::new(Patch::byzantium(), transaction, HeaderParams::default());

	while let Err(require) = vm.fire() {
		let result = match require {
			RequireError::Account(address) if address == caller() => {
				vm.commit_account(AccountCommitment::Full {
					nonce: U256::zero(),
					address,
					balance: U256::from(1_000_000_000u64),
					code: Rc::new(Vec::new()),
				})
			}
			RequireError::Account(address) if address == target() => {
				vm.commit_account(AccountCommitment::Full {
					nonce: U256::zero(),
					address,
					balance: U256::zero(),
					code: code.clone(),
				})
			}
			RequireError::Account(address) | RequireError::AccountCode(address) => {
				vm.commit_nonexist(address)
			}
			other => panic!("unexpected requirement {:?}", other),
		};
		result.unwrap();
	}

	vm.used_gas()
}

fn criterion_benchmark(c: &mut Criterion) {
	let code = Rc::new(hex::decode(LOOP_CODE).unwrap());
	c.bench_function("countdown 0x1000", |b| {
		b.iter(|| run_loop(black_box(code.clone())))
	});
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
