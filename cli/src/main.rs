//! Run one transaction through SputnikVM, answering every requirement
//! from a YAML state fixture.

use anyhow::{anyhow, bail, Context as _, Result};
use clap::Parser;
use log::{debug, info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use primitive_types::{H160, H256, U256};
use serde::{Deserialize, Serialize};
use sputnikvm::{
	AccountChange, AccountCommitment, Gas, HeaderParams, Log, Patch, PatchBuilder, PrecompiledSet,
	RequireError, Transaction, TransactionAction, TransactionVM,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Parser, Debug)]
#[clap(name = "sputnikvm", version, about = "Run one transaction through SputnikVM")]
struct Opts {
	/// YAML fixture holding the patch, transaction, block header and state.
	fixture: PathBuf,
	/// log4rs YAML configuration. Takes precedence over `--verbose`.
	#[clap(long)]
	log_config: Option<PathBuf>,
	/// Raise the log level; repeat for more.
	#[clap(short, long, parse(from_occurrences))]
	verbose: usize,
	/// Patch preset to use instead of the one named in the fixture.
	#[clap(long)]
	patch: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct Fixture {
	#[serde(default = "default_patch")]
	patch: String,
	/// Custom rule set, built against the Byzantium precompiled contracts.
	#[serde(default)]
	custom_patch: Option<PatchBuilder>,
	transaction: TransactionFixture,
	#[serde(default)]
	block: HeaderParams,
	#[serde(default)]
	accounts: BTreeMap<H160, AccountFixture>,
	#[serde(default)]
	blockhashes: BTreeMap<U256, H256>,
}

fn default_patch() -> String {
	"byzantium".into()
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TransactionFixture {
	caller: H160,
	#[serde(default)]
	gas_price: U256,
	gas_limit: U256,
	/// Target of a message call; a contract creation when absent.
	#[serde(default)]
	to: Option<H160>,
	#[serde(default)]
	value: U256,
	#[serde(default)]
	input: String,
	#[serde(default)]
	nonce: U256,
}

impl TransactionFixture {
	fn to_transaction(&self) -> Result<Transaction> {
		Ok(Transaction {
			caller: self.caller,
			gas_price: Gas::from(self.gas_price),
			gas_limit: Gas::from(self.gas_limit),
			action: match self.to {
				Some(address) => TransactionAction::Call(address),
				None => TransactionAction::Create,
			},
			value: self.value,
			input: Rc::new(decode_hex(&self.input).context("transaction input")?),
			nonce: self.nonce,
		})
	}
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct AccountFixture {
	#[serde(default)]
	nonce: U256,
	#[serde(default)]
	balance: U256,
	#[serde(default)]
	code: String,
	#[serde(default)]
	storage: BTreeMap<U256, U256>,
}

#[derive(Serialize)]
struct Report<'a> {
	status: String,
	failed: bool,
	used_gas: Gas,
	requirements: usize,
	out: String,
	logs: &'a [Log],
	account_changes: &'a [AccountChange],
}

fn decode_hex(value: &str) -> Result<Vec<u8>> {
	let value = value.trim();
	let value = value.strip_prefix("0x").unwrap_or(value);
	hex::decode(value).with_context(|| format!("invalid hex {:?}", value))
}

fn init_logging(opts: &Opts) -> Result<()> {
	if let Some(path) = &opts.log_config {
		log4rs::init_file(path, Default::default())
			.with_context(|| format!("loading log config {}", path.display()))?;
		return Ok(());
	}

	let level = match opts.verbose {
		0 => LevelFilter::Warn,
		1 => LevelFilter::Info,
		2 => LevelFilter::Debug,
		_ => LevelFilter::Trace,
	};
	let stderr = ConsoleAppender::builder()
		.target(log4rs::append::console::Target::Stderr)
		.encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S%.3f)} {h({l:5})} {t} - {m}{n}")))
		.build();
	let config = Config::builder()
		.appender(Appender::builder().build("stderr", Box::new(stderr)))
		.build(Root::builder().appender("stderr").build(level))?;
	log4rs::init_config(config)?;

	Ok(())
}

fn select_patch(name: &str, custom: Option<PatchBuilder>) -> Result<Patch> {
	if let Some(builder) = custom {
		return builder
			.build(PrecompiledSet::Byzantium)
			.map_err(|e| anyhow!("invalid custom patch: {}", e));
	}

	Ok(match name {
		"frontier" => Patch::frontier(),
		"homestead" => Patch::homestead(),
		"eip150" => Patch::eip150(),
		"eip160" => Patch::eip160(),
		"byzantium" => Patch::byzantium(),
		"constantinople" => Patch::constantinople(),
		other => bail!("unknown patch {:?}", other),
	})
}

/// Commit the datum the VM asked for. Accounts missing from the fixture
/// do not exist.
fn answer(vm: &mut TransactionVM, fixture: &Fixture, require: RequireError) -> Result<()> {
	let result = match require {
		RequireError::Account(address) => match fixture.accounts.get(&address) {
			Some(account) => vm.commit_account(AccountCommitment::Full {
				nonce: account.nonce,
				address,
				balance: account.balance,
				code: Rc::new(decode_hex(&account.code)?),
			}),
			None => vm.commit_nonexist(address),
		},
		RequireError::AccountCode(address) => match fixture.accounts.get(&address) {
			Some(account) => vm.commit_account_code(address, decode_hex(&account.code)?),
			None => vm.commit_nonexist(address),
		},
		RequireError::AccountStorage(address, index) => {
			let value = fixture
				.accounts
				.get(&address)
				.and_then(|account| account.storage.get(&index).copied())
				.unwrap_or_default();
			vm.commit_account_storage(address, index, value)
		}
		RequireError::Blockhash(number) => {
			let hash = fixture.blockhashes.get(&number).copied().unwrap_or_default();
			vm.commit_blockhash(number, hash)
		}
	};

	result.map_err(|e| anyhow!("commit for {:?} rejected: {}", require, e))
}

/// Run the fixture transaction to the end, answering every requirement.
/// Returns the exited VM and the number of requirements answered.
fn execute(fixture: &Fixture, patch_name: Option<&str>) -> Result<(TransactionVM, usize)> {
	let patch_name = patch_name.unwrap_or(&fixture.patch);
	let patch = select_patch(patch_name, fixture.custom_patch.clone())?;
	let transaction = fixture.transaction.to_transaction()?;

	let mut vm = TransactionVM::new(patch, transaction, fixture.block.clone());
	let mut requirements = 0;
	while let Err(require) = vm.fire() {
		requirements += 1;
		debug!("answering {:?}", require);
		answer(&mut vm, fixture, require)?;
	}
	info!(
		"exited with {:?} after {} requirements",
		vm.status(),
		requirements
	);

	Ok((vm, requirements))
}

fn main() -> Result<()> {
	let opts = Opts::parse();
	init_logging(&opts)?;

	let source = fs::read_to_string(&opts.fixture)
		.with_context(|| format!("reading fixture {}", opts.fixture.display()))?;
	let fixture: Fixture = serde_yaml::from_str(&source).context("parsing fixture")?;

	let (vm, requirements) = execute(&fixture, opts.patch.as_deref())?;

	let report = Report {
		status: format!("{:?}", vm.status()),
		failed: vm.status_failed(),
		used_gas: vm.used_gas(),
		requirements,
		out: format!("0x{}", hex::encode(vm.out())),
		logs: vm.logs(),
		account_changes: vm.account_changes(),
	};
	print!("{}", serde_yaml::to_string(&report)?);

	Ok(())
}
