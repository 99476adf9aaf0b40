//! Manifest load tester CLI
//!
//! Generates signed transactions against a fixed or fetched account context
//! and reports generation throughput. Every setting can come from a flag, the
//! environment, or a `.env` file.
//!
//! # Example
//!
//! ```bash
//! # 10 seconds of mixed load from two generated accounts
//! CHAIN_ID=manifest-1 manifest-load-tester -w 4 -d 10
//!
//! # Fetch account number and sequence, write transactions for a broadcaster
//! manifest-load-tester --chain-id manifest-1 --lcd-url http://localhost:1317 \
//!     --user-keys $KEY1,$KEY2 --weights bank_send=3,create_group=1 \
//!     --max-txs 1000 -o txs.hex
//! ```

use anyhow::Context;
use clap::Parser;
use manifest_load_txgen::config::DEFAULT_RANDOM_MEMO_LEN;
use manifest_load_txgen::{
    parse_weights, AccountContextSource, AccountPool, LcdClient, LoadTestConfig, MemoPolicy,
    Params, Runner, SigningPipeline, TxClientFactory,
};
use manifest_load_types::{KeyType, SborTxCodec, DEFAULT_ACCOUNT_PREFIX};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Manifest ledger load tester
#[derive(Parser, Debug)]
#[command(name = "manifest-load-tester")]
#[command(version, about, long_about = None)]
struct Args {
    /// Chain id bound into every signature
    #[arg(long, env = "CHAIN_ID")]
    chain_id: String,

    /// Amount moved by each bank send
    #[arg(long, env = "AMOUNT", default_value_t = 1)]
    amount: u64,

    /// Denomination of transfers and fees
    #[arg(long, env = "DENOM", default_value = manifest_load_txgen::config::DEFAULT_DENOM)]
    denom: String,

    /// Flat fee per transaction
    #[arg(long, env = "FEE", default_value_t = 5)]
    fee: u64,

    /// Gas limit per transaction
    #[arg(long, env = "GAS_LIMIT", default_value_t = 200_000)]
    gas_limit: u64,

    /// Length of the random metadata of a new group
    #[arg(long, env = "CREATE_GROUP_METADATA_SIZE", default_value_t = 100)]
    create_group_metadata_size: usize,

    /// Comma-separated hex private keys. Accounts are generated when omitted.
    #[arg(long, env = "USER_KEYS", value_delimiter = ',')]
    user_keys: Vec<String>,

    /// Number of generated accounts when no keys are given
    #[arg(short = 'a', long, env = "ACCOUNTS", default_value_t = 2)]
    accounts: usize,

    /// Key algorithm of the accounts (secp256k1 or ed25519)
    #[arg(long, env = "KEY_TYPE", default_value = "secp256k1")]
    key_type: KeyType,

    /// Bech32 prefix of account addresses
    #[arg(long, env = "ACCOUNT_PREFIX", default_value = DEFAULT_ACCOUNT_PREFIX)]
    account_prefix: String,

    /// LCD endpoint for account number and sequence. Fixed context when omitted.
    #[arg(long, env = "LCD_URL")]
    lcd_url: Option<String>,

    /// Account number of the fixed context
    #[arg(long, env = "ACCOUNT_NUMBER", default_value_t = 0)]
    account_number: u64,

    /// Sequence of the fixed context
    #[arg(long, env = "SEQUENCE", default_value_t = 0)]
    sequence: u64,

    /// Shape weights, e.g. bank_send=3,create_group=1
    #[arg(long, env = "WEIGHTS", default_value = "bank_send=1,create_group=1")]
    weights: String,

    /// Fixed memo for every transaction
    #[arg(long, env = "MEMO", conflicts_with = "random_memo")]
    memo: Option<String>,

    /// Random alphanumeric memo per transaction
    #[arg(long)]
    random_memo: bool,

    /// Timeout height, zero for none
    #[arg(long, env = "TIMEOUT_HEIGHT", default_value_t = 0)]
    timeout_height: u64,

    /// Number of worker threads
    #[arg(short = 'w', long, default_value_t = 1)]
    workers: usize,

    /// Run duration in seconds, zero to run until --max-txs
    #[arg(short = 'd', long, default_value_t = 10)]
    duration: u64,

    /// Stop after this many transactions
    #[arg(long)]
    max_txs: Option<u64>,

    /// Seed for reproducible runs. Entropy when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds between progress lines
    #[arg(long, default_value_t = 1)]
    progress_interval: u64,

    /// Write generated transactions as hex lines to this file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "warn,manifest_load_txgen=info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let pool = build_pool(&args)?;
    let pipeline = build_pipeline(&args)?;

    let memo = match (&args.memo, args.random_memo) {
        (_, true) => MemoPolicy::Random {
            len: DEFAULT_RANDOM_MEMO_LEN,
        },
        (Some(memo), false) => MemoPolicy::Fixed(memo.clone()),
        (None, false) => MemoPolicy::default(),
    };
    let params = Params::new()
        .with_amount(args.amount)
        .with_denom(&args.denom)
        .with_fee(args.fee)
        .with_gas_limit(args.gas_limit)
        .with_create_group_metadata_size(args.create_group_metadata_size)
        .with_memo(memo)
        .with_timeout_height(args.timeout_height);

    let mut factory = TxClientFactory::new(pool, params, pipeline)?;
    for (shape, weight) in parse_weights(&args.weights)? {
        factory.register_shape(shape, weight);
    }

    let mut config = LoadTestConfig::new()
        .with_workers(args.workers)
        .with_duration(Duration::from_secs(args.duration))
        .with_progress_interval(Duration::from_secs(args.progress_interval));
    if let Some(max_txs) = args.max_txs {
        config = config.with_max_txs(max_txs);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let mut runner = Runner::new(factory, config)?;
    if let Some(path) = &args.output {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        runner = runner.with_sink(Box::new(BufWriter::new(file)));
        info!(path = %path.display(), "Writing transactions");
    }

    let report = runner.run()?;
    report.print();
    Ok(())
}

fn build_pool(args: &Args) -> anyhow::Result<AccountPool> {
    let keys: Vec<&str> = args
        .user_keys
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();

    let pool = if keys.is_empty() {
        AccountPool::generate(args.accounts, args.key_type, &args.account_prefix)?
    } else {
        AccountPool::from_hex_keys(&keys, args.key_type, &args.account_prefix)
            .context("Failed to load USER_KEYS")?
    };

    for account in pool.iter() {
        info!(name = account.name(), address = %account.address(), "Loaded account");
    }
    Ok(pool)
}

fn build_pipeline(args: &Args) -> anyhow::Result<SigningPipeline> {
    let context = match &args.lcd_url {
        Some(url) => {
            info!(url, "Fetching account context from LCD");
            AccountContextSource::Online(Arc::new(LcdClient::new(url.clone())?))
        }
        None => AccountContextSource::Fixed {
            account_number: args.account_number,
            sequence: args.sequence,
        },
    };

    Ok(SigningPipeline::new(
        args.chain_id.clone(),
        context,
        Arc::new(SborTxCodec::new()),
    ))
}
