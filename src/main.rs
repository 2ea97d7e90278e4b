//! solkit - Solana client toolkit CLI
//!
//! Subcommands cover the toolkit surface: fee recommendations, a
//! build/simulate/send transfer pipeline, vanity address grinding, PDA
//! brute-forcing, and the local send history.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solkit::config::Config;
use solkit::fees::PriorityFeeCalculator;
use solkit::history::{HistoryStore, TransactionHistoryItem, TxKind};
use solkit::rpc::{ClusterRpc, SolanaRpc};
use solkit::search::{
    PdaBruteForcer, PdaOptions, Seed, VanityGenerator, VanityOptions,
};
use solkit::tx::instructions::sol_transfer;
use solkit::tx::{
    assemble_signed, ensure_sendable, PriorityFee, RetryManager, RetryOptions,
    TransactionBuilder, TransactionSimulator, TxVersion,
};
use solkit::types::{FeeSpeed, SearchProgress, TransactionUpdate, TxStatus};
use solkit::wallet::WalletManager;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "solkit.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show current priority fee recommendations
    Fees,

    /// Build, simulate, and send a SOL transfer
    Transfer {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Amount in SOL
        #[arg(long)]
        amount_sol: f64,

        /// Fee speed preset (slow, normal, fast, turbo)
        #[arg(long, default_value = "normal", conflicts_with = "micro_lamports")]
        speed: FeeSpeed,

        /// Manual priority fee in micro-lamports per CU
        #[arg(long)]
        micro_lamports: Option<u64>,

        /// Explicit compute unit limit
        #[arg(long)]
        cu_limit: Option<u32>,

        /// Build a v0 transaction instead of legacy
        #[arg(long)]
        versioned: bool,

        /// Simulate only; never broadcast
        #[arg(long)]
        simulate_only: bool,

        /// Keypair file (overrides configuration)
        #[arg(long)]
        keypair: Option<String>,
    },

    /// Grind for a vanity address
    Grind {
        /// Required address prefix (Base58)
        #[arg(long)]
        prefix: Option<String>,

        /// Required address suffix (Base58)
        #[arg(long)]
        suffix: Option<String>,

        /// Match case-insensitively
        #[arg(long)]
        ignore_case: bool,

        /// Give up after this many attempts
        #[arg(long)]
        max_attempts: Option<u64>,

        /// Worker threads (0 = all cores)
        #[arg(long, default_value_t = 0)]
        threads: usize,

        /// Directory to write the found keypair into
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Brute-force a PDA over a seed template
    Pda {
        /// Program ID to derive under
        #[arg(long)]
        program: String,

        /// Seed slots: 'str:<text>' or 'range:<min>:<max>' (repeatable)
        #[arg(long = "seed", required = true)]
        seeds: Vec<String>,

        /// Required address prefix (Base58)
        #[arg(long)]
        prefix: Option<String>,

        /// Required address suffix (Base58)
        #[arg(long)]
        suffix: Option<String>,

        /// Match case-insensitively
        #[arg(long)]
        ignore_case: bool,
    },

    /// Show or clear the local send history
    History {
        /// Delete all history records
        #[arg(long)]
        clear: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "solkit=debug" } else { "solkit=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = Config::from_file_with_env(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;
    debug!(config_path = %args.config, "configuration loaded");

    match args.command {
        Command::Fees => cmd_fees(&config).await,
        Command::Transfer {
            to,
            amount_sol,
            speed,
            micro_lamports,
            cu_limit,
            versioned,
            simulate_only,
            keypair,
        } => {
            cmd_transfer(
                &config,
                &to,
                amount_sol,
                speed,
                micro_lamports,
                cu_limit,
                versioned,
                simulate_only,
                keypair,
            )
            .await
        }
        Command::Grind {
            prefix,
            suffix,
            ignore_case,
            max_attempts,
            threads,
            output,
        } => cmd_grind(&config, prefix, suffix, ignore_case, max_attempts, threads, output).await,
        Command::Pda {
            program,
            seeds,
            prefix,
            suffix,
            ignore_case,
        } => cmd_pda(program, seeds, prefix, suffix, ignore_case).await,
        Command::History { clear } => cmd_history(&config, clear),
    }
}

async fn cmd_fees(config: &Config) -> Result<()> {
    let rpc: Arc<dyn ClusterRpc> = Arc::new(SolanaRpc::from_config(&config.rpc)?);
    let calculator =
        PriorityFeeCalculator::new(rpc).with_fallback(config.fees.fallback_micro_lamports);

    let estimate = calculator.estimate_fee().await;
    println!(
        "base fee: {} micro-lamports/CU (source: {:?})",
        estimate.base_micro_lamports, estimate.source
    );
    for rec in calculator.recommendations().await {
        println!(
            "  {:<7} {:>10} micro-lamports  {:<8} {}",
            rec.speed.to_string(),
            rec.micro_lamports,
            rec.estimated_time,
            rec.description
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_transfer(
    config: &Config,
    to: &str,
    amount_sol: f64,
    speed: FeeSpeed,
    micro_lamports: Option<u64>,
    cu_limit: Option<u32>,
    versioned: bool,
    simulate_only: bool,
    keypair: Option<String>,
) -> Result<()> {
    let recipient = Pubkey::from_str(to).context("Invalid recipient address")?;
    if amount_sol <= 0.0 {
        anyhow::bail!("Amount must be positive");
    }
    let lamports = (amount_sol * LAMPORTS_PER_SOL as f64).round() as u64;

    let keypair_path = keypair.unwrap_or_else(|| config.wallet.keypair_path.clone());
    let wallet = WalletManager::from_file(&keypair_path)?;
    let rpc: Arc<dyn ClusterRpc> = Arc::new(SolanaRpc::from_config(&config.rpc)?);

    let priority_fee = match micro_lamports {
        Some(micro_lamports) => PriorityFee::Manual { micro_lamports },
        None => PriorityFee::Speed(speed),
    };
    let mut builder = TransactionBuilder::new(Arc::clone(&rpc))
        .fee_payer(wallet.pubkey())
        .instruction(sol_transfer(&wallet.pubkey(), &recipient, lamports)?)
        .priority_fee(priority_fee)
        .version(if versioned { TxVersion::V0 } else { TxVersion::Legacy });
    if let Some(limit) = cu_limit {
        builder = builder.compute_unit_limit(limit);
    }
    // Pre-flight balance check before any signing
    let balance = rpc.balance(&wallet.pubkey()).await?;
    if balance < lamports {
        anyhow::bail!(
            "Insufficient balance: {balance} lamports available, {lamports} required"
        );
    }

    let plan = builder.plan().await?;
    println!(
        "plan: {} lamports to {recipient}, priority fee {} micro-lamports/CU",
        lamports, plan.priority_fee_micro_lamports
    );

    // Preflight: a failed simulation blocks the send
    let blockhash = rpc.latest_blockhash().await?;
    let built = assemble_signed(&plan, blockhash, &wallet)?;
    let simulator = TransactionSimulator::new(Arc::clone(&rpc));
    let simulation = simulator.simulate(&built).await?;
    println!(
        "simulation: success={} units={:?}",
        simulation.success, simulation.units_consumed
    );
    if let Some(err) = &simulation.error {
        println!("simulation error: {err}");
    }
    ensure_sendable(&simulation)?;
    if simulate_only {
        return Ok(());
    }

    let history = HistoryStore::open(&config.history.path)?;
    let retry = RetryManager::new(Arc::clone(&rpc), RetryOptions::from(&config.retry));
    let mut recorded: Option<String> = None;
    let on_update = |update: TransactionUpdate| {
        match update.status {
            TxStatus::Sent => {
                let signature = update.signature.map(|s| s.to_string()).unwrap_or_default();
                println!("sent: {signature} (submission {})", update.attempt);
                if recorded.is_none() {
                    let item = TransactionHistoryItem::new(
                        signature.clone(),
                        TxKind::SolTransfer,
                        Some(lamports),
                        format!("{amount_sol} SOL to {recipient}"),
                    );
                    if let Err(err) = history.record(item) {
                        warn!(error = %err, "failed to record history item");
                    }
                    recorded = Some(signature);
                }
            }
            TxStatus::Confirming => println!("confirming (poll {})...", update.attempt),
            other => println!("{other}"),
        };
    };
    let outcome = retry.send_with_retry(&plan, &wallet, on_update).await;

    match outcome {
        Ok(outcome) => {
            let signature = outcome.signature.to_string();
            finalize_history(&history, &recorded, &signature, TxStatus::Confirmed, None, lamports, amount_sol, &recipient);
            println!(
                "confirmed: {} after {} submission(s)",
                signature, outcome.submissions
            );
            Ok(())
        }
        Err(err) => {
            if let Some(signature) = err.signature() {
                let status = match &err {
                    solkit::tx::TxError::OnChain { .. } => TxStatus::Failed,
                    _ => TxStatus::TimedOut,
                };
                finalize_history(
                    &history,
                    &recorded,
                    &signature.to_string(),
                    status,
                    Some(err.to_string()),
                    lamports,
                    amount_sol,
                    &recipient,
                );
            }
            Err(err.into())
        }
    }
}

/// Update the history record for the final signature; resubmissions mean
/// the confirmed signature may differ from the first recorded one.
#[allow(clippy::too_many_arguments)]
fn finalize_history(
    history: &HistoryStore,
    recorded: &Option<String>,
    signature: &str,
    status: TxStatus,
    error: Option<String>,
    lamports: u64,
    amount_sol: f64,
    recipient: &Pubkey,
) {
    let result = if recorded.as_deref() == Some(signature) {
        history.update_status(signature, status, error)
    } else {
        let mut item = TransactionHistoryItem::new(
            signature,
            TxKind::SolTransfer,
            Some(lamports),
            format!("{amount_sol} SOL to {recipient}"),
        );
        item.status = status;
        item.error = error;
        history.record(item)
    };
    if let Err(err) = result {
        warn!(error = %err, "failed to finalize history item");
    }
}

async fn cmd_grind(
    config: &Config,
    prefix: Option<String>,
    suffix: Option<String>,
    ignore_case: bool,
    max_attempts: Option<u64>,
    threads: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    let options = VanityOptions {
        prefix,
        suffix,
        case_insensitive: ignore_case,
        max_attempts,
        threads: if threads == 0 { config.search.threads } else { threads },
    };
    let generator = Arc::new(VanityGenerator::new(options)?);
    println!(
        "grinding (expected ~{:.0} attempts, ctrl-c to stop)",
        generator.expected_attempts()
    );

    let stopper = Arc::clone(&generator);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stopper.stop();
        }
    });

    let (tx, rx) = crossbeam::channel::bounded::<SearchProgress>(64);
    let printer = tokio::task::spawn_blocking(move || {
        for progress in rx {
            eprintln!(
                "  {} attempts | {:.0}/s | {:.1}s",
                progress.attempts,
                progress.rate,
                progress.elapsed.as_secs_f64()
            );
        }
    });
    let runner = Arc::clone(&generator);
    let result = tokio::task::spawn_blocking(move || runner.run(Some(tx))).await?;
    printer.await?;

    match result {
        Some(found) => {
            println!("address: {}", found.address);
            println!("matched: {} after {} attempts", found.matched, found.attempts);
            println!("secret (base58): {}", found.secret_base58());
            if let Some(dir) = output {
                std::fs::create_dir_all(&dir)?;
                let path = dir.join(format!("{}.json", found.address));
                let bytes: Vec<u8> = found.keypair.to_bytes().to_vec();
                std::fs::write(&path, serde_json::to_string(&bytes)?)?;
                println!("keypair written to {}", path.display());
            }
            Ok(())
        }
        None => {
            println!(
                "no match after {} attempts",
                generator.attempts()
            );
            Ok(())
        }
    }
}

async fn cmd_pda(
    program: String,
    seeds: Vec<String>,
    prefix: Option<String>,
    suffix: Option<String>,
    ignore_case: bool,
) -> Result<()> {
    let program_id = Pubkey::from_str(&program).context("Invalid program ID")?;
    let seeds: Vec<Seed> = seeds
        .iter()
        .map(|s| s.parse())
        .collect::<Result<_, _>>()?;
    let mut options = PdaOptions::new(program_id, seeds);
    options.prefix = prefix;
    options.suffix = suffix;
    options.case_insensitive = ignore_case;

    let forcer = Arc::new(PdaBruteForcer::new(options)?);
    println!("deriving over {} candidates (ctrl-c to stop)", forcer.candidate_count());

    let stopper = Arc::clone(&forcer);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stopper.stop();
        }
    });

    let (tx, rx) = crossbeam::channel::bounded::<SearchProgress>(64);
    let printer = tokio::task::spawn_blocking(move || {
        for progress in rx {
            eprintln!("  {} candidates | {:.0}/s", progress.attempts, progress.rate);
        }
    });
    let runner = Arc::clone(&forcer);
    let result = tokio::task::spawn_blocking(move || runner.run(Some(tx))).await?;
    printer.await?;

    match result {
        Some(found) => {
            println!("address: {} (bump {})", found.address, found.bump);
            println!("seeds: {:?}", found.seeds);
            println!("candidates tried: {}", found.attempts);
        }
        None => println!("no match in {} candidates", forcer.attempts()),
    }
    Ok(())
}

fn cmd_history(config: &Config, clear: bool) -> Result<()> {
    let history = HistoryStore::open(&config.history.path)?;
    if clear {
        history.clear()?;
        println!("history cleared");
        return Ok(());
    }
    if history.is_empty() {
        println!("history is empty");
        return Ok(());
    }
    for item in history.items().iter().rev() {
        println!(
            "{}  {:<10} {:<14} {}  {}",
            item.timestamp.format("%Y-%m-%d %H:%M:%S"),
            item.status.to_string(),
            item.kind.to_string(),
            item.signature,
            item.description
        );
        if let Some(err) = &item.error {
            println!("    error: {err}");
        }
    }
    Ok(())
}
