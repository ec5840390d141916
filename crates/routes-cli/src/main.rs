use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use routes_config::{ConfigLoader, DEFAULT_CONFIG_PATH};
use routes_core::{PublishOrchestrator, PublishRequest};
use routes_intent::{hash_intent, IntentBuilder, SimpleIntentParams};
use routes_quote::{select_cheapest_for, select_cheapest_native_send_for};
use routes_types::{
	ChainId, ExecutionState, Intent, IntentExecutionType, Prover, SolverQuote,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod service;

use service::RoutesClient;

#[derive(Parser)]
#[command(name = "routes")]
#[command(about = "Cross-chain intent client", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[arg(short, long, value_name = "FILE", env = "ROUTES_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
	config: PathBuf,

	/// Ignored when RUST_LOG is set
	#[arg(long, env = "ROUTES_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Request solver quotes for a transfer intent
	Quote {
		#[command(flatten)]
		intent: IntentArgs,
		/// Fix the destination amount and ask for the smallest reward
		#[arg(long)]
		reverse: bool,
		#[arg(long)]
		gasless: bool,
	},
	/// Quote, publish and track a transfer intent to fulfillment
	Publish {
		#[command(flatten)]
		intent: IntentArgs,
		/// Sign permits and let the quoting service publish
		#[arg(long)]
		gasless: bool,
		/// Return after source confirmation
		#[arg(long)]
		no_wait: bool,
		/// Give up waiting for fulfillment after this many seconds
		#[arg(long)]
		timeout_secs: Option<u64>,
	},
	/// Print the route, reward and intent hashes of a freshly built intent
	Hash {
		#[command(flatten)]
		intent: IntentArgs,
	},
	/// Validate the configuration file
	Validate,
}

#[derive(Args, Debug)]
struct IntentArgs {
	/// Origin chain id
	#[arg(long)]
	from: u64,
	/// Destination chain id
	#[arg(long)]
	to: u64,
	/// Token delivered on the destination chain
	#[arg(long)]
	route_token: String,
	/// Token paid on the origin chain
	#[arg(long)]
	reward_token: String,
	/// Destination amount in base units
	#[arg(long)]
	amount: String,
	/// Most to spend on the origin chain, in base units
	#[arg(long)]
	limit: String,
	/// Defaults to the configured account
	#[arg(long)]
	creator: Option<String>,
	/// Defaults to the creator
	#[arg(long)]
	recipient: Option<String>,
	/// hyper, meta or a prover contract address
	#[arg(long)]
	prover: Option<Prover>,
	/// Absolute deadline, Unix seconds
	#[arg(long)]
	expiry: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	match &cli.command {
		Commands::Quote {
			intent,
			reverse,
			gasless,
		} => quote(&cli, intent, *reverse, *gasless).await,
		Commands::Publish {
			intent,
			gasless,
			no_wait,
			timeout_secs,
		} => publish(&cli, intent, *gasless, *no_wait, *timeout_secs).await,
		Commands::Hash { intent } => hash(&cli, intent).await,
		Commands::Validate => validate_config(&cli).await,
	}
}

async fn load_client(cli: &Cli) -> Result<RoutesClient> {
	info!("Loading configuration from: {:?}", cli.config);

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")?;

	RoutesClient::from_config(config)
}

fn build_intent(client: &RoutesClient, args: &IntentArgs) -> Result<Intent> {
	let creator = match &args.creator {
		Some(creator) => creator.clone(),
		None => client
			.account_address()
			.map(|a| a.to_string())
			.context("No creator given and no account configured")?,
	};

	let params = SimpleIntentParams {
		creator,
		recipient: args.recipient.clone(),
		origin_chain: ChainId(args.from),
		destination_chain: ChainId(args.to),
		route_token: args.route_token.clone(),
		reward_token: args.reward_token.clone(),
		amount: args.amount.clone(),
		spending_token_limit: args.limit.clone(),
		prover: args.prover,
		expiry_time: args.expiry,
	};

	Ok(client.builder.build_simple_intent(&params)?)
}

fn execution_type(gasless: bool) -> IntentExecutionType {
	if gasless {
		IntentExecutionType::Gasless
	} else {
		IntentExecutionType::SelfPublish
	}
}

fn cheapest<'a>(
	intent: &Intent,
	quotes: &'a [SolverQuote],
	kind: &IntentExecutionType,
) -> Result<&'a SolverQuote> {
	let best = if intent.reward.tokens.is_empty() {
		select_cheapest_native_send_for(quotes, kind)?
	} else {
		select_cheapest_for(quotes, kind)?
	};
	Ok(best)
}

async fn quote(cli: &Cli, args: &IntentArgs, reverse: bool, gasless: bool) -> Result<()> {
	let client = load_client(cli).await?;
	let intent = build_intent(&client, args)?;
	let kind = execution_type(gasless);
	let types = [kind.clone()];

	let quotes = if reverse {
		client.quoting.request_reverse_quotes(&intent, &types).await?
	} else {
		client.quoting.request_quotes(&intent, &types).await?
	};

	let best = cheapest(&intent, &quotes, &kind)?;
	info!(
		quote_id = %best.quote_id,
		solver_id = %best.solver_id,
		"Cheapest of {} quotes",
		quotes.len()
	);

	println!("{}", serde_json::to_string_pretty(&quotes)?);
	Ok(())
}

async fn publish(
	cli: &Cli,
	args: &IntentArgs,
	gasless: bool,
	no_wait: bool,
	timeout_secs: Option<u64>,
) -> Result<()> {
	let client = load_client(cli).await?;
	let intent = build_intent(&client, args)?;
	let kind = execution_type(gasless);

	let quotes = client
		.quoting
		.request_quotes(&intent, std::slice::from_ref(&kind))
		.await?;
	let best = cheapest(&intent, &quotes, &kind)?;
	let entry = best
		.entry_for(&kind)
		.ok_or_else(|| anyhow!("Quote {} has no {} entry", best.quote_id, kind))?;

	let now = chrono::Utc::now().timestamp().max(0) as u64;
	if entry.is_expired(now) {
		bail!("Quote {} expired at {}", best.quote_id, entry.expiry_time);
	}

	let quoted = IntentBuilder::apply_quote(&intent, entry)?;
	if !quoted.is_solvent() {
		bail!(
			"Quote {} rewards {} which does not cover the route amount {}",
			best.quote_id,
			quoted.reward_token_total(),
			quoted.route_token_total()
		);
	}

	let orchestrator = client.orchestrator()?;
	let request = if gasless {
		let vault = orchestrator.resolve_vault_address(&quoted).await?;
		PublishRequest::gasless(quoted, best, Some(vault))
	} else {
		PublishRequest::self_publish(quoted)
	};

	let execution = match orchestrator.publish(&request).await {
		Ok(execution) => execution,
		Err(e) => {
			report(&e.execution);
			return Err(e.into());
		}
	};
	report(&execution);

	if no_wait {
		return Ok(());
	}

	track(&orchestrator, &request.intent, execution, timeout_secs).await
}

async fn track(
	orchestrator: &PublishOrchestrator,
	intent: &Intent,
	execution: ExecutionState,
	timeout_secs: Option<u64>,
) -> Result<()> {
	let timeout = async {
		match timeout_secs {
			Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
			None => std::future::pending::<()>().await,
		}
	};

	tokio::select! {
		result = orchestrator.track_fulfillment(intent, execution) => match result {
			Ok(execution) => {
				report(&execution);
				Ok(())
			}
			Err(e) => {
				report(&e.execution);
				Err(e.into())
			}
		},
		_ = timeout => {
			warn!("Stopped waiting for fulfillment after {}s", timeout_secs.unwrap_or_default());
			Ok(())
		}
		_ = setup_shutdown_signal() => {
			info!("Shutdown signal received, stopped waiting for fulfillment");
			Ok(())
		}
	}
}

fn report(execution: &ExecutionState) {
	if execution.state.is_terminal() && !execution.is_fulfilled() {
		error!("Publish state: {}", execution.state);
	} else {
		info!("Publish state: {}", execution.state);
	}

	for hash in &execution.approval_tx_hashes {
		info!("  Approval: {}", hash);
	}
	if let Some(hash) = execution.publish_tx_hash {
		info!("  Publish: {}", hash);
	}
	if let Some(hash) = execution.intent_hash {
		info!("  Intent hash: {}", hash);
	}
	if let Some(hash) = execution.fulfillment_tx_hash {
		info!("  Fulfillment: {}", hash);
	}
}

async fn hash(cli: &Cli, args: &IntentArgs) -> Result<()> {
	let client = load_client(cli).await?;
	let intent = build_intent(&client, args)?;
	let hashes = hash_intent(&intent);

	println!("route:  {}", hashes.route_hash);
	println!("reward: {}", hashes.reward_hash);
	println!("intent: {}", hashes.intent_hash);
	Ok(())
}

async fn validate_config(cli: &Cli) -> Result<()> {
	info!("Validating configuration file: {:?}", cli.config);

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")?;

	info!("Configuration is valid");
	info!("dApp id: {}", config.client.dapp_id);
	info!("Quoting service: {}", config.quoting.base_url);

	let mut chains: Vec<_> = config.chains.iter().collect();
	chains.sort_by_key(|(id, _)| **id);
	for (id, chain) in chains {
		info!(
			"  Chain {} ({}): intent source {}, inbox {}, {} stablecoins",
			id,
			chain.name.as_deref().unwrap_or("unnamed"),
			chain.intent_source,
			chain.inbox,
			chain.stablecoins.len()
		);
	}

	if config.account.is_none() {
		warn!("No account configured; only quoting and hashing are available");
	}

	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}

async fn setup_shutdown_signal() {
	let ctrl_c = async {
		signal::ctrl_c()
			.await
			.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		signal::unix::signal(signal::unix::SignalKind::terminate())
			.expect("failed to install signal handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
