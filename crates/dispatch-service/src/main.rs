//! Dispatch client service binary.
//!
//! Wires the HTTP gateway, a local stdin-fed push transport and the engine
//! together. Lines typed (or piped) into the process are either worker
//! commands (`accept`, `reject`, `arrived`, `delivered`, `cancel`, `online`,
//! `offline`, `logout`) or raw push payloads, which makes the full offer
//! lifecycle drivable without a hosted push provider.

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dispatch_config::{Config, ConfigLoader};
use dispatch_core::{DispatchEngine, EngineBuilder, UserCommand};
use dispatch_gateway::HttpGateway;
use dispatch_ingest::{ChannelSource, RawPayload};
use dispatch_types::{
	DispatchEvent, Navigator, OfferEvent, OrderOffer, SessionStore, UiEvent, WorkerId,
};

#[derive(Parser)]
#[command(name = "dispatch-service")]
#[command(about = "Courier dispatch client", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", default_value = "config/local.toml")]
	config: PathBuf,

	#[arg(long, env = "DISPATCH_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the dispatch client
	Start,
	/// Validate the configuration file
	Validate,
}

/// Session store backed by the loaded configuration.
struct ConfigSessionStore {
	worker_id: Option<WorkerId>,
}

#[async_trait]
impl SessionStore for ConfigSessionStore {
	async fn worker_id(&self) -> Option<WorkerId> {
		self.worker_id
	}
}

/// Navigation collaborator that records screen transitions in the log.
struct LogNavigator;

#[async_trait]
impl Navigator for LogNavigator {
	async fn go_to_in_progress(&self, offer: OrderOffer) {
		info!(
			order_id = offer.order_id,
			order_number = %offer.order_number,
			store = %offer.store_name,
			"navigating to in-progress screen"
		);
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	setup_tracing(&cli.log_level)?;

	match cli.command {
		Some(Commands::Start) | None => start(cli).await,
		Some(Commands::Validate) => validate(cli),
	}
}

fn setup_tracing(level: &str) -> Result<()> {
	let filter = EnvFilter::try_new(level).context("Invalid log level")?;
	tracing_subscriber::fmt().with_env_filter(filter).init();
	Ok(())
}

fn validate(cli: Cli) -> Result<()> {
	let config = ConfigLoader::from_file(&cli.config)?;
	info!(path = ?cli.config, "configuration is valid");
	info!(gateway = %config.gateway.base_url, channel = %config.push.channel);
	Ok(())
}

async fn start(cli: Cli) -> Result<()> {
	info!("Starting courier dispatch client");

	let config = ConfigLoader::from_file(&cli.config).context("Failed to load configuration")?;
	let worker_id = config.worker.id;

	let gateway = HttpGateway::new(
		&config.gateway.base_url,
		Duration::from_secs(config.gateway.timeout_secs),
	)
	.context("Failed to build HTTP gateway")?;

	let (source, feed) = ChannelSource::new();
	let mut engine = build_engine(config, gateway, source, worker_id).await?;

	let commands = engine.command_sender();
	let events = engine.event_bus().subscribe();

	tokio::spawn(render_events(events));
	tokio::spawn(read_stdin(commands, feed));

	engine.run().await.context("Engine stopped with an error")?;
	info!("Courier dispatch client stopped");
	Ok(())
}

async fn build_engine(
	config: Config,
	gateway: HttpGateway,
	source: ChannelSource,
	worker_id: Option<WorkerId>,
) -> Result<DispatchEngine> {
	EngineBuilder::new()
		.with_config(config)
		.with_gateway(Arc::new(gateway))
		.with_navigator(Arc::new(LogNavigator))
		.with_session_store(Box::new(ConfigSessionStore { worker_id }))
		.with_push_source(Box::new(source))
		.build()
		.await
		.context("Failed to build dispatch engine (is a worker id configured?)")
}

/// Translate stdin lines into user commands or raw push payloads.
async fn read_stdin(
	commands: mpsc::UnboundedSender<UserCommand>,
	feed: mpsc::UnboundedSender<RawPayload>,
) {
	let stdin = tokio::io::BufReader::new(tokio::io::stdin());
	let mut lines = stdin.lines();

	while let Ok(Some(line)) = lines.next_line().await {
		let line = line.trim().to_string();
		if line.is_empty() {
			continue;
		}

		let command = match line.split_whitespace().next() {
			Some("accept") => Some(UserCommand::Accept),
			Some("reject") => Some(UserCommand::Reject),
			Some("arrived") => Some(UserCommand::ArrivedAtStore),
			Some("delivered") => Some(UserCommand::Delivered),
			Some("cancel") => Some(UserCommand::CancelJob {
				reason: line
					.strip_prefix("cancel")
					.map(|r| r.trim().to_string())
					.filter(|r| !r.is_empty()),
			}),
			Some("online") => Some(UserCommand::SetAvailability(true)),
			Some("offline") => Some(UserCommand::SetAvailability(false)),
			Some("logout") | Some("quit") => Some(UserCommand::Logout),
			_ => None,
		};

		let send_failed = match command {
			Some(command) => commands.send(command).is_err(),
			// Anything else is treated as a raw push payload.
			None => feed.send(line).is_err(),
		};
		if send_failed {
			break;
		}
	}
}

/// Print lifecycle events the way a screen would render them.
async fn render_events(mut events: tokio::sync::broadcast::Receiver<DispatchEvent>) {
	while let Ok(event) = events.recv().await {
		match event {
			DispatchEvent::Offer(OfferEvent::Surfaced {
				offer,
				countdown_seconds,
			}) => {
				info!(
					order_number = %offer.order_number,
					store = %offer.store_name,
					area = %offer.customer_area,
					fee = %offer.delivery_fee,
					countdown_seconds,
					"new offer"
				);
			}
			DispatchEvent::Offer(OfferEvent::CountdownTick {
				remaining_seconds, ..
			}) => {
				if remaining_seconds % 10 == 0 {
					info!(remaining_seconds, "countdown");
				}
			}
			DispatchEvent::Offer(OfferEvent::Resolved {
				order_id,
				resolution,
			}) => {
				info!(order_id, ?resolution, "offer resolved");
			}
			DispatchEvent::Offer(OfferEvent::Cleared) => {
				info!("no pending offers");
			}
			DispatchEvent::Job(job) => {
				info!(?job, "delivery update");
			}
			DispatchEvent::Ui(UiEvent::Alert { message }) => {
				warn!(%message, "alert");
			}
			DispatchEvent::Ui(UiEvent::RatesUpdated { rates }) => {
				info!(
					acceptance = rates.acceptance_rate,
					rejection = rates.rejection_rate,
					"rates updated"
				);
			}
		}
	}
}
