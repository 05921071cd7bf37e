//! Single-task event loop driving the lifecycle controller.
//!
//! Push payloads, user commands and the 1 Hz countdown tick all funnel into
//! one `tokio::select!` loop, so controller handlers run to completion one
//! at a time. That cooperative scheduling is what lets the queue and
//! countdown mutate without locks.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

use dispatch_config::Config;
use dispatch_gateway::OrderGateway;
use dispatch_ingest::{IngestService, PushSource};
use dispatch_types::{Navigator, SessionStore, WorkerSession};

use crate::controller::DispatchController;
use crate::event_bus::EventBus;

#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Service error: {0}")]
	Service(String),
	#[error("no worker session; offer processing disabled")]
	SessionAbsent,
}

/// A worker action forwarded from the UI layer.
#[derive(Debug, Clone)]
pub enum UserCommand {
	Accept,
	Reject,
	ArrivedAtStore,
	Delivered,
	CancelJob { reason: Option<String> },
	SetAvailability(bool),
	/// Session ended; tear down the push subscription and stop.
	Logout,
}

pub struct DispatchEngine {
	config: Config,
	controller: DispatchController,
	ingest: IngestService,
	event_bus: EventBus,
	commands: Option<mpsc::UnboundedReceiver<UserCommand>>,
	command_tx: mpsc::UnboundedSender<UserCommand>,
}

impl DispatchEngine {
	/// Run the event loop until shutdown or logout.
	pub async fn run(&mut self) -> Result<(), EngineError> {
		let mut commands = self
			.commands
			.take()
			.ok_or_else(|| EngineError::Service("Engine is already running".into()))?;

		let (raw_tx, mut raw_rx) = mpsc::unbounded_channel();
		self.ingest
			.start(raw_tx)
			.await
			.map_err(|e| EngineError::Service(e.to_string()))?;

		let mut countdown_tick = tokio::time::interval(Duration::from_secs(1));
		let mut rates_tick =
			tokio::time::interval(Duration::from_secs(self.config.offers.rates_poll_secs));

		loop {
			tokio::select! {
				Some(raw) = raw_rx.recv() => {
					self.controller.on_push_event(&raw);
				}

				Some(command) = commands.recv() => {
					if self.handle_command(command).await {
						break;
					}
				}

				_ = countdown_tick.tick() => {
					self.controller.on_tick().await;
				}

				_ = rates_tick.tick() => {
					self.controller.refresh_rates().await;
				}

				_ = tokio::signal::ctrl_c() => {
					info!("shutting down dispatch engine");
					break;
				}
			}
		}

		self.ingest
			.stop()
			.await
			.map_err(|e| EngineError::Service(e.to_string()))?;
		Ok(())
	}

	/// Returns true when the engine should stop.
	async fn handle_command(&mut self, command: UserCommand) -> bool {
		match command {
			UserCommand::Accept => self.controller.on_accept().await,
			UserCommand::Reject => self.controller.on_reject().await,
			UserCommand::ArrivedAtStore => self.controller.on_arrived_at_store().await,
			UserCommand::Delivered => self.controller.on_delivered().await,
			UserCommand::CancelJob { reason } => self.controller.on_cancel_job(reason).await,
			UserCommand::SetAvailability(available) => {
				self.controller.set_availability(available).await
			}
			UserCommand::Logout => {
				info!("session ended, tearing down push subscription");
				return true;
			}
		}
		false
	}

	/// Sender the UI layer uses to deliver worker actions.
	pub fn command_sender(&self) -> mpsc::UnboundedSender<UserCommand> {
		self.command_tx.clone()
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	pub fn config(&self) -> &Config {
		&self.config
	}
}

/// Wires collaborators into a [`DispatchEngine`].
///
/// Fails closed: without a worker session in the store, `build` refuses to
/// create the engine and nothing is ever subscribed or processed.
pub struct EngineBuilder {
	config: Option<Config>,
	gateway: Option<Arc<dyn OrderGateway>>,
	navigator: Option<Arc<dyn Navigator>>,
	session_store: Option<Box<dyn SessionStore>>,
	push_source: Option<Box<dyn PushSource>>,
}

impl EngineBuilder {
	pub fn new() -> Self {
		Self {
			config: None,
			gateway: None,
			navigator: None,
			session_store: None,
			push_source: None,
		}
	}

	pub fn with_config(mut self, config: Config) -> Self {
		self.config = Some(config);
		self
	}

	pub fn with_gateway(mut self, gateway: Arc<dyn OrderGateway>) -> Self {
		self.gateway = Some(gateway);
		self
	}

	pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
		self.navigator = Some(navigator);
		self
	}

	pub fn with_session_store(mut self, store: Box<dyn SessionStore>) -> Self {
		self.session_store = Some(store);
		self
	}

	pub fn with_push_source(mut self, source: Box<dyn PushSource>) -> Self {
		self.push_source = Some(source);
		self
	}

	pub async fn build(self) -> Result<DispatchEngine, EngineError> {
		let config = self
			.config
			.ok_or_else(|| EngineError::Config("Configuration not provided".into()))?;
		let gateway = self
			.gateway
			.ok_or_else(|| EngineError::Config("Gateway not provided".into()))?;
		let navigator = self
			.navigator
			.ok_or_else(|| EngineError::Config("Navigator not provided".into()))?;
		let store = self
			.session_store
			.ok_or_else(|| EngineError::Config("Session store not provided".into()))?;
		let source = self
			.push_source
			.ok_or_else(|| EngineError::Config("Push source not provided".into()))?;

		let worker_id = store.worker_id().await.ok_or(EngineError::SessionAbsent)?;
		info!(worker_id, "building dispatch engine");

		let event_bus = EventBus::new(256);
		let controller = DispatchController::new(
			WorkerSession { worker_id },
			gateway,
			navigator,
			event_bus.clone(),
			config.offers.countdown_secs,
		);
		let ingest = IngestService::new(
			source,
			config.push.channel.clone(),
			config.push.event.clone(),
		);
		let (command_tx, commands) = mpsc::unbounded_channel();

		Ok(DispatchEngine {
			config,
			controller,
			ingest,
			event_bus,
			commands: Some(commands),
			command_tx,
		})
	}
}

impl Default for EngineBuilder {
	fn default() -> Self {
		Self::new()
	}
}
