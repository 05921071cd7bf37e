//! Push transport abstraction.
//!
//! The real transport (a hosted push-messaging provider) lives outside this
//! workspace; the core only needs a way to receive raw payloads for a fixed
//! channel/event pair once a worker session exists, and to tear the
//! subscription down on session loss.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// A payload exactly as delivered by the push transport.
pub type RawPayload = String;

#[derive(Debug, Error)]
pub enum SourceError {
	#[error("subscription failed: {0}")]
	Subscribe(String),
	#[error("push source already subscribed")]
	AlreadySubscribed,
	#[error("push source is not subscribed")]
	NotSubscribed,
}

/// A transport delivering raw offer payloads for one channel/event pair.
#[async_trait]
pub trait PushSource: Send + Sync {
	/// Begin delivering payloads for `channel`/`event` into `sink`.
	async fn subscribe(
		&mut self,
		channel: &str,
		event: &str,
		sink: mpsc::UnboundedSender<RawPayload>,
	) -> Result<(), SourceError>;

	/// Stop delivering payloads and release the subscription.
	async fn unsubscribe(&mut self) -> Result<(), SourceError>;
}

/// Owns the push source and its channel/event subscription keys.
///
/// Started once the engine has a worker session, stopped on logout or
/// shutdown.
pub struct IngestService {
	source: Mutex<Box<dyn PushSource>>,
	channel: String,
	event: String,
}

impl IngestService {
	pub fn new(source: Box<dyn PushSource>, channel: String, event: String) -> Self {
		Self {
			source: Mutex::new(source),
			channel,
			event,
		}
	}

	/// Subscribe the underlying transport, delivering payloads into `sink`.
	pub async fn start(&self, sink: mpsc::UnboundedSender<RawPayload>) -> Result<(), SourceError> {
		info!(
			channel = %self.channel,
			event = %self.event,
			"subscribing to push channel"
		);
		self.source
			.lock()
			.await
			.subscribe(&self.channel, &self.event, sink)
			.await
	}

	/// Tear down the push subscription.
	pub async fn stop(&self) -> Result<(), SourceError> {
		info!(channel = %self.channel, "unsubscribing from push channel");
		self.source.lock().await.unsubscribe().await
	}
}

/// In-process push source fed by an mpsc channel.
///
/// Serves as the transport for local runs (payloads typed or piped into the
/// process) and for tests. Payloads sent before `subscribe` are buffered by
/// the channel and delivered on subscription.
pub struct ChannelSource {
	feed: Option<mpsc::UnboundedReceiver<RawPayload>>,
	forwarder: Option<tokio::task::JoinHandle<()>>,
}

impl ChannelSource {
	/// Creates the source and the sender used to feed it.
	pub fn new() -> (Self, mpsc::UnboundedSender<RawPayload>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(
			Self {
				feed: Some(rx),
				forwarder: None,
			},
			tx,
		)
	}
}

#[async_trait]
impl PushSource for ChannelSource {
	async fn subscribe(
		&mut self,
		channel: &str,
		event: &str,
		sink: mpsc::UnboundedSender<RawPayload>,
	) -> Result<(), SourceError> {
		let mut feed = self.feed.take().ok_or(SourceError::AlreadySubscribed)?;
		debug!(%channel, %event, "channel source subscribed");

		self.forwarder = Some(tokio::spawn(async move {
			while let Some(payload) = feed.recv().await {
				if sink.send(payload).is_err() {
					warn!("payload sink dropped, stopping channel source");
					break;
				}
			}
		}));
		Ok(())
	}

	async fn unsubscribe(&mut self) -> Result<(), SourceError> {
		match self.forwarder.take() {
			Some(handle) => {
				handle.abort();
				Ok(())
			}
			None => Err(SourceError::NotSubscribed),
		}
	}
}
