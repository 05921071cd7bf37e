//! Configuration types for the dispatch client.

use serde::{Deserialize, Serialize};

use dispatch_types::WorkerId;

/// Complete client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Worker identity settings
	#[serde(default)]
	pub worker: WorkerConfig,
	/// Backend gateway settings
	pub gateway: GatewayConfig,
	/// Push transport subscription keys
	#[serde(default)]
	pub push: PushConfig,
	/// Offer display and timing settings
	#[serde(default)]
	pub offers: OfferConfig,
}

/// Worker identity settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkerConfig {
	/// Worker id of the signed-in session, when configured statically.
	///
	/// Usually absent here and supplied by the session store or the
	/// `DISPATCH_WORKER_ID` environment variable.
	pub id: Option<WorkerId>,
}

/// Backend gateway settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
	/// Base URL of the delivery backend
	pub base_url: String,
	/// Request timeout in seconds
	#[serde(default = "default_timeout_secs")]
	pub timeout_secs: u64,
}

/// Push transport subscription keys
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PushConfig {
	/// Channel the backend broadcasts worker offers on
	#[serde(default = "default_push_channel")]
	pub channel: String,
	/// Event name within the channel
	#[serde(default = "default_push_event")]
	pub event: String,
}

/// Offer display and timing settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OfferConfig {
	/// Seconds a surfaced offer waits before auto-rejection
	#[serde(default = "default_countdown_secs")]
	pub countdown_secs: u32,
	/// Seconds between acceptance/rejection rate refreshes
	#[serde(default = "default_rates_poll_secs")]
	pub rates_poll_secs: u64,
}

impl Default for PushConfig {
	fn default() -> Self {
		Self {
			channel: default_push_channel(),
			event: default_push_event(),
		}
	}
}

impl Default for OfferConfig {
	fn default() -> Self {
		Self {
			countdown_secs: default_countdown_secs(),
			rates_poll_secs: default_rates_poll_secs(),
		}
	}
}

fn default_timeout_secs() -> u64 {
	10
}

fn default_push_channel() -> String {
	"worker-offers".to_string()
}

fn default_push_event() -> String {
	"order-offer".to_string()
}

fn default_countdown_secs() -> u32 {
	60
}

fn default_rates_poll_secs() -> u64 {
	10
}
