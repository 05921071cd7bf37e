//! Configuration loading from files and environment.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::types::Config;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
	/// Load configuration from file
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
		let path = path.as_ref();
		info!("Loading configuration from {:?}", path);

		let contents = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {:?}", path))?;

		let mut config = match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml(&contents)?,
			Some("json") => Self::from_json(&contents)?,
			_ => anyhow::bail!("Unsupported config format: {:?}", path),
		};

		Self::apply_env_overrides(&mut config)?;
		Self::validate(&config)?;
		Ok(config)
	}

	/// Load from TOML string
	pub fn from_toml(contents: &str) -> Result<Config> {
		toml::from_str(contents).context("Failed to parse TOML")
	}

	/// Load from JSON string
	pub fn from_json(contents: &str) -> Result<Config> {
		serde_json::from_str(contents).context("Failed to parse JSON")
	}

	/// Apply environment variable overrides
	fn apply_env_overrides(config: &mut Config) -> Result<()> {
		if let Ok(url) = std::env::var("DISPATCH_GATEWAY_URL") {
			debug!("Overriding gateway base URL from environment");
			config.gateway.base_url = url;
		}

		if let Ok(id) = std::env::var("DISPATCH_WORKER_ID") {
			let id = id
				.parse()
				.context("DISPATCH_WORKER_ID must be a numeric worker id")?;
			debug!("Overriding worker id from environment");
			config.worker.id = Some(id);
		}

		Ok(())
	}

	/// Validate configuration
	pub fn validate(config: &Config) -> Result<()> {
		if !config.gateway.base_url.starts_with("http") {
			anyhow::bail!("Gateway base URL must be an http(s) URL");
		}
		if config.gateway.timeout_secs == 0 {
			anyhow::bail!("Gateway timeout must be at least 1 second");
		}
		if config.push.channel.is_empty() || config.push.event.is_empty() {
			anyhow::bail!("Push channel and event names must not be empty");
		}
		if config.offers.countdown_secs == 0 {
			anyhow::bail!("Offer countdown must be at least 1 second");
		}
		if config.offers.rates_poll_secs == 0 {
			anyhow::bail!("Rates poll interval must be at least 1 second");
		}
		Ok(())
	}
}
