//! Configuration for the dispatch client.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{Config, GatewayConfig, OfferConfig, PushConfig, WorkerConfig};
