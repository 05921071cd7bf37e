//! Backend gateway for order decisions and worker state.
//!
//! The dispatch core records every decision (accept, reject, status change)
//! with the backend through [`OrderGateway`]. The trait keeps the core
//! testable with in-memory stubs; [`HttpGateway`] is the production
//! implementation speaking JSON over HTTP.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use dispatch_types::{OrderId, OrderStatus, WorkerId, WorkerRates};

pub use http::HttpGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
	#[error("request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("backend returned status {status} for {operation}")]
	Status { operation: &'static str, status: u16 },
}

/// Backend operations the dispatch core depends on.
///
/// All calls are fire-and-forget with respect to local state: once issued
/// they are never cancelled, and their outcome only decides what message the
/// worker sees.
#[async_trait]
pub trait OrderGateway: Send + Sync {
	/// Record that the worker accepted the offered order.
	async fn accept_order(&self, order_id: OrderId, worker_id: WorkerId)
		-> Result<(), GatewayError>;

	/// Record that the worker rejected (or timed out on) the offered order.
	async fn reject_order(&self, order_id: OrderId, worker_id: WorkerId)
		-> Result<(), GatewayError>;

	/// Move an order to a new lifecycle status.
	async fn update_order_status(
		&self,
		order_id: OrderId,
		status: OrderStatus,
	) -> Result<(), GatewayError>;

	/// Cancel an in-progress order.
	async fn cancel_order(
		&self,
		order_id: OrderId,
		worker_id: WorkerId,
		reason: Option<String>,
	) -> Result<(), GatewayError>;

	/// Mark the worker as available (or unavailable) for new offers.
	async fn set_availability(
		&self,
		worker_id: WorkerId,
		available: bool,
	) -> Result<(), GatewayError>;

	/// The worker's current acceptance/rejection rates.
	async fn worker_rates(&self, worker_id: WorkerId) -> Result<WorkerRates, GatewayError>;
}
