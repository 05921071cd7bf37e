//! Traits for external collaborators the dispatch core talks to.
//!
//! The session store and screen navigation are owned by the surrounding app;
//! the core only sees them through these interfaces.

use async_trait::async_trait;

use crate::common::WorkerId;
use crate::offer::OrderOffer;

/// Identity of the signed-in delivery worker.
///
/// Loaded once when the engine is built. If no session exists the engine
/// refuses to start: no push subscription, no offer processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSession {
	pub worker_id: WorkerId,
}

/// Read access to the externally persisted session.
#[async_trait]
pub trait SessionStore: Send + Sync {
	/// The signed-in worker's id, if a session exists.
	async fn worker_id(&self) -> Option<WorkerId>;
}

/// Screen navigation collaborator.
#[async_trait]
pub trait Navigator: Send + Sync {
	/// Transition to the in-progress screen for a freshly accepted offer.
	///
	/// Invoked only after the backend confirmed both the acceptance and the
	/// in-transit status update.
	async fn go_to_in_progress(&self, offer: OrderOffer);
}
