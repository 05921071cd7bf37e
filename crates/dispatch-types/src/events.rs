//! Events broadcast by the dispatch core to the UI layer.
//!
//! The screen layer subscribes to these through the core's event bus and
//! renders from them; nothing in the core waits on a subscriber.

use serde::{Deserialize, Serialize};

use crate::common::OrderId;
use crate::offer::{OrderOffer, WorkerRates};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DispatchEvent {
	Offer(OfferEvent),
	Job(JobEvent),
	Ui(UiEvent),
}

/// How a surfaced offer left the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferResolution {
	Accepted,
	Rejected,
	/// The countdown expired with no worker action; policy-wise identical to
	/// a rejection.
	TimedOut,
}

/// Events about the offer queue and the offer currently on display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OfferEvent {
	/// A new offer became the queue head and should be displayed.
	Surfaced {
		offer: OrderOffer,
		countdown_seconds: u32,
	},
	/// One second elapsed on the displayed offer's countdown.
	CountdownTick {
		order_id: OrderId,
		remaining_seconds: u32,
	},
	/// The head offer was resolved and removed from the queue.
	Resolved {
		order_id: OrderId,
		resolution: OfferResolution,
	},
	/// The queue is empty; the offer display should be dismissed.
	Cleared,
}

/// Events about the worker's current in-progress delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobEvent {
	ArrivedAtStore { order_id: OrderId },
	Delivered { order_id: OrderId },
	Cancelled { order_id: OrderId },
}

/// Presentation-level events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UiEvent {
	/// One human-readable alert for a failed operation.
	Alert { message: String },
	/// Fresh acceptance/rejection rates from the backend.
	RatesUpdated { rates: WorkerRates },
}
