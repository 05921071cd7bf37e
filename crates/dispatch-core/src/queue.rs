//! FIFO queue of offers awaiting a worker decision.

use std::collections::VecDeque;
use tracing::debug;

use dispatch_types::{OrderId, OrderOffer};

/// Result of appending an offer to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
	/// The queue was empty; this offer is now the head and must be surfaced.
	BecameHead,
	/// Another offer is on display; this one waits its turn.
	Buffered,
	/// An offer with the same order id is already queued; dropped.
	Duplicate,
}

/// Ordered collection of pending offers.
///
/// At most one offer is on display at a time, always the head. Insertion is
/// strictly at the tail and removal strictly at the head, so offers resolve
/// in arrival order.
#[derive(Debug, Default)]
pub struct OfferQueue {
	offers: VecDeque<OrderOffer>,
}

impl OfferQueue {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append an offer, ignoring duplicates by order id.
	pub fn enqueue(&mut self, offer: OrderOffer) -> EnqueueOutcome {
		if self.contains(offer.order_id) {
			debug!(order_id = offer.order_id, "duplicate offer ignored");
			return EnqueueOutcome::Duplicate;
		}

		let was_empty = self.offers.is_empty();
		self.offers.push_back(offer);
		if was_empty {
			EnqueueOutcome::BecameHead
		} else {
			EnqueueOutcome::Buffered
		}
	}

	/// The offer currently on display, if any.
	pub fn peek_head(&self) -> Option<&OrderOffer> {
		self.offers.front()
	}

	/// Remove the head after its accept/reject resolution.
	///
	/// Returns the resolved offer. The caller is responsible for surfacing
	/// the new head (if any) and restarting its countdown.
	pub fn resolve_head(&mut self) -> Option<OrderOffer> {
		self.offers.pop_front()
	}

	pub fn contains(&self, order_id: OrderId) -> bool {
		self.offers.iter().any(|o| o.order_id == order_id)
	}

	pub fn len(&self) -> usize {
		self.offers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.offers.is_empty()
	}

	/// Offers buffered behind the displayed head.
	pub fn pending_count(&self) -> usize {
		self.offers.len().saturating_sub(1)
	}
}
