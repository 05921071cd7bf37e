//! Order offer and status types.
//!
//! An [`OrderOffer`] is the decoded form of a push notification broadcast to
//! eligible delivery workers. It is immutable once decoded; resolution state
//! (queued, surfaced, accepted, rejected) lives in the dispatch core, never
//! on the offer itself.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::common::{OrderId, Timestamp, WorkerId};

/// A candidate delivery job offered to this worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOffer {
	/// Backend order identifier.
	pub order_id: OrderId,
	/// Human-readable order number shown to the worker.
	pub order_number: String,
	/// Name of the store the order is picked up from.
	pub store_name: String,
	/// Pickup address, when the backend includes one.
	pub store_address: Option<String>,
	/// Fee the worker earns for this delivery.
	pub delivery_fee: Decimal,
	/// Area of the customer's address.
	pub customer_area: String,
	/// Workers this offer was broadcast to.
	pub eligible_workers: HashSet<WorkerId>,
	/// When this offer was received locally.
	pub received_at: Timestamp,
}

/// Lifecycle status of an order, as reported to the backend.
///
/// The backend stores these as opaque strings; [`OrderStatus::wire_name`] is
/// the stable vocabulary used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	Offered,
	Accepted,
	InTransit,
	ArrivedAtStore,
	Delivered,
	Cancelled,
}

impl OrderStatus {
	/// The string the backend expects in status update bodies.
	pub fn wire_name(&self) -> &'static str {
		match self {
			OrderStatus::Offered => "offered",
			OrderStatus::Accepted => "accepted",
			OrderStatus::InTransit => "in_transit",
			OrderStatus::ArrivedAtStore => "arrived_at_store",
			OrderStatus::Delivered => "delivered",
			OrderStatus::Cancelled => "cancelled",
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.wire_name())
	}
}

/// Acceptance/rejection rates the backend tracks per worker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkerRates {
	/// Percentage of offers this worker accepted.
	pub acceptance_rate: f64,
	/// Percentage of offers this worker rejected or let expire.
	pub rejection_rate: f64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_wire_names_are_stable() {
		assert_eq!(OrderStatus::InTransit.wire_name(), "in_transit");
		assert_eq!(OrderStatus::ArrivedAtStore.to_string(), "arrived_at_store");
		assert_eq!(OrderStatus::Cancelled.wire_name(), "cancelled");
	}

	#[test]
	fn test_status_serde_matches_wire_name() {
		let json = serde_json::to_string(&OrderStatus::InTransit).unwrap();
		assert_eq!(json, "\"in_transit\"");
		let back: OrderStatus = serde_json::from_str(&json).unwrap();
		assert_eq!(back, OrderStatus::InTransit);
	}
}
