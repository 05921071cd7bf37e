//! Worker eligibility filtering.
//!
//! Offers are broadcast on a shared channel; each one carries the list of
//! workers it was addressed to. An offer applies to this client only if the
//! signed-in worker appears in that list. Without a session nothing is
//! eligible.

use dispatch_types::{OrderOffer, WorkerId};

/// Whether an offer applies to the given worker.
pub fn is_eligible(offer: &OrderOffer, worker: Option<WorkerId>) -> bool {
	match worker {
		Some(id) => offer.eligible_workers.contains(&id),
		None => false,
	}
}
