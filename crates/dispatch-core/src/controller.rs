//! Offer lifecycle controller.
//!
//! Glues the decoder, eligibility filter, offer queue and countdown into one
//! flow and records every decision with the backend gateway. All handlers
//! run on the engine's single event loop, so state mutation is strictly
//! sequential.
//!
//! Decision policy, deliberately asymmetric: accepting is pessimistic (the
//! worker is only navigated to the in-progress screen after the backend
//! confirmed both the acceptance and the status update), rejecting is
//! optimistic (the queue advances locally whether or not the backend call
//! succeeded, so a flaky network can never pin the worker on an offer they
//! declined).

use std::sync::Arc;
use tracing::{debug, info, warn};

use dispatch_gateway::OrderGateway;
use dispatch_ingest::{decode, is_eligible};
use dispatch_types::{
	DispatchEvent, JobEvent, Navigator, OfferEvent, OfferResolution, OrderOffer, OrderStatus,
	UiEvent, WorkerSession,
};

use crate::countdown::{Countdown, Tick};
use crate::event_bus::EventBus;
use crate::queue::{EnqueueOutcome, OfferQueue};

pub struct DispatchController {
	session: WorkerSession,
	gateway: Arc<dyn OrderGateway>,
	navigator: Arc<dyn Navigator>,
	events: EventBus,
	queue: OfferQueue,
	countdown: Countdown,
	countdown_secs: u32,
	/// The accepted order currently being delivered, if any.
	in_progress: Option<OrderOffer>,
}

impl DispatchController {
	pub fn new(
		session: WorkerSession,
		gateway: Arc<dyn OrderGateway>,
		navigator: Arc<dyn Navigator>,
		events: EventBus,
		countdown_secs: u32,
	) -> Self {
		Self {
			session,
			gateway,
			navigator,
			events,
			queue: OfferQueue::new(),
			countdown: Countdown::new(),
			countdown_secs,
			in_progress: None,
		}
	}

	/// Handle a raw push payload.
	///
	/// Undecodable events are dropped with a log line; offers not addressed
	/// to this worker are dropped silently.
	pub fn on_push_event(&mut self, raw: &str) {
		let offer = match decode(raw) {
			Ok(offer) => offer,
			Err(e) => {
				warn!(error = %e, "dropping undecodable push event");
				return;
			}
		};

		if !is_eligible(&offer, Some(self.session.worker_id)) {
			debug!(
				order_id = offer.order_id,
				"offer not addressed to this worker"
			);
			return;
		}

		let order_id = offer.order_id;
		match self.queue.enqueue(offer.clone()) {
			EnqueueOutcome::BecameHead => {
				info!(order_id, "new offer surfaced");
				self.surface(offer);
			}
			EnqueueOutcome::Buffered => {
				debug!(
					order_id,
					pending = self.queue.pending_count(),
					"offer buffered behind the displayed one"
				);
			}
			EnqueueOutcome::Duplicate => {}
		}
	}

	/// Worker accepted the displayed offer.
	pub async fn on_accept(&mut self) {
		let Some(offer) = self.queue.peek_head().cloned() else {
			self.alert("There is no offer to accept.");
			return;
		};
		self.countdown.cancel();

		let order_id = offer.order_id;
		match self
			.gateway
			.accept_order(order_id, self.session.worker_id)
			.await
		{
			Ok(()) => {
				match self
					.gateway
					.update_order_status(order_id, OrderStatus::InTransit)
					.await
				{
					Ok(()) => {
						info!(order_id, "order accepted, starting delivery");
						self.in_progress = Some(offer.clone());
						self.navigator.go_to_in_progress(offer).await;
					}
					Err(e) => {
						warn!(order_id, error = %e, "status update failed after accept");
						self.alert("Order accepted, but the status update may not have registered.");
					}
				}
			}
			Err(e) => {
				// The offer is consumed either way; re-displaying a possibly
				// already-processed offer is unsafe. The backend owns retry.
				warn!(order_id, error = %e, "accept call failed");
				self.alert("The acceptance may not have registered with the backend.");
			}
		}

		self.publish(DispatchEvent::Offer(OfferEvent::Resolved {
			order_id,
			resolution: OfferResolution::Accepted,
		}));
		self.advance_queue();
	}

	/// Worker rejected the displayed offer.
	pub async fn on_reject(&mut self) {
		self.resolve_rejection(OfferResolution::Rejected).await;
	}

	/// Advance the countdown by one second, auto-rejecting on expiry.
	pub async fn on_tick(&mut self) {
		match self.countdown.tick() {
			Tick::Idle => {}
			Tick::Running { remaining } => {
				if let Some(offer) = self.queue.peek_head() {
					self.publish(DispatchEvent::Offer(OfferEvent::CountdownTick {
						order_id: offer.order_id,
						remaining_seconds: remaining,
					}));
				}
			}
			Tick::Expired => {
				info!("offer countdown expired, auto-rejecting");
				self.resolve_rejection(OfferResolution::TimedOut).await;
			}
		}
	}

	/// Shared path for manual rejection and countdown expiry.
	async fn resolve_rejection(&mut self, resolution: OfferResolution) {
		let Some(offer) = self.queue.peek_head().cloned() else {
			self.alert("There is no offer to reject.");
			return;
		};
		self.countdown.cancel();

		let order_id = offer.order_id;
		if let Err(e) = self
			.gateway
			.reject_order(order_id, self.session.worker_id)
			.await
		{
			// Optimistic: the queue advances regardless.
			warn!(order_id, error = %e, "reject call failed, advancing anyway");
			self.alert("The rejection may not have registered with the backend.");
		}

		self.publish(DispatchEvent::Offer(OfferEvent::Resolved {
			order_id,
			resolution,
		}));
		self.advance_queue();
	}

	/// Remove the resolved head and surface the next offer, if any.
	fn advance_queue(&mut self) {
		self.queue.resolve_head();
		match self.queue.peek_head().cloned() {
			Some(next) => self.surface(next),
			None => {
				self.countdown.cancel();
				self.publish(DispatchEvent::Offer(OfferEvent::Cleared));
			}
		}
	}

	fn surface(&mut self, offer: OrderOffer) {
		self.countdown.start(self.countdown_secs);
		self.publish(DispatchEvent::Offer(OfferEvent::Surfaced {
			offer,
			countdown_seconds: self.countdown_secs,
		}));
	}

	/// Worker arrived at the store for the in-progress delivery.
	pub async fn on_arrived_at_store(&mut self) {
		let Some(offer) = self.in_progress.clone() else {
			self.alert("No delivery is in progress.");
			return;
		};

		match self
			.gateway
			.update_order_status(offer.order_id, OrderStatus::ArrivedAtStore)
			.await
		{
			Ok(()) => {
				self.publish(DispatchEvent::Job(JobEvent::ArrivedAtStore {
					order_id: offer.order_id,
				}));
			}
			Err(e) => {
				warn!(order_id = offer.order_id, error = %e, "arrival update failed");
				self.alert("The arrival update may not have registered.");
			}
		}
	}

	/// Worker handed the order to the customer.
	pub async fn on_delivered(&mut self) {
		let Some(offer) = self.in_progress.clone() else {
			self.alert("No delivery is in progress.");
			return;
		};

		match self
			.gateway
			.update_order_status(offer.order_id, OrderStatus::Delivered)
			.await
		{
			Ok(()) => {
				info!(order_id = offer.order_id, "delivery completed");
				self.in_progress = None;
				self.publish(DispatchEvent::Job(JobEvent::Delivered {
					order_id: offer.order_id,
				}));
			}
			Err(e) => {
				// Keep the job so the worker can retry the confirmation.
				warn!(order_id = offer.order_id, error = %e, "delivered update failed");
				self.alert("The delivery confirmation may not have registered.");
			}
		}
	}

	/// Worker backed out of the in-progress delivery.
	pub async fn on_cancel_job(&mut self, reason: Option<String>) {
		let Some(offer) = self.in_progress.clone() else {
			self.alert("No delivery is in progress.");
			return;
		};

		match self
			.gateway
			.cancel_order(offer.order_id, self.session.worker_id, reason)
			.await
		{
			Ok(()) => {
				self.in_progress = None;
				self.publish(DispatchEvent::Job(JobEvent::Cancelled {
					order_id: offer.order_id,
				}));
			}
			Err(e) => {
				warn!(order_id = offer.order_id, error = %e, "cancel call failed");
				self.alert("The cancellation may not have registered.");
			}
		}
	}

	/// Toggle this worker's availability for new offers.
	pub async fn set_availability(&mut self, available: bool) {
		if let Err(e) = self
			.gateway
			.set_availability(self.session.worker_id, available)
			.await
		{
			warn!(error = %e, "availability update failed");
			self.alert("Could not update availability.");
		}
	}

	/// Fetch fresh acceptance/rejection rates and publish them.
	///
	/// Background poll; failures are logged but never alerted.
	pub async fn refresh_rates(&self) {
		match self.gateway.worker_rates(self.session.worker_id).await {
			Ok(rates) => {
				self.publish(DispatchEvent::Ui(UiEvent::RatesUpdated { rates }));
			}
			Err(e) => debug!(error = %e, "rates refresh failed"),
		}
	}

	/// The offer currently shown to the worker.
	pub fn active_offer(&self) -> Option<&OrderOffer> {
		self.queue.peek_head()
	}

	/// Seconds left before the displayed offer is auto-rejected.
	pub fn remaining_seconds(&self) -> u32 {
		self.countdown.remaining_seconds()
	}

	/// Offers buffered behind the displayed one.
	pub fn pending_count(&self) -> usize {
		self.queue.pending_count()
	}

	/// The accepted order currently being delivered.
	pub fn in_progress_job(&self) -> Option<&OrderOffer> {
		self.in_progress.as_ref()
	}

	fn publish(&self, event: DispatchEvent) {
		self.events.publish(event).ok();
	}

	fn alert(&self, message: &str) {
		warn!(alert = %message, "surfacing alert");
		self.publish(DispatchEvent::Ui(UiEvent::Alert {
			message: message.to_string(),
		}));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use dispatch_gateway::GatewayError;
	use dispatch_ingest::encode_offer;
	use dispatch_types::{OrderId, WorkerId, WorkerRates};
	use rust_decimal::Decimal;
	use std::sync::Mutex;
	use tokio::sync::broadcast;

	const WORKER: WorkerId = 7;

	#[derive(Debug, Clone, PartialEq)]
	enum Call {
		Accept(OrderId, WorkerId),
		Reject(OrderId, WorkerId),
		Status(OrderId, OrderStatus),
		Cancel(OrderId, WorkerId),
		Availability(WorkerId, bool),
		Rates(WorkerId),
	}

	#[derive(Default)]
	struct MockGateway {
		calls: Mutex<Vec<Call>>,
		fail_accept: bool,
		fail_reject: bool,
		fail_status: bool,
	}

	impl MockGateway {
		fn failure() -> GatewayError {
			GatewayError::Status {
				operation: "test",
				status: 500,
			}
		}

		fn calls(&self) -> Vec<Call> {
			self.calls.lock().unwrap().clone()
		}

		fn record(&self, call: Call) {
			self.calls.lock().unwrap().push(call);
		}
	}

	#[async_trait]
	impl OrderGateway for MockGateway {
		async fn accept_order(
			&self,
			order_id: OrderId,
			worker_id: WorkerId,
		) -> Result<(), GatewayError> {
			self.record(Call::Accept(order_id, worker_id));
			if self.fail_accept {
				return Err(Self::failure());
			}
			Ok(())
		}

		async fn reject_order(
			&self,
			order_id: OrderId,
			worker_id: WorkerId,
		) -> Result<(), GatewayError> {
			self.record(Call::Reject(order_id, worker_id));
			if self.fail_reject {
				return Err(Self::failure());
			}
			Ok(())
		}

		async fn update_order_status(
			&self,
			order_id: OrderId,
			status: OrderStatus,
		) -> Result<(), GatewayError> {
			self.record(Call::Status(order_id, status));
			if self.fail_status {
				return Err(Self::failure());
			}
			Ok(())
		}

		async fn cancel_order(
			&self,
			order_id: OrderId,
			worker_id: WorkerId,
			_reason: Option<String>,
		) -> Result<(), GatewayError> {
			self.record(Call::Cancel(order_id, worker_id));
			Ok(())
		}

		async fn set_availability(
			&self,
			worker_id: WorkerId,
			available: bool,
		) -> Result<(), GatewayError> {
			self.record(Call::Availability(worker_id, available));
			Ok(())
		}

		async fn worker_rates(&self, worker_id: WorkerId) -> Result<WorkerRates, GatewayError> {
			self.record(Call::Rates(worker_id));
			Ok(WorkerRates {
				acceptance_rate: 80.0,
				rejection_rate: 20.0,
			})
		}
	}

	#[derive(Default)]
	struct MockNavigator {
		visited: Mutex<Vec<OrderOffer>>,
	}

	#[async_trait]
	impl Navigator for MockNavigator {
		async fn go_to_in_progress(&self, offer: OrderOffer) {
			self.visited.lock().unwrap().push(offer);
		}
	}

	struct Harness {
		controller: DispatchController,
		gateway: Arc<MockGateway>,
		navigator: Arc<MockNavigator>,
		events: broadcast::Receiver<DispatchEvent>,
	}

	fn harness(gateway: MockGateway) -> Harness {
		let gateway = Arc::new(gateway);
		let navigator = Arc::new(MockNavigator::default());
		let bus = EventBus::new(256);
		let events = bus.subscribe();
		let controller = DispatchController::new(
			WorkerSession { worker_id: WORKER },
			gateway.clone(),
			navigator.clone(),
			bus,
			60,
		);
		Harness {
			controller,
			gateway,
			navigator,
			events,
		}
	}

	fn offer_for(order_id: OrderId, workers: &[WorkerId]) -> OrderOffer {
		OrderOffer {
			order_id,
			order_number: format!("A-{order_id}"),
			store_name: "Store".to_string(),
			store_address: None,
			delivery_fee: Decimal::from(1500),
			customer_area: "Area".to_string(),
			eligible_workers: workers.iter().copied().collect(),
			received_at: 0,
		}
	}

	fn push(harness: &mut Harness, order_id: OrderId) {
		let raw = encode_offer(&offer_for(order_id, &[WORKER]));
		harness.controller.on_push_event(&raw);
	}

	fn drain(events: &mut broadcast::Receiver<DispatchEvent>) -> Vec<DispatchEvent> {
		let mut drained = Vec::new();
		while let Ok(event) = events.try_recv() {
			drained.push(event);
		}
		drained
	}

	fn alerts(events: &[DispatchEvent]) -> Vec<String> {
		events
			.iter()
			.filter_map(|e| match e {
				DispatchEvent::Ui(UiEvent::Alert { message }) => Some(message.clone()),
				_ => None,
			})
			.collect()
	}

	#[tokio::test]
	async fn test_eligible_push_event_surfaces_offer() {
		let mut h = harness(MockGateway::default());
		push(&mut h, 1);

		assert_eq!(h.controller.active_offer().map(|o| o.order_id), Some(1));
		assert_eq!(h.controller.remaining_seconds(), 60);
		assert_eq!(h.controller.pending_count(), 0);

		let events = drain(&mut h.events);
		assert!(matches!(
			events.first(),
			Some(DispatchEvent::Offer(OfferEvent::Surfaced {
				countdown_seconds: 60,
				..
			}))
		));
	}

	#[tokio::test]
	async fn test_undecodable_payload_is_dropped() {
		let mut h = harness(MockGateway::default());
		h.controller.on_push_event("definitely not a payload");

		assert!(h.controller.active_offer().is_none());
		assert!(alerts(&drain(&mut h.events)).is_empty());
	}

	#[tokio::test]
	async fn test_ineligible_offer_is_dropped_silently() {
		let mut h = harness(MockGateway::default());
		let raw = encode_offer(&offer_for(1, &[WORKER + 1]));
		h.controller.on_push_event(&raw);

		assert!(h.controller.active_offer().is_none());
		assert!(drain(&mut h.events).is_empty());
	}

	#[tokio::test]
	async fn test_duplicate_offer_appears_once() {
		let mut h = harness(MockGateway::default());
		push(&mut h, 1);
		push(&mut h, 1);

		assert_eq!(h.controller.pending_count(), 0);
		assert_eq!(h.controller.active_offer().map(|o| o.order_id), Some(1));
	}

	#[tokio::test]
	async fn test_accept_happy_path() {
		let mut h = harness(MockGateway::default());
		push(&mut h, 1);
		h.controller.on_accept().await;

		assert_eq!(
			h.gateway.calls(),
			vec![
				Call::Accept(1, WORKER),
				Call::Status(1, OrderStatus::InTransit),
			]
		);

		let visited = h.navigator.visited.lock().unwrap();
		assert_eq!(visited.len(), 1);
		assert_eq!(visited[0].order_id, 1);
		drop(visited);

		assert!(h.controller.active_offer().is_none());
		assert_eq!(h.controller.in_progress_job().map(|o| o.order_id), Some(1));
		assert!(alerts(&drain(&mut h.events)).is_empty());
	}

	#[tokio::test]
	async fn test_accept_without_offer_alerts() {
		let mut h = harness(MockGateway::default());
		h.controller.on_accept().await;

		assert!(h.gateway.calls().is_empty());
		assert_eq!(alerts(&drain(&mut h.events)).len(), 1);
	}

	#[tokio::test]
	async fn test_accept_failure_still_consumes_offer() {
		let mut h = harness(MockGateway {
			fail_accept: true,
			..Default::default()
		});
		push(&mut h, 1);
		h.controller.on_accept().await;

		// No status update, no navigation, but the offer is gone locally.
		assert_eq!(h.gateway.calls(), vec![Call::Accept(1, WORKER)]);
		assert!(h.navigator.visited.lock().unwrap().is_empty());
		assert!(h.controller.active_offer().is_none());
		assert!(h.controller.in_progress_job().is_none());
		assert_eq!(alerts(&drain(&mut h.events)).len(), 1);
	}

	#[tokio::test]
	async fn test_status_update_failure_blocks_navigation() {
		let mut h = harness(MockGateway {
			fail_status: true,
			..Default::default()
		});
		push(&mut h, 1);
		h.controller.on_accept().await;

		assert!(h.navigator.visited.lock().unwrap().is_empty());
		assert!(h.controller.active_offer().is_none());
		assert_eq!(alerts(&drain(&mut h.events)).len(), 1);
	}

	#[tokio::test]
	async fn test_reject_advances_queue() {
		let mut h = harness(MockGateway::default());
		push(&mut h, 1);
		push(&mut h, 2);
		h.controller.on_reject().await;

		assert_eq!(h.gateway.calls(), vec![Call::Reject(1, WORKER)]);
		assert_eq!(h.controller.active_offer().map(|o| o.order_id), Some(2));
		assert_eq!(h.controller.remaining_seconds(), 60);
	}

	#[tokio::test]
	async fn test_optimistic_reject_under_gateway_failure() {
		let mut h = harness(MockGateway {
			fail_reject: true,
			..Default::default()
		});
		push(&mut h, 1);
		push(&mut h, 2);
		h.controller.on_reject().await;

		// Queue advances to the second offer even though the call failed.
		assert_eq!(h.controller.active_offer().map(|o| o.order_id), Some(2));
		assert_eq!(alerts(&drain(&mut h.events)).len(), 1);
	}

	#[tokio::test]
	async fn test_fifo_resolution_across_mixed_decisions() {
		let mut h = harness(MockGateway::default());
		push(&mut h, 1);
		push(&mut h, 2);
		push(&mut h, 3);

		h.controller.on_accept().await;
		h.controller.on_reject().await;
		h.controller.on_accept().await;

		let resolved: Vec<OrderId> = h
			.gateway
			.calls()
			.iter()
			.filter_map(|c| match c {
				Call::Accept(id, _) | Call::Reject(id, _) => Some(*id),
				_ => None,
			})
			.collect();
		assert_eq!(resolved, vec![1, 2, 3]);
		assert!(h.controller.active_offer().is_none());
	}

	#[tokio::test]
	async fn test_countdown_expiry_matches_manual_reject() {
		let mut timed = harness(MockGateway::default());
		push(&mut timed, 1);
		for _ in 0..60 {
			timed.controller.on_tick().await;
		}

		let mut manual = harness(MockGateway::default());
		push(&mut manual, 1);
		manual.controller.on_reject().await;

		assert_eq!(timed.gateway.calls(), manual.gateway.calls());
		assert!(timed.controller.active_offer().is_none());
		assert!(manual.controller.active_offer().is_none());

		let timed_out = drain(&mut timed.events).into_iter().any(|e| {
			matches!(
				e,
				DispatchEvent::Offer(OfferEvent::Resolved {
					order_id: 1,
					resolution: OfferResolution::TimedOut,
				})
			)
		});
		assert!(timed_out);
	}

	#[tokio::test]
	async fn test_buffered_offer_does_not_restart_timer() {
		let mut h = harness(MockGateway::default());
		push(&mut h, 1);

		for _ in 0..30 {
			h.controller.on_tick().await;
		}
		push(&mut h, 2);

		// The second offer must not touch the running countdown.
		assert_eq!(h.controller.remaining_seconds(), 30);
		assert_eq!(h.controller.active_offer().map(|o| o.order_id), Some(1));

		for _ in 0..30 {
			h.controller.on_tick().await;
		}

		// Exactly one auto-reject fired, for the first offer; the second is
		// surfaced with a fresh countdown.
		assert_eq!(h.gateway.calls(), vec![Call::Reject(1, WORKER)]);
		assert_eq!(h.controller.active_offer().map(|o| o.order_id), Some(2));
		assert_eq!(h.controller.remaining_seconds(), 60);
	}

	#[tokio::test]
	async fn test_accept_cancels_countdown() {
		let mut h = harness(MockGateway::default());
		push(&mut h, 1);
		h.controller.on_accept().await;

		for _ in 0..120 {
			h.controller.on_tick().await;
		}

		// No auto-reject after resolution.
		assert_eq!(
			h.gateway.calls(),
			vec![
				Call::Accept(1, WORKER),
				Call::Status(1, OrderStatus::InTransit),
			]
		);
	}

	#[tokio::test]
	async fn test_arrival_and_delivery_flow() {
		let mut h = harness(MockGateway::default());
		push(&mut h, 1);
		h.controller.on_accept().await;

		h.controller.on_arrived_at_store().await;
		assert_eq!(h.controller.in_progress_job().map(|o| o.order_id), Some(1));

		h.controller.on_delivered().await;
		assert!(h.controller.in_progress_job().is_none());

		let statuses: Vec<OrderStatus> = h
			.gateway
			.calls()
			.iter()
			.filter_map(|c| match c {
				Call::Status(_, status) => Some(*status),
				_ => None,
			})
			.collect();
		assert_eq!(
			statuses,
			vec![
				OrderStatus::InTransit,
				OrderStatus::ArrivedAtStore,
				OrderStatus::Delivered,
			]
		);
	}

	#[tokio::test]
	async fn test_cancel_job_clears_in_progress() {
		let mut h = harness(MockGateway::default());
		push(&mut h, 1);
		h.controller.on_accept().await;

		h.controller
			.on_cancel_job(Some("store closed".to_string()))
			.await;

		assert!(h.controller.in_progress_job().is_none());
		assert!(h.gateway.calls().contains(&Call::Cancel(1, WORKER)));
	}

	#[tokio::test]
	async fn test_rates_refresh_publishes_event() {
		let mut h = harness(MockGateway::default());
		h.controller.refresh_rates().await;

		assert_eq!(h.gateway.calls(), vec![Call::Rates(WORKER)]);
		let got_rates = drain(&mut h.events)
			.into_iter()
			.any(|e| matches!(e, DispatchEvent::Ui(UiEvent::RatesUpdated { .. })));
		assert!(got_rates);
	}

	#[tokio::test]
	async fn test_availability_toggle() {
		let mut h = harness(MockGateway::default());
		h.controller.set_availability(true).await;
		h.controller.set_availability(false).await;

		assert_eq!(
			h.gateway.calls(),
			vec![
				Call::Availability(WORKER, true),
				Call::Availability(WORKER, false),
			]
		);
	}
}
