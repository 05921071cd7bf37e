//! Broadcast bus carrying dispatch events to the UI layer.
//!
//! Built on tokio's broadcast channel so any number of screens can observe
//! the offer lifecycle without the controller knowing about them. Publishing
//! never blocks; events published with no subscriber are simply dropped.

use tokio::sync::broadcast;

use dispatch_types::DispatchEvent;

pub struct EventBus {
	sender: broadcast::Sender<DispatchEvent>,
}

impl EventBus {
	/// Creates a bus buffering up to `capacity` unread events per subscriber.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// New subscriber receiving every event published from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
		self.sender.subscribe()
	}

	/// Publish an event to all current subscribers.
	///
	/// A send error only means nobody is listening, which is not a failure
	/// for the dispatch core; callers may ignore it.
	pub fn publish(
		&self,
		event: DispatchEvent,
	) -> Result<(), broadcast::error::SendError<DispatchEvent>> {
		self.sender.send(event)?;
		Ok(())
	}
}

impl Clone for EventBus {
	fn clone(&self) -> Self {
		Self {
			sender: self.sender.clone(),
		}
	}
}
