//! Order-offer lifecycle core for the courier dispatch client.
//!
//! Owns the offer queue, the auto-reject countdown and the controller that
//! serializes worker decisions to the backend. The surrounding app supplies
//! the push transport, the HTTP gateway, the session store and navigation,
//! and observes the lifecycle through the event bus.

pub mod controller;
pub mod countdown;
pub mod engine;
pub mod event_bus;
pub mod queue;

pub use controller::DispatchController;
pub use countdown::{Countdown, Tick};
pub use engine::{DispatchEngine, EngineBuilder, EngineError, UserCommand};
pub use event_bus::EventBus;
pub use queue::{EnqueueOutcome, OfferQueue};
