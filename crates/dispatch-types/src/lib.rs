//! Shared types for the courier dispatch core.

pub mod collaborators;
pub mod common;
pub mod events;
pub mod offer;

pub use collaborators::{Navigator, SessionStore, WorkerSession};
pub use common::{now, OrderId, Timestamp, WorkerId};
pub use events::{DispatchEvent, JobEvent, OfferEvent, OfferResolution, UiEvent};
pub use offer::{OrderOffer, OrderStatus, WorkerRates};
