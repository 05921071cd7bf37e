//! Push event ingestion for the dispatch core.
//!
//! Raw payloads arrive from a per-worker push channel as base64-encoded,
//! zlib-compressed JSON. This crate decodes them into [`OrderOffer`]s,
//! filters them by worker eligibility, and abstracts the push transport
//! behind the [`PushSource`] trait so the core never talks to a concrete
//! messaging provider.
//!
//! [`OrderOffer`]: dispatch_types::OrderOffer

pub mod decoder;
pub mod eligibility;
pub mod source;

pub use decoder::{decode, encode_offer, DecodeError};
pub use eligibility::is_eligible;
pub use source::{ChannelSource, IngestService, PushSource, RawPayload, SourceError};
