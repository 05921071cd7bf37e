//! Decoding of raw push payloads into order offers.
//!
//! The backend broadcasts offers as JSON, deflates the bytes with zlib and
//! base64-encodes the result. Decoding runs the pipeline in reverse and maps
//! the wire fields onto [`OrderOffer`]. Any failing step drops the event
//! whole; a partially decoded offer is never produced.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

use dispatch_types::{now, OrderId, OrderOffer, WorkerId};

#[derive(Debug, Error)]
pub enum DecodeError {
	#[error("invalid base64 payload: {0}")]
	Base64(#[from] base64::DecodeError),
	#[error("payload decompression failed: {0}")]
	Inflate(#[from] std::io::Error),
	#[error("invalid offer JSON: {0}")]
	Json(#[from] serde_json::Error),
	#[error("offer payload missing required field: {0}")]
	MissingField(&'static str),
}

/// Wire shape of a broadcast offer.
#[derive(Debug, Serialize, Deserialize)]
struct OfferPayload {
	order: OrderPayload,
	#[serde(rename = "connectedWorkers", default)]
	connected_workers: Vec<ConnectedWorker>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OrderPayload {
	id: Option<OrderId>,
	#[serde(rename = "order_numbers")]
	order_number: Option<String>,
	store: Option<StorePayload>,
	address: Option<AddressPayload>,
	delivery_fee: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StorePayload {
	name: Option<String>,
	address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AddressPayload {
	area: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConnectedWorker {
	id: WorkerId,
}

/// Decodes a raw push payload into an [`OrderOffer`].
///
/// Pipeline: base64 decode, zlib inflate, UTF-8, JSON parse, field mapping.
pub fn decode(raw: &str) -> Result<OrderOffer, DecodeError> {
	let compressed = BASE64.decode(raw.trim())?;

	let mut text = String::new();
	ZlibDecoder::new(compressed.as_slice()).read_to_string(&mut text)?;

	let payload: OfferPayload = serde_json::from_str(&text)?;
	offer_from_payload(payload)
}

fn offer_from_payload(payload: OfferPayload) -> Result<OrderOffer, DecodeError> {
	let order = payload.order;
	let store = order.store.ok_or(DecodeError::MissingField("order.store"))?;

	Ok(OrderOffer {
		order_id: order.id.ok_or(DecodeError::MissingField("order.id"))?,
		order_number: order
			.order_number
			.ok_or(DecodeError::MissingField("order.order_numbers"))?,
		store_name: store
			.name
			.ok_or(DecodeError::MissingField("order.store.name"))?,
		store_address: store.address,
		delivery_fee: order
			.delivery_fee
			.ok_or(DecodeError::MissingField("order.delivery_fee"))?,
		customer_area: order
			.address
			.and_then(|a| a.area)
			.ok_or(DecodeError::MissingField("order.address.area"))?,
		eligible_workers: payload.connected_workers.iter().map(|w| w.id).collect(),
		received_at: now(),
	})
}

/// Encodes an offer the way the backend broadcasts it.
///
/// This is the inverse of [`decode`], used by tests and by local transports
/// that fabricate payloads.
pub fn encode_offer(offer: &OrderOffer) -> String {
	let payload = OfferPayload {
		order: OrderPayload {
			id: Some(offer.order_id),
			order_number: Some(offer.order_number.clone()),
			store: Some(StorePayload {
				name: Some(offer.store_name.clone()),
				address: offer.store_address.clone(),
			}),
			address: Some(AddressPayload {
				area: Some(offer.customer_area.clone()),
			}),
			delivery_fee: Some(offer.delivery_fee),
		},
		connected_workers: offer
			.eligible_workers
			.iter()
			.map(|id| ConnectedWorker { id: *id })
			.collect(),
	};

	// Serializing a struct of plain fields cannot fail.
	let json = serde_json::to_vec(&payload).unwrap_or_default();
	let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
	let compressed = encoder
		.write_all(&json)
		.and_then(|_| encoder.finish())
		.unwrap_or_default();
	BASE64.encode(compressed)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_offer() -> OrderOffer {
		OrderOffer {
			order_id: 4711,
			order_number: "A-4711".to_string(),
			store_name: "Al Noor Grocery".to_string(),
			store_address: Some("12 Market St".to_string()),
			delivery_fee: Decimal::from(2500),
			customer_area: "Old Town".to_string(),
			eligible_workers: [7, 9].into_iter().collect(),
			received_at: 0,
		}
	}

	#[test]
	fn test_decode_round_trip() {
		let offer = sample_offer();
		let decoded = decode(&encode_offer(&offer)).unwrap();

		assert_eq!(decoded.order_id, offer.order_id);
		assert_eq!(decoded.order_number, offer.order_number);
		assert_eq!(decoded.store_name, offer.store_name);
		assert_eq!(decoded.store_address, offer.store_address);
		assert_eq!(decoded.delivery_fee, offer.delivery_fee);
		assert_eq!(decoded.customer_area, offer.customer_area);
		assert_eq!(decoded.eligible_workers, offer.eligible_workers);
	}

	#[test]
	fn test_decode_rejects_malformed_base64() {
		assert!(matches!(
			decode("not!!base64??"),
			Err(DecodeError::Base64(_))
		));
	}

	#[test]
	fn test_decode_rejects_uncompressed_bytes() {
		let raw = BASE64.encode(b"plain bytes, no zlib header");
		assert!(matches!(decode(&raw), Err(DecodeError::Inflate(_))));
	}

	#[test]
	fn test_decode_rejects_invalid_json() {
		let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
		encoder.write_all(b"{ this is not json").unwrap();
		let raw = BASE64.encode(encoder.finish().unwrap());
		assert!(matches!(decode(&raw), Err(DecodeError::Json(_))));
	}

	#[test]
	fn test_decode_requires_order_id() {
		let json = br#"{"order":{"order_numbers":"A-1","store":{"name":"S"},"address":{"area":"X"},"delivery_fee":100},"connectedWorkers":[]}"#;
		let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
		encoder.write_all(json).unwrap();
		let raw = BASE64.encode(encoder.finish().unwrap());

		assert!(matches!(
			decode(&raw),
			Err(DecodeError::MissingField("order.id"))
		));
	}

	#[test]
	fn test_decode_tolerates_absent_worker_list() {
		let json = br#"{"order":{"id":1,"order_numbers":"A-1","store":{"name":"S"},"address":{"area":"X"},"delivery_fee":100}}"#;
		let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
		encoder.write_all(json).unwrap();
		let raw = BASE64.encode(encoder.finish().unwrap());

		let offer = decode(&raw).unwrap();
		assert!(offer.eligible_workers.is_empty());
	}
}
