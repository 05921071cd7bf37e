//! HTTP implementation of the order gateway.
//!
//! Endpoint paths and body field names follow the delivery backend's API:
//! order decisions are posted with the worker id under
//! `delivery_worker_id`, status updates carry the status string under
//! `order_status`.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use dispatch_types::{OrderId, OrderStatus, WorkerId, WorkerRates};

use crate::{GatewayError, OrderGateway};

/// Gateway speaking JSON over HTTP to the delivery backend.
pub struct HttpGateway {
	client: reqwest::Client,
	base_url: String,
}

#[derive(Debug, Serialize)]
struct DecisionBody {
	order_id: OrderId,
	delivery_worker_id: WorkerId,
}

#[derive(Debug, Serialize)]
struct StatusBody {
	order_status: &'static str,
}

#[derive(Debug, Serialize)]
struct CancelBody {
	order_id: OrderId,
	delivery_worker_id: WorkerId,
	#[serde(skip_serializing_if = "Option::is_none")]
	reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct AvailabilityBody {
	status: &'static str,
}

impl HttpGateway {
	/// Creates a gateway for the given backend base URL.
	pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
		let client = reqwest::Client::builder().timeout(timeout).build()?;
		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	async fn post<B: Serialize>(
		&self,
		operation: &'static str,
		path: &str,
		body: &B,
	) -> Result<(), GatewayError> {
		debug!(%path, operation, "posting to backend");
		let response = self.client.post(self.url(path)).json(body).send().await?;

		let status = response.status();
		if !status.is_success() {
			return Err(GatewayError::Status {
				operation,
				status: status.as_u16(),
			});
		}
		Ok(())
	}
}

#[async_trait]
impl OrderGateway for HttpGateway {
	async fn accept_order(
		&self,
		order_id: OrderId,
		worker_id: WorkerId,
	) -> Result<(), GatewayError> {
		let body = DecisionBody {
			order_id,
			delivery_worker_id: worker_id,
		};
		self.post("accept_order", "/api/accept-order-for-delivery", &body)
			.await
	}

	async fn reject_order(
		&self,
		order_id: OrderId,
		worker_id: WorkerId,
	) -> Result<(), GatewayError> {
		let body = DecisionBody {
			order_id,
			delivery_worker_id: worker_id,
		};
		self.post("reject_order", "/api/reject-order-for-delivery", &body)
			.await
	}

	async fn update_order_status(
		&self,
		order_id: OrderId,
		status: OrderStatus,
	) -> Result<(), GatewayError> {
		let body = StatusBody {
			order_status: status.wire_name(),
		};
		self.post(
			"update_order_status",
			&format!("/api/orders/status/{order_id}"),
			&body,
		)
		.await
	}

	async fn cancel_order(
		&self,
		order_id: OrderId,
		worker_id: WorkerId,
		reason: Option<String>,
	) -> Result<(), GatewayError> {
		let body = CancelBody {
			order_id,
			delivery_worker_id: worker_id,
			reason,
		};
		self.post("cancel_order", "/api/cancel-order", &body).await
	}

	async fn set_availability(
		&self,
		worker_id: WorkerId,
		available: bool,
	) -> Result<(), GatewayError> {
		let body = AvailabilityBody {
			status: if available { "connected" } else { "offline" },
		};
		self.post(
			"set_availability",
			&format!("/api/delivery-men/status/{worker_id}"),
			&body,
		)
		.await
	}

	async fn worker_rates(&self, worker_id: WorkerId) -> Result<WorkerRates, GatewayError> {
		let path = format!("/api/delivery-men/rates/{worker_id}");
		let response = self.client.get(self.url(&path)).send().await?;

		let status = response.status();
		if !status.is_success() {
			return Err(GatewayError::Status {
				operation: "worker_rates",
				status: status.as_u16(),
			});
		}
		Ok(response.json::<WorkerRates>().await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_base_url_trailing_slash_is_normalized() {
		let gateway = HttpGateway::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
		assert_eq!(
			gateway.url("/api/cancel-order"),
			"http://localhost:8000/api/cancel-order"
		);
	}

	#[test]
	fn test_decision_body_field_names() {
		let body = DecisionBody {
			order_id: 12,
			delivery_worker_id: 7,
		};
		let json = serde_json::to_value(&body).unwrap();
		assert_eq!(json["order_id"], 12);
		assert_eq!(json["delivery_worker_id"], 7);
	}

	#[test]
	fn test_rates_deserialization() {
		let rates: WorkerRates =
			serde_json::from_str(r#"{"acceptance_rate": 82.5, "rejection_rate": 17.5}"#).unwrap();
		assert_eq!(rates.acceptance_rate, 82.5);
		assert_eq!(rates.rejection_rate, 17.5);
	}
}
