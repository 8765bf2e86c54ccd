pub mod razorpay;
pub mod signature;

use async_trait::async_trait;
use common::PaymentStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from the payment gateway.
///
/// `Unavailable` means the gateway could not be reached (timeout, connect
/// failure) and the local payment keeps its prior state; `Rejected` means
/// the gateway answered and declined, which is terminal for the attempt.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
    #[error("gateway rejected request: {description}")]
    Rejected {
        code: Option<String>,
        description: String,
    },
}

/// Order creation request. Amounts are in minor units (paise).
#[derive(Clone, Debug, Serialize)]
pub struct CreateOrderRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: Value,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
}

/// Payment object fetched from the gateway.
#[derive(Clone, Debug, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GatewayRefund {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Refund creation request. Amount in minor units.
#[derive(Clone, Debug, Serialize)]
pub struct CreateRefundRequest {
    pub amount_minor: i64,
    pub notes: Value,
}

/// Egress contract to the hosted payment gateway. Constructor-injected into
/// the orchestrator so tests can substitute a fake.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, req: CreateOrderRequest) -> Result<GatewayOrder, GatewayError>;

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError>;

    async fn create_refund(
        &self,
        payment_id: &str,
        req: CreateRefundRequest,
    ) -> Result<GatewayRefund, GatewayError>;
}

/// Map a gateway payment state onto the local lifecycle for the client-side
/// verify path. Unknown states leave the payment unchanged.
pub fn map_gateway_status(gateway_status: &str) -> Option<PaymentStatus> {
    match gateway_status {
        "captured" => Some(PaymentStatus::Completed),
        "authorized" => Some(PaymentStatus::Processing),
        "failed" => Some(PaymentStatus::Failed),
        _ => None,
    }
}

/// Convert a rupee amount into gateway minor units (paise).
pub fn to_minor_units(amount: i64) -> i64 {
    amount * 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_status_mapping() {
        assert_eq!(map_gateway_status("captured"), Some(PaymentStatus::Completed));
        assert_eq!(
            map_gateway_status("authorized"),
            Some(PaymentStatus::Processing)
        );
        assert_eq!(map_gateway_status("failed"), Some(PaymentStatus::Failed));
        assert_eq!(map_gateway_status("created"), None);
        assert_eq!(map_gateway_status(""), None);
    }

    #[test]
    fn minor_units() {
        assert_eq!(to_minor_units(250_000), 25_000_000);
    }
}
