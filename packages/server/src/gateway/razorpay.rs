use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::GatewayConfig;

use super::{
    CreateOrderRequest, CreateRefundRequest, GatewayError, GatewayOrder, GatewayPayment,
    GatewayRefund, PaymentGateway,
};

/// Razorpay REST client. All calls are bounded by the configured timeout;
/// exceeding it surfaces as `GatewayError::Unavailable` and leaves local
/// state untouched.
pub struct RazorpayGateway {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

/// Razorpay error envelope: `{"error": {"code": ..., "description": ...}}`.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl RazorpayGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("client build failed: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        })
    }

    fn transport_error(e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Unavailable("gateway request timed out".into())
        } else {
            GatewayError::Unavailable(e.to_string())
        }
    }

    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let resp = req
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = resp.status();
        if status.is_success() {
            return resp.json::<T>().await.map_err(Self::transport_error);
        }

        if status.is_server_error() {
            return Err(GatewayError::Unavailable(format!(
                "gateway returned {status}"
            )));
        }

        let detail = resp
            .json::<ErrorEnvelope>()
            .await
            .map(|e| e.error)
            .unwrap_or(ErrorDetail {
                code: None,
                description: None,
            });

        Err(GatewayError::Rejected {
            code: detail.code,
            description: detail
                .description
                .unwrap_or_else(|| format!("gateway returned {status}")),
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, req: CreateOrderRequest) -> Result<GatewayOrder, GatewayError> {
        let body = json!({
            "amount": req.amount_minor,
            "currency": req.currency,
            "receipt": req.receipt,
            "notes": req.notes,
        });

        self.execute(
            self.http
                .post(format!("{}/orders", self.base_url))
                .json(&body),
        )
        .await
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        self.execute(
            self.http
                .get(format!("{}/payments/{payment_id}", self.base_url)),
        )
        .await
    }

    async fn create_refund(
        &self,
        payment_id: &str,
        req: CreateRefundRequest,
    ) -> Result<GatewayRefund, GatewayError> {
        let body = json!({
            "amount": req.amount_minor,
            "notes": req.notes,
        });

        self.execute(
            self.http
                .post(format!("{}/payments/{payment_id}/refund", self.base_url))
                .json(&body),
        )
        .await
    }
}
