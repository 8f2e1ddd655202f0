//! Client for the hosted payment provider.
//!
//! All outbound calls go through the [`PaymentGateway`] trait so the
//! HTTP client can be swapped for a mock in tests. The production
//! implementation is [`HttpPaymentGateway`].

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use tracing::error;
use utoipa::ToSchema;

use crate::config::GatewayConfig;
use crate::errors::ServiceError;

/// Card details submitted for tokenization. The raw number is
/// forwarded to the provider and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CardTokenRequest {
    pub card_number: String,
    pub expiration_month: i16,
    pub expiration_year: i16,
    pub security_code: String,
    pub cardholder_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardToken {
    pub id: String,
    pub last_four_digits: String,
    /// Provider's card brand identifier, e.g. "visa".
    #[serde(default)]
    pub payment_method_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub token: String,
    pub transaction_amount: Decimal,
    pub installments: u32,
    pub description: String,
    /// Our order id, echoed back by the provider on status lookups.
    pub external_reference: String,
    pub payer_email: String,
}

/// A payment as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub transaction_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferenceItem {
    pub title: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    pub external_reference: String,
    pub payer_email: String,
}

/// Hosted checkout preference returned by the provider. `init_point`
/// is the URL the mobile client opens.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreferenceResponse {
    pub id: String,
    pub init_point: String,
    #[serde(default)]
    pub sandbox_init_point: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_card_token(&self, req: &CardTokenRequest) -> Result<CardToken, ServiceError>;

    async fn create_payment(&self, req: &PaymentRequest) -> Result<GatewayPayment, ServiceError>;

    async fn create_preference(
        &self,
        req: &PreferenceRequest,
    ) -> Result<PreferenceResponse, ServiceError>;

    async fn get_payment(&self, payment_id: &str) -> Result<GatewayPayment, ServiceError>;
}

pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl HttpPaymentGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(path, error = %e, "payment provider request failed");
                ServiceError::GatewayError("payment provider unreachable".to_string())
            })?;

        Self::parse_response(path, response).await
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                error!(path, error = %e, "payment provider request failed");
                ServiceError::GatewayError("payment provider unreachable".to_string())
            })?;

        Self::parse_response(path, response).await
    }

    async fn parse_response<T: for<'de> Deserialize<'de>>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound(
                "payment provider resource not found".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(path, %status, body, "payment provider returned error");
            return Err(ServiceError::GatewayError(format!(
                "payment provider returned {}",
                status
            )));
        }

        response.json::<T>().await.map_err(|e| {
            error!(path, error = %e, "payment provider response malformed");
            ServiceError::GatewayError("malformed provider response".to_string())
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_card_token(&self, req: &CardTokenRequest) -> Result<CardToken, ServiceError> {
        self.post_json("/v1/card_tokens", req).await
    }

    async fn create_payment(&self, req: &PaymentRequest) -> Result<GatewayPayment, ServiceError> {
        self.post_json("/v1/payments", req).await
    }

    async fn create_preference(
        &self,
        req: &PreferenceRequest,
    ) -> Result<PreferenceResponse, ServiceError> {
        self.post_json("/checkout/preferences", req).await
    }

    async fn get_payment(&self, payment_id: &str) -> Result<GatewayPayment, ServiceError> {
        self.get_json(&format!("/v1/payments/{}", payment_id)).await
    }
}

type HmacSha256 = Hmac<Sha256>;

/// Verifies the HMAC-SHA256 hex signature of a raw webhook body.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);

    let expected = match hex::decode(signature.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_signature_roundtrip() {
        let secret = "whsec_test";
        let body = br#"{"type":"payment","data":{"id":"123"}}"#;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let signature = hex::encode(mac.finalize().into_bytes());

        assert!(verify_webhook_signature(secret, body, &signature));
        assert!(!verify_webhook_signature(secret, b"tampered", &signature));
        assert!(!verify_webhook_signature("wrong", body, &signature));
    }

    #[test]
    fn malformed_signature_is_rejected() {
        assert!(!verify_webhook_signature("s", b"body", "not-hex"));
        assert!(!verify_webhook_signature("s", b"body", ""));
    }
}
