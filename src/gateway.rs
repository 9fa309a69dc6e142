use hmac::{Hmac, Mac};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use crate::{
    config::GatewayConfig,
    error::{AppError, AppResult},
};

type HmacSha256 = Hmac<Sha256>;

/// Client for the third-party payment gateway. Two operations: create a
/// remote payment intent for an amount, and verify the signature the
/// gateway hands back after the client completes payment out-of-band.
#[derive(Clone)]
pub struct PaymentGateway {
    http: reqwest::Client,
    key_id: String,
    key_secret: String,
    base_url: String,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
}

impl PaymentGateway {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            currency: config.currency.clone(),
        }
    }

    /// Create a remote payment intent and return the gateway's identifier.
    /// The gateway expects the amount in minor currency units.
    pub async fn create_intent(
        &self,
        amount: Decimal,
        currency: &str,
        receipt: &str,
    ) -> AppResult<String> {
        let minor_units = (amount * Decimal::ONE_HUNDRED)
            .trunc()
            .to_i64()
            .ok_or_else(|| AppError::Validation("amount out of range".to_string()))?;

        let url = format!("{}/v1/orders", self.base_url);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "amount": minor_units,
                "currency": currency,
                "receipt": receipt,
            }))
            .send()
            .await?
            .error_for_status()?;

        let intent: IntentResponse = response.json().await?;
        Ok(intent.id)
    }

    /// Recompute the HMAC-SHA256 over `{order_id}|{payment_id}` with the
    /// shared secret and compare against the hex signature. Fails closed:
    /// any decode or key error yields false.
    pub fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let Ok(mut mac) = HmacSha256::new_from_slice(self.key_secret.as_bytes()) else {
            return false;
        };
        mac.update(format!("{order_id}|{payment_id}").as_bytes());

        match hex::decode(signature) {
            Ok(provided) => mac.verify_slice(&provided).is_ok(),
            Err(_) => false,
        }
    }
}
