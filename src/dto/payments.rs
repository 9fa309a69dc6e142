use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// Total to charge; must be greater than zero.
    pub amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    /// Gateway-assigned order identifier; the client completes payment
    /// out-of-band against this id.
    pub order_id: String,
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub order_id: String,
    pub verified: bool,
}
