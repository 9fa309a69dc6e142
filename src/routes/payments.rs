use axum::{Json, Router, extract::State, routing::post};
use rust_decimal::Decimal;

use crate::{
    dto::payments::{
        CheckoutRequest, CheckoutResponse, VerifyPaymentRequest, VerifyPaymentResponse,
    },
    error::{AppError, AppResult},
    middleware::auth::CurrentUser,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/verify", post(verify_payment))
}

#[utoipa::path(
    post,
    path = "/api/payments/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "PENDING order created under the gateway id", body = ApiResponse<CheckoutResponse>),
        (status = 400, description = "Amount must be greater than zero"),
        (status = 502, description = "Payment gateway unreachable"),
    ),
    security(("cookie_auth" = [])),
    tag = "Payments"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<CheckoutResponse>>> {
    if payload.amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }
    let resp = payment_service::create_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Signature checked and order settled either way", body = ApiResponse<VerifyPaymentResponse>),
        (status = 404, description = "Order not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> AppResult<Json<ApiResponse<VerifyPaymentResponse>>> {
    let resp = payment_service::verify_payment(&state, &user, payload).await?;
    Ok(Json(resp))
}
