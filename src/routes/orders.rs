use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::orders::{OrderHistory, OrderStats},
    error::AppResult,
    middleware::auth::CurrentUser,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/stats", get(order_stats))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Line items of the user's successful orders", body = ApiResponse<OrderHistory>)
    ),
    security(("cookie_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<OrderHistory>>> {
    let resp = order_service::orders_for_user(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/stats",
    responses(
        (status = 200, description = "Successful-order count and total spend", body = ApiResponse<OrderStats>)
    ),
    security(("cookie_auth" = [])),
    tag = "Orders"
)]
pub async fn order_stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<OrderStats>>> {
    let resp = order_service::order_stats(&state.pool, &user).await?;
    Ok(Json(resp))
}
