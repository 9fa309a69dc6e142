use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QuerySelect, RelationTrait, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::payments::{CheckoutRequest, CheckoutResponse, VerifyPaymentRequest, VerifyPaymentResponse},
    entity::{
        cart_items::{self, Column as CartCol, Entity as CartItems},
        order_items::ActiveModel as OrderItemActive,
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, OrderStatus},
        products::Column as ProdCol,
    },
    error::{AppError, AppResult},
    middleware::auth::CurrentUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Phase 1: obtain a remote payment intent, then record the PENDING order
/// under the gateway's identifier. Nothing is written locally unless the
/// remote call succeeds, so either both sides exist or neither does.
/// The amount must already be validated > 0 by the caller.
pub async fn create_order(
    state: &AppState,
    user: &CurrentUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    let receipt = format!("txn_{}", Utc::now().timestamp_millis());
    let currency = state.gateway.currency.clone();
    let order_id = state
        .gateway
        .create_intent(payload.amount, &currency, &receipt)
        .await?;

    OrderActive {
        order_id: Set(order_id.clone()),
        user_id: Set(user.id),
        total_amount: Set(payload.amount),
        status: Set(OrderStatus::Pending),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "checkout_created",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        CheckoutResponse {
            order_id,
            amount: payload.amount,
            currency,
        },
        Some(Meta::empty()),
    ))
}

/// Phase 2: check the gateway signature and settle the order.
///
/// Valid signature: one transaction moves the order to SUCCESS, snapshots
/// the cart into order items and clears the cart. Invalid signature: the
/// order is marked FAILED. Any error inside the valid branch is caught and
/// compensated with a best-effort FAILED write; that compensation is not
/// atomic with the failure that triggered it.
pub async fn verify_payment(
    state: &AppState,
    user: &CurrentUser,
    payload: VerifyPaymentRequest,
) -> AppResult<ApiResponse<VerifyPaymentResponse>> {
    let signature_valid =
        state
            .gateway
            .verify_signature(&payload.order_id, &payload.payment_id, &payload.signature);

    let verified = if signature_valid {
        match settle_success(state, &payload.order_id, user.id).await {
            Ok(success) => success,
            Err(AppError::NotFound) => return Err(AppError::NotFound),
            Err(err) => {
                tracing::error!(error = %err, order_id = %payload.order_id, "payment settlement failed");
                compensate_failure(state, &payload.order_id).await;
                false
            }
        }
    } else {
        mark_failed(state, &payload.order_id).await?;
        false
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "payment_verified",
        Some("orders"),
        Some(serde_json::json!({ "order_id": payload.order_id, "verified": verified })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let message = if verified {
        "Payment verified"
    } else {
        "Payment verification failed"
    };
    Ok(ApiResponse::success(
        message,
        VerifyPaymentResponse {
            order_id: payload.order_id,
            verified,
        },
        Some(Meta::empty()),
    ))
}

#[derive(Debug, FromQueryResult)]
struct CartSnapshotRow {
    product_id: Uuid,
    quantity: i32,
    price: Decimal,
}

/// Status update, order-item snapshot and cart deletion commit or roll
/// back together. The row lock on the order serializes concurrent verify
/// attempts for the same id; a terminal order is left untouched.
async fn settle_success(state: &AppState, order_id: &str, user_id: Uuid) -> AppResult<bool> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(OrderCol::OrderId.eq(order_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.status.is_terminal() {
        txn.commit().await?;
        return Ok(order.status == OrderStatus::Success);
    }

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Success);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    let rows = CartItems::find()
        .select_only()
        .column_as(CartCol::ProductId, "product_id")
        .column_as(CartCol::Quantity, "quantity")
        .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
        .column_as(ProdCol::Price, "price")
        .filter(CartCol::UserId.eq(user_id))
        .into_model::<CartSnapshotRow>()
        .all(&txn)
        .await?;

    for row in &rows {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.order_id.clone()),
            product_id: Set(row.product_id),
            quantity: Set(row.quantity),
            price_per_unit: Set(row.price),
            total_price: Set(row.price * Decimal::from(row.quantity)),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(true)
}

/// Invalid-signature branch: the order must exist; a still-PENDING order
/// moves to FAILED, a terminal one is left as it is.
async fn mark_failed(state: &AppState, order_id: &str) -> AppResult<()> {
    let order = Orders::find()
        .filter(OrderCol::OrderId.eq(order_id))
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.status.is_terminal() {
        return Ok(());
    }

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Failed);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;
    Ok(())
}

/// Compensation after a settlement error. Best-effort: a missing order or
/// a failing write is logged and swallowed, so the order can be left
/// PENDING if this write also fails.
async fn compensate_failure(state: &AppState, order_id: &str) {
    match mark_failed(state, order_id).await {
        Ok(()) => {}
        Err(AppError::NotFound) => {
            tracing::warn!(%order_id, "order missing during failure compensation");
        }
        Err(err) => {
            tracing::warn!(error = %err, %order_id, "failed to mark order FAILED");
        }
    }
}
