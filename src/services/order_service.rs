use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::orders::{OrderHistory, OrderLineDetail, OrderStats},
    error::AppResult,
    middleware::auth::CurrentUser,
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct HistoryRow {
    order_id: String,
    product_id: Uuid,
    quantity: i32,
    price_per_unit: Decimal,
    total_price: Decimal,
    name: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
}

/// Purchase history: every line item of the user's successful orders,
/// joined with live product data. Lines whose product has since been
/// deleted are skipped.
pub async fn orders_for_user(
    pool: &DbPool,
    user: &CurrentUser,
) -> AppResult<ApiResponse<OrderHistory>> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        r#"
        SELECT oi.order_id, oi.product_id, oi.quantity, oi.price_per_unit, oi.total_price,
               p.name, p.description,
               (SELECT pi.image_url FROM product_images pi
                WHERE pi.product_id = p.id ORDER BY pi.id LIMIT 1) AS image_url
        FROM order_items oi
        JOIN orders o ON o.order_id = oi.order_id
        LEFT JOIN products p ON p.id = oi.product_id
        WHERE o.user_id = $1 AND o.status = 'SUCCESS'
        ORDER BY o.created_at DESC, oi.created_at
        "#,
    )
    .bind(user.id)
    .fetch_all(pool)
    .await?;

    let items = rows
        .into_iter()
        .filter_map(|row| {
            let name = row.name?;
            Some(OrderLineDetail {
                order_id: row.order_id,
                product_id: row.product_id,
                name,
                description: row.description,
                image_url: row.image_url,
                price_per_unit: row.price_per_unit,
                quantity: row.quantity,
                total_price: row.total_price,
            })
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderHistory { items },
        Some(Meta::empty()),
    ))
}

pub async fn order_stats(pool: &DbPool, user: &CurrentUser) -> AppResult<ApiResponse<OrderStats>> {
    let (total_orders, total_spending): (i64, Decimal) = sqlx::query_as(
        r#"
        SELECT COUNT(DISTINCT o.order_id), COALESCE(SUM(oi.total_price), 0)
        FROM orders o
        JOIN order_items oi ON oi.order_id = o.order_id
        WHERE o.user_id = $1 AND o.status = 'SUCCESS'
        "#,
    )
    .bind(user.id)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success(
        "OK",
        OrderStats {
            total_orders,
            total_spending,
        },
        None,
    ))
}
