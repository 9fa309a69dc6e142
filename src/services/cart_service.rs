use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::cart::{AddToCartRequest, CartCount, CartLine, CartView, UpdateCartItemRequest},
    error::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::CartItem,
    response::{ApiResponse, Meta},
};

/// Shown for products that have no image rows.
const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/400?text=No+Image";

/// Upsert: an existing (user, product) row is merged by incrementing its
/// quantity, never duplicated.
pub async fn add_to_cart(
    pool: &DbPool,
    user: &CurrentUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }

    let product: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    if product.is_none() {
        return Err(AppError::NotFound);
    }

    let cart_item: CartItem = sqlx::query_as(
        r#"
        INSERT INTO cart_items (id, user_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, product_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(payload.product_id)
    .bind(payload.quantity)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product added to cart",
        cart_item,
        None,
    ))
}

/// Overwrite the row's quantity; zero deletes the row. The row must exist.
pub async fn update_quantity(
    pool: &DbPool,
    user: &CurrentUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.quantity < 0 {
        return Err(AppError::Validation(
            "quantity must not be negative".to_string(),
        ));
    }

    let existing: Option<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user.id)
            .bind(product_id)
            .fetch_optional(pool)
            .await?;
    if existing.is_none() {
        return Err(AppError::NotFound);
    }

    if payload.quantity == 0 {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user.id)
            .bind(product_id)
            .execute(pool)
            .await?;
    } else {
        sqlx::query("UPDATE cart_items SET quantity = $3 WHERE user_id = $1 AND product_id = $2")
            .bind(user.id)
            .bind(product_id)
            .bind(payload.quantity)
            .execute(pool)
            .await?;
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Cart item updated",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Deleting an absent row is a no-op; repeated deletes succeed.
pub async fn delete_item(
    pool: &DbPool,
    user: &CurrentUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
        .bind(user.id)
        .bind(product_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        tracing::debug!(%product_id, "cart delete for absent row");
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Cart item deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

#[derive(FromRow)]
struct CartLineRow {
    product_id: Uuid,
    name: String,
    description: Option<String>,
    price: Decimal,
    quantity: i32,
    image_url: Option<String>,
}

pub async fn get_items(pool: &DbPool, user: &CurrentUser) -> AppResult<ApiResponse<CartView>> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        r#"
        SELECT ci.product_id, p.name, p.description, p.price, ci.quantity,
               (SELECT pi.image_url FROM product_images pi
                WHERE pi.product_id = p.id ORDER BY pi.id LIMIT 1) AS image_url
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at
        "#,
    )
    .bind(user.id)
    .fetch_all(pool)
    .await?;

    let mut overall_total = Decimal::ZERO;
    let lines = rows
        .into_iter()
        .map(|row| {
            let line_total = row.price * Decimal::from(row.quantity);
            overall_total += line_total;
            CartLine {
                product_id: row.product_id,
                name: row.name,
                description: row.description,
                image_url: row.image_url.unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
                price_per_unit: row.price,
                quantity: row.quantity,
                line_total,
            }
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        CartView {
            lines,
            overall_total,
        },
        Some(Meta::empty()),
    ))
}

pub async fn item_count(pool: &DbPool, user: &CurrentUser) -> AppResult<ApiResponse<CartCount>> {
    let total: (i64,) =
        sqlx::query_as("SELECT COALESCE(SUM(quantity), 0) FROM cart_items WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(pool)
            .await?;

    Ok(ApiResponse::success(
        "OK",
        CartCount { count: total.0 },
        None,
    ))
}
