use chrono::{DateTime, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use sha2::Sha256;
use uuid::Uuid;

use storefront_api::{
    config::GatewayConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        cart::{AddToCartRequest, UpdateCartItemRequest},
        payments::VerifyPaymentRequest,
    },
    entity::{
        orders::{ActiveModel as OrderActive, OrderStatus},
        products::ActiveModel as ProductActive,
        users::ActiveModel as UserActive,
    },
    gateway::PaymentGateway,
    middleware::auth::{CurrentUser, RoutePolicy},
    models::Role,
    services::{analytics_service, cart_service, payment_service, token_service::TokenService},
    state::AppState,
};

const GATEWAY_SECRET: &str = "test-gateway-secret";

// Integration flow: cart merging and zero-quantity removal, then the
// two-phase checkout with signature verification, terminal-state
// idempotency, the invalid-signature branch, and the analytics roll-up.
#[tokio::test]
async fn cart_checkout_and_analytics_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let user_id = create_user(&state, "shopper", "shopper@example.com").await?;
    let shopper = CurrentUser {
        id: user_id,
        username: "shopper".to_string(),
        email: "shopper@example.com".to_string(),
        role: Role::Customer,
    };

    let category_id = create_category(&state, "Gear").await?;
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Test Widget".into()),
        description: Set(Some("A product for testing".into())),
        price: Set(dec!(1000.00)),
        stock: Set(10),
        category_id: Set(Some(category_id)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    // Repeated adds for the same product merge by incrementing.
    cart_service::add_to_cart(
        &state.pool,
        &shopper,
        AddToCartRequest {
            product_id: product.id,
            quantity: 2,
        },
    )
    .await?;
    cart_service::add_to_cart(
        &state.pool,
        &shopper,
        AddToCartRequest {
            product_id: product.id,
            quantity: 3,
        },
    )
    .await?;
    let quantity: (i32,) = sqlx::query_as(
        "SELECT quantity FROM cart_items WHERE user_id = $1 AND product_id = $2",
    )
    .bind(user_id)
    .bind(product.id)
    .fetch_one(&state.pool)
    .await?;
    assert_eq!(quantity.0, 5);

    // Quantity zero removes the line.
    cart_service::update_quantity(
        &state.pool,
        &shopper,
        product.id,
        UpdateCartItemRequest { quantity: 0 },
    )
    .await?;
    let view = cart_service::get_items(&state.pool, &shopper).await?;
    let view = view.data.expect("cart view");
    assert!(view.lines.is_empty());
    assert_eq!(view.overall_total, Decimal::ZERO);

    // Two items in the cart, then a PENDING order for the cart total.
    cart_service::add_to_cart(
        &state.pool,
        &shopper,
        AddToCartRequest {
            product_id: product.id,
            quantity: 2,
        },
    )
    .await?;
    let order_id = "order_test_1";
    create_pending_order(&state, order_id, user_id, dec!(2000.00)).await?;

    // Valid signature: SUCCESS, one order item per cart line, cart cleared.
    let verify = payment_service::verify_payment(
        &state,
        &shopper,
        VerifyPaymentRequest {
            order_id: order_id.to_string(),
            payment_id: "pay_1".to_string(),
            signature: sign(order_id, "pay_1"),
        },
    )
    .await?;
    assert!(verify.data.expect("verify response").verified);
    assert_eq!(order_status(&state, order_id).await?, "SUCCESS");
    assert_eq!(order_item_count(&state, order_id).await?, 1);
    assert_eq!(cart_line_count(&state, user_id).await?, 0);

    // A second verify for a terminal order is a no-op: no duplicate order
    // items, and a refilled cart stays untouched.
    cart_service::add_to_cart(
        &state.pool,
        &shopper,
        AddToCartRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;
    let verify = payment_service::verify_payment(
        &state,
        &shopper,
        VerifyPaymentRequest {
            order_id: order_id.to_string(),
            payment_id: "pay_1".to_string(),
            signature: sign(order_id, "pay_1"),
        },
    )
    .await?;
    assert!(verify.data.expect("verify response").verified);
    assert_eq!(order_status(&state, order_id).await?, "SUCCESS");
    assert_eq!(order_item_count(&state, order_id).await?, 1);
    assert_eq!(cart_line_count(&state, user_id).await?, 1);

    // Invalid signature: FAILED, no order items, cart untouched.
    let failed_order_id = "order_test_2";
    create_pending_order(&state, failed_order_id, user_id, dec!(1000.00)).await?;
    let verify = payment_service::verify_payment(
        &state,
        &shopper,
        VerifyPaymentRequest {
            order_id: failed_order_id.to_string(),
            payment_id: "pay_2".to_string(),
            signature: "00ff00ff".to_string(),
        },
    )
    .await?;
    assert!(!verify.data.expect("verify response").verified);
    assert_eq!(order_status(&state, failed_order_id).await?, "FAILED");
    assert_eq!(order_item_count(&state, failed_order_id).await?, 0);
    assert_eq!(cart_line_count(&state, user_id).await?, 1);

    // Analytics over a fixed synthetic day: two successful orders of
    // 100.00 and 50.50, one resolvable line and one orphaned line.
    let report_day = NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date");
    let stamp: DateTime<Utc> = "2024-03-15T10:00:00Z".parse()?;
    insert_success_order(&state, "order_report_1", user_id, dec!(100.00), stamp).await?;
    insert_success_order(&state, "order_report_2", user_id, dec!(50.50), stamp).await?;
    insert_order_item(&state, "order_report_1", product.id, 2, dec!(1000.00)).await?;
    insert_order_item(&state, "order_report_2", Uuid::new_v4(), 1, dec!(50.50)).await?;

    let report = analytics_service::daily(&state.pool, report_day).await?;
    let report = report.data.expect("business report");
    assert_eq!(report.total_orders, 2);
    assert_eq!(report.total_revenue, dec!(150.50));
    assert_eq!(report.total_items_sold, 2);
    assert_eq!(report.category_sales.get("Gear"), Some(&2));
    assert_eq!(report.category_revenue.get("Gear"), Some(&dec!(2000.00)));
    assert_eq!(report.top_category_by_quantity, "Gear");
    assert_eq!(report.unprocessed_items, 1);

    // A day with no orders reports zeros and N/A categories.
    let empty_day = NaiveDate::from_ymd_opt(2024, 3, 16).expect("valid date");
    let report = analytics_service::daily(&state.pool, empty_day).await?;
    let report = report.data.expect("business report");
    assert_eq!(report.total_orders, 0);
    assert_eq!(report.total_revenue, Decimal::ZERO);
    assert_eq!(report.top_category_by_quantity, "N/A");
    assert_eq!(report.top_category_by_revenue, "N/A");

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, cart_items, product_images, products, categories, auth_tokens, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState {
        pool,
        orm,
        tokens: TokenService::new("test-secret", 3600),
        gateway: PaymentGateway::new(&GatewayConfig {
            key_id: "test-key".to_string(),
            key_secret: GATEWAY_SECRET.to_string(),
            base_url: "http://localhost:0".to_string(),
            currency: "INR".to_string(),
        }),
        policy: RoutePolicy::default(),
    })
}

fn sign(order_id: &str, payment_id: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(GATEWAY_SECRET.as_bytes())
        .expect("hmac accepts any key length");
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

async fn create_user(state: &AppState, username: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(Role::Customer.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_category(state: &AppState, name: &str) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
        .bind(id)
        .bind(name)
        .execute(&state.pool)
        .await?;
    Ok(id)
}

async fn create_pending_order(
    state: &AppState,
    order_id: &str,
    user_id: Uuid,
    total_amount: Decimal,
) -> anyhow::Result<()> {
    OrderActive {
        order_id: Set(order_id.to_string()),
        user_id: Set(user_id),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

async fn insert_success_order(
    state: &AppState,
    order_id: &str,
    user_id: Uuid,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (order_id, user_id, total_amount, status, created_at, updated_at)
        VALUES ($1, $2, $3, 'SUCCESS', $4, $4)
        "#,
    )
    .bind(order_id)
    .bind(user_id)
    .bind(total_amount)
    .bind(created_at)
    .execute(&state.pool)
    .await?;
    Ok(())
}

async fn insert_order_item(
    state: &AppState,
    order_id: &str,
    product_id: Uuid,
    quantity: i32,
    price_per_unit: Decimal,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO order_items (id, order_id, product_id, quantity, price_per_unit, total_price)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(price_per_unit)
    .bind(price_per_unit * Decimal::from(quantity))
    .execute(&state.pool)
    .await?;
    Ok(())
}

async fn order_status(state: &AppState, order_id: &str) -> anyhow::Result<String> {
    let row: (String,) = sqlx::query_as("SELECT status FROM orders WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(row.0)
}

async fn order_item_count(state: &AppState, order_id: &str) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM order_items WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(row.0)
}

async fn cart_line_count(state: &AppState, user_id: Uuid) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(row.0)
}
