use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use crate::{
    db::DbPool,
    dto::admin::BusinessReport,
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct OrderRow {
    order_id: String,
    total_amount: Decimal,
}

#[derive(FromRow)]
struct ItemRow {
    quantity: i32,
    price: Option<Decimal>,
    category: Option<String>,
}

struct Aggregates {
    total_orders: i64,
    total_revenue: Decimal,
    total_items_sold: i64,
    category_sales: BTreeMap<String, i64>,
    category_revenue: BTreeMap<String, Decimal>,
    unprocessed_items: i64,
}

pub async fn daily(pool: &DbPool, date: NaiveDate) -> AppResult<ApiResponse<BusinessReport>> {
    let from = start_of_day(date);
    let to = start_of_day(
        date.succ_opt()
            .ok_or_else(|| AppError::Validation("date out of range".to_string()))?,
    );

    let aggregates = aggregate_window(pool, Some((from, to))).await?;
    let mut report = build_report(aggregates, "Daily");
    report.date = Some(date);
    Ok(ApiResponse::success("OK", report, Some(Meta::empty())))
}

pub async fn monthly(
    pool: &DbPool,
    month: u32,
    year: i32,
) -> AppResult<ApiResponse<BusinessReport>> {
    let from = first_of_month(year, month)?;
    let to = if month == 12 {
        first_of_month(year + 1, 1)?
    } else {
        first_of_month(year, month + 1)?
    };

    let aggregates = aggregate_window(pool, Some((from, to))).await?;
    let mut report = build_report(aggregates, "Monthly");
    report.month = Some(month);
    report.year = Some(year);
    Ok(ApiResponse::success("OK", report, Some(Meta::empty())))
}

pub async fn yearly(pool: &DbPool, year: i32) -> AppResult<ApiResponse<BusinessReport>> {
    let from = first_of_month(year, 1)?;
    let to = first_of_month(year + 1, 1)?;

    let aggregates = aggregate_window(pool, Some((from, to))).await?;
    let mut report = build_report(aggregates, "Yearly");
    report.year = Some(year);
    Ok(ApiResponse::success("OK", report, Some(Meta::empty())))
}

pub async fn overall(pool: &DbPool) -> AppResult<ApiResponse<BusinessReport>> {
    let aggregates = aggregate_window(pool, None).await?;
    let average = if aggregates.total_orders > 0 {
        Some((aggregates.total_revenue / Decimal::from(aggregates.total_orders)).round_dp(2))
    } else {
        Some(Decimal::ZERO)
    };

    let mut report = build_report(aggregates, "Overall");
    report.average_order_value = average;
    Ok(ApiResponse::success("OK", report, Some(Meta::empty())))
}

/// Walk every successful order in the window and fold its line items into
/// per-category tallies. A line whose product or category cannot be
/// resolved is skipped and counted, never silently dropped and never fatal
/// to the report.
async fn aggregate_window(
    pool: &DbPool,
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> AppResult<Aggregates> {
    let orders: Vec<OrderRow> = match window {
        Some((from, to)) => {
            sqlx::query_as(
                r#"
                SELECT order_id, total_amount FROM orders
                WHERE status = 'SUCCESS' AND created_at >= $1 AND created_at < $2
                "#,
            )
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as("SELECT order_id, total_amount FROM orders WHERE status = 'SUCCESS'")
                .fetch_all(pool)
                .await?
        }
    };

    let mut aggregates = Aggregates {
        total_orders: orders.len() as i64,
        total_revenue: Decimal::ZERO,
        total_items_sold: 0,
        category_sales: BTreeMap::new(),
        category_revenue: BTreeMap::new(),
        unprocessed_items: 0,
    };

    for order in &orders {
        aggregates.total_revenue += order.total_amount;

        let items: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT oi.quantity, p.price, c.name AS category
            FROM order_items oi
            LEFT JOIN products p ON p.id = oi.product_id
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE oi.order_id = $1
            "#,
        )
        .bind(&order.order_id)
        .fetch_all(pool)
        .await?;

        for item in items {
            let (Some(price), Some(category)) = (item.price, item.category) else {
                aggregates.unprocessed_items += 1;
                tracing::warn!(
                    order_id = %order.order_id,
                    "skipping order item with unresolved product or category"
                );
                continue;
            };

            let quantity = i64::from(item.quantity);
            *aggregates.category_sales.entry(category.clone()).or_insert(0) += quantity;
            *aggregates
                .category_revenue
                .entry(category)
                .or_insert(Decimal::ZERO) += price * Decimal::from(item.quantity);
            aggregates.total_items_sold += quantity;
        }
    }

    Ok(aggregates)
}

fn build_report(aggregates: Aggregates, period: &str) -> BusinessReport {
    let top_category_by_quantity = aggregates
        .category_sales
        .iter()
        .max_by_key(|(_, quantity)| **quantity)
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| "N/A".to_string());

    let top_category_by_revenue = aggregates
        .category_revenue
        .iter()
        .max_by(|a, b| a.1.cmp(b.1))
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| "N/A".to_string());

    let category_revenue = aggregates
        .category_revenue
        .into_iter()
        .map(|(name, revenue)| (name, revenue.round_dp(2)))
        .collect();

    BusinessReport {
        period: period.to_string(),
        date: None,
        month: None,
        year: None,
        total_orders: aggregates.total_orders,
        total_revenue: aggregates.total_revenue.round_dp(2),
        average_order_value: None,
        total_items_sold: aggregates.total_items_sold,
        unique_categories: aggregates.category_sales.len(),
        category_sales: aggregates.category_sales,
        category_revenue,
        top_category_by_quantity,
        top_category_by_revenue,
        unprocessed_items: aggregates.unprocessed_items,
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn first_of_month(year: i32, month: u32) -> AppResult<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(start_of_day)
        .ok_or_else(|| AppError::Validation("invalid month or year".to_string()))
}
