use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::models::User;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ModifyUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DailyQuery {
    /// Calendar day in YYYY-MM-DD format.
    pub date: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MonthlyQuery {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct YearlyQuery {
    pub year: i32,
}

/// Revenue roll-up over successful orders for one reporting window.
/// All monetary figures are rounded to 2 decimal places.
#[derive(Debug, Serialize, ToSchema)]
pub struct BusinessReport {
    pub period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub total_orders: i64,
    pub total_revenue: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_order_value: Option<Decimal>,
    pub total_items_sold: i64,
    pub unique_categories: usize,
    pub category_sales: BTreeMap<String, i64>,
    pub category_revenue: BTreeMap<String, Decimal>,
    pub top_category_by_quantity: String,
    pub top_category_by_revenue: String,
    /// Line items skipped because their product or category could not be
    /// resolved; counted instead of silently dropped.
    pub unprocessed_items: i64,
}
