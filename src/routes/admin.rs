use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    dto::{
        admin::{
            BusinessReport, DailyQuery, ModifyUserRequest, MonthlyQuery, UserList, YearlyQuery,
        },
        products::{CategoryList, CreateCategoryRequest, CreateProductRequest, ProductDetail},
    },
    error::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::{Category, User},
    response::ApiResponse,
    routes::params::Pagination,
    services::{admin_service, analytics_service, product_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user).put(modify_user))
        .route("/products", post(create_product))
        .route("/products/{id}", delete(delete_product))
        .route("/categories", post(create_category))
        .route("/business/daily", get(daily_business))
        .route("/business/monthly", get(monthly_business))
        .route("/business/yearly", get(yearly_business))
        .route("/business/overall", get(overall_business))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List users (admin only)", body = ApiResponse<UserList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("cookie_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = admin_service::list_users(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Get user (admin only)", body = ApiResponse<User>),
        (status = 404, description = "Not Found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Admin"
)]
pub async fn get_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = admin_service::get_user(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ModifyUserRequest,
    responses(
        (status = 200, description = "Update username/email/role; invalidates the user's sessions", body = ApiResponse<User>),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Not Found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Admin"
)]
pub async fn modify_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModifyUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = admin_service::modify_user(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 200, description = "Create product with its image", body = ApiResponse<ProductDetail>),
        (status = 400, description = "Validation failure"),
    ),
    security(("cookie_auth" = [])),
    tag = "Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::create_product(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Delete product and its images"),
        (status = 404, description = "Not Found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state.pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Create category", body = ApiResponse<Category>),
        (status = 400, description = "Name empty or already taken"),
    ),
    security(("cookie_auth" = [])),
    tag = "Admin"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = product_service::create_category(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/admin/business/daily",
    params(("date" = String, Query, description = "Day in YYYY-MM-DD format")),
    responses(
        (status = 200, description = "Daily revenue report", body = ApiResponse<BusinessReport>),
        (status = 400, description = "Bad date"),
    ),
    security(("cookie_auth" = [])),
    tag = "Admin"
)]
pub async fn daily_business(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<DailyQuery>,
) -> AppResult<Json<ApiResponse<BusinessReport>>> {
    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d").map_err(|_| {
        AppError::Validation("Invalid date format. Use YYYY-MM-DD format".to_string())
    })?;
    if date > Utc::now().date_naive() {
        return Err(AppError::Validation(
            "Cannot analyze future dates".to_string(),
        ));
    }
    let resp = analytics_service::daily(&state.pool, date).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/admin/business/monthly",
    params(
        ("month" = u32, Query, description = "Month, 1-12"),
        ("year" = i32, Query, description = "Year, 2020-2030")
    ),
    responses(
        (status = 200, description = "Monthly revenue report", body = ApiResponse<BusinessReport>),
        (status = 400, description = "Month or year out of range"),
    ),
    security(("cookie_auth" = [])),
    tag = "Admin"
)]
pub async fn monthly_business(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<MonthlyQuery>,
) -> AppResult<Json<ApiResponse<BusinessReport>>> {
    if !(1..=12).contains(&query.month) {
        return Err(AppError::Validation(
            "Month must be between 1 and 12".to_string(),
        ));
    }
    validate_year(query.year)?;
    let resp = analytics_service::monthly(&state.pool, query.month, query.year).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/admin/business/yearly",
    params(("year" = i32, Query, description = "Year, 2020-2030")),
    responses(
        (status = 200, description = "Yearly revenue report", body = ApiResponse<BusinessReport>),
        (status = 400, description = "Year out of range"),
    ),
    security(("cookie_auth" = [])),
    tag = "Admin"
)]
pub async fn yearly_business(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<YearlyQuery>,
) -> AppResult<Json<ApiResponse<BusinessReport>>> {
    validate_year(query.year)?;
    let resp = analytics_service::yearly(&state.pool, query.year).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/admin/business/overall",
    responses(
        (status = 200, description = "All-time revenue report", body = ApiResponse<BusinessReport>),
    ),
    security(("cookie_auth" = [])),
    tag = "Admin"
)]
pub async fn overall_business(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<ApiResponse<BusinessReport>>> {
    let resp = analytics_service::overall(&state.pool).await?;
    Ok(Json(resp))
}

fn validate_year(year: i32) -> AppResult<()> {
    if !(2020..=2030).contains(&year) {
        return Err(AppError::Validation(
            "Year must be between 2020 and 2030".to_string(),
        ));
    }
    Ok(())
}
