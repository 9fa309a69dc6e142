use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
};

use crate::{
    dto::auth::{LoginRequest, RegisterRequest, SessionUser},
    error::AppResult,
    middleware::auth::{AUTH_COOKIE, CurrentUser},
    models::User,
    response::{ApiResponse, Meta},
    services::auth_service::{login_user, logout_user, register_user},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/verify", get(verify))
}

fn session_cookie(token: &str, max_age: i64) -> String {
    format!("{AUTH_COOKIE}={token}; HttpOnly; Path=/; Max-Age={max_age}; SameSite=Lax")
}

fn clear_session_cookie() -> String {
    format!("{AUTH_COOKIE}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax")
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Register user", body = ApiResponse<User>),
        (status = 400, description = "Username or email already in use")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = register_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login and set the session cookie", body = ApiResponse<SessionUser>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let (resp, issued) = login_user(&state, payload).await?;
    let cookie = session_cookie(&issued.value, state.tokens.ttl_secs());
    Ok(([(header::SET_COOKIE, cookie)], Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Invalidate the session and clear the cookie"),
        (status = 401, description = "Not authenticated")
    ),
    security(("cookie_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let resp = logout_user(&state, &user).await?;
    Ok(([(header::SET_COOKIE, clear_session_cookie())], Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/auth/verify",
    responses(
        (status = 200, description = "Echo the authenticated identity", body = ApiResponse<SessionUser>),
        (status = 401, description = "Not authenticated")
    ),
    security(("cookie_auth" = [])),
    tag = "Auth"
)]
pub async fn verify(user: CurrentUser) -> Json<ApiResponse<SessionUser>> {
    let session = SessionUser {
        username: user.username,
        role: user.role,
    };
    Json(ApiResponse::success("OK", session, Some(Meta::empty())))
}
