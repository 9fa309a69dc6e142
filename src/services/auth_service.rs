use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{LoginRequest, RegisterRequest, SessionUser},
    error::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::{Role, User},
    response::{ApiResponse, Meta},
    services::token_service::IssuedToken,
    state::AppState,
};

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        username,
        email,
        password,
    } = payload;

    let username = username.trim().to_string();
    let email = email.trim().to_string();
    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "username, email and password are required".to_string(),
        ));
    }

    let taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(&username)
        .fetch_optional(&state.pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::Validation("Username is already taken".to_string()));
    }

    let taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::Validation(
            "Email is already registered".to_string(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();

    let user: User = sqlx::query_as(
        "INSERT INTO users (id, username, email, password_hash, role) VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&username)
    .bind(&email)
    .bind(password_hash)
    .bind(Role::Customer.as_str())
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("User created", user, None))
}

/// Authenticate, rotate the stored token set (delete-then-reissue) and hand
/// the new token back so the route can set the session cookie.
pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<(ApiResponse<SessionUser>, IssuedToken)> {
    let LoginRequest { username, password } = payload;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username.as_str())
        .fetch_optional(&state.pool)
        .await?;
    let user = match user {
        Some(u) => u,
        None => {
            return Err(AppError::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let role = Role::parse(&user.role)
        .ok_or_else(|| anyhow::anyhow!("unknown role {:?} for user {}", user.role, user.id))?;

    state.tokens.invalidate(&state.pool, user.id).await;
    let issued = state.tokens.issue(&user.username)?;
    state.tokens.persist(&state.pool, user.id, &issued).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let session = SessionUser {
        username: user.username,
        role,
    };
    Ok((
        ApiResponse::success("Login successful", session, Some(Meta::empty())),
        issued,
    ))
}

pub async fn logout_user(
    state: &AppState,
    user: &CurrentUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state.tokens.invalidate(&state.pool, user.id).await;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_logout",
        Some("users"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Logout successful",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
