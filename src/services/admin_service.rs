use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::admin::{ModifyUserRequest, UserList},
    error::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::{Role, User},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    let (page, limit, offset) = pagination.normalize();
    let items: Vec<User> =
        sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(&state.pool)
            .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&state.pool)
        .await?;

    Ok(ApiResponse::success(
        "OK",
        UserList { items },
        Some(Meta::new(page, limit, total.0)),
    ))
}

pub async fn get_user(state: &AppState, id: Uuid) -> AppResult<ApiResponse<User>> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    match user {
        Some(user) => Ok(ApiResponse::success("OK", user, None)),
        None => Err(AppError::NotFound),
    }
}

/// Update username, email and/or role. A modified user must log in again:
/// their stored tokens are deleted best-effort, never fatally.
pub async fn modify_user(
    state: &AppState,
    admin: &CurrentUser,
    id: Uuid,
    payload: ModifyUserRequest,
) -> AppResult<ApiResponse<User>> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let mut username = user.username.clone();
    if let Some(new_username) = payload
        .username
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let taken: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE username = $1 AND id <> $2")
                .bind(new_username)
                .bind(id)
                .fetch_optional(&state.pool)
                .await?;
        if taken.is_some() {
            return Err(AppError::Validation(format!(
                "Username already exists: {new_username}"
            )));
        }
        username = new_username.to_string();
    }

    let mut email = user.email.clone();
    if let Some(new_email) = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        if !new_email.contains('@') {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }
        let taken: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = $1 AND id <> $2")
                .bind(new_email)
                .bind(id)
                .fetch_optional(&state.pool)
                .await?;
        if taken.is_some() {
            return Err(AppError::Validation(format!(
                "Email already exists: {new_email}"
            )));
        }
        email = new_email.to_string();
    }

    let mut role = user.role.clone();
    if let Some(new_role) = payload
        .role
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let parsed = Role::parse(new_role).ok_or_else(|| {
            AppError::Validation(format!(
                "Invalid role: {new_role}. Valid roles are: ADMIN, CUSTOMER"
            ))
        })?;
        role = parsed.as_str().to_string();
    }

    let updated: User = sqlx::query_as(
        r#"
        UPDATE users
        SET username = $2, email = $3, role = $4, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&username)
    .bind(&email)
    .bind(&role)
    .fetch_one(&state.pool)
    .await?;

    // The user needs to re-login; a stale token must not keep the old role.
    state.tokens.invalidate(&state.pool, id).await;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.id),
        "user_modify",
        Some("users"),
        Some(serde_json::json!({ "user_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("User updated", updated, None))
}
