use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Role, User},
    state::AppState,
};

/// Name of the session cookie set on login and read on every request.
pub const AUTH_COOKIE: &str = "auth_token";

/// Identity resolved by the access gate and attached to the request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// One row of the access table: a path prefix, the roles allowed through,
/// and the message returned on a role mismatch.
#[derive(Debug, Clone, Copy)]
pub struct PolicyRule {
    pub prefix: &'static str,
    pub allowed: &'static [Role],
    pub denial: &'static str,
}

/// Endpoints reachable without a session, matched on the exact path.
const PUBLIC_PATHS: &[&str] = &[
    "/api/auth/login",
    "/api/auth/register",
    "/api/users/register",
    "/health",
];

/// First matching prefix wins, so the admin rule must precede the general
/// API rule.
const RULES: &[PolicyRule] = &[
    PolicyRule {
        prefix: "/admin",
        allowed: &[Role::Admin],
        denial: "Admin access required",
    },
    PolicyRule {
        prefix: "/api",
        allowed: &[Role::Customer, Role::Admin],
        denial: "Customer access required",
    },
];

#[derive(Debug, Clone, Copy)]
pub struct RoutePolicy {
    public_paths: &'static [&'static str],
    rules: &'static [PolicyRule],
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            public_paths: PUBLIC_PATHS,
            rules: RULES,
        }
    }
}

impl RoutePolicy {
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.contains(&path)
    }

    /// The rule governing a path, if any. Paths outside every prefix
    /// (docs, fallback) are not guarded.
    pub fn rule_for(&self, path: &str) -> Option<&'static PolicyRule> {
        self.rules.iter().find(|rule| path.starts_with(rule.prefix))
    }

    pub fn allows(&self, path: &str, role: Role) -> bool {
        match self.rule_for(path) {
            Some(rule) => rule.allowed.contains(&role),
            None => true,
        }
    }
}

/// Access gate over the whole router. Internal faults never reach the
/// handler chain; they are converted to a generic 500 here.
pub async fn access_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match run_gate(&state, request, next).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn run_gate(state: &AppState, mut request: Request, next: Next) -> AppResult<Response> {
    let path = request.uri().path().to_string();

    if state.policy.is_public(&path) {
        return Ok(next.run(request).await);
    }

    // Preflight requests short-circuit before any token handling; the CORS
    // layer wrapping the router decorates the response headers.
    if request.method() == Method::OPTIONS {
        return Ok(StatusCode::OK.into_response());
    }

    let Some(rule) = state.policy.rule_for(&path) else {
        return Ok(next.run(request).await);
    };

    let token = token_from_cookies(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Invalid or missing token".to_string()))?;

    if !state.tokens.validate(&token) {
        return Err(AppError::Unauthorized("Invalid or missing token".to_string()));
    }

    // A token deleted by logout or an admin user modification is no longer
    // acceptable even while its signature is still within the expiry window.
    if !state.tokens.is_active(&state.pool, &token).await? {
        return Err(AppError::Unauthorized("Invalid or missing token".to_string()));
    }

    let username = state
        .tokens
        .extract_username(&token)
        .ok_or_else(|| AppError::Unauthorized("Invalid or missing token".to_string()))?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(&username)
        .fetch_optional(&state.pool)
        .await?;
    let user = user.ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let role = Role::parse(&user.role)
        .ok_or_else(|| anyhow::anyhow!("unknown role {:?} for user {}", user.role, user.id))?;

    if !rule.allowed.contains(&role) {
        return Err(AppError::Forbidden(rule.denial.to_string()));
    }

    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
        email: user.email,
        role,
    });

    Ok(next.run(request).await)
}

fn token_from_cookies(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == AUTH_COOKIE).then(|| value.to_string())
    })
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
    }
}
