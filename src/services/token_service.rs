use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::auth::Claims,
    error::{AppError, AppResult},
};

/// Issues and validates signed session tokens bound to a username and an
/// expiry, and maintains the stored-token state that backs invalidation.
/// Constructed once at startup from configuration.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl: Duration,
}

#[derive(Debug)]
pub struct IssuedToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenService {
    pub fn new(secret: impl Into<String>, ttl_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, username: &str) -> AppResult<IssuedToken> {
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("failed to set expiration")))?;

        let claims = Claims {
            sub: username.to_string(),
            exp: expires_at.timestamp() as usize,
        };

        let value = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

        Ok(IssuedToken { value, expires_at })
    }

    /// Fails closed: any parse, signature, or expiry problem is false.
    pub fn validate(&self, token: &str) -> bool {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .is_ok()
    }

    /// Undefined for tokens that did not pass `validate`.
    pub fn extract_username(&self, token: &str) -> Option<String> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .ok()
        .map(|data| data.claims.sub)
    }

    /// Store an issued token so it can later be invalidated.
    pub async fn persist(&self, pool: &DbPool, user_id: Uuid, issued: &IssuedToken) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO auth_tokens (id, user_id, token, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&issued.value)
        .bind(issued.expires_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Whether the token is still present in the store. Logout and admin
    /// user modification delete rows, which revokes the session.
    pub async fn is_active(&self, pool: &DbPool, token: &str) -> AppResult<bool> {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM auth_tokens WHERE token = $1")
            .bind(token)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    /// Best-effort deletion of the user's stored tokens. Failure is logged
    /// and never fatal to the calling operation.
    pub async fn invalidate(&self, pool: &DbPool, user_id: Uuid) {
        if let Err(err) = sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await
        {
            tracing::warn!(error = %err, %user_id, "failed to delete stored tokens");
        }
    }
}
