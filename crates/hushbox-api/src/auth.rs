use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::{State, rejection::JsonRejection}, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::info;
use uuid::Uuid;

use hushbox_db::{Database, UserRow};
use hushbox_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};

use crate::blocking;
use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    /// Base of the public profile links handed out to users, e.g. `https://hush.example`.
    pub public_url: String,
}

impl AppStateInner {
    pub fn profile_url(&self, username: &str) -> String {
        format!("{}/u/{}", self.public_url.trim_end_matches('/'), username)
    }
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    validate_username(&req.username)?;
    if req.password.len() < 8 {
        return Err(ApiError::InvalidInput("Password must be at least 8 characters".into()));
    }

    let user_id = Uuid::new_v4();
    let username = req.username.clone();
    let db = state.clone();
    let created = blocking(move || -> anyhow::Result<bool> {
        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
            .to_string();

        db.db.create_user(&user_id.to_string(), &req.username, &password_hash)
    })
    .await?;

    if !created {
        return Err(ApiError::Conflict("Username is already taken".into()));
    }
    info!("Registered user {}", username);

    let token = create_token(&state.jwt_secret, user_id, &username, state.token_ttl_days)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            user_id,
            profile_url: state.profile_url(&username),
            username,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let db = state.clone();
    let user = blocking(move || -> Result<UserRow, ApiError> {
        let Some(user) = db.db.get_user_by_username(&req.username)? else {
            return Err(ApiError::InvalidCredentials);
        };

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| anyhow::anyhow!("stored password hash is unreadable: {}", e))?;
        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::InvalidCredentials)?;

        Ok(user)
    })
    .await?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", user.id, e))?;

    let token = create_token(&state.jwt_secret, user_id, &user.username, state.token_ttl_days)?;

    Ok(Json(AuthResponse {
        success: true,
        user_id,
        profile_url: state.profile_url(&user.username),
        username: user.username,
        token,
    }))
}

/// Usernames appear in public links, so they are limited to URL-safe characters.
fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.len() < 3 || username.len() > 32 {
        return Err(ApiError::InvalidInput("Username must be 3 to 32 characters".into()));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::InvalidInput(
            "Username may only contain letters, digits, '_' and '-'".into(),
        ));
    }
    Ok(())
}

pub fn create_token(secret: &str, user_id: Uuid, username: &str, ttl_days: i64) -> anyhow::Result<String> {
    let exp = chrono::TimeDelta::try_days(ttl_days)
        .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| anyhow::anyhow!("token lifetime of {} days is out of range", ttl_days))?;

    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: exp.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn verify_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip() {
        let id = Uuid::new_v4();
        let token = create_token("secret", id, "alice", 1).unwrap();

        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn wrong_secret_or_expired_token_fails() {
        let token = create_token("secret", Uuid::new_v4(), "alice", 1).unwrap();
        assert!(verify_token("other", &token).is_none());

        let expired = create_token("secret", Uuid::new_v4(), "alice", -1).unwrap();
        assert!(verify_token("secret", &expired).is_none());
        assert!(verify_token("secret", "not-a-jwt").is_none());
    }

    #[test]
    fn out_of_range_lifetime_is_an_error() {
        assert!(create_token("secret", Uuid::new_v4(), "alice", 1_000_000_000_000_000).is_err());
        assert!(create_token("secret", Uuid::new_v4(), "alice", i64::MAX).is_err());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("alice_01").is_ok());
        assert!(validate_username("a-b").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("slash/y").is_err());
    }
}
