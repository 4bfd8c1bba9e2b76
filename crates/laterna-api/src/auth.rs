use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand_core::OsRng;
use tracing::info;
use uuid::Uuid;

use laterna_db::Database;
use laterna_gateway::Dispatcher;
use laterna_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::chat::ChatService;
use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub dispatcher: Dispatcher,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: String) -> AppState {
        Arc::new(Self {
            db: Arc::new(db),
            jwt_secret,
            dispatcher: Dispatcher::new(),
        })
    }

    pub fn chat(&self) -> ChatService {
        ChatService::new(self.db.clone(), self.dispatcher.clone())
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::Validation("username must be 3-32 characters".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation("password must be at least 8 characters".into()));
    }

    let db = state.db.clone();
    let username = req.username.clone();
    let user_id = blocking(move || {
        // Skip hashing for the common case; the insert below still decides races
        if db.get_user_by_username(&req.username).map_err(ApiError::Internal)?.is_some() {
            return Err(ApiError::Conflict(format!("username '{}' is taken", req.username)));
        }

        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
            .to_string();

        let user_id = Uuid::new_v4();
        db.create_user(
            &user_id.to_string(),
            &req.username,
            &password_hash,
            req.image_url.as_deref(),
        )?;
        Ok(user_id)
    })
    .await?;

    let token = create_token(&state.jwt_secret, user_id, &username)
        .map_err(ApiError::Internal)?;

    info!("Registered {} ({})", username, user_id);

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let user = blocking(move || {
        let user = db
            .get_user_by_username(&req.username)
            .map_err(ApiError::Internal)?
            .ok_or(ApiError::Unauthorized)?;

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt password hash: {}", e)))?;

        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(user)
    })
    .await?;

    let user_id: Uuid = user.id.parse().map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?;

    let token = create_token(&state.jwt_secret, user_id, &user.username)
        .map_err(ApiError::Internal)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        token,
    }))
}

/// Argon2 and SQLite both block; keep them off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
}

fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
