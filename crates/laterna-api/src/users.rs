use axum::{Extension, Json, extract::State};
use tracing::warn;

use laterna_types::api::Claims;
use laterna_types::models::UserSummary;

use crate::auth::AppState;
use crate::error::ApiError;

/// Everyone the caller could start a conversation with.
pub async fn list_users(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let Extension(claims) = claims.ok_or(ApiError::Unauthorized)?;

    let db = state.db.clone();
    let caller = claims.sub.to_string();
    let rows = tokio::task::spawn_blocking(move || db.list_users_except(&caller))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
        .map_err(ApiError::Internal)?;

    let users = rows
        .into_iter()
        .filter_map(|row| match row.id.parse() {
            Ok(id) => Some(UserSummary {
                id,
                username: row.username,
                image_url: row.image_url,
            }),
            Err(e) => {
                warn!("Corrupt user id '{}': {}", row.id, e);
                None
            }
        })
        .collect();

    Ok(Json(users))
}
