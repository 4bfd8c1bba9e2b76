use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use laterna_types::api::{Claims, SendMessageRequest};
use laterna_types::models::Message;

use crate::auth::AppState;
use crate::error::ApiError;

/// Any participant may read a conversation; there is no per-conversation ACL.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(other_user_id): Path<Uuid>,
    claims: Option<Extension<Claims>>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let caller = claims.map(|Extension(c)| c.sub);
    let messages = state.chat().get_messages(caller, other_user_id).await?;
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = claims.map(|Extension(c)| c.sub);
    let message = state
        .chat()
        .send_message(caller, req.receiver_id, req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
