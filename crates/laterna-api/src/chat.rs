//! Chat service: conversation history and sending, with best-effort
//! delivery to the participants' live gateway connections.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use laterna_db::{Database, StoreError};
use laterna_gateway::Dispatcher;
use laterna_types::events::GatewayEvent;
use laterna_types::models::Message;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(anyhow::Error),
}

impl From<StoreError> for ChatError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(msg) => ChatError::Validation(msg),
            StoreError::NotFound(id) => ChatError::NotFound(format!("user {} not found", id)),
            StoreError::Storage(e) => ChatError::Storage(e),
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    db: Arc<Database>,
    dispatcher: Dispatcher,
}

impl ChatService {
    pub fn new(db: Arc<Database>, dispatcher: Dispatcher) -> Self {
        Self { db, dispatcher }
    }

    /// Conversation between the caller and `other_user_id`, oldest first.
    /// Either participant may read it.
    pub async fn get_messages(
        &self,
        caller: Option<Uuid>,
        other_user_id: Uuid,
    ) -> Result<Vec<Message>, ChatError> {
        let caller = caller.ok_or(ChatError::NotAuthenticated)?;

        self.blocking(move |db| {
            if !db.user_exists(&other_user_id.to_string()).map_err(ChatError::Storage)? {
                return Err(ChatError::NotFound(format!("user {} not found", other_user_id)));
            }
            Ok(db.list_conversation(caller, other_user_id)?)
        })
        .await
    }

    /// Persist a message from the caller, then push it to both participants.
    /// The send succeeds once the row is stored; delivery is not awaited on.
    pub async fn send_message(
        &self,
        caller: Option<Uuid>,
        receiver_id: Uuid,
        content: String,
    ) -> Result<Message, ChatError> {
        let caller = caller.ok_or(ChatError::NotAuthenticated)?;
        if content.trim().is_empty() {
            return Err(ChatError::Validation("content must not be empty".into()));
        }

        let message = self
            .blocking(move |db| Ok(db.append_message(caller, receiver_id, &content)?))
            .await?;

        self.deliver(&message).await;
        Ok(message)
    }

    async fn deliver(&self, message: &Message) {
        let event = GatewayEvent::MessageCreate(message.clone());
        let to_receiver = self.dispatcher.notify_user(message.receiver_id, event.clone()).await;
        // Sender's other sessions
        let to_sender = self.dispatcher.notify_user(message.sender_id, event).await;

        debug!(
            "Message {} pushed to {} receiver / {} sender connection(s)",
            message.id, to_receiver, to_sender
        );
    }

    /// Run a database closure off the async runtime.
    async fn blocking<F, T>(&self, f: F) -> Result<T, ChatError>
    where
        F: FnOnce(&Database) -> Result<T, ChatError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ChatError::Storage(anyhow::anyhow!("blocking task failed: {}", e))
            })?
    }
}
