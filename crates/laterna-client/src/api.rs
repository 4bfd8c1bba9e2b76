use std::future::Future;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use laterna_types::api::{
    ErrorBody, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, SendMessageRequest,
};
use laterna_types::models::{Message, UserSummary};

use crate::error::ClientError;

/// What the chat view needs from the server. `ApiClient` is the real one;
/// tests substitute an in-memory backend.
pub trait ChatBackend: Clone + Send + Sync + 'static {
    fn fetch_users(&self) -> impl Future<Output = Result<Vec<UserSummary>, ClientError>> + Send;

    fn fetch_messages(
        &self,
        partner: Uuid,
    ) -> impl Future<Output = Result<Vec<Message>, ClientError>> + Send;

    fn send_message(
        &self,
        receiver: Uuid,
        content: String,
    ) -> impl Future<Output = Result<Message, ClientError>> + Send;
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// WebSocket URL of the gateway on the same host.
    pub fn gateway_url(&self) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{base}/gateway")
    }

    pub async fn register(
        &mut self,
        username: &str,
        password: &str,
        image_url: Option<String>,
    ) -> Result<RegisterResponse, ClientError> {
        let req = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            image_url,
        };
        let resp: RegisterResponse =
            self.execute(self.http.post(self.url("/auth/register")).json(&req)).await?;
        self.token = Some(resp.token.clone());
        Ok(resp)
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let req = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp: LoginResponse =
            self.execute(self.http.post(self.url("/auth/login")).json(&req)).await?;
        self.token = Some(resp.token.clone());
        Ok(resp)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        decode(req.send().await?).await
    }
}

impl ChatBackend for ApiClient {
    async fn fetch_users(&self) -> Result<Vec<UserSummary>, ClientError> {
        self.execute(self.http.get(self.url("/users"))).await
    }

    async fn fetch_messages(&self, partner: Uuid) -> Result<Vec<Message>, ClientError> {
        self.execute(self.http.get(self.url(&format!("/conversation/{partner}"))))
            .await
    }

    async fn send_message(&self, receiver: Uuid, content: String) -> Result<Message, ClientError> {
        let req = SendMessageRequest {
            receiver_id: receiver,
            content,
        };
        self.execute(self.http.post(self.url("/conversation")).json(&req))
            .await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);

    Err(match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::Validation(message)
        }
        _ => ClientError::Server {
            status: status.as_u16(),
            message,
        },
    })
}
