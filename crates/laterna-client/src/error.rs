use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("not signed in or session expired")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rejected: {0}")]
    Validation(String),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("bad payload: {0}")]
    Json(#[from] serde_json::Error),
}
