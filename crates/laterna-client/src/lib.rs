//! Client side of Laterna chat: HTTP API access, the live gateway
//! subscription, and the conversation view state.

pub mod api;
pub mod error;
pub mod gateway;
pub mod view;

pub use api::{ApiClient, ChatBackend};
pub use error::ClientError;
pub use gateway::{GatewaySubscription, GatewayUpdate};
pub use view::{ChatContext, ChatView, ViewState};
