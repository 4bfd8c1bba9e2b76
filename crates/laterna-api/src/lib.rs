pub mod auth;
pub mod chat;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod router;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use router::router;
