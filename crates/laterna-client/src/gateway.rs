use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use laterna_types::events::{GatewayCommand, GatewayEvent};

use crate::error::ClientError;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// What the view hears from the gateway.
#[derive(Debug, Clone)]
pub enum GatewayUpdate {
    Event(GatewayEvent),
    /// The socket dropped; a reconnect is being attempted.
    Disconnected,
    /// Identified again after a drop. Anything pushed in between was missed.
    Reconnected,
}

/// A live gateway connection that reconnects with backoff until dropped.
pub struct GatewaySubscription {
    rx: mpsc::UnboundedReceiver<GatewayUpdate>,
    task: JoinHandle<()>,
}

impl GatewaySubscription {
    pub fn spawn(url: String, token: String) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(url, token, tx));
        Self { rx, task }
    }

    pub async fn recv(&mut self) -> Option<GatewayUpdate> {
        self.rx.recv().await
    }
}

impl Drop for GatewaySubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(url: String, token: String, tx: mpsc::UnboundedSender<GatewayUpdate>) {
    let mut backoff = INITIAL_BACKOFF;
    let mut identified_before = false;

    loop {
        let result = session(&url, &token, &tx, identified_before).await;
        if tx.is_closed() {
            return;
        }

        match result {
            Ok(identified) => {
                if identified {
                    identified_before = true;
                    backoff = INITIAL_BACKOFF;
                    let _ = tx.send(GatewayUpdate::Disconnected);
                }
                info!("Gateway connection closed, retrying in {:?}", backoff);
            }
            Err(e) => warn!("Gateway connection failed: {}, retrying in {:?}", e, backoff),
        }

        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

/// One connection attempt. Returns whether the server accepted Identify.
async fn session(
    url: &str,
    token: &str,
    tx: &mpsc::UnboundedSender<GatewayUpdate>,
    identified_before: bool,
) -> Result<bool, ClientError> {
    let (ws, _) = connect_async(url)
        .await
        .map_err(|e| ClientError::Gateway(e.to_string()))?;
    let (mut write, mut read) = ws.split();

    let identify = serde_json::to_string(&GatewayCommand::Identify {
        token: token.to_string(),
    })?;
    write
        .send(WsMessage::Text(identify.into()))
        .await
        .map_err(|e| ClientError::Gateway(e.to_string()))?;

    let mut identified = false;
    while let Some(frame) = read.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!("Gateway read error: {}", e);
                break;
            }
        };

        match frame {
            WsMessage::Text(text) => {
                let event = match serde_json::from_str::<GatewayEvent>(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("Unrecognised gateway event: {}", e);
                        continue;
                    }
                };

                if matches!(event, GatewayEvent::Ready { .. }) && !identified {
                    identified = true;
                    if identified_before && tx.send(GatewayUpdate::Reconnected).is_err() {
                        break;
                    }
                }

                if tx.send(GatewayUpdate::Event(event)).is_err() {
                    break;
                }
            }
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    Ok(identified)
}
