use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::debug;
use uuid::Uuid;

use laterna_types::events::GatewayEvent;

/// Per-user live connections: conn_id -> sender.
type Connections = HashMap<Uuid, mpsc::UnboundedSender<GatewayEvent>>;

/// Manages all connected clients. Targeted events go to a user's own
/// connections; presence goes to everyone.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Broadcast channel for global events (presence)
    broadcast_tx: broadcast::Sender<GatewayEvent>,

    /// Track online users: user_id -> username
    online_users: RwLock<HashMap<Uuid, String>>,

    /// Per-user targeted send channels, one entry per open connection
    user_channels: RwLock<HashMap<Uuid, Connections>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                online_users: RwLock::new(HashMap::new()),
                user_channels: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Subscribe to global gateway events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an event to all connected clients.
    pub fn broadcast(&self, event: GatewayEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }

    /// Register a connection for `user_id`. Returns (conn_id, receiver).
    pub async fn register_connection(
        &self,
        user_id: Uuid,
    ) -> (Uuid, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .user_channels
            .write()
            .await
            .entry(user_id)
            .or_default()
            .insert(conn_id, tx);
        (conn_id, rx)
    }

    /// Remove one connection. Returns true if the user has no connections left.
    pub async fn unregister_connection(&self, user_id: Uuid, conn_id: Uuid) -> bool {
        let mut channels = self.inner.user_channels.write().await;
        remove_connection(&mut channels, user_id, conn_id)
    }

    /// Best-effort delivery to every live connection of `user_id`.
    /// Returns how many connections accepted the event; zero is not an error.
    pub async fn notify_user(&self, user_id: Uuid, event: GatewayEvent) -> usize {
        let channels = self.inner.user_channels.read().await;
        let Some(conns) = channels.get(&user_id) else {
            debug!("No live connection for {}, dropping event", user_id);
            return 0;
        };

        let mut delivered = 0;
        for tx in conns.values() {
            if tx.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Mark a user online. Presence is only broadcast on the first connection.
    pub async fn user_online(&self, user_id: Uuid, username: String) {
        let was_online = self
            .inner
            .online_users
            .write()
            .await
            .insert(user_id, username.clone())
            .is_some();

        if !was_online {
            self.broadcast(GatewayEvent::PresenceUpdate {
                user_id,
                username,
                online: true,
            });
        }
    }

    /// Drop one connection and, if it was the user's last, mark them offline.
    pub async fn user_offline(&self, user_id: Uuid, conn_id: Uuid) {
        // Held until the offline broadcast is out, so a connection registering
        // meanwhile announces itself online afterwards.
        let mut channels = self.inner.user_channels.write().await;
        if !remove_connection(&mut channels, user_id, conn_id) {
            // Another tab is still connected
            return;
        }

        let username = self
            .inner
            .online_users
            .write()
            .await
            .remove(&user_id)
            .unwrap_or_default();

        self.broadcast(GatewayEvent::PresenceUpdate {
            user_id,
            username,
            online: false,
        });
        drop(channels);
    }

    /// Get list of online users.
    pub async fn online_users(&self) -> Vec<(Uuid, String)> {
        self.inner
            .online_users
            .read()
            .await
            .iter()
            .map(|(id, name)| (*id, name.clone()))
            .collect()
    }
}

fn remove_connection(
    channels: &mut HashMap<Uuid, Connections>,
    user_id: Uuid,
    conn_id: Uuid,
) -> bool {
    let Some(conns) = channels.get_mut(&user_id) else {
        return true;
    };
    conns.remove(&conn_id);
    if conns.is_empty() {
        channels.remove(&user_id);
        true
    } else {
        false
    }
}
