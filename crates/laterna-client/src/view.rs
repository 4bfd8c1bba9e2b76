//! Conversation view: which partner is selected, the cached message list,
//! and how fetches, sends and pushes are folded into it.
//!
//! ```text
//! NoSelection --select--> ConversationLoading --fetch ok--> ConversationLoaded
//!                              ^                                   |
//!                              +------ select / reconnect ---------+
//! ```
//!
//! A fetch result is only applied if it was issued for the partner that is
//! still selected, and for the latest selection of that partner.

use std::collections::HashSet;

use chrono::{DateTime, Local, Utc};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use laterna_types::events::GatewayEvent;
use laterna_types::models::{Message, UserSummary};

use crate::api::ChatBackend;
use crate::error::ClientError;
use crate::gateway::{GatewaySubscription, GatewayUpdate};

/// Everything a mounted view depends on. Owned by the view and dropped with it.
pub struct ChatContext<B> {
    pub backend: B,
    pub me: UserSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    NoSelection,
    ConversationLoading { partner: Uuid },
    ConversationLoaded { partner: Uuid, messages: Vec<Message> },
}

/// Identifies one conversation fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub partner: Uuid,
    generation: u64,
}

/// The view's state machine without any I/O.
#[derive(Debug)]
pub struct ConversationCache {
    me: Uuid,
    state: ViewState,
    generation: u64,
    /// Messages seen while loading; merged into the fetch result.
    pending: Vec<Message>,
}

impl ConversationCache {
    pub fn new(me: Uuid) -> Self {
        Self {
            me,
            state: ViewState::NoSelection,
            generation: 0,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn selected(&self) -> Option<Uuid> {
        match self.state {
            ViewState::NoSelection => None,
            ViewState::ConversationLoading { partner }
            | ViewState::ConversationLoaded { partner, .. } => Some(partner),
        }
    }

    pub fn messages(&self) -> &[Message] {
        match &self.state {
            ViewState::ConversationLoaded { messages, .. } => messages,
            _ => &[],
        }
    }

    /// Switch to `partner` and return the ticket for the fetch to issue.
    pub fn select(&mut self, partner: Uuid) -> FetchTicket {
        self.generation += 1;
        self.pending.clear();
        self.state = ViewState::ConversationLoading { partner };
        FetchTicket {
            partner,
            generation: self.generation,
        }
    }

    /// Re-fetch the selected conversation. What is already cached is kept
    /// and merged with the fresh result.
    pub fn refetch(&mut self) -> Option<FetchTicket> {
        let partner = self.selected()?;
        let cached = match std::mem::replace(&mut self.state, ViewState::NoSelection) {
            ViewState::ConversationLoaded { messages, .. } => messages,
            _ => Vec::new(),
        };
        let pending = std::mem::take(&mut self.pending);

        let ticket = self.select(partner);
        self.pending = cached;
        for msg in pending {
            insert_ordered(&mut self.pending, msg);
        }
        Some(ticket)
    }

    /// Apply a fetch result. Returns false if the ticket is stale.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, fetched: Vec<Message>) -> bool {
        if !self.is_current(ticket) {
            debug!("Discarding stale conversation fetch for {}", ticket.partner);
            return false;
        }

        let mut messages = fetched;
        for msg in std::mem::take(&mut self.pending) {
            insert_ordered(&mut messages, msg);
        }
        self.state = ViewState::ConversationLoaded {
            partner: ticket.partner,
            messages,
        };
        true
    }

    /// Fold a message into the open conversation. Returns false if it
    /// belongs to some other conversation or is already present.
    pub fn merge(&mut self, msg: Message) -> bool {
        let Some(partner) = self.selected() else {
            return false;
        };
        if !msg.is_between(self.me, partner) {
            return false;
        }

        match &mut self.state {
            ViewState::ConversationLoaded { messages, .. } => insert_ordered(messages, msg),
            _ => insert_ordered(&mut self.pending, msg),
        }
    }

    fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.generation == self.generation
            && matches!(self.state, ViewState::ConversationLoading { partner } if partner == ticket.partner)
    }
}

/// Insert by timestamp; equal timestamps keep arrival order. Dedups by id.
fn insert_ordered(list: &mut Vec<Message>, msg: Message) -> bool {
    if list.iter().any(|m| m.id == msg.id) {
        return false;
    }
    let pos = list.partition_point(|m| m.created_at <= msg.created_at);
    list.insert(pos, msg);
    true
}

/// One row of the rendered conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub id: Uuid,
    pub content: String,
    pub time: String,
    pub from_me: bool,
    pub avatar: Option<String>,
}

/// "hh:mm AM" in local time.
pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%I:%M %p").to_string()
}

enum ViewUpdate {
    Users(Result<Vec<UserSummary>, ClientError>),
    Fetched {
        ticket: FetchTicket,
        result: Result<Vec<Message>, ClientError>,
    },
    Gateway(GatewayUpdate),
}

/// A mounted chat view. Background work (fetches, gateway relay) reports
/// back through one channel and is aborted when the view is dropped.
pub struct ChatView<B: ChatBackend> {
    ctx: ChatContext<B>,
    cache: ConversationCache,
    users: Vec<UserSummary>,
    online: HashSet<Uuid>,
    connected: bool,
    last_error: Option<String>,
    updates_tx: mpsc::UnboundedSender<ViewUpdate>,
    updates_rx: mpsc::UnboundedReceiver<ViewUpdate>,
    tasks: Vec<AbortHandle>,
}

impl<B: ChatBackend> ChatView<B> {
    /// Mount the view and start loading the user directory.
    pub fn mount(ctx: ChatContext<B>) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let mut view = Self {
            cache: ConversationCache::new(ctx.me.id),
            ctx,
            users: Vec::new(),
            online: HashSet::new(),
            connected: false,
            last_error: None,
            updates_tx,
            updates_rx,
            tasks: Vec::new(),
        };

        let backend = view.ctx.backend.clone();
        let tx = view.updates_tx.clone();
        view.spawn(async move {
            let _ = tx.send(ViewUpdate::Users(backend.fetch_users().await));
        });
        view
    }

    pub fn state(&self) -> &ViewState {
        self.cache.state()
    }

    pub fn users(&self) -> &[UserSummary] {
        &self.users
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.online.contains(&user_id)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Select a conversation partner and fetch its history in the background.
    pub fn select_partner(&mut self, partner: Uuid) {
        let ticket = self.cache.select(partner);
        self.spawn_fetch(ticket);
    }

    /// Fetch the selected conversation again, e.g. after a failed load.
    /// Returns false when nothing is selected.
    pub fn retry(&mut self) -> bool {
        let Some(ticket) = self.cache.refetch() else {
            return false;
        };
        self.last_error = None;
        self.spawn_fetch(ticket);
        true
    }

    /// Relay a gateway subscription into this view.
    pub fn attach_gateway(&mut self, mut subscription: GatewaySubscription) {
        let tx = self.updates_tx.clone();
        self.spawn(async move {
            while let Some(update) = subscription.recv().await {
                if tx.send(ViewUpdate::Gateway(update)).is_err() {
                    break;
                }
            }
        });
    }

    /// Send to the selected partner and add the stored message to the cache.
    pub async fn send(&mut self, content: &str) -> Result<Message, ClientError> {
        let partner = self
            .cache
            .selected()
            .ok_or_else(|| ClientError::Validation("no conversation selected".into()))?;
        if content.trim().is_empty() {
            return Err(ClientError::Validation("message is empty".into()));
        }

        let message = self
            .ctx
            .backend
            .send_message(partner, content.to_string())
            .await?;
        self.cache.merge(message.clone());
        Ok(message)
    }

    /// Wait for and apply the next background update.
    pub async fn pump(&mut self) {
        if let Some(update) = self.updates_rx.recv().await {
            self.apply(update);
        }
    }

    /// Apply every update that is already queued, without waiting.
    pub fn pump_ready(&mut self) {
        while let Ok(update) = self.updates_rx.try_recv() {
            self.apply(update);
        }
    }

    pub fn handle_gateway(&mut self, update: GatewayUpdate) {
        match update {
            GatewayUpdate::Event(GatewayEvent::MessageCreate(msg)) => {
                self.cache.merge(msg);
            }
            GatewayUpdate::Event(GatewayEvent::PresenceUpdate { user_id, online, .. }) => {
                if online {
                    self.online.insert(user_id);
                } else {
                    self.online.remove(&user_id);
                }
            }
            GatewayUpdate::Event(GatewayEvent::Ready { .. }) => {
                self.connected = true;
            }
            GatewayUpdate::Disconnected => {
                self.connected = false;
                self.online.clear();
            }
            GatewayUpdate::Reconnected => {
                self.connected = true;
                if let Some(ticket) = self.cache.refetch() {
                    self.spawn_fetch(ticket);
                }
            }
        }
    }

    /// Rows for the loaded conversation, oldest first.
    pub fn render(&self) -> Vec<RenderedMessage> {
        let partner_avatar = self.cache.selected().and_then(|partner| {
            self.users
                .iter()
                .find(|u| u.id == partner)
                .and_then(|u| u.image_url.clone())
        });

        self.cache
            .messages()
            .iter()
            .map(|m| {
                let from_me = m.sender_id == self.ctx.me.id;
                RenderedMessage {
                    id: m.id,
                    content: m.content.clone(),
                    time: format_time(m.created_at),
                    from_me,
                    avatar: if from_me {
                        self.ctx.me.image_url.clone()
                    } else {
                        partner_avatar.clone()
                    },
                }
            })
            .collect()
    }

    fn apply(&mut self, update: ViewUpdate) {
        match update {
            ViewUpdate::Users(Ok(users)) => self.users = users,
            ViewUpdate::Users(Err(e)) => {
                warn!("Failed to load users: {}", e);
                self.last_error = Some(e.to_string());
            }
            ViewUpdate::Fetched { ticket, result: Ok(messages) } => {
                if self.cache.apply_fetch(ticket, messages) {
                    self.last_error = None;
                }
            }
            ViewUpdate::Fetched { ticket, result: Err(e) } => {
                // Stays loading with whatever was cached; `retry` re-issues it
                if self.cache.is_current(ticket) {
                    warn!("Failed to load conversation with {}: {}", ticket.partner, e);
                    self.last_error = Some(e.to_string());
                }
            }
            ViewUpdate::Gateway(update) => self.handle_gateway(update),
        }
    }

    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        let backend = self.ctx.backend.clone();
        let tx = self.updates_tx.clone();
        self.spawn(async move {
            let result = backend.fetch_messages(ticket.partner).await;
            let _ = tx.send(ViewUpdate::Fetched { ticket, result });
        });
    }

    fn spawn<F>(&mut self, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(tokio::spawn(fut).abort_handle());
    }
}

impl<B: ChatBackend> Drop for ChatView<B> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::TimeZone;
    use tokio::sync::Notify;

    fn user(name: &str) -> UserSummary {
        UserSummary {
            id: Uuid::new_v4(),
            username: name.into(),
            image_url: Some(format!("https://img/{name}.png")),
        }
    }

    fn msg(from: Uuid, to: Uuid, content: &str, secs: i64) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender_id: from,
            receiver_id: to,
            content: content.into(),
            created_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    #[derive(Clone, Default)]
    struct FakeBackend {
        inner: Arc<FakeInner>,
    }

    #[derive(Default)]
    struct FakeInner {
        me: Mutex<Option<Uuid>>,
        users: Mutex<Vec<UserSummary>>,
        conversations: Mutex<HashMap<Uuid, Vec<Message>>>,
        gates: Mutex<HashMap<Uuid, Arc<Notify>>>,
        fetches: Mutex<Vec<Uuid>>,
        failing: Mutex<HashSet<Uuid>>,
        clock: Mutex<i64>,
    }

    impl FakeBackend {
        fn new(me: Uuid, users: Vec<UserSummary>) -> Self {
            let backend = Self::default();
            *backend.inner.me.lock().unwrap() = Some(me);
            *backend.inner.users.lock().unwrap() = users;
            *backend.inner.clock.lock().unwrap() = 1000;
            backend
        }

        fn set_conversation(&self, partner: Uuid, messages: Vec<Message>) {
            self.inner.conversations.lock().unwrap().insert(partner, messages);
        }

        /// Make fetches for `partner` wait until `release`.
        fn hold(&self, partner: Uuid) {
            self.inner.gates.lock().unwrap().insert(partner, Arc::new(Notify::new()));
        }

        fn release(&self, partner: Uuid) {
            if let Some(gate) = self.inner.gates.lock().unwrap().get(&partner) {
                gate.notify_one();
            }
        }

        fn set_failing(&self, partner: Uuid, failing: bool) {
            let mut set = self.inner.failing.lock().unwrap();
            if failing {
                set.insert(partner);
            } else {
                set.remove(&partner);
            }
        }

        fn fetch_count(&self) -> usize {
            self.inner.fetches.lock().unwrap().len()
        }
    }

    impl ChatBackend for FakeBackend {
        async fn fetch_users(&self) -> Result<Vec<UserSummary>, ClientError> {
            Ok(self.inner.users.lock().unwrap().clone())
        }

        async fn fetch_messages(&self, partner: Uuid) -> Result<Vec<Message>, ClientError> {
            self.inner.fetches.lock().unwrap().push(partner);
            let gate = self.inner.gates.lock().unwrap().get(&partner).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if self.inner.failing.lock().unwrap().contains(&partner) {
                return Err(ClientError::Server {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            Ok(self
                .inner
                .conversations
                .lock()
                .unwrap()
                .get(&partner)
                .cloned()
                .unwrap_or_default())
        }

        async fn send_message(&self, receiver: Uuid, content: String) -> Result<Message, ClientError> {
            let me = self.inner.me.lock().unwrap().unwrap();
            let secs = {
                let mut clock = self.inner.clock.lock().unwrap();
                *clock += 1;
                *clock
            };
            Ok(msg(me, receiver, &content, secs))
        }
    }

    async fn pump_until<B: ChatBackend>(view: &mut ChatView<B>, done: impl Fn(&ChatView<B>) -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !done(view) {
                view.pump().await;
            }
        })
        .await
        .expect("view never reached expected state");
    }

    fn loaded_with(view: &ChatView<FakeBackend>, partner: Uuid) -> bool {
        matches!(view.state(), ViewState::ConversationLoaded { partner: p, .. } if *p == partner)
    }

    #[test]
    fn cache_starts_with_no_selection() {
        let cache = ConversationCache::new(Uuid::new_v4());
        assert_eq!(cache.state(), &ViewState::NoSelection);
        assert!(cache.messages().is_empty());
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let me = Uuid::new_v4();
        let (b, c) = (Uuid::new_v4(), Uuid::new_v4());
        let mut cache = ConversationCache::new(me);

        let ticket_b = cache.select(b);
        let ticket_c = cache.select(c);

        assert!(!cache.apply_fetch(ticket_b, vec![msg(b, me, "from b", 1)]));
        assert_eq!(cache.state(), &ViewState::ConversationLoading { partner: c });

        assert!(cache.apply_fetch(ticket_c, vec![msg(c, me, "from c", 2)]));
        assert_eq!(cache.messages()[0].content, "from c");
    }

    #[test]
    fn reselecting_same_partner_invalidates_older_fetch() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut cache = ConversationCache::new(me);

        let first = cache.select(b);
        let second = cache.select(b);

        assert!(!cache.apply_fetch(first, vec![]));
        assert!(cache.apply_fetch(second, vec![]));
    }

    #[test]
    fn merge_keeps_ascending_order_and_dedups() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut cache = ConversationCache::new(me);
        let ticket = cache.select(b);

        let early = msg(b, me, "early", 1);
        let late = msg(me, b, "late", 3);
        cache.apply_fetch(ticket, vec![early.clone(), late.clone()]);

        let middle = msg(b, me, "middle", 2);
        assert!(cache.merge(middle.clone()));
        assert!(!cache.merge(middle));
        assert!(!cache.merge(msg(Uuid::new_v4(), me, "elsewhere", 2)));

        let contents: Vec<_> = cache.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["early", "middle", "late"]);
    }

    #[test]
    fn messages_arriving_while_loading_are_merged_into_fetch() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut cache = ConversationCache::new(me);
        let ticket = cache.select(b);

        let pushed = msg(b, me, "pushed", 5);
        assert!(cache.merge(pushed.clone()));

        // Fetch already contains the pushed message plus an older one
        let older = msg(me, b, "older", 1);
        cache.apply_fetch(ticket, vec![older, pushed]);

        let contents: Vec<_> = cache.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["older", "pushed"]);
    }

    #[test]
    fn refetch_keeps_cached_messages() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut cache = ConversationCache::new(me);
        let ticket = cache.select(b);
        let seen = msg(b, me, "seen", 1);
        cache.apply_fetch(ticket, vec![seen.clone()]);

        let ticket = cache.refetch().unwrap();
        assert_eq!(cache.state(), &ViewState::ConversationLoading { partner: b });

        let missed = msg(b, me, "missed", 2);
        cache.apply_fetch(ticket, vec![seen, missed]);
        assert_eq!(cache.messages().len(), 2);
    }

    #[test]
    fn time_is_twelve_hour_clock() {
        let formatted = format_time(Utc::now());
        assert_eq!(formatted.len(), 8);
        assert!(formatted.ends_with("AM") || formatted.ends_with("PM"));
    }

    #[tokio::test]
    async fn late_fetch_for_previous_partner_is_never_shown() {
        let me = user("me");
        let (b, c) = (user("b"), user("c"));
        let backend = FakeBackend::new(me.id, vec![b.clone(), c.clone()]);
        backend.set_conversation(b.id, vec![msg(b.id, me.id, "from b", 1)]);
        backend.set_conversation(c.id, vec![msg(c.id, me.id, "from c", 2)]);
        backend.hold(b.id);

        let mut view = ChatView::mount(ChatContext { backend: backend.clone(), me: me.clone() });
        view.select_partner(b.id);
        view.select_partner(c.id);

        pump_until(&mut view, |v| loaded_with(v, c.id)).await;

        backend.release(b.id);
        tokio::time::sleep(Duration::from_millis(50)).await;
        view.pump_ready();
        assert_eq!(view.users().len(), 2);

        assert!(loaded_with(&view, c.id));
        let rendered = view.render();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].content, "from c");
    }

    #[tokio::test]
    async fn previous_partner_resolving_first_leaves_loading() {
        let me = user("me");
        let (b, c) = (user("b"), user("c"));
        let backend = FakeBackend::new(me.id, vec![b.clone(), c.clone()]);
        backend.set_conversation(b.id, vec![msg(b.id, me.id, "from b", 1)]);
        backend.hold(b.id);
        backend.hold(c.id);

        let mut view = ChatView::mount(ChatContext { backend: backend.clone(), me });
        view.select_partner(b.id);
        view.select_partner(c.id);

        backend.release(b.id);
        tokio::time::sleep(Duration::from_millis(50)).await;
        view.pump_ready();
        assert_eq!(view.state(), &ViewState::ConversationLoading { partner: c.id });

        backend.release(c.id);
        pump_until(&mut view, |v| loaded_with(v, c.id)).await;
        assert!(view.render().is_empty());
    }

    #[tokio::test]
    async fn send_appends_without_refetch() {
        let me = user("me");
        let b = user("b");
        let backend = FakeBackend::new(me.id, vec![b.clone()]);
        backend.set_conversation(b.id, vec![msg(b.id, me.id, "hello", 1)]);

        let mut view = ChatView::mount(ChatContext { backend: backend.clone(), me: me.clone() });
        view.select_partner(b.id);
        pump_until(&mut view, |v| loaded_with(v, b.id) && !v.users().is_empty()).await;

        view.send("hi").await.unwrap();
        assert_eq!(backend.fetch_count(), 1);

        let rendered = view.render();
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[1].content, "hi");
        assert!(rendered[1].from_me);
        assert_eq!(rendered[1].avatar, me.image_url);
        assert!(!rendered[0].from_me);
        assert_eq!(rendered[0].avatar, b.image_url);
    }

    #[tokio::test]
    async fn send_without_selection_fails() {
        let me = user("me");
        let backend = FakeBackend::new(me.id, vec![]);
        let mut view = ChatView::mount(ChatContext { backend, me });

        assert!(matches!(view.send("hi").await, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn gateway_push_and_reconnect() {
        let me = user("me");
        let b = user("b");
        let backend = FakeBackend::new(me.id, vec![b.clone()]);

        let mut view = ChatView::mount(ChatContext { backend: backend.clone(), me: me.clone() });
        view.select_partner(b.id);
        pump_until(&mut view, |v| loaded_with(v, b.id)).await;

        let pushed = msg(b.id, me.id, "pushed", 10);
        view.handle_gateway(GatewayUpdate::Event(GatewayEvent::MessageCreate(pushed.clone())));
        view.handle_gateway(GatewayUpdate::Event(GatewayEvent::PresenceUpdate {
            user_id: b.id,
            username: "b".into(),
            online: true,
        }));
        assert_eq!(view.render().len(), 1);
        assert!(view.is_online(b.id));

        // Missed while disconnected; only a re-fetch brings it in
        let missed = msg(me.id, b.id, "missed", 11);
        backend.set_conversation(b.id, vec![pushed, missed]);
        view.handle_gateway(GatewayUpdate::Disconnected);
        assert!(!view.is_connected());
        view.handle_gateway(GatewayUpdate::Reconnected);

        pump_until(&mut view, |v| loaded_with(v, b.id)).await;
        let contents: Vec<_> = view.render().into_iter().map(|r| r.content).collect();
        assert_eq!(contents, vec!["pushed", "missed"]);
        assert_eq!(backend.fetch_count(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_can_be_retried() {
        let me = user("me");
        let b = user("b");
        let backend = FakeBackend::new(me.id, vec![b.clone()]);
        backend.set_conversation(b.id, vec![msg(b.id, me.id, "hello", 1)]);
        backend.set_failing(b.id, true);

        let mut view = ChatView::mount(ChatContext { backend: backend.clone(), me });
        view.select_partner(b.id);
        pump_until(&mut view, |v| v.last_error().is_some()).await;
        assert_eq!(view.state(), &ViewState::ConversationLoading { partner: b.id });

        backend.set_failing(b.id, false);
        assert!(view.retry());
        assert!(view.last_error().is_none());

        pump_until(&mut view, |v| loaded_with(v, b.id)).await;
        assert_eq!(view.render()[0].content, "hello");
        assert_eq!(backend.fetch_count(), 2);
    }

    #[tokio::test]
    async fn retry_without_selection_does_nothing() {
        let me = user("me");
        let backend = FakeBackend::new(me.id, vec![]);
        let mut view = ChatView::mount(ChatContext { backend: backend.clone(), me });

        assert!(!view.retry());
        assert_eq!(backend.fetch_count(), 0);
    }
}
