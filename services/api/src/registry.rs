//! In-memory session registry.
//!
//! Conversations are tracked per process in a `HashMap` behind an async
//! `RwLock`. Each [`Session`] owns the write half of its upstream websocket
//! (once connected) and the handle of the task driving the read half.

use elevenlabs_convai::ConvaiSink;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Connection half of a session. Guarded by a single lock so writes to the
/// upstream socket are serialized and the active flag cannot drift from the
/// sink's presence.
#[derive(Default)]
pub(crate) struct ConnState {
    pub(crate) active: bool,
    pub(crate) sink: Option<ConvaiSink>,
}

/// One relayed conversation.
pub struct Session {
    pub conversation_id: Uuid,
    pub agent_id: String,
    pub(crate) conn: Mutex<ConnState>,
    task: Mutex<Option<JoinHandle<()>>>,
    created_at: Instant,
}

impl Session {
    fn new(agent_id: &str) -> Self {
        Self {
            conversation_id: Uuid::new_v4(),
            agent_id: agent_id.to_string(),
            conn: Mutex::new(ConnState::default()),
            task: Mutex::new(None),
            created_at: Instant::now(),
        }
    }

    /// Whether the upstream websocket is connected and writable.
    pub async fn is_active(&self) -> bool {
        self.conn.lock().await.active
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Remembers the task driving the upstream read loop so it can be
    /// cancelled later.
    pub async fn attach_task(&self, handle: JoinHandle<()>) {
        let mut task = self.task.lock().await;
        if let Some(old) = task.replace(handle) {
            old.abort();
        }
    }

    /// Cancels the read-loop task, if one is still attached.
    pub(crate) async fn abort_task(&self) {
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }
    }
}

/// Process-wide map from conversation id to live session.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new session for `agent_id` under a fresh conversation id.
    pub async fn create(&self, agent_id: &str) -> Arc<Session> {
        let session = Arc::new(Session::new(agent_id));
        self.sessions
            .write()
            .await
            .insert(session.conversation_id, session.clone());
        session
    }

    pub async fn get(&self, conversation_id: &Uuid) -> Option<Arc<Session>> {
        self.sessions.read().await.get(conversation_id).cloned()
    }

    /// Removes a session from the map. Callers still holding an `Arc` can
    /// finish tearing it down afterwards.
    pub async fn remove(&self, conversation_id: &Uuid) -> Option<Arc<Session>> {
        self.sessions.write().await.remove(conversation_id)
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
