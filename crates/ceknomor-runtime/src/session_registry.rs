//! Conversation session registry
//!
//! Holds one [`SessionState`] per conversation. Transport-agnostic: the key
//! type is whatever identifies a conversation for the transport in use.

use crate::interaction::SessionState;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Registry of per-conversation state.
///
/// Each entry sits behind its own mutex, so an event for one conversation
/// is handled to completion before the next event for that conversation,
/// while other conversations proceed independently.
pub struct SessionRegistry<Id: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static> {
    sessions: RwLock<HashMap<Id, Arc<Mutex<SessionState>>>>,
}

impl<Id: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static> Default
    for SessionRegistry<Id>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static> SessionRegistry<Id> {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get existing session or create an idle one
    pub async fn get_or_create(&self, id: Id) -> Arc<Mutex<SessionState>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(state) = sessions.get(&id) {
                return state.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        // Another task may have inserted between the two locks
        sessions
            .entry(id)
            .or_insert_with_key(|id| {
                debug!(conversation = ?id, "Creating session state");
                Arc::new(Mutex::new(SessionState::default()))
            })
            .clone()
    }

    /// Get session if exists
    pub async fn get(&self, id: &Id) -> Option<Arc<Mutex<SessionState>>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Drop the entry for `id` if it is idle and no other task holds it.
    ///
    /// Returns `true` if the entry was removed. An entry that is still in use
    /// or mid-conversation is kept.
    pub async fn remove_if_idle(&self, id: &Id) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(state) = sessions.get(id) else {
            return false;
        };
        // The map's own reference is the only one left
        let idle = Arc::strong_count(state) == 1
            && state.try_lock().is_ok_and(|state| state.is_idle());
        if idle {
            sessions.remove(id);
            debug!(conversation = ?id, "Dropping idle session state");
        }
        idle
    }

    /// Number of known conversations
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no conversation has been seen yet
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
