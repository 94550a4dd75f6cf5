//! In-memory per-user state with single-writer access.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use taxbot_core::UserKey;
use taxbot_dialog::Session;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::history::HistoryBuffer;

/// Everything one user owns: calculator session and chat history.
#[derive(Debug, Clone)]
pub struct UserState {
    pub session: Session,
    pub history: HistoryBuffer,
    /// Last time a turn for this user started.
    pub updated_at: DateTime<Utc>,
}

impl UserState {
    fn new(history_limit: usize) -> Self {
        Self {
            session: Session::default(),
            history: HistoryBuffer::new(history_limit),
            updated_at: Utc::now(),
        }
    }
}

/// Keyed lock table of [`UserState`].
///
/// Holding the guard returned by [`SessionStore::lock`] gives exclusive
/// access to that user's state; other users are unaffected. State lives for
/// the lifetime of the process only.
pub struct SessionStore {
    users: Mutex<HashMap<UserKey, Arc<Mutex<UserState>>>>,
    history_limit: usize,
}

impl SessionStore {
    #[must_use]
    pub fn new(history_limit: usize) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            history_limit,
        }
    }

    /// Wait for exclusive access to `user`'s state, creating it on first use.
    pub async fn lock(&self, user: UserKey) -> OwnedMutexGuard<UserState> {
        let entry = {
            let mut users = self.users.lock().await;
            Arc::clone(users.entry(user).or_insert_with(|| {
                debug!("Creating state for user {user}");
                Arc::new(Mutex::new(UserState::new(self.history_limit)))
            }))
        };

        let mut guard = entry.lock_owned().await;
        guard.updated_at = Utc::now();
        guard
    }

    /// Drop users idle for longer than `max_idle`.
    ///
    /// An entry handed out by [`SessionStore::lock`] is kept even before its
    /// guard is acquired; the map holds the only other reference.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let mut users = self.users.lock().await;
        let before = users.len();

        users.retain(|_, state| {
            Arc::strong_count(state) > 1
                || state
                    .try_lock()
                    .map_or(true, |state| state.updated_at >= cutoff)
        });

        let evicted = before - users.len();
        if evicted > 0 {
            info!("Evicted {evicted} idle user states");
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }

    #[must_use]
    pub const fn history_limit(&self) -> usize {
        self.history_limit
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(crate::history::DEFAULT_HISTORY_LIMIT)
    }
}
