//! In-memory session store with per-key exclusion.
//!
//! Every (user, chat) key owns a slot behind its own async mutex. Handlers hold a
//! [`SessionGuard`] for the whole read-transition-write cycle, so two events for the
//! same key are applied one after the other while different keys never wait on each
//! other.
//!
//! The sweep only evicts slots it can lock without waiting; a slot that is busy is
//! being touched right now and cannot be idle. Evicted slots are marked retired, and
//! a handler that raced the sweep to a retired slot simply fetches a fresh one.

use super::state::{ConversationSession, SessionKey};
use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, OwnedMutexGuard},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Slot {
    session: Option<ConversationSession>,
    retired: bool,
}

/// Exclusive access to one key's session until dropped.
#[derive(Debug)]
pub struct SessionGuard {
    key: SessionKey,
    slot: OwnedMutexGuard<Slot>,
}

impl SessionGuard {
    /// Key this guard holds.
    #[must_use]
    pub const fn key(&self) -> SessionKey {
        self.key
    }

    /// The current session, if a dialog is in progress.
    #[must_use]
    pub fn get(&self) -> Option<&ConversationSession> {
        self.slot.session.as_ref()
    }

    /// Removes and returns the current session.
    pub fn take(&mut self) -> Option<ConversationSession> {
        self.slot.session.take()
    }

    /// Stores `session`, replacing any previous one.
    pub fn upsert(&mut self, session: ConversationSession) {
        self.slot.session = Some(session);
    }

    /// Ends the dialog.
    pub fn delete(&mut self) {
        self.slot.session = None;
    }
}

/// Conversation sessions keyed by (user, chat).
#[derive(Debug, Default)]
pub struct SessionStore {
    slots: Mutex<HashMap<SessionKey, Arc<Mutex<Slot>>>>,
}

impl SessionStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn lock(&self, key: SessionKey) -> SessionGuard {
        loop {
            let slot = {
                let mut slots = self.slots.lock().await;
                Arc::clone(slots.entry(key).or_default())
            };
            let guard = slot.lock_owned().await;
            if !guard.retired {
                return SessionGuard { key, slot: guard };
            }
        }
    }

    /// Snapshot of the session for `key`.
    pub async fn get(&self, key: SessionKey) -> Option<ConversationSession> {
        self.lock(key).await.get().cloned()
    }

    /// Stores `session` under `key`, replacing any previous dialog.
    pub async fn upsert(&self, key: SessionKey, session: ConversationSession) {
        self.lock(key).await.upsert(session);
    }

    /// Ends the dialog under `key`, if any.
    pub async fn delete(&self, key: SessionKey) {
        self.lock(key).await.delete();
    }

    /// Number of dialogs in progress.
    pub async fn active_sessions(&self) -> usize {
        let slots = self.slots.lock().await;
        slots
            .values()
            .filter(|slot| slot.try_lock().map_or(true, |slot| slot.session.is_some()))
            .count()
    }

    /// Evicts sessions idle for longer than `max_idle`. Returns how many were evicted.
    pub async fn sweep(&self, max_idle: Duration) -> usize {
        self.sweep_at(Utc::now(), max_idle).await
    }

    /// [`Self::sweep`] against an explicit clock.
    pub async fn sweep_at(&self, now: DateTime<Utc>, max_idle: Duration) -> usize {
        let mut slots = self.slots.lock().await;
        let mut evicted = 0;

        slots.retain(|key, slot| {
            // Busy slots are in use by a handler right now
            let Ok(mut guard) = slot.try_lock() else {
                return true;
            };
            let expired = guard
                .session
                .as_ref()
                .is_some_and(|session| session.is_idle(now, max_idle));
            if expired {
                debug!(
                    user_id = key.user_id,
                    chat_id = key.chat_id,
                    "Evicting idle session"
                );
                evicted += 1;
                guard.session = None;
            }
            if guard.session.is_none() {
                guard.retired = true;
                return false;
            }
            true
        });

        evicted
    }
}

/// Runs [`SessionStore::sweep`] every `every` until the task is aborted.
pub fn spawn_sweeper(store: Arc<SessionStore>, every: Duration, max_idle: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = store.sweep(max_idle).await;
            if evicted > 0 {
                info!(evicted, "Swept idle conversation sessions");
            }
        }
    })
}
