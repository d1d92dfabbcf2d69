//! Notification queue - strictly FIFO, one utterance at a time
//!
//! The queue is the only piece of a session touched from outside the frame
//! loop. The frame loop pushes, a speaker drains. State sits behind one
//! mutex so a flush is atomic with respect to both.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Notification queue configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Pending utterances kept before the oldest is dropped
    pub max_pending: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig { max_pending: 8 }
    }
}

/// One queued utterance
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<Utterance>,
    speaking: Option<Utterance>,
    next_id: u64,
    closed: bool,
}

/// Shared, serialized utterance queue
#[derive(Clone, Debug)]
pub struct NotificationQueue {
    state: Arc<Mutex<QueueState>>,
    wake: Arc<Notify>,
    cancel: Arc<Notify>,
    config: QueueConfig,
}

impl NotificationQueue {
    pub fn new(config: QueueConfig) -> Self {
        NotificationQueue {
            state: Arc::new(Mutex::new(QueueState::default())),
            wake: Arc::new(Notify::new()),
            cancel: Arc::new(Notify::new()),
            config,
        }
    }

    /// Enqueue an utterance; `None` once the queue is closed
    pub fn push(&self, text: impl Into<String>) -> Option<u64> {
        let id = {
            let mut state = self.state.lock();
            if state.closed {
                return None;
            }
            let id = state.next_id;
            state.next_id += 1;
            state.pending.push_back(Utterance {
                id,
                text: text.into(),
            });
            while state.pending.len() > self.config.max_pending.max(1) {
                if let Some(dropped) = state.pending.pop_front() {
                    warn!(id = dropped.id, "notification queue full, dropping oldest");
                }
            }
            id
        };
        self.wake.notify_one();
        Some(id)
    }

    /// Start the next utterance if none is playing
    pub fn next(&self) -> Option<Utterance> {
        let mut state = self.state.lock();
        if state.speaking.is_some() {
            return None;
        }
        let utterance = state.pending.pop_front()?;
        state.speaking = Some(utterance.clone());
        Some(utterance)
    }

    /// Mark an utterance finished; false if it was cancelled meanwhile
    pub fn complete(&self, id: u64) -> bool {
        let finished = {
            let mut state = self.state.lock();
            match &state.speaking {
                Some(current) if current.id == id => {
                    state.speaking = None;
                    true
                }
                _ => false,
            }
        };
        if finished {
            self.wake.notify_one();
        }
        finished
    }

    /// Utterance `id` is still the one playing
    pub fn is_current(&self, id: u64) -> bool {
        self.state
            .lock()
            .speaking
            .as_ref()
            .map_or(false, |u| u.id == id)
    }

    pub fn is_speaking(&self) -> bool {
        self.state.lock().speaking.is_some()
    }

    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Drop every pending utterance and cancel the playing one
    ///
    /// Returns the number of utterances discarded.
    pub fn flush(&self) -> usize {
        let discarded = {
            let mut state = self.state.lock();
            let n = state.pending.len() + usize::from(state.speaking.is_some());
            state.pending.clear();
            state.speaking = None;
            n
        };
        if discarded > 0 {
            debug!(discarded, "notification queue flushed");
        }
        self.cancel.notify_waiters();
        discarded
    }

    /// Flush and refuse further pushes
    pub fn close(&self) -> usize {
        self.state.lock().closed = true;
        let discarded = self.flush();
        self.wake.notify_one();
        discarded
    }

    pub(crate) fn wake(&self) -> &Notify {
        &self.wake
    }

    pub(crate) fn cancel(&self) -> &Notify {
        &self.cancel
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}
