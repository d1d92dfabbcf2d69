//! Speaker task - drains the notification queue into a speech sink

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::{NotificationQueue, Utterance};

/// Audio playback collaborator
///
/// `speak` starts playback and returns how long it will take. The speaker
/// marks the utterance complete after that long unless it is cancelled.
pub trait SpeechSink: Send + 'static {
    fn speak(&mut self, utterance: &Utterance) -> Duration;

    /// Stop whatever is playing
    fn cancel(&mut self) {}
}

/// Sink that records utterances instead of playing them
#[derive(Clone, Debug, Default)]
pub struct MemorySpeech {
    spoken: Arc<Mutex<Vec<String>>>,
    cancelled: Arc<Mutex<u32>>,
    duration: Duration,
}

impl MemorySpeech {
    /// Every utterance "plays" for `duration`
    pub fn with_duration(duration: Duration) -> Self {
        MemorySpeech {
            duration,
            ..Self::default()
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }

    pub fn cancellations(&self) -> u32 {
        *self.cancelled.lock()
    }
}

impl SpeechSink for MemorySpeech {
    fn speak(&mut self, utterance: &Utterance) -> Duration {
        self.spoken.lock().push(utterance.text.clone());
        self.duration
    }

    fn cancel(&mut self) {
        *self.cancelled.lock() += 1;
    }
}

/// Handle to a running speaker task
pub struct SpeakerHandle {
    queue: NotificationQueue,
    task: JoinHandle<()>,
}

impl SpeakerHandle {
    pub fn queue(&self) -> &NotificationQueue {
        &self.queue
    }

    /// Close the queue and wait for the task to exit
    pub async fn shutdown(self) {
        self.queue.close();
        if let Err(e) = self.task.await {
            tracing::warn!("speaker task ended abnormally: {}", e);
        }
    }
}

/// Start a background speaker draining `queue` into `sink`
pub fn spawn_speaker<S: SpeechSink>(queue: NotificationQueue, mut sink: S) -> SpeakerHandle {
    let worker = queue.clone();

    let task = tokio::spawn(async move {
        loop {
            let utterance = loop {
                // notify_one leaves a permit, so a push between the
                // check and the await is not lost
                let woken = worker.wake().notified();
                if worker.is_closed() {
                    debug!("speaker stopped");
                    return;
                }
                if let Some(u) = worker.next() {
                    break u;
                }
                woken.await;
            };

            let cancelled = worker.cancel().notified();
            tokio::pin!(cancelled);
            cancelled.as_mut().enable();

            trace!(id = utterance.id, text = %utterance.text, "speaking");
            let length = sink.speak(&utterance);

            if !worker.is_current(utterance.id) {
                sink.cancel();
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(length) => {
                    worker.complete(utterance.id);
                }
                _ = &mut cancelled => {
                    trace!(id = utterance.id, "utterance cancelled");
                    sink.cancel();
                }
            }
        }
    });

    SpeakerHandle { queue, task }
}
