use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::pipeline::split_audio_use_case::SplitResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitFinished {
    pub item_id: String,
    #[serde(flatten)]
    pub result: SplitResult,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitFailed {
    pub item_id: String,
    pub error: String,
}

/// Job lifecycle notification. Serializes as
/// `{"type": "split_finished" | "split_failed", "data": {"item_id": ..., ...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SplitEvent {
    SplitFinished(SplitFinished),
    SplitFailed(SplitFailed),
}

impl SplitEvent {
    pub fn finished(item_id: &str, result: SplitResult) -> Self {
        SplitEvent::SplitFinished(SplitFinished {
            item_id: item_id.to_string(),
            result,
        })
    }

    pub fn failed(item_id: &str, error: impl ToString) -> Self {
        SplitEvent::SplitFailed(SplitFailed {
            item_id: item_id.to_string(),
            error: error.to_string(),
        })
    }

    pub fn item_id(&self) -> &str {
        match self {
            SplitEvent::SplitFinished(e) => &e.item_id,
            SplitEvent::SplitFailed(e) => &e.item_id,
        }
    }

    /// Server-sent-events frame: `data: <json>\n\n`.
    pub fn to_sse_frame(&self) -> Result<String, serde_json::Error> {
        Ok(format!("data: {}\n\n", serde_json::to_string(self)?))
    }
}

struct Shared {
    sender: UnboundedSender<SplitEvent>,
    /// One queue for every subscriber. Whoever holds the lock is the next to
    /// receive; the rest wait their turn.
    receiver: tokio::sync::Mutex<UnboundedReceiver<SplitEvent>>,
    /// Connected subscriber count. Held while publishing so a publish never
    /// races the last subscriber leaving.
    subscribers: Mutex<usize>,
}

impl Shared {
    fn subscribers(&self) -> MutexGuard<'_, usize> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Single unbounded FIFO of job events shared by every producer and
/// subscriber.
///
/// This is a work queue, not a broadcast: each event goes to exactly one of
/// the subscribers connected when it is published. Events published while
/// nobody listens are dropped, and whatever is still queued when the last
/// subscriber disconnects is discarded, so a subscriber never sees events
/// from before it connected.
///
/// Publishing never blocks and may happen from any thread; receiving is
/// async.
#[derive(Clone)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                sender,
                receiver: tokio::sync::Mutex::new(receiver),
                subscribers: Mutex::new(0),
            }),
        }
    }

    pub fn publish(&self, event: SplitEvent) {
        let subscribers = self.shared.subscribers();
        if *subscribers == 0 {
            log::debug!("No subscribers, dropping event for {}", event.item_id());
            return;
        }
        // The bus owns the receiver, so the channel is never closed
        let _ = self.shared.sender.send(event);
    }

    pub fn subscribe(&self) -> Subscription {
        *self.shared.subscribers() += 1;
        Subscription {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        *self.shared.subscribers()
    }
}

/// A connected consumer of the shared event queue. Disconnects on drop.
pub struct Subscription {
    shared: Arc<Shared>,
}

impl Subscription {
    /// Waits for the next event.
    pub async fn recv(&self) -> Option<SplitEvent> {
        self.shared.receiver.lock().await.recv().await
    }

    /// `None` if nothing arrived within `timeout`.
    pub async fn recv_timeout(&self, timeout: Duration) -> Option<SplitEvent> {
        tokio::time::timeout(timeout, self.recv())
            .await
            .ok()
            .flatten()
    }

    /// Takes a queued event without waiting. Returns `None` while another
    /// subscriber is waiting on the queue.
    pub fn try_recv(&self) -> Option<SplitEvent> {
        self.shared.receiver.try_lock().ok()?.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut subscribers = self.shared.subscribers();
        *subscribers = subscribers.saturating_sub(1);
        if *subscribers > 0 {
            return;
        }
        // No subscriber is left to hold the queue lock
        if let Ok(mut receiver) = self.shared.receiver.try_lock() {
            let mut discarded = 0;
            while receiver.try_recv().is_ok() {
                discarded += 1;
            }
            if discarded > 0 {
                log::debug!("Last subscriber left, discarded {discarded} undelivered events");
            }
        }
    }
}
