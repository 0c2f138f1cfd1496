//! Broadcast bus with a bounded replay buffer for late subscribers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tokio_stream::wrappers::BroadcastStream;

use crate::payloads::{DEFAULT_REPLAY_CAPACITY, Event, EventEnvelope, EventId};

/// Live-only stream for consumers that prefer `StreamExt` combinators.
pub type LiveStream = BroadcastStream<EventEnvelope>;

/// Cloneable handle to the workflow event bus.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    replay: Arc<Mutex<ReplayLog>>,
    replay_capacity: usize,
}

/// Buffered envelopes plus the id counter; both change under one lock so
/// buffer order always matches id order.
struct ReplayLog {
    buffer: VecDeque<EventEnvelope>,
    next_id: EventId,
}

impl EventBus {
    /// Bus whose broadcast channel and replay buffer both hold `capacity`
    /// envelopes.
    ///
    /// # Panics
    ///
    /// Panics on a zero capacity; configuration validation rejects it first.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "event bus capacity must be positive");
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            replay: Arc::new(Mutex::new(ReplayLog {
                buffer: VecDeque::with_capacity(capacity),
                next_id: 1,
            })),
            replay_capacity: capacity,
        }
    }

    /// Bus sized by [`DEFAULT_REPLAY_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REPLAY_CAPACITY)
    }

    /// Wrap `event` in an envelope with the next id and fan it out.
    ///
    /// Publishing succeeds even when nobody is listening.
    pub fn publish(&self, event: Event) -> EventId {
        let mut replay = self.lock_replay();
        let id = replay.next_id;
        replay.next_id = id.saturating_add(1);
        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };

        if replay.buffer.len() == self.replay_capacity {
            replay.buffer.pop_front();
        }
        replay.buffer.push_back(envelope.clone());
        let _ = self.sender.send(envelope);
        id
    }

    /// Stream of events after `since_id`, served from the replay buffer first.
    /// `None` subscribes to live events only.
    #[must_use]
    pub fn subscribe(&self, since_id: Option<EventId>) -> EventStream {
        let receiver = self.sender.subscribe();
        let backlog = since_id.map_or_else(VecDeque::new, |since| {
            self.lock_replay()
                .buffer
                .iter()
                .filter(|item| item.id > since)
                .cloned()
                .collect()
        });
        let last_replayed = backlog.back().map(|item: &EventEnvelope| item.id);

        EventStream {
            backlog,
            last_replayed,
            receiver,
        }
    }

    /// Subscribe to live events only, wrapped as a `Stream`.
    #[must_use]
    pub fn live(&self) -> LiveStream {
        BroadcastStream::new(self.sender.subscribe())
    }

    /// Id of the newest buffered envelope.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        self.lock_replay().buffer.back().map(|event| event.id)
    }

    /// Collect the buffered events emitted after `id`.
    #[must_use]
    pub fn backlog_since(&self, id: EventId) -> Vec<EventEnvelope> {
        self.lock_replay()
            .buffer
            .iter()
            .filter(|env| env.id > id)
            .cloned()
            .collect()
    }

    fn lock_replay(&self) -> MutexGuard<'_, ReplayLog> {
        self.replay.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber handle returned by [`EventBus::subscribe`].
pub struct EventStream {
    backlog: VecDeque<EventEnvelope>,
    last_replayed: Option<EventId>,
    receiver: Receiver<EventEnvelope>,
}

impl EventStream {
    /// Receive the next event, draining the replay backlog first.
    ///
    /// Live events already delivered through the backlog are skipped. Returns
    /// `None` once every bus handle has been dropped.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        if let Some(event) = self.backlog.pop_front() {
            return Some(event);
        }

        loop {
            let envelope = match self.receiver.recv().await {
                Ok(envelope) => envelope,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            };
            if self.last_replayed.is_some_and(|last| envelope.id <= last) {
                continue;
            }
            return Some(envelope);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::task;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    const RECV_TIMEOUT: Duration = Duration::from_secs(1);

    fn loaded(count: usize) -> Event {
        Event::RecordsLoaded { count }
    }

    #[tokio::test]
    async fn sequential_ids_and_replay() {
        let bus = EventBus::with_capacity(16);

        let mut last_id = 0;
        for i in 0..5 {
            last_id = bus.publish(loaded(i));
        }
        assert_eq!(last_id, 5);
        assert_eq!(bus.last_event_id(), Some(5));

        let mut stream = bus.subscribe(Some(2));
        let mut received = Vec::new();
        for _ in 0..3 {
            if let Some(event) = stream.next().await {
                received.push(event.id);
            }
        }
        assert_eq!(received, vec![3, 4, 5]);
    }

    #[test]
    fn replay_buffer_drops_oldest_entries() {
        let bus = EventBus::with_capacity(2);
        for i in 0..4 {
            let _ = bus.publish(loaded(i));
        }
        let ids: Vec<_> = bus.backlog_since(0).into_iter().map(|env| env.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn live_stream_receives_published_events() {
        let bus = EventBus::with_capacity(8);
        let mut live = bus.live();
        let _ = bus.publish(Event::BusyChanged { busy: true });

        let next = timeout(RECV_TIMEOUT, live.next())
            .await
            .expect("live stream timed out")
            .expect("live stream closed")
            .expect("live stream lagged");
        assert_eq!(next.event, Event::BusyChanged { busy: true });
    }

    #[tokio::test]
    async fn replayed_events_are_not_delivered_twice() {
        let bus = EventBus::with_capacity(32);
        let _ = bus.publish(loaded(0));
        let mut stream = bus.subscribe(Some(0));
        let _ = bus.publish(loaded(1));

        let mut seen = Vec::new();
        while let Ok(Some(envelope)) = timeout(Duration::from_millis(100), stream.next()).await {
            seen.push(envelope.id);
        }
        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test]
    async fn concurrent_publishers_are_all_observed() {
        let bus = EventBus::with_capacity(256);
        let mut stream = bus.subscribe(None);

        let publishers: Vec<_> = (0..4)
            .map(|_| {
                let bus = bus.clone();
                task::spawn(async move {
                    for i in 0..50 {
                        let _ = bus.publish(loaded(i));
                    }
                })
            })
            .collect();
        for publisher in publishers {
            publisher.await.expect("publisher task panicked");
        }

        let mut ids = HashSet::new();
        while ids.len() < 200 {
            let envelope = timeout(RECV_TIMEOUT, stream.next())
                .await
                .expect("stream stalled")
                .expect("bus closed");
            ids.insert(envelope.id);
        }
        assert_eq!(ids.len(), 200);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_publishers_keep_the_buffer_in_id_order() {
        let bus = EventBus::with_capacity(512);
        let _ = bus.publish(loaded(0));
        let mut stream = bus.subscribe(Some(0));

        let publishers: Vec<_> = (0..8)
            .map(|_| {
                let bus = bus.clone();
                task::spawn(async move {
                    for i in 0..40 {
                        let _ = bus.publish(loaded(i));
                        task::yield_now().await;
                    }
                })
            })
            .collect();
        for publisher in publishers {
            publisher.await.expect("publisher task panicked");
        }

        let buffered: Vec<_> = bus.backlog_since(0).into_iter().map(|env| env.id).collect();
        let expected: Vec<EventId> = (1..=321).collect();
        assert_eq!(buffered, expected);

        let mut delivered = Vec::new();
        while delivered.len() < expected.len() {
            let envelope = timeout(RECV_TIMEOUT, stream.next())
                .await
                .expect("stream stalled")
                .expect("bus closed");
            delivered.push(envelope.id);
        }
        assert_eq!(delivered, expected);
    }
}
