//! Replay-latest fan-out of feed load states
//!
//! Every subscriber gets its own unbounded queue, seeded with the current
//! state. Publishing pushes to all live subscribers and prunes the ones that
//! went away.

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::ContentStream;
use crate::load_state::LoadState;
use crate::model::FeedContents;

struct PublisherInner {
    current: LoadState<FeedContents>,
    subscribers: Vec<mpsc::UnboundedSender<LoadState<FeedContents>>>,
}

/// Shared publisher used by repository implementations
pub struct ContentPublisher {
    inner: Mutex<PublisherInner>,
}

impl ContentPublisher {
    /// Create a publisher holding an initial state
    #[must_use]
    pub fn new(initial: LoadState<FeedContents>) -> Self {
        Self {
            inner: Mutex::new(PublisherInner {
                current: initial,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Subscribe; the first item is the current state
    pub fn subscribe(&self) -> ContentStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        // Cannot fail: the receiver is still in scope.
        let _ = tx.send(inner.current.clone());
        inner.subscribers.push(tx);
        UnboundedReceiverStream::new(rx).boxed()
    }

    /// Publish a new state to every subscriber
    pub fn publish(&self, state: LoadState<FeedContents>) {
        let mut inner = self.inner.lock();
        inner
            .subscribers
            .retain(|tx| tx.send(state.clone()).is_ok());
        inner.current = state;
    }

    /// Current state
    pub fn current(&self) -> LoadState<FeedContents> {
        self.inner.lock().current.clone()
    }

    /// Edit the loaded contents in place and republish
    ///
    /// Does nothing unless the current state is `Success`. Returns whether a
    /// new state was published.
    pub fn update_contents(&self, f: impl FnOnce(&mut FeedContents)) -> bool {
        let mut inner = self.inner.lock();
        let LoadState::Success(contents) = &inner.current else {
            return false;
        };
        let mut contents = contents.clone();
        f(&mut contents);

        let state = LoadState::Success(contents);
        inner
            .subscribers
            .retain(|tx| tx.send(state.clone()).is_ok());
        inner.current = state;
        true
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }
}

impl Default for ContentPublisher {
    fn default() -> Self {
        Self::new(LoadState::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_subscriber_gets_current_first() {
        let publisher = ContentPublisher::new(LoadState::Success(FeedContents::default()));
        let mut stream = publisher.subscribe();

        let first = stream.next().await.unwrap();
        assert!(first.is_success());
    }

    #[tokio::test]
    async fn test_emissions_are_not_coalesced() {
        let publisher = ContentPublisher::default();
        let mut stream = publisher.subscribe();

        publisher.publish(LoadState::error(FeedError::Closed));
        publisher.publish(LoadState::error(FeedError::Closed));
        publisher.publish(LoadState::Success(FeedContents::default()));

        assert!(stream.next().await.unwrap().is_loading());
        assert!(stream.next().await.unwrap().is_error());
        assert!(stream.next().await.unwrap().is_error());
        assert!(stream.next().await.unwrap().is_success());
    }

    #[test]
    fn test_update_contents_requires_success() {
        let publisher = ContentPublisher::default();
        assert!(!publisher.update_contents(|c| c.items.clear()));

        publisher.publish(LoadState::Success(FeedContents::default()));
        assert!(publisher.update_contents(|c| {
            c.favorites.insert(crate::model::FeedItemId::new("a"));
        }));
        assert!(publisher
            .current()
            .value()
            .unwrap()
            .is_favorite(&crate::model::FeedItemId::new("a")));
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let publisher = ContentPublisher::default();
        let stream = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 1);

        drop(stream);
        publisher.publish(LoadState::Loading);
        assert_eq!(publisher.subscriber_count(), 0);
    }
}
