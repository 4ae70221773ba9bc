//! One-shot Effects
//!
//! Effects are notifications that must be seen exactly once, unlike the view
//! state which is continuously republished. They travel through an unbounded
//! FIFO queue with a single consumer.
//!
//! # Single consumer
//!
//! The queue is unicast. [`EffectStream`] cannot be cloned, and the view model
//! hands it out only once. A second simultaneous consumer is not supported;
//! use a broadcast bus if several observers need the same notifications.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::FeedError;

/// One-shot notification for the surface
#[derive(Clone, Debug)]
pub enum Effect {
    /// Show an error to the user once
    ErrorMessage(Arc<FeedError>),
}

impl Effect {
    /// Human-readable text of the effect
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::ErrorMessage(cause) => cause.to_string(),
        }
    }
}

/// Create a connected effect sender and stream
#[must_use]
pub fn effect_channel() -> (EffectSender, EffectStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        EffectSender { tx },
        EffectStream {
            inner: UnboundedReceiverStream::new(rx),
        },
    )
}

/// Producer side of the effect queue
///
/// Cheap to clone. Sending never blocks and never drops while the stream is
/// alive.
#[derive(Clone, Debug)]
pub struct EffectSender {
    tx: mpsc::UnboundedSender<Effect>,
}

impl EffectSender {
    /// Enqueue an effect
    ///
    /// Returns `false` if the consumer has gone away.
    pub fn send(&self, effect: Effect) -> bool {
        match self.tx.send(effect) {
            Ok(()) => true,
            Err(mpsc::error::SendError(effect)) => {
                tracing::debug!(?effect, "Effect consumer gone, dropping effect");
                false
            }
        }
    }

    /// Enqueue an error effect
    pub fn send_error(&self, cause: Arc<FeedError>) -> bool {
        self.send(Effect::ErrorMessage(cause))
    }
}

/// Consumer side of the effect queue
#[derive(Debug)]
pub struct EffectStream {
    inner: UnboundedReceiverStream<Effect>,
}

impl EffectStream {
    /// Wait for the next effect
    ///
    /// Returns `None` once every sender is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<Effect> {
        self.inner.as_mut().recv().await
    }

    /// Take the next effect if one is queued
    pub fn try_recv(&mut self) -> Option<Effect> {
        self.inner.as_mut().try_recv().ok()
    }
}

impl Stream for EffectStream {
    type Item = Effect;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
