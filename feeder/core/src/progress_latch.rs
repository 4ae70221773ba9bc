//! Progress Latch
//!
//! Debounces a raw "is loading" signal into a flicker-free "show progress"
//! signal:
//!
//! - a load shorter than the show delay never shows the indicator;
//! - once shown, the indicator stays up for at least the minimum visible time.
//!
//! ```text
//! loading  ──┐▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔┌────────────────
//!            │                 │
//! shown    ──┼──────┐▔▔▔▔▔▔▔▔▔▔┼▔▔▔▔▔▔┌─────────
//!            |<show>|          |      |
//!                   |<--- min visible --->|
//! ```
//!
//! At most one timer is pending per latch. Every [`ProgressLatch::refresh`]
//! call replaces it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Timing of the progress latch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatchConfig {
    /// How long loading must last before the indicator appears
    pub show_delay: Duration,
    /// Minimum time the indicator stays visible once shown
    pub min_visible: Duration,
}

impl Default for LatchConfig {
    fn default() -> Self {
        Self {
            show_delay: Duration::from_millis(750),
            min_visible: Duration::from_millis(500),
        }
    }
}

impl LatchConfig {
    /// Set the show delay
    #[must_use]
    pub fn with_show_delay(mut self, delay: Duration) -> Self {
        self.show_delay = delay;
        self
    }

    /// Set the minimum visible time
    #[must_use]
    pub fn with_min_visible(mut self, min_visible: Duration) -> Self {
        self.min_visible = min_visible;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimerKind {
    Show,
    Hide,
}

#[derive(Debug)]
struct PendingTimer {
    kind: TimerKind,
    deadline: Instant,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct LatchInner {
    /// When the indicator was shown; `None` while hidden
    shown_at: Option<Instant>,
    pending: Option<PendingTimer>,
    /// Bumped on every refresh so a superseded timer never applies
    generation: u64,
}

/// Debounced progress indicator
pub struct ProgressLatch {
    config: LatchConfig,
    inner: Arc<Mutex<LatchInner>>,
    toggle_tx: Arc<watch::Sender<bool>>,
}

impl ProgressLatch {
    /// Create a hidden latch
    #[must_use]
    pub fn new(config: LatchConfig) -> Self {
        let (toggle_tx, _) = watch::channel(false);
        Self {
            config,
            inner: Arc::new(Mutex::new(LatchInner::default())),
            toggle_tx: Arc::new(toggle_tx),
        }
    }

    /// Latch timing
    #[must_use]
    pub fn config(&self) -> LatchConfig {
        self.config
    }

    /// Observe the debounced "show progress" flag
    ///
    /// The value only changes on show/hide edges.
    #[must_use]
    pub fn toggle_state(&self) -> watch::Receiver<bool> {
        self.toggle_tx.subscribe()
    }

    /// Whether the indicator is currently shown
    #[must_use]
    pub fn is_shown(&self) -> bool {
        *self.toggle_tx.borrow()
    }

    /// Feed the raw loading flag
    ///
    /// Never blocks; timers run on the tokio runtime, so this must be called
    /// from within one.
    pub fn refresh(&self, is_loading: bool) {
        let mut inner = self.inner.lock();
        let previous = inner.pending.take();
        if let Some(timer) = &previous {
            timer.handle.abort();
        }
        inner.generation = inner.generation.wrapping_add(1);
        let now = Instant::now();

        if is_loading {
            if inner.shown_at.is_some() {
                // Still loading while visible: any pending hide is dropped.
                return;
            }
            let deadline = match previous {
                Some(PendingTimer {
                    kind: TimerKind::Show,
                    deadline,
                    ..
                }) => deadline,
                _ => now + self.config.show_delay,
            };
            tracing::trace!(delay = ?deadline.saturating_duration_since(now), "Arming progress show");
            self.arm(&mut inner, TimerKind::Show, deadline);
        } else {
            let Some(shown_at) = inner.shown_at else {
                // Finished before the delay elapsed: nothing was ever shown.
                return;
            };
            let hide_at = shown_at + self.config.min_visible;
            if now >= hide_at {
                inner.shown_at = None;
                self.toggle_tx.send_replace(false);
                tracing::debug!("Progress hidden");
            } else {
                tracing::trace!(remaining = ?hide_at - now, "Holding progress for minimum time");
                self.arm(&mut inner, TimerKind::Hide, hide_at);
            }
        }
    }

    fn arm(&self, inner: &mut LatchInner, kind: TimerKind, deadline: Instant) {
        let generation = inner.generation;
        let shared = Arc::clone(&self.inner);
        let toggle_tx = Arc::clone(&self.toggle_tx);

        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;

            let mut inner = shared.lock();
            if inner.generation != generation {
                return;
            }
            inner.pending = None;
            match kind {
                TimerKind::Show => {
                    inner.shown_at = Some(Instant::now());
                    toggle_tx.send_replace(true);
                    tracing::debug!("Progress shown");
                }
                TimerKind::Hide => {
                    inner.shown_at = None;
                    toggle_tx.send_replace(false);
                    tracing::debug!("Progress hidden");
                }
            }
        });

        inner.pending = Some(PendingTimer {
            kind,
            deadline,
            handle,
        });
    }
}

impl Drop for ProgressLatch {
    fn drop(&mut self) {
        if let Some(timer) = self.inner.lock().pending.take() {
            timer.handle.abort();
        }
    }
}

impl std::fmt::Debug for ProgressLatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressLatch")
            .field("config", &self.config)
            .field("shown", &self.is_shown())
            .finish_non_exhaustive()
    }
}
