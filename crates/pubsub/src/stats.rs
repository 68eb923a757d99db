use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing the health of a running pubsub service.
///
/// Shared between the service task and every [`PubSubFrontend`] clone. All
/// counters are monotonic; readers should compute deltas themselves.
///
/// [`PubSubFrontend`]: crate::PubSubFrontend
#[derive(Debug, Default)]
pub struct PubSubStats {
    orphaned_responses: AtomicU64,
    backpressure_rejections: AtomicU64,
    ring_saturation_events: AtomicU64,
    reconnects: AtomicU64,
    lost_subscriptions: AtomicU64,
}

impl PubSubStats {
    /// Record a response frame that matched no pending request.
    pub(crate) fn record_orphaned_response(&self, reason: &'static str) {
        tracing::warn!(reason, "orphaned response");
        self.orphaned_responses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a submission rejected due to backpressure.
    pub(crate) fn record_backpressure_rejection(&self) {
        tracing::warn!("request rejected due to backpressure");
        self.backpressure_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the submission queue crossing its saturation threshold.
    pub(crate) fn record_ring_saturation(&self, remaining: usize) {
        tracing::warn!(remaining, "ring-buffer saturation");
        self.ring_saturation_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful reconnect.
    pub(crate) fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Record server-side subscriptions lost to a reconnect.
    pub(crate) fn record_lost_subscriptions(&self, count: u64) {
        if count > 0 {
            tracing::warn!(
                count,
                "server-side subscriptions lost on reconnect; callers must re-subscribe"
            );
            self.lost_subscriptions.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Number of response frames that matched no pending request.
    pub fn orphaned_responses(&self) -> u64 {
        self.orphaned_responses.load(Ordering::Relaxed)
    }

    /// Number of submissions rejected due to backpressure.
    pub fn backpressure_rejections(&self) -> u64 {
        self.backpressure_rejections.load(Ordering::Relaxed)
    }

    /// Number of times the submission queue crossed its saturation threshold.
    pub fn ring_saturation_events(&self) -> u64 {
        self.ring_saturation_events.load(Ordering::Relaxed)
    }

    /// Number of successful reconnects.
    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    /// Number of server-side subscriptions invalidated by reconnects.
    pub fn lost_subscriptions(&self) -> u64 {
        self.lost_subscriptions.load(Ordering::Relaxed)
    }
}
