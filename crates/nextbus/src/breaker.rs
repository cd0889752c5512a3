use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

/// Shared flag that stops all upstream calls once the upstream reports its
/// daily quota is used up.
///
/// The breaker never recovers on its own: an operator resets or toggles it.
#[derive(Debug, Default)]
pub struct QuotaBreaker {
    disabled: AtomicBool,
}

impl QuotaBreaker {
    #[must_use]
    pub const fn new() -> Self {
        Self { disabled: AtomicBool::new(false) }
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// Stop upstream calls.
    pub fn trip(&self) {
        if !self.disabled.swap(true, Ordering::AcqRel) {
            warn!(monotonic_counter.quota_breaker_trips = 1, "upstream quota exhausted, disabling upstream calls");
        }
    }

    /// Resume upstream calls.
    pub fn reset(&self) {
        self.disabled.store(false, Ordering::Release);
    }

    /// Flip the flag, returning the new `disabled` state.
    pub fn toggle(&self) -> bool {
        !self.disabled.fetch_xor(true, Ordering::AcqRel)
    }
}
