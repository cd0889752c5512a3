use serde::{Deserialize, Serialize};
use tracing::info;

use crate::provider::Provider;
use crate::service::NextBus;

/// Whether upstream calls are currently disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub disabled: bool,
}

impl<P: Provider> NextBus<P> {
    #[must_use]
    pub fn status(&self) -> Status {
        Status { disabled: self.breaker.is_disabled() }
    }

    /// Operator override: flip the breaker and report the new state.
    pub fn toggle_disabled(&self) -> Status {
        let disabled = self.breaker.toggle();
        info!(disabled, "upstream calls toggled by operator");
        Status { disabled }
    }

    /// Operator override: resume upstream calls.
    pub fn reset(&self) -> Status {
        self.breaker.reset();
        info!("upstream calls re-enabled by operator");
        self.status()
    }
}
