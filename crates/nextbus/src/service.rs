use std::sync::Arc;

use realtime::{Error, Result, unavailable};
use tokio::time;

use crate::breaker::QuotaBreaker;
use crate::config::Settings;
use crate::provider::Provider;

/// Facade exposing the NextBus queries without HTTP bindings.
///
/// The breaker is shared: every service built from the same breaker stops
/// calling upstream once any of them sees the quota run out.
#[derive(Debug)]
pub struct NextBus<P> {
    pub(crate) provider: P,
    pub(crate) breaker: Arc<QuotaBreaker>,
    pub(crate) settings: Settings,
}

impl<P: Provider> NextBus<P> {
    #[must_use]
    pub const fn new(provider: P, breaker: Arc<QuotaBreaker>, settings: Settings) -> Self {
        Self { provider, breaker, settings }
    }

    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub fn breaker(&self) -> &QuotaBreaker {
        &self.breaker
    }

    /// Run an upstream call under the breaker and the upstream timeout.
    ///
    /// A quota error trips the breaker. While the breaker is tripped the call
    /// is not made and `Error::QuotaExceeded` is returned.
    pub(crate) async fn upstream<T>(
        &self, what: &str, call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        if self.breaker.is_disabled() {
            return Err(Error::QuotaExceeded(format!("upstream disabled, skipped {what}")));
        }

        let Ok(result) = time::timeout(self.settings.upstream_timeout, call).await else {
            return Err(unavailable!("{} timed out after {:?}", what, self.settings.upstream_timeout));
        };

        if let Err(err) = &result
            && err.is_quota_exceeded()
        {
            self.breaker.trip();
        }
        result
    }
}
