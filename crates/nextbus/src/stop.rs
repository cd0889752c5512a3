//! # Stop predictions
//!
//! A composite stop's predictions are the merged predictions of its members.
//! Each member is fetched and cached on its own so that a member shared by
//! several composites is only requested once per cache window.

use bustime::Prediction;
use futures::future::join_all;
use realtime::{Result, invalid_input};
use stops::{MULTI_PREFIX, member_ids};
use tracing::warn;

use crate::cache::{self, Key};
use crate::prediction::{FormattedPrediction, PredictionReply, StopInfo};
use crate::provider::Provider;
use crate::service::NextBus;

impl<P: Provider> NextBus<P> {
    /// Predictions for a single or composite (`multi:`) stop, soonest first.
    ///
    /// Single stops must exist in the stop database and their reply includes
    /// the stop's name and location. While upstream calls are disabled the
    /// reply holds a single over-limit placeholder.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for an unknown stop or a composite id
    /// without members.
    pub async fn stop_predictions(&self, stop_id: &str) -> Result<PredictionReply> {
        let members = member_ids(stop_id);
        let stop_info = if stop_id.starts_with(MULTI_PREFIX) {
            if members.is_empty() {
                return Err(invalid_input!("composite stop {} has no members", stop_id));
            }
            None
        } else {
            let Some(stop) = self.provider.database().stop(stop_id) else {
                return Err(invalid_input!("unknown stop {}", stop_id));
            };
            Some(StopInfo { name: stop.name.clone(), loc: stop.location })
        };

        if self.breaker.is_disabled() {
            return Ok(PredictionReply::over_limit(stop_info));
        }

        let fetched = join_all(members.iter().map(|member| self.member_predictions(member))).await;
        let now = self.provider.now();

        let mut predictions = vec![];
        for result in fetched {
            match result {
                Ok(raw) => predictions.extend(raw.iter().map(|p| FormattedPrediction::new(p, now))),
                Err(err) if err.is_quota_exceeded() => {
                    return Ok(PredictionReply::over_limit(stop_info));
                }
                Err(err) => return Err(err),
            }
        }

        Ok(PredictionReply::new(predictions, stop_info))
    }

    async fn member_predictions(&self, stop_id: &str) -> Result<Vec<Prediction>> {
        let key = Key::Stop(stop_id.to_string());
        let ttl = Some(self.settings.prediction_ttl);

        cache::get_or_compute(&self.provider, &key, ttl, || async {
            match self.upstream("predictions", self.provider.fetch_predictions(stop_id)).await {
                Ok(predictions) => Ok(predictions),
                Err(err) if err.is_quota_exceeded() => Err(err),
                Err(err) => {
                    warn!(stop_id, error = %err, "predictions unavailable");
                    Ok(vec![])
                }
            }
        })
        .await
    }
}
