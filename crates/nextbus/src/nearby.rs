use geojson::FeatureCollection;
use realtime::{Error, Result, invalid_input};
use stops::{Coordinate, nearest};

use crate::cache::{self, Key};
use crate::features::stop_feature;
use crate::provider::Provider;
use crate::service::NextBus;

impl<P: Provider> NextBus<P> {
    /// The stops closest to (`lat`, `lng`), nearest first.
    ///
    /// `limit` defaults to the configured count and is capped at the
    /// configured maximum. A negative count returns no stops.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when the coordinates are not a valid
    /// position or the count is not an integer.
    pub async fn nearby(&self, lat: &str, lng: &str, limit: Option<&str>) -> Result<FeatureCollection> {
        let origin = Coordinate::parse(lat, lng)?;
        let requested = limit
            .map(|value| {
                value.trim().parse::<i64>().map_err(|err| invalid_input!("invalid result count {}: {}", value, err))
            })
            .transpose()?;
        let limit = self.settings.nearest_limit(requested);
        let key = Key::Nearby { lat: origin.lat, lng: origin.lng, limit };

        cache::get_or_compute(&self.provider, &key, None, || async {
            let stops = self.provider.database().stops.values();
            let features = nearest(stops, origin, limit)
                .into_iter()
                .map(|ranked| {
                    let stop = ranked.stop;
                    stop_feature(&stop.id, &stop.name, stop.location, Some(ranked.miles))
                })
                .collect();
            Ok::<_, Error>(FeatureCollection { bbox: None, features, foreign_members: None })
        })
        .await
    }
}
