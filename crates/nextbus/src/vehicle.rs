//! # Vehicle positions

use geojson::{Feature, FeatureCollection, JsonObject};
use realtime::{Error, Result, not_found};
use serde_json::json;
use tracing::{info, warn};

use crate::cache::{self, Key};
use crate::features::{placeholder_feature, vehicle_feature};
use crate::provider::Provider;
use crate::service::NextBus;

const ROUTE_UNAVAILABLE: &str = "This route is not available or does not exist.";
const NO_VEHICLES: &str = "This route has no busses.";
const LOCATION_UNAVAILABLE: &str = "Location data temporarily unavailable.";
const OVER_LIMIT: &str = "API over limit.";

impl<P: Provider> NextBus<P> {
    /// Every vehicle on the comma separated `routes`.
    ///
    /// Routes whose vehicles cannot be fetched are listed in the collection's
    /// `inactive` member. While upstream calls are disabled the collection is
    /// empty, every route is inactive and `disabled` is set.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when a route is unknown or no vehicle is
    /// found on any of the routes.
    pub async fn vehicles_on_route(&self, routes: &str) -> Result<FeatureCollection> {
        let route_ids: Vec<&str> =
            routes.split(',').map(str::trim).filter(|id| !id.is_empty()).collect();

        let database = self.provider.database();
        if route_ids.is_empty() || route_ids.iter().any(|id| database.route(id).is_none()) {
            return Err(not_found!("{}", ROUTE_UNAVAILABLE));
        }

        if self.breaker.is_disabled() {
            return Ok(on_route(vec![], &route_ids, true));
        }

        let mut features = vec![];
        let mut inactive = vec![];
        for route_id in &route_ids {
            let vehicles = match self.upstream("vehicles", self.provider.fetch_vehicles_on_route(route_id)).await {
                Ok(vehicles) => vehicles,
                Err(err) if err.is_quota_exceeded() => return Ok(on_route(vec![], &route_ids, true)),
                Err(err) => {
                    info!(route_id, error = %err, "no vehicles for route");
                    inactive.push(*route_id);
                    continue;
                }
            };

            let color = database.route(route_id).map(|route| route.color.as_str());
            for vehicle in vehicles {
                let key = Key::OnRouteBus(vehicle.vehicle_id.clone());
                let ttl = Some(self.settings.on_route_ttl);
                let feature = cache::get_or_compute(&self.provider, &key, ttl, || async {
                    Ok::<_, Error>(vehicle_feature(&vehicle, color))
                })
                .await?;
                features.push(feature);
            }
        }

        if features.is_empty() {
            return Err(not_found!("{}", NO_VEHICLES));
        }
        Ok(on_route(features, &inactive, false))
    }

    /// Position of a single vehicle.
    ///
    /// Falls back to a placeholder feature when the vehicle cannot be located
    /// or upstream calls are disabled.
    ///
    /// # Errors
    ///
    /// Returns an error only when the cache layer does.
    pub async fn vehicle(&self, vehicle_id: &str) -> Result<Feature> {
        if self.breaker.is_disabled() {
            return Ok(placeholder_feature(OVER_LIMIT, self.provider.now()));
        }

        let key = Key::Vehicle(vehicle_id.to_string());
        let ttl = Some(self.settings.vehicle_ttl);

        let result = cache::get_or_compute(&self.provider, &key, ttl, || async {
            match self.upstream("vehicle", self.provider.fetch_vehicle(vehicle_id)).await {
                Ok(vehicle) => {
                    let database = self.provider.database();
                    let color = database.route(&vehicle.route).map(|route| route.color.as_str());
                    Ok(vehicle_feature(&vehicle, color))
                }
                Err(err) if err.is_quota_exceeded() => Err(err),
                Err(err) => {
                    warn!(vehicle_id, error = %err, "vehicle unavailable");
                    Ok(placeholder_feature(LOCATION_UNAVAILABLE, self.provider.now()))
                }
            }
        })
        .await;

        match result {
            Err(err) if err.is_quota_exceeded() => Ok(placeholder_feature(OVER_LIMIT, self.provider.now())),
            result => result,
        }
    }
}

fn on_route(features: Vec<Feature>, inactive: &[&str], disabled: bool) -> FeatureCollection {
    let mut members = JsonObject::new();
    members.insert("inactive".to_string(), json!(inactive));
    members.insert("disabled".to_string(), json!(disabled));
    FeatureCollection { bbox: None, features, foreign_members: Some(members) }
}
