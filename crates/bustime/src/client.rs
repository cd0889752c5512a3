//! # BusTime client
//!
//! Calls the BusTime XML API through the host's [`HttpRequest`] provider. The
//! base URL and API key are read from [`Config`] on every call.

use anyhow::Context;
use bytes::Bytes;
use http::{Method, Request, StatusCode};
use realtime::{Config, HttpRequest, Result, unavailable};
use stops::StopRecord;
use tracing::{debug, info, warn};

use crate::model::{Pattern, Prediction, RouteRecord, VehicleRecord};
use crate::wire::BusTimeResponse;

/// Config key for the API base URL, e.g.
/// `http://realtime.portauthority.org/bustime/api/v1`.
pub const BUSTIME_URL: &str = "BUSTIME_URL";

/// Config key for the developer API key.
pub const BUSTIME_KEY: &str = "BUSTIME_KEY";

/// BusTime API client borrowing the host provider.
#[derive(Debug)]
pub struct BusTime<'a, P> {
    provider: &'a P,
}

impl<'a, P: HttpRequest + Config> BusTime<'a, P> {
    #[must_use]
    pub const fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Every tracked route with its stops. Routes whose stops cannot be loaded
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error when the route list cannot be fetched or the quota is
    /// exhausted part way through.
    pub async fn routes(&self) -> Result<Vec<RouteRecord>> {
        let listed = self.call("getroutes", &[]).await?.routes;

        let mut routes = Vec::with_capacity(listed.len());
        for route in listed {
            match self.route_stops(&route.rt).await {
                Ok((inbound, outbound)) => routes.push(RouteRecord {
                    id: route.rt,
                    name: route.rtnm,
                    color: route.rtclr,
                    inbound,
                    outbound,
                }),
                Err(err) if err.is_quota_exceeded() => return Err(err),
                Err(err) => {
                    warn!(route_id = %route.rt, error = %err, "skipping route without stops");
                }
            }
        }

        Ok(routes)
    }

    async fn route_stops(&self, route_id: &str) -> Result<(Vec<StopRecord>, Vec<StopRecord>)> {
        let directions = self.call("getdirections", &[("rt", route_id)]).await?.directions;

        let mut inbound = vec![];
        let mut outbound = vec![];
        for direction in directions {
            let stops = self.call("getstops", &[("rt", route_id), ("dir", &direction)]).await?.stops;
            let records = stops.into_iter().map(StopRecord::from);
            if direction.to_uppercase().contains("INBOUND") {
                inbound.extend(records);
            } else {
                outbound.extend(records);
            }
        }

        Ok((inbound, outbound))
    }

    /// # Errors
    ///
    /// Returns an error when the call fails or a prediction is malformed.
    pub async fn predictions(&self, stop_id: &str) -> Result<Vec<Prediction>> {
        let response = self.call("getpredictions", &[("stpid", stop_id)]).await?;
        response.predictions.into_iter().map(Prediction::try_from).collect()
    }

    /// Position of a single vehicle. The next stop is taken from the
    /// vehicle's first prediction and left empty when none is available.
    ///
    /// # Errors
    ///
    /// Returns an error when the vehicle is not reporting.
    pub async fn vehicle(&self, vehicle_id: &str) -> Result<VehicleRecord> {
        let response = self.call("getvehicles", &[("vid", vehicle_id)]).await?;
        let Some(vehicle) = response.vehicles.into_iter().next() else {
            return Err(unavailable!("no position for vehicle {}", vehicle_id));
        };

        let mut record = VehicleRecord::try_from(vehicle)?;
        record.next_stop = self.next_stop(vehicle_id).await?;
        Ok(record)
    }

    async fn next_stop(&self, vehicle_id: &str) -> Result<Option<String>> {
        match self.call("getpredictions", &[("vid", vehicle_id)]).await {
            Ok(response) => Ok(response.predictions.into_iter().next().map(|prd| prd.stpnm)),
            Err(err) if err.is_quota_exceeded() => Err(err),
            Err(err) => {
                debug!(vehicle_id, error = %err, "next stop unavailable");
                Ok(None)
            }
        }
    }

    /// Vehicles reporting on a route. A malformed vehicle is logged and left
    /// out; the rest of the route is still returned.
    ///
    /// # Errors
    ///
    /// Returns an error when the route has no vehicles reporting.
    pub async fn vehicles_on_route(&self, route_id: &str) -> Result<Vec<VehicleRecord>> {
        let response = self.call("getvehicles", &[("rt", route_id)]).await?;
        let vehicles = response
            .vehicles
            .into_iter()
            .filter_map(|vehicle| {
                let vehicle_id = vehicle.vid.clone();
                VehicleRecord::try_from(vehicle)
                    .inspect_err(|err| {
                        warn!(route_id, vehicle_id = %vehicle_id, error = %err, "dropping malformed vehicle");
                    })
                    .ok()
            })
            .collect();
        Ok(vehicles)
    }

    /// # Errors
    ///
    /// Returns an error when the call fails.
    pub async fn patterns(&self, route_id: &str) -> Result<Vec<Pattern>> {
        let response = self.call("getpatterns", &[("rt", route_id)]).await?;
        Ok(response.patterns.into_iter().map(Pattern::from).collect())
    }

    async fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<BusTimeResponse> {
        let base = self.provider.get(BUSTIME_URL).await.context("getting BUSTIME_URL")?;
        let key = self.provider.get(BUSTIME_KEY).await.context("getting BUSTIME_KEY")?;

        let query = std::iter::once(("key", key.as_str()))
            .chain(params.iter().copied())
            .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        let uri = format!("{}/{method}?{query}", base.trim_end_matches('/'));

        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Bytes::new())
            .context("building bustime request")?;

        info!(monotonic_counter.bustime_requests = 1, method);
        let response = self
            .provider
            .fetch(request)
            .await
            .map_err(|err| unavailable!("bustime {}: {}", method, err))?;

        if response.status() != StatusCode::OK {
            return Err(unavailable!("bustime {} returned {}", method, response.status()));
        }

        BusTimeResponse::try_from(response.body().as_ref())?.check()
    }
}
