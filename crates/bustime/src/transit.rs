use realtime::Result;

use crate::model::{Pattern, Prediction, RouteRecord, VehicleRecord};

/// Upstream transit data source.
///
/// Every method may fail with `Error::QuotaExceeded` once the daily request
/// allowance is used up, or `Error::UpstreamUnavailable` for any other
/// upstream failure.
pub trait Transit: Send + Sync {
    /// All tracked routes with their inbound and outbound stops.
    fn fetch_routes(&self) -> impl Future<Output = Result<Vec<RouteRecord>>> + Send;

    /// Arrival predictions for a single upstream stop.
    fn fetch_predictions(
        &self, stop_id: &str,
    ) -> impl Future<Output = Result<Vec<Prediction>>> + Send;

    /// Latest position of one vehicle, including the next stop it will serve.
    fn fetch_vehicle(&self, vehicle_id: &str) -> impl Future<Output = Result<VehicleRecord>> + Send;

    /// Latest positions of every vehicle on a route.
    fn fetch_vehicles_on_route(
        &self, route_id: &str,
    ) -> impl Future<Output = Result<Vec<VehicleRecord>>> + Send;

    /// Geometry of every pattern (path variant) of a route.
    fn fetch_patterns(&self, route_id: &str) -> impl Future<Output = Result<Vec<Pattern>>> + Send;
}
