//! # Stop database generation
//!
//! Builds the stop database from the upstream route list: every route with its
//! stops, the stops grouped into logical stops, and each route pattern as a
//! coloured path feature.

use bustime::{Pattern, RouteRecord, Transit};
use geojson::{Feature, Geometry, JsonObject, Value};
use realtime::Result;
use serde_json::json;
use stops::{RouteSummary, StopDatabase, group};
use tracing::{info, warn};

/// Fetch everything the database holds.
///
/// Routes whose patterns cannot be loaded are logged and kept without paths.
///
/// # Errors
///
/// Returns an error when the route list cannot be fetched or the upstream
/// quota runs out.
pub async fn build(transit: &impl Transit) -> Result<StopDatabase> {
    let routes = transit.fetch_routes().await?;
    info!(routes = routes.len(), "fetched routes");

    let mut database = StopDatabase::default();
    for route in &routes {
        match transit.fetch_patterns(&route.id).await {
            Ok(patterns) => {
                for pattern in &patterns {
                    database.patterns.insert(pattern.pid.clone(), pattern_feature(pattern, &route.color));
                }
            }
            Err(err) if err.is_quota_exceeded() => return Err(err),
            Err(err) => warn!(route_id = %route.id, error = %err, "skipping route patterns"),
        }
    }

    database.stops = group(routes.iter().flat_map(stop_records));
    database.routes = routes
        .into_iter()
        .map(|route| {
            let summary = RouteSummary { id: route.id, name: route.name, color: route.color };
            (summary.id.clone(), summary)
        })
        .collect();

    info!(
        routes = database.routes.len(),
        stops = database.stops.len(),
        patterns = database.patterns.len(),
        "built stop database"
    );
    Ok(database)
}

fn stop_records(route: &RouteRecord) -> impl Iterator<Item = stops::StopRecord> + '_ {
    route.inbound.iter().chain(&route.outbound).cloned()
}

/// A pattern's path as a line feature in its route's colour.
#[must_use]
pub fn pattern_feature(pattern: &Pattern, color: &str) -> Feature {
    let line = pattern.points.iter().map(|point| vec![point.lng, point.lat]).collect();

    let mut properties = JsonObject::new();
    properties.insert("pid".to_string(), json!(pattern.pid));
    properties.insert("direction".to_string(), json!(pattern.direction));
    properties.insert("color".to_string(), json!(color));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(line))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
