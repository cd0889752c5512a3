//! Transit records returned by [`crate::Transit`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stops::{Coordinate, StopRecord};

/// A tracked route and the stops it serves in each direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub id: String,
    pub name: String,

    /// Route colour as `#rrggbb`.
    pub color: String,
    pub inbound: Vec<StopRecord>,
    pub outbound: Vec<StopRecord>,
}

/// An upstream arrival prediction for one vehicle at one stop.
///
/// The predicted time is absolute so a cached prediction can be re-expressed
/// relative to any later "now".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub route: String,
    pub destination: String,

    /// Direction of travel, as published (e.g. `INBOUND`).
    pub direction: String,
    pub stop_id: String,
    pub vehicle_id: String,

    /// Distance from the vehicle to the stop along the route, in feet.
    pub feet_to_stop: u32,
    pub arrives_at: DateTime<Utc>,

    /// `true` for an arrival prediction, `false` for a departure.
    pub is_arrival: bool,
}

/// Latest reported state of a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub vehicle_id: String,
    pub location: Coordinate,

    /// Heading in degrees, 0 is north.
    pub heading: u16,

    /// Speed in miles per hour.
    pub speed: u16,
    pub pattern_id: String,
    pub route: String,
    pub destination: String,
    pub updated_at: DateTime<Utc>,

    /// Name of the next stop served, when known.
    #[serde(default)]
    pub next_stop: Option<String>,
}

/// The path a route variant travels, in sequence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub pid: String,
    pub direction: String,
    pub points: Vec<Coordinate>,
}
