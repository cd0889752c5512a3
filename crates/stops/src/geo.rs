//! # Distance and ranking
//!
//! Great-circle distances use the haversine formula over a spherical earth.

use std::cmp::Ordering;

use realtime::{Result, invalid_input};
use serde::{Deserialize, Serialize};

use crate::group::LogicalStop;

/// Mean earth radius, kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Miles per kilometer.
pub const MILES_PER_KM: f64 = 0.621_371_192;

const INVALID_COORDINATE: &str = "Invalid lat/lng pair.";

/// A WGS84 position. Serialized as a `[lat, lng]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting non-finite or out of range values.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when either value is out of range.
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
            return Err(invalid_input!("{}", INVALID_COORDINATE));
        }
        Ok(Self { lat, lng })
    }

    /// Parse a coordinate from request path segments.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when either value is not a number or is
    /// out of range.
    pub fn parse(lat: &str, lng: &str) -> Result<Self> {
        let (Ok(lat), Ok(lng)) = (lat.trim().parse::<f64>(), lng.trim().parse::<f64>()) else {
            return Err(invalid_input!("{}", INVALID_COORDINATE));
        };
        Self::new(lat, lng)
    }

    /// Coordinate-wise arithmetic mean. `None` for an empty input.
    pub fn mean(points: impl IntoIterator<Item = Self>) -> Option<Self> {
        let (count, lat, lng) = points
            .into_iter()
            .fold((0_u32, 0.0, 0.0), |(n, lat, lng), p| (n + 1, lat + p.lat, lng + p.lng));
        if count == 0 {
            return None;
        }
        let n = f64::from(count);
        Some(Self { lat: lat / n, lng: lng / n })
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(c: Coordinate) -> Self {
        (c.lat, c.lng)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Unit {
    #[default]
    Miles,
    Kilometers,
}

/// Haversine distance between two coordinates.
#[must_use]
pub fn distance(a: Coordinate, b: Coordinate, unit: Unit) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    let km = EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    match unit {
        Unit::Kilometers => km,
        Unit::Miles => km * MILES_PER_KM,
    }
}

/// A stop paired with its distance from the query origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<'a> {
    pub stop: &'a LogicalStop,

    /// Miles from the origin, rounded to 3 decimal places.
    pub miles: f64,
}

/// The `limit` stops closest to `origin`, nearest first.
#[must_use]
pub fn nearest<'a>(
    stops: impl IntoIterator<Item = &'a LogicalStop>, origin: Coordinate, limit: usize,
) -> Vec<Ranked<'a>> {
    if limit == 0 {
        return vec![];
    }

    let mut ranked: Vec<(&LogicalStop, f64)> =
        stops.into_iter().map(|s| (s, distance(s.location, origin, Unit::Miles))).collect();
    ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    ranked.truncate(limit);

    ranked.into_iter().map(|(stop, miles)| Ranked { stop, miles: round_to(miles, 3) }).collect()
}

/// Round `value` to `places` decimal places.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}
