//! GeoJSON features for stops and vehicles, styled for the map markers.

use bustime::{TIME_ZONE, VehicleRecord};
use chrono::{DateTime, Utc};
use geojson::{Feature, Geometry, JsonObject, Value};
use serde_json::json;
use stops::Coordinate;

/// Marker colour for stops and for vehicles on unknown routes.
pub const DEFAULT_MARKER: &str = "#fa0";

/// Marker colour for vehicles without location data.
pub const UNAVAILABLE_MARKER: &str = "#aaa";

fn point(location: Coordinate) -> Geometry {
    // GeoJSON positions are longitude first
    Geometry::new(Value::Point(vec![location.lng, location.lat]))
}

fn marker(properties: &mut JsonObject, color: &str) {
    properties.insert("marker-size".to_string(), json!("medium"));
    properties.insert("marker-symbol".to_string(), json!("bus"));
    properties.insert("marker-color".to_string(), json!(color));
}

fn feature(location: Coordinate, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(point(location)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// A stop marker. `miles` is included for distance ranked results.
pub fn stop_feature(stop_id: &str, name: &str, location: Coordinate, miles: Option<f64>) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("stopId".to_string(), json!(stop_id));
    properties.insert("name".to_string(), json!(name));
    if let Some(miles) = miles {
        properties.insert("miToStop".to_string(), json!(miles));
    }
    marker(&mut properties, DEFAULT_MARKER);
    feature(location, properties)
}

/// Short `#rgb` marker colour from a `#rrggbb` route colour, taking the high
/// digit of each channel.
pub fn vehicle_marker(route_color: Option<&str>) -> String {
    let Some(color) = route_color else {
        return DEFAULT_MARKER.to_string();
    };
    let digits: String = color.chars().skip(1).step_by(2).take(3).collect();
    if digits.len() == 3 { format!("#{digits}") } else { DEFAULT_MARKER.to_string() }
}

/// A vehicle marker with its latest reported state.
pub fn vehicle_feature(vehicle: &VehicleRecord, route_color: Option<&str>) -> Feature {
    let local = vehicle.updated_at.with_timezone(&TIME_ZONE);

    let mut properties = JsonObject::new();
    properties.insert("vid".to_string(), json!(vehicle.vehicle_id));
    properties.insert("speed".to_string(), json!(vehicle.speed));
    properties.insert("heading".to_string(), json!(vehicle.heading));
    properties.insert("pattern".to_string(), json!(vehicle.pattern_id));
    properties.insert("destination".to_string(), json!(vehicle.destination));
    properties.insert("route".to_string(), json!(vehicle.route));
    properties.insert("lastupdated".to_string(), json!(local.format("%Y-%m-%d %H:%M:%S").to_string()));
    properties.insert("u_lastupdated".to_string(), json!(vehicle.updated_at.timestamp().to_string()));
    properties.insert("next_stop".to_string(), json!(vehicle.next_stop));
    marker(&mut properties, &vehicle_marker(route_color));
    feature(vehicle.location, properties)
}

/// A grey marker at (0, 0) standing in for a vehicle whose position cannot be
/// shown.
pub fn placeholder_feature(title: &str, now: DateTime<Utc>) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("u_lastupdated".to_string(), json!(now.timestamp().to_string()));
    properties.insert("title".to_string(), json!(title));
    marker(&mut properties, UNAVAILABLE_MARKER);
    feature(Coordinate { lat: 0.0, lng: 0.0 }, properties)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_from_route_colour() {
        assert_eq!(vehicle_marker(Some("#cc3399")), "#c39");
        assert_eq!(vehicle_marker(Some("#12")), DEFAULT_MARKER);
        assert_eq!(vehicle_marker(None), DEFAULT_MARKER);
    }

    #[test]
    fn stop_coordinates_lng_first() {
        let feature = stop_feature("1", "Forbes + Morewood", Coordinate { lat: 40.4, lng: -79.9 }, None);
        let json = serde_json::to_value(&feature).unwrap();

        assert_eq!(json["geometry"]["coordinates"], json!([-79.9, 40.4]));
        assert_eq!(json["properties"]["marker-color"], "#fa0");
        assert!(json["properties"].get("miToStop").is_none());
    }
}
