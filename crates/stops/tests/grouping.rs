#![allow(missing_docs)]

use pretty_assertions::assert_eq;
use stops::{
    Coordinate, LogicalStop, StopDatabase, StopRecord, Unit, distance, group, member_ids, nearest,
};

fn record(id: &str, lat: f64, lng: f64, name: &str) -> StopRecord {
    StopRecord { id: id.to_string(), location: Coordinate { lat, lng }, name: name.to_string() }
}

fn single(id: &str, lat: f64, lng: f64) -> LogicalStop {
    LogicalStop::from_members(&[record(id, lat, lng, id)]).expect("one member")
}

#[test]
fn single_member_keeps_identity() {
    let stops = group(vec![record("4407", 40.4443, -79.9436, "Forbes Ave at Morewood Ave")]);

    assert_eq!(stops.len(), 1);
    let stop = &stops["4407"];
    assert_eq!(stop.id, "4407");
    assert_eq!(stop.location, Coordinate { lat: 40.4443, lng: -79.9436 });
    assert_eq!(stop.name, "Forbes + Morewood");
    assert_eq!(stop.members, vec!["4407"]);
    assert!(!stop.is_composite());
}

#[test]
fn opposite_directions_merge() {
    let stops = group(vec![
        record("4407", 40.0, -80.0, "Forbes Ave at Morewood Ave"),
        record("8190", 41.0, -79.0, "Forbes Ave opp Morewood Ave FS"),
        record("2631", 40.5, -79.5, "Fifth Ave at Craig St"),
    ]);

    assert_eq!(stops.len(), 2);
    let merged = &stops["multi:4407,8190"];
    assert_eq!(merged.location, Coordinate { lat: 40.5, lng: -79.5 });
    assert_eq!(merged.name, "Forbes + Morewood");
    assert!(merged.is_composite());
    for id in ["4407", "8190"] {
        assert!(merged.id.contains(id));
    }
    assert_eq!(member_ids(&merged.id), vec!["4407", "8190"]);
    assert!(stops.contains_key("2631"));
}

#[test]
fn same_name_far_apart_still_merges() {
    let stops = group(vec![
        record("1", 40.0, -80.0, "Main St at Center Ave"),
        record("2", 41.0, -78.0, "Main St opp Center Ave"),
    ]);
    assert_eq!(stops.len(), 1);
    assert!(stops.contains_key("multi:1,2"));
}

#[test]
fn distance_properties() {
    let a = Coordinate { lat: 40.4406, lng: -79.9959 };
    let b = Coordinate { lat: 40.4443, lng: -79.9436 };

    assert!((distance(a, b, Unit::Miles) - distance(b, a, Unit::Miles)).abs() < 1e-12);
    assert!(distance(a, a, Unit::Miles).abs() < f64::EPSILON);
    assert!(distance(a, b, Unit::Kilometers) > distance(a, b, Unit::Miles));
}

#[test]
fn nearest_two_of_three() {
    let stops = [single("A", 0.0, 0.0), single("B", 0.0, 1.0), single("C", 0.0, 10.0)];
    let origin = Coordinate { lat: 0.0, lng: 0.0 };

    let ranked = nearest(&stops, origin, 2);
    let ids: Vec<_> = ranked.iter().map(|r| r.stop.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);
    assert!(ranked[0].miles.abs() < f64::EPSILON);
    // one degree of longitude at the equator
    assert!((ranked[1].miles - 69.093).abs() < 0.001);
}

#[test]
fn nearest_is_sorted_and_bounded() {
    let stops: Vec<_> = (0..20_u32)
        .map(|i| single(&i.to_string(), 40.0 + f64::from(i % 7) * 0.01, -80.0 + f64::from(i) * 0.003))
        .collect();
    let origin = Coordinate { lat: 40.03, lng: -79.97 };

    for limit in [1, 5, 20, 50] {
        let ranked = nearest(&stops, origin, limit);
        assert_eq!(ranked.len(), limit.min(stops.len()));
        assert!(ranked.windows(2).all(|w| w[0].miles <= w[1].miles));
    }
}

#[test]
fn nearest_zero_limit() {
    let stops = [single("A", 0.0, 0.0)];
    assert!(nearest(&stops, Coordinate { lat: 0.0, lng: 0.0 }, 0).is_empty());
}

#[test]
fn database_round_trip_through_file() {
    let mut db = StopDatabase::default();
    db.stops = group(vec![
        record("4407", 40.0, -80.0, "Forbes Ave at Morewood Ave"),
        record("8190", 41.0, -79.0, "Forbes Ave opp Morewood Ave FS"),
    ]);

    let path = std::env::temp_dir().join(format!("stopdb-{}.json", std::process::id()));
    db.save(&path).expect("should save");
    let loaded = StopDatabase::load(&path).expect("should load");
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.stops, db.stops);
    assert_eq!(loaded.checksum().expect("checksum"), db.checksum().expect("checksum"));
    assert_eq!(loaded.search("forbes")[0].stop_id, "multi:4407,8190");
}
