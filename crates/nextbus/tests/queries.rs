//! Service queries against a scripted upstream.


use std::sync::Arc;
use std::time::Duration;

use geojson::Value;
use nextbus::{NextBus, QuotaBreaker, Settings, Status};
use pretty_assertions::assert_eq;
use realtime::Error;
use serde_json::json;
use stops::{Coordinate, SearchHit};

use crate::provider::{MockProvider, logical, prediction, quota, unavailable, vehicle};

fn service(provider: MockProvider) -> NextBus<MockProvider> {
    NextBus::new(provider, Arc::new(QuotaBreaker::new()), Settings::default())
}

fn etas(reply: &nextbus::PredictionReply) -> Vec<Option<i64>> {
    reply.predictions.iter().map(|p| p.eta).collect()
}

#[tokio::test]
async fn single_stop_predictions() {
    let mut provider = MockProvider::new();
    provider.predictions.insert(
        "4407".to_string(),
        Ok(vec![prediction("4407", "5613", 12), prediction("4407", "5620", 3)]),
    );
    let service = service(provider);

    let reply = service.stop_predictions("4407").await.expect("should predict");

    assert_eq!(etas(&reply), vec![Some(3), Some(12)]);
    assert_eq!(reply.vids, "5620-5613");
    let info = reply.stop_info.expect("single stop has info");
    assert_eq!(info.name, "Forbes Ave at Morewood Ave");
    assert_eq!(info.loc, Coordinate { lat: 40.4443, lng: -79.9436 });
}

#[tokio::test]
async fn composite_stop_merges_members() {
    let mut provider = MockProvider::new();
    provider.predictions.insert(
        "4407".to_string(),
        Ok(vec![prediction("4407", "a", 5), prediction("4407", "b", 20)]),
    );
    provider.predictions.insert("8190".to_string(), Ok(vec![prediction("8190", "c", 1)]));
    let service = service(provider);

    let reply = service.stop_predictions("multi:4407,8190").await.expect("should predict");

    assert_eq!(etas(&reply), vec![Some(1), Some(5), Some(20)]);
    assert_eq!(reply.vids, "c-a-b");
    assert!(reply.stop_info.is_none());
    assert_eq!(service.provider().calls(), 2);
}

#[tokio::test]
async fn predictions_reused_within_window() {
    let mut provider = MockProvider::new();
    provider.predictions.insert("4407".to_string(), Ok(vec![prediction("4407", "5613", 7)]));
    let service = service(provider);

    let first = service.stop_predictions("4407").await.expect("should predict");
    let second = service.stop_predictions("4407").await.expect("should predict");

    assert_eq!(first, second);
    assert_eq!(service.provider().calls(), 1);
}

#[tokio::test]
async fn unknown_stop_rejected() {
    let service = service(MockProvider::new());

    let Err(err) = service.stop_predictions("0000").await else {
        panic!("unknown stop should be rejected");
    };
    assert!(matches!(err, Error::InvalidInput(_)));

    let Err(err) = service.stop_predictions("multi:").await else {
        panic!("empty composite should be rejected");
    };
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(service.provider().calls(), 0);
}

#[tokio::test]
async fn upstream_failure_gives_empty_predictions() {
    let mut provider = MockProvider::new();
    provider.predictions.insert("4407".to_string(), Err(unavailable()));
    let service = service(provider);

    let reply = service.stop_predictions("4407").await.expect("should reply");

    assert!(reply.predictions.is_empty());
    assert_eq!(reply.vids, "");
    assert!(reply.stop_info.is_some());
    assert!(!service.status().disabled);
}

#[tokio::test]
async fn quota_disables_upstream_until_reset() {
    let mut provider = MockProvider::new();
    provider.predictions.insert("4407".to_string(), Err(quota()));
    provider.predictions.insert("2631".to_string(), Ok(vec![prediction("2631", "5613", 4)]));
    let service = service(provider);

    let reply = service.stop_predictions("4407").await.expect("should reply");
    assert_eq!(reply.vids, "9999");
    assert_eq!(reply.predictions[0].eta, None);
    assert_eq!(service.status(), Status { disabled: true });
    assert_eq!(service.provider().calls(), 1);

    // no upstream calls while disabled, even for other stops
    let reply = service.stop_predictions("2631").await.expect("should reply");
    assert_eq!(reply.vids, "9999");
    assert!(reply.stop_info.is_some());
    assert_eq!(service.provider().calls(), 1);

    service.reset();
    let reply = service.stop_predictions("2631").await.expect("should reply");
    assert_eq!(etas(&reply), vec![Some(4)]);
    assert_eq!(service.provider().calls(), 2);
}

#[tokio::test]
async fn operator_toggle() {
    let service = service(MockProvider::new());

    assert_eq!(service.status(), Status { disabled: false });
    assert_eq!(service.toggle_disabled(), Status { disabled: true });
    assert_eq!(service.status(), Status { disabled: true });
    assert_eq!(service.toggle_disabled(), Status { disabled: false });
}

#[tokio::test]
async fn nearby_nearest_first() {
    let service = service(MockProvider::new());

    let collection = service.nearby("40.4446", "-79.9489", Some("1")).await.expect("should rank");

    assert_eq!(collection.features.len(), 1);
    let feature = &collection.features[0];
    assert_eq!(feature.property("stopId"), Some(&json!("2631")));
    assert_eq!(feature.property("marker-color"), Some(&json!("#fa0")));
    let miles = feature.property("miToStop").and_then(serde_json::Value::as_f64).expect("has distance");
    assert!(miles < 0.01);

    let all = service.nearby("40.4446", "-79.9489", None).await.expect("should rank");
    assert_eq!(all.features.len(), 2);
}

#[tokio::test]
async fn nearby_rejects_bad_coordinates() {
    let service = service(MockProvider::new());

    for (lat, lng) in [("north", "-79.9"), ("40.4", ""), ("91.0", "-79.9"), ("40.4", "-181")] {
        let Err(err) = service.nearby(lat, lng, None).await else {
            panic!("{lat},{lng} should be rejected");
        };
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}

#[tokio::test]
async fn nearby_result_count() {
    let service = service(MockProvider::new());

    let none = service.nearby("40.4446", "-79.9489", Some("-1")).await.expect("negative count is empty");
    assert!(none.features.is_empty());

    let capped = service.nearby("40.4446", "-79.9489", Some(" 500 ")).await.expect("should rank");
    assert_eq!(capped.features.len(), 2);

    for count in ["abc", "1.5", ""] {
        let Err(err) = service.nearby("40.4446", "-79.9489", Some(count)).await else {
            panic!("count {count:?} should be rejected");
        };
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}

#[tokio::test]
async fn find_groups_by_intersection() {
    let mut provider = MockProvider::new();
    provider.hits = vec![
        SearchHit {
            name: "Forbes Ave at Morewood Ave".to_string(),
            location: Coordinate { lat: 40.0, lng: -80.0 },
            stop_id: "4407".to_string(),
        },
        SearchHit {
            name: "Forbes Ave opp Morewood Ave FS".to_string(),
            location: Coordinate { lat: 42.0, lng: -78.0 },
            stop_id: "8190".to_string(),
        },
        SearchHit {
            name: "Fifth Ave at Craig St".to_string(),
            location: Coordinate { lat: 40.4446, lng: -79.9490 },
            stop_id: "2631".to_string(),
        },
    ];
    let service = service(provider);

    let collection = service.find("forbes").await.expect("should search");

    assert_eq!(collection.features.len(), 2);
    let merged = collection
        .features
        .iter()
        .find(|f| f.property("stopId") == Some(&json!("multi:4407,8190")))
        .expect("merged feature");
    let Some(Value::Point(position)) = merged.geometry.as_ref().map(|g| g.value.clone()) else {
        panic!("merged feature should be a point");
    };
    assert_eq!(position, vec![-79.0, 41.0]);
}

#[tokio::test]
async fn short_query_not_searched() {
    let service = service(MockProvider::new());

    let collection = service.find(" fo ").await.expect("should reply");

    assert!(collection.features.is_empty());
    assert_eq!(service.provider().searches.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn vehicles_on_routes() {
    let mut provider = MockProvider::new();
    provider.route_vehicles.insert("61C".to_string(), Ok(vec![vehicle("5613", "61C")]));
    provider.route_vehicles.insert("P1".to_string(), Err(unavailable()));
    let service = service(provider);

    let collection = service.vehicles_on_route("61C,P1").await.expect("should list");

    assert_eq!(collection.features.len(), 1);
    let feature = &collection.features[0];
    assert_eq!(feature.property("vid"), Some(&json!("5613")));
    assert_eq!(feature.property("marker-color"), Some(&json!("#c39")));
    assert_eq!(feature.property("next_stop"), Some(&json!("Forbes Ave at Craig St")));

    let members = collection.foreign_members.expect("has status members");
    assert_eq!(members["inactive"], json!(["P1"]));
    assert_eq!(members["disabled"], json!(false));
}

#[tokio::test]
async fn unknown_route_not_found() {
    let service = service(MockProvider::new());

    let Err(err) = service.vehicles_on_route("61C,999").await else {
        panic!("unknown route should not be found");
    };
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(service.provider().calls(), 0);
}

#[tokio::test]
async fn route_without_vehicles() {
    let mut provider = MockProvider::new();
    provider.route_vehicles.insert("61C".to_string(), Ok(vec![]));
    let service = service(provider);

    let Err(err) = service.vehicles_on_route("61C").await else {
        panic!("route without vehicles should not be found");
    };
    assert_eq!(err, Error::NotFound("This route has no busses.".to_string()));
}

#[tokio::test]
async fn on_route_while_disabled() {
    let service = service(MockProvider::new());
    service.toggle_disabled();

    let collection = service.vehicles_on_route("P1").await.expect("should reply");

    assert!(collection.features.is_empty());
    let members = collection.foreign_members.expect("has status members");
    assert_eq!(members["inactive"], json!(["P1"]));
    assert_eq!(members["disabled"], json!(true));
    assert_eq!(service.provider().calls(), 0);
}

#[tokio::test]
async fn vehicle_position() {
    let mut provider = MockProvider::new();
    provider.vehicles.insert("5613".to_string(), Ok(vehicle("5613", "61C")));
    let service = service(provider);

    let feature = service.vehicle("5613").await.expect("should locate");

    assert_eq!(feature.property("route"), Some(&json!("61C")));
    assert_eq!(feature.property("speed"), Some(&json!(25)));
    assert_eq!(feature.property("u_lastupdated"), Some(&json!("1705325400")));
    assert_eq!(feature.property("lastupdated"), Some(&json!("2024-01-15 08:30:00")));
}

#[tokio::test]
async fn vehicle_placeholders() {
    let mut provider = MockProvider::new();
    provider.vehicles.insert("9000".to_string(), Err(quota()));
    let service = service(provider);

    let feature = service.vehicle("5613").await.expect("should reply");
    assert_eq!(feature.property("title"), Some(&json!("Location data temporarily unavailable.")));
    assert_eq!(feature.property("marker-color"), Some(&json!("#aaa")));

    let feature = service.vehicle("9000").await.expect("should reply");
    assert_eq!(feature.property("title"), Some(&json!("API over limit.")));
    assert!(service.status().disabled);
}

#[tokio::test]
async fn patterns_from_database() {
    let mut provider = MockProvider::new();
    let path = geojson::Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(Value::LineString(vec![vec![-79.9, 40.4], vec![-79.8, 40.5]]))),
        id: None,
        properties: None,
        foreign_members: None,
    };
    provider.database.patterns.insert("1406".to_string(), path.clone());
    let service = service(provider);

    assert_eq!(service.pattern("1406").await.expect("should find"), path);

    let Err(err) = service.pattern("0").await else {
        panic!("unknown pattern should not be found");
    };
    assert_eq!(err, Error::NotFound("Pattern not found.".to_string()));
}

#[tokio::test]
async fn stop_database_export() {
    let mut provider = MockProvider::new();
    let composite = logical("8190", "Forbes Ave opp Morewood Ave FS", 40.4446, -79.9431);
    provider.database.stops.insert(composite.id.clone(), composite);
    let service = service(provider);

    let routes = service.available_routes().await.expect("should list");
    assert_eq!(
        routes.available,
        vec![
            ("61C".to_string(), "McKeesport - Homestead".to_string()),
            ("P1".to_string(), "East Busway".to_string()),
        ]
    );

    let checksum = service.stops_checksum().await.expect("should digest");
    let export = service.stop_export().await.expect("should export");
    assert_eq!(export.checksum, checksum.checksum);
    assert_eq!(export.checksum.len(), 16);
    assert_eq!(export.stops.len(), 3);
}

#[tokio::test]
async fn stalled_upstream_times_out() {
    let mut provider = MockProvider::new();
    provider.stalled.insert("4407".to_string());
    let settings = Settings { upstream_timeout: Duration::from_millis(1), ..Settings::default() };
    let service = NextBus::new(provider, Arc::new(QuotaBreaker::new()), settings);

    let reply = service.stop_predictions("4407").await.expect("timeout degrades to no predictions");

    assert!(reply.predictions.is_empty());
    assert!(reply.stop_info.is_some());
    assert!(!service.status().disabled);
    assert_eq!(service.provider().calls(), 1);
}

#[tokio::test]
async fn concurrent_requests_agree() {
    let mut provider = MockProvider::new();
    provider.predictions.insert(
        "4407".to_string(),
        Ok(vec![prediction("4407", "5613", 12), prediction("4407", "5620", 3)]),
    );
    let service = service(provider);

    let replies = futures::future::join_all((0..4).map(|_| service.stop_predictions("4407"))).await;
    let replies: Vec<_> = replies.into_iter().map(|reply| reply.expect("should predict")).collect();

    assert!(replies.iter().all(|reply| *reply == replies[0]));
    assert_eq!(etas(&replies[0]), vec![Some(3), Some(12)]);
    let calls = service.provider().calls();
    assert!((1..=4).contains(&calls), "{calls} upstream calls");
}
