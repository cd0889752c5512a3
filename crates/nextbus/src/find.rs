use geojson::{Feature, FeatureCollection};
use realtime::{Error, Result};
use stops::{Coordinate, MULTI_PREFIX, SearchHit, member_ids, partition};

use crate::cache::{self, Key};
use crate::features::stop_feature;
use crate::provider::Provider;
use crate::service::NextBus;

impl<P: Provider> NextBus<P> {
    /// Stops whose names match `query`, one feature per intersection.
    ///
    /// Queries shorter than the configured minimum return an empty collection
    /// without searching.
    ///
    /// # Errors
    ///
    /// Returns the search collaborator's error.
    pub async fn find(&self, query: &str) -> Result<FeatureCollection> {
        let query = query.trim();
        if query.chars().count() < self.settings.min_search {
            return Ok(collection(vec![]));
        }

        let key = Key::Find(query.to_string());
        cache::get_or_compute(&self.provider, &key, None, || async {
            let hits = self.provider.search(query).await?;
            let features = partition(hits, |hit| hit.name.as_str())
                .into_values()
                .filter_map(|group| merge(&group))
                .collect();
            Ok::<_, Error>(collection(features))
        })
        .await
    }
}

const fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection { bbox: None, features, foreign_members: None }
}

// Hits sharing a name key become one feature at their mean location. A hit
// that is itself composite contributes its members.
fn merge(hits: &[SearchHit]) -> Option<Feature> {
    let first = hits.first()?;
    if hits.len() == 1 {
        return Some(stop_feature(&first.stop_id, &first.name, first.location, None));
    }

    let location = Coordinate::mean(hits.iter().map(|hit| hit.location))?;
    let ids: Vec<&str> = hits.iter().flat_map(|hit| member_ids(&hit.stop_id)).collect();
    let stop_id = format!("{MULTI_PREFIX}{}", ids.join(","));
    Some(stop_feature(&stop_id, &first.name, location, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, name: &str, lat: f64, lng: f64) -> SearchHit {
        SearchHit { name: name.to_string(), location: Coordinate { lat, lng }, stop_id: id.to_string() }
    }

    #[test]
    fn merges_hits() {
        let feature = merge(&[
            hit("1", "Forbes Ave at Morewood Ave", 40.0, -80.0),
            hit("multi:2,3", "Forbes Ave opp Morewood Ave", 42.0, -78.0),
        ])
        .unwrap();
        let json = serde_json::to_value(&feature).unwrap();

        assert_eq!(json["properties"]["stopId"], "multi:1,2,3");
        assert_eq!(json["geometry"]["coordinates"], serde_json::json!([-79.0, 41.0]));
    }

    #[test]
    fn single_hit_unchanged() {
        let feature = merge(&[hit("multi:2,3", "Forbes + Morewood", 40.0, -80.0)]).unwrap();
        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["properties"]["stopId"], "multi:2,3");
    }
}
