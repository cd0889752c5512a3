//! # Stop database
//!
//! The read-only snapshot of routes, logical stops and route patterns the
//! service answers queries from. It is generated offline from the upstream
//! route listing and loaded once at start-up.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geojson::Feature;
use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::geo::Coordinate;
use crate::group::LogicalStop;

/// Upper bound on search results, matching the search index page size.
pub const SEARCH_LIMIT: usize = 100;

/// Route details kept in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub id: String,
    pub name: String,

    /// Route colour as `#rrggbb`.
    #[serde(default)]
    pub color: String,
}

/// A stop matched by a free-text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub name: String,
    pub location: Coordinate,
    pub stop_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopDatabase {
    #[serde(default)]
    pub routes: BTreeMap<String, RouteSummary>,
    #[serde(default)]
    pub stops: BTreeMap<String, LogicalStop>,
    #[serde(default)]
    pub patterns: BTreeMap<String, Feature>,
}

impl StopDatabase {
    /// Load a database previously written by [`StopDatabase::save`].
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or is not a database.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let db: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("deserializing stop database {}", path.display()))?;

        tracing::info!(
            routes = db.routes.len(),
            stops = db.stops.len(),
            patterns = db.patterns.len(),
            "loaded stop database"
        );
        Ok(db)
    }

    /// Write the database as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = serde_json::to_vec(self).context("serializing stop database")?;
        fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
    }

    #[must_use]
    pub fn stop(&self, stop_id: &str) -> Option<&LogicalStop> {
        self.stops.get(stop_id)
    }

    #[must_use]
    pub fn route(&self, route_id: &str) -> Option<&RouteSummary> {
        self.routes.get(route_id)
    }

    #[must_use]
    pub fn pattern(&self, pattern_id: &str) -> Option<&Feature> {
        self.patterns.get(pattern_id)
    }

    /// `(id, name)` for every route, ordered by id.
    #[must_use]
    pub fn available_routes(&self) -> Vec<(String, String)> {
        self.routes.values().map(|r| (r.id.clone(), r.name.clone())).collect()
    }

    /// Stable hex digest of the stop table, used by clients to decide whether
    /// their local copy is current.
    ///
    /// # Errors
    ///
    /// Returns an error when the stop table cannot be serialized.
    pub fn checksum(&self) -> Result<String> {
        let bytes = serde_json::to_vec(&self.stops).context("serializing stops")?;
        Ok(format!("{:016x}", XxHash64::oneshot(0, &bytes)))
    }

    /// Stops whose name contains a word starting with each word of `query`,
    /// case-insensitively, in stop id order.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let terms = words(query);
        if terms.is_empty() {
            return vec![];
        }

        self.stops
            .values()
            .filter(|stop| {
                let name = words(&stop.name);
                terms.iter().all(|term| name.iter().any(|word| word.starts_with(term.as_str())))
            })
            .take(SEARCH_LIMIT)
            .map(|stop| SearchHit {
                name: stop.name.clone(),
                location: stop.location,
                stop_id: stop.id.clone(),
            })
            .collect()
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '#')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}
