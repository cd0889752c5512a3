//! # Stop database queries
//!
//! Answers from the stop database alone; no upstream calls. Results never
//! expire because the database only changes on restart.

use std::collections::BTreeMap;

use geojson::Feature;
use realtime::{Error, Result, not_found};
use serde::{Deserialize, Serialize};
use stops::LogicalStop;

use crate::cache::{self, Key};
use crate::provider::Provider;
use crate::service::NextBus;

/// Tracked routes as `[id, name]` pairs, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableRoutes {
    pub available: Vec<(String, String)>,
}

/// Digest of the stop table, for clients deciding whether to download it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopsChecksum {
    pub checksum: String,
}

/// The full stop table with its digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopExport {
    pub checksum: String,
    pub stops: BTreeMap<String, LogicalStop>,
}

impl<P: Provider> NextBus<P> {
    /// The path feature for pattern `pattern_id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown pattern.
    pub async fn pattern(&self, pattern_id: &str) -> Result<Feature> {
        if self.provider.database().pattern(pattern_id).is_none() {
            return Err(not_found!("Pattern not found."));
        }

        let key = Key::Pattern(pattern_id.to_string());
        cache::get_or_compute(&self.provider, &key, None, || async {
            self.provider.database().pattern(pattern_id).cloned().ok_or_else(|| not_found!("Pattern not found."))
        })
        .await
    }

    /// # Errors
    ///
    /// Returns an error only when the cache layer does.
    pub async fn available_routes(&self) -> Result<AvailableRoutes> {
        cache::get_or_compute(&self.provider, &Key::AvailableRoutes, None, || async {
            Ok::<_, Error>(AvailableRoutes { available: self.provider.database().available_routes() })
        })
        .await
    }

    /// # Errors
    ///
    /// Returns an error when the stop table cannot be serialized.
    pub async fn stops_checksum(&self) -> Result<StopsChecksum> {
        cache::get_or_compute(&self.provider, &Key::StopsChecksum, None, || async {
            Ok::<_, Error>(StopsChecksum { checksum: self.provider.database().checksum()? })
        })
        .await
    }

    /// # Errors
    ///
    /// Returns an error when the stop table cannot be serialized.
    pub async fn stop_export(&self) -> Result<StopExport> {
        cache::get_or_compute(&self.provider, &Key::Stops, None, || async {
            let database = self.provider.database();
            Ok::<_, Error>(StopExport { checksum: database.checksum()?, stops: database.stops.clone() })
        })
        .await
    }
}
