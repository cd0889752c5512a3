//! # Cache-aside layer
//!
//! Query results are stored as JSON under a [`Key`] derived from the query.
//! A present entry is returned without recomputing it; expiry is delegated to
//! the [`StateStore`]. The store is best effort: failures reading or writing
//! it are logged and the value is computed as if the entry were missing.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use realtime::{Result, StateStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Cache keys, one variant per query type.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    /// Upstream predictions for one (non composite) stop id.
    Stop(String),

    /// A single vehicle's feature.
    Vehicle(String),

    /// A vehicle's feature within a route listing.
    OnRouteBus(String),

    /// Nearby stops for an origin and result count.
    Nearby { lat: f64, lng: f64, limit: usize },

    /// Search results for a query.
    Find(String),

    Pattern(String),
    AvailableRoutes,
    StopsChecksum,
    Stops,
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop(id) => write!(f, "_stop_{id}"),
            Self::Vehicle(vid) => write!(f, "_vehicle_{vid}"),
            Self::OnRouteBus(vid) => write!(f, "_onroute_bus_{vid}"),
            Self::Nearby { lat, lng, limit } => write!(f, "_nearby_{lat}_{lng}_{limit}"),
            Self::Find(query) => write!(f, "_find_{query}"),
            Self::Pattern(pid) => write!(f, "_pattern_{pid}"),
            Self::AvailableRoutes => f.write_str("_available_routes"),
            Self::StopsChecksum => f.write_str("_stops_checksum"),
            Self::Stops => f.write_str("_stops"),
        }
    }
}

/// Return the cached value for `key`, or compute, store and return it.
///
/// Entries written with a `ttl` expire after it; entries without one live
/// until invalidated. Errors from `compute` are returned and nothing is
/// stored. Concurrent misses each compute; the last write wins.
///
/// # Errors
///
/// Returns the error from `compute`.
pub async fn get_or_compute<S, T, F, Fut>(
    store: &S, key: &Key, ttl: Option<Duration>, compute: F,
) -> Result<T>
where
    S: StateStore,
    T: Serialize + DeserializeOwned + Send,
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = Result<T>> + Send,
{
    let cache_key = key.to_string();

    match store.get(&cache_key).await {
        Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => {
                debug!(cache_key = %cache_key, "cache hit");
                return Ok(value);
            }
            Err(err) => {
                warn!(cache_key = %cache_key, error = %err, "evicting undecodable cache entry");
                if let Err(err) = store.delete(&cache_key).await {
                    warn!(cache_key = %cache_key, error = %err, "failed to evict cache entry");
                }
            }
        },
        Ok(None) => {}
        Err(err) => warn!(cache_key = %cache_key, error = %err, "cache read failed"),
    }

    let value = compute().await?;

    match serde_json::to_vec(&value) {
        Ok(bytes) => {
            if let Err(err) = store.set(&cache_key, &bytes, ttl.map(|ttl| ttl.as_secs())).await {
                warn!(cache_key = %cache_key, error = %err, "cache write failed");
            }
        }
        Err(err) => warn!(cache_key = %cache_key, error = %err, "failed to serialize value for cache"),
    }

    Ok(value)
}

/// Remove the entry for `key`.
///
/// # Errors
///
/// Returns an error when the store cannot delete the entry.
pub async fn invalidate(store: &impl StateStore, key: &Key) -> Result<()> {
    store.delete(&key.to_string()).await.map_err(Into::into)
}
