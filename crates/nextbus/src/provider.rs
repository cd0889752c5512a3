//! # Provider
//!
//! Provider defines the external data interfaces the queries depend on.

use bustime::Transit;
use chrono::{DateTime, Utc};
use realtime::{Result, StateStore};
use stops::{SearchHit, StopDatabase};

/// Provider entry point implemented by the host application.
pub trait Provider: Transit + StopSearch + StopDirectory + StateStore + Time {}

/// Free-text stop search.
pub trait StopSearch: Send + Sync {
    /// Stops matching `query`. Empty when nothing matches.
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<SearchHit>>> + Send;
}

/// Read-only access to the stop database: routes, logical stops and route
/// patterns.
pub trait StopDirectory: Send + Sync {
    fn database(&self) -> &StopDatabase;
}

/// The `Time` trait provides the current time.
pub trait Time: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
