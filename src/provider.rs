use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use bustime::{BUSTIME_KEY, BUSTIME_URL, BusTime, Pattern, Prediction, RouteRecord, Transit, VehicleRecord};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{Request, Response};
use nextbus::{StopDirectory, StopSearch, Time};
use realtime::{Config, HttpRequest, StateStore};
use stops::{SearchHit, StopDatabase};

use crate::config::AppConfig;
use crate::store::MemoryStore;

/// Host implementation of every capability the service crates depend on.
#[derive(Clone)]
pub struct Provider {
    client: reqwest::Client,
    config: Arc<AppConfig>,
    store: Arc<MemoryStore>,
    database: Arc<StopDatabase>,
}

impl Provider {
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(config: Arc<AppConfig>, database: StopDatabase) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.settings.upstream_timeout)
            .gzip(true)
            .build()
            .context("building http client")?;

        let store = Arc::new(MemoryStore::with_capacity(config.cache_capacity));
        Ok(Self { client, config, store, database: Arc::new(database) })
    }

    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

impl nextbus::Provider for Provider {}

impl HttpRequest for Provider {
    async fn fetch(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let (parts, body) = request.into_parts();
        let uri = parts.uri.to_string();

        let response = self
            .client
            .request(parts.method, &uri)
            .headers(parts.headers)
            .body(body)
            .send()
            .await
            .with_context(|| format!("requesting {}", redact(&uri)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.context("reading response body")?;

        let mut reply = Response::new(body);
        *reply.status_mut() = status;
        *reply.headers_mut() = headers;
        Ok(reply)
    }
}

impl Config for Provider {
    async fn get(&self, key: &str) -> Result<String> {
        match key {
            BUSTIME_URL => Ok(self.config.bustime_url.clone()),
            BUSTIME_KEY if self.config.bustime_key.is_empty() => Err(anyhow!("BUSTIME_KEY is not set")),
            BUSTIME_KEY => Ok(self.config.bustime_key.clone()),
            _ => std::env::var(key).with_context(|| format!("{key} is not set")),
        }
    }
}

impl StateStore for Provider {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.store.get(key))
    }

    async fn set(&self, key: &str, value: &[u8], ttl_secs: Option<u64>) -> Result<Option<Vec<u8>>> {
        Ok(self.store.set(key, value, ttl_secs.map(Duration::from_secs)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key);
        Ok(())
    }
}

impl Transit for Provider {
    async fn fetch_routes(&self) -> realtime::Result<Vec<RouteRecord>> {
        BusTime::new(self).routes().await
    }

    async fn fetch_predictions(&self, stop_id: &str) -> realtime::Result<Vec<Prediction>> {
        BusTime::new(self).predictions(stop_id).await
    }

    async fn fetch_vehicle(&self, vehicle_id: &str) -> realtime::Result<VehicleRecord> {
        BusTime::new(self).vehicle(vehicle_id).await
    }

    async fn fetch_vehicles_on_route(&self, route_id: &str) -> realtime::Result<Vec<VehicleRecord>> {
        BusTime::new(self).vehicles_on_route(route_id).await
    }

    async fn fetch_patterns(&self, route_id: &str) -> realtime::Result<Vec<Pattern>> {
        BusTime::new(self).patterns(route_id).await
    }
}

impl StopSearch for Provider {
    async fn search(&self, query: &str) -> realtime::Result<Vec<SearchHit>> {
        Ok(self.database.search(query))
    }
}

impl StopDirectory for Provider {
    fn database(&self) -> &StopDatabase {
        &self.database
    }
}

impl Time for Provider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// Upstream URLs carry the API key in the query string.
fn redact(uri: &str) -> &str {
    uri.split_once('?').map_or(uri, |(path, _)| path)
}
