use std::env;
use std::time::Duration;

/// Query tuning, read from the environment at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// How long a stop's predictions are reused.
    pub prediction_ttl: Duration,

    /// How long a single vehicle's position is reused.
    pub vehicle_ttl: Duration,

    /// How long a vehicle feature in a route listing is reused.
    pub on_route_ttl: Duration,

    /// Upper bound on any single upstream call.
    pub upstream_timeout: Duration,

    /// Nearby stops returned when the caller does not ask for a number.
    pub default_nearest: usize,

    /// Most nearby stops a caller may ask for.
    pub max_nearest: usize,

    /// Shortest search query, in characters, that is searched.
    pub min_search: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prediction_ttl: Duration::from_secs(20),
            vehicle_ttl: Duration::from_secs(15),
            on_route_ttl: Duration::from_secs(25),
            upstream_timeout: Duration::from_secs(10),
            default_nearest: 10,
            max_nearest: 125,
            min_search: 3,
        }
    }
}

impl Settings {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            prediction_ttl: env_secs("PREDICTION_TTL_SECS", defaults.prediction_ttl),
            vehicle_ttl: env_secs("VEHICLE_TTL_SECS", defaults.vehicle_ttl),
            on_route_ttl: env_secs("ON_ROUTE_TTL_SECS", defaults.on_route_ttl),
            upstream_timeout: env_secs("UPSTREAM_TIMEOUT_SECS", defaults.upstream_timeout),
            default_nearest: env_usize("DEFAULT_NEAREST", defaults.default_nearest),
            max_nearest: env_usize("MAX_NEAREST", defaults.max_nearest),
            min_search: env_usize("MIN_SEARCH", defaults.min_search),
        }
    }

    /// The number of nearby stops to return for a requested count. Negative
    /// counts return nothing.
    #[must_use]
    pub fn nearest_limit(&self, requested: Option<i64>) -> usize {
        requested
            .map_or(self.default_nearest, |n| usize::try_from(n.max(0)).unwrap_or(usize::MAX))
            .min(self.max_nearest)
    }
}

fn env_secs(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|value| value.parse::<usize>().ok()).unwrap_or(default)
}
