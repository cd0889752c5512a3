//! # NextBus
//!
//! Answers the service's queries: stop predictions, nearby stops, stop search,
//! vehicle positions, route patterns and the stop database export.
//!
//! Upstream calls go through a shared [`QuotaBreaker`] and, where the result is
//! worth reusing, through the cache-aside layer in [`cache`] backed by the
//! host's [`realtime::StateStore`].

mod breaker;
pub mod cache;
mod catalog;
mod config;
mod features;
mod find;
mod nearby;
mod prediction;
mod provider;
mod service;
mod status;
mod stop;
mod vehicle;

pub use self::breaker::*;
pub use self::catalog::*;
pub use self::config::*;
pub use self::prediction::*;
pub use self::provider::*;
pub use self::service::*;
pub use self::status::*;
