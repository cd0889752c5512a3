//! # BusTime
//!
//! Upstream transit data for the NextBus service. [`Transit`] is the
//! capability the service consumes; [`BusTime`] implements it over the Port
//! Authority BusTime XML API using the host's [`realtime::HttpRequest`].

mod client;
mod model;
mod time;
mod transit;
mod wire;

pub use self::client::*;
pub use self::model::*;
pub use self::time::*;
pub use self::transit::*;
