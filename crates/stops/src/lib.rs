//! # Stops
//!
//! Turns the raw stop records published by the transit agency into logical
//! stops: names are normalized so that both directions of travel through an
//! intersection share a key, same-key records are merged, and the merged stops
//! are ranked by distance from a caller.

mod database;
mod geo;
mod group;
mod normalize;

pub use self::database::*;
pub use self::geo::*;
pub use self::group::*;
pub use self::normalize::*;
