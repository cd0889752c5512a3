//! # Prediction formatting
//!
//! Upstream predictions carry an absolute time and a distance in feet. Riders
//! see minutes from now, miles, and a display class used to colour the row.

use bustime::Prediction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stops::{Coordinate, round_to};

const FEET_PER_MILE: f64 = 5280.0;
const MILLIS_PER_MINUTE: i64 = 60_000;

/// How soon a vehicle is expected, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayClass {
    /// Due within 10 minutes.
    Soon,

    /// Due in 11 to 25 minutes.
    KindaSoon,

    /// Anything else, including predictions already in the past.
    Later,
}

impl DisplayClass {
    #[must_use]
    pub const fn from_eta(eta: i64) -> Self {
        match eta {
            0..=10 => Self::Soon,
            11..=25 => Self::KindaSoon,
            _ => Self::Later,
        }
    }
}

/// A prediction as returned to riders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedPrediction {
    pub route: String,
    pub destination: String,
    pub direction: String,

    /// Whole minutes until arrival, negative when overdue. Absent only on the
    /// over-limit placeholder.
    pub eta: Option<i64>,

    /// Miles from the stop, to one decimal place.
    pub dist: f64,
    pub vid: String,
    pub display: DisplayClass,
    pub arrival: bool,
}

impl FormattedPrediction {
    #[must_use]
    pub fn new(prediction: &Prediction, now: DateTime<Utc>) -> Self {
        let eta = minutes_until(prediction.arrives_at, now);

        Self {
            route: prediction.route.clone(),
            destination: prediction.destination.clone(),
            direction: capitalize(&prediction.direction),
            eta: Some(eta),
            dist: round_to(f64::from(prediction.feet_to_stop) / FEET_PER_MILE, 1),
            vid: prediction.vehicle_id.clone(),
            display: DisplayClass::from_eta(eta),
            arrival: prediction.is_arrival,
        }
    }

    /// Placeholder shown while upstream calls are disabled.
    #[must_use]
    pub fn over_limit() -> Self {
        Self {
            route: "API Error".to_string(),
            destination: "API OVER LIMIT".to_string(),
            direction: "We've exceeded our daily allotment for Port Authority data requests."
                .to_string(),
            eta: None,
            dist: 0.0,
            vid: "0".to_string(),
            display: DisplayClass::Soon,
            arrival: false,
        }
    }
}

/// Whole minutes from `now` until `at`, rounded to the nearest minute.
#[must_use]
pub fn minutes_until(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (at - now).num_milliseconds();
    (millis + MILLIS_PER_MINUTE / 2).div_euclid(MILLIS_PER_MINUTE)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

/// Name and location of the requested stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopInfo {
    pub name: String,
    pub loc: Coordinate,
}

/// Predictions for a stop, soonest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionReply {
    pub predictions: Vec<FormattedPrediction>,

    /// Vehicle ids of the predictions, joined with `-`.
    pub vids: String,

    /// Present for single stops only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_info: Option<StopInfo>,
}

impl PredictionReply {
    /// Build a reply, ordering `predictions` by ETA. Equal ETAs keep their
    /// relative order.
    #[must_use]
    pub fn new(mut predictions: Vec<FormattedPrediction>, stop_info: Option<StopInfo>) -> Self {
        predictions.sort_by_key(|p| p.eta.unwrap_or(i64::MAX));
        let vids = predictions.iter().map(|p| p.vid.as_str()).collect::<Vec<_>>().join("-");
        Self { predictions, vids, stop_info }
    }

    #[must_use]
    pub fn over_limit(stop_info: Option<StopInfo>) -> Self {
        Self { predictions: vec![FormattedPrediction::over_limit()], vids: "9999".to_string(), stop_info }
    }
}
