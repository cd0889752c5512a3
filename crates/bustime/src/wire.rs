//! BusTime XML payloads.
//!
//! Every call answers with a `<bustime-response>` document holding either the
//! requested elements or one or more `<error>` elements.

use realtime::{Error, Result, unavailable};
use serde::Deserialize;
use stops::{Coordinate, StopRecord};

use crate::model::{Pattern, Prediction, VehicleRecord};
use crate::time::parse_timestamp;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BusTimeResponse {
    #[serde(rename = "error")]
    pub errors: Vec<WireError>,

    #[serde(rename = "route")]
    pub routes: Vec<WireRoute>,

    #[serde(rename = "dir")]
    pub directions: Vec<String>,

    #[serde(rename = "stop")]
    pub stops: Vec<WireStop>,

    #[serde(rename = "prd")]
    pub predictions: Vec<WirePrediction>,

    #[serde(rename = "vehicle")]
    pub vehicles: Vec<WireVehicle>,

    #[serde(rename = "ptr")]
    pub patterns: Vec<WirePattern>,
}

impl TryFrom<&[u8]> for BusTimeResponse {
    type Error = Error;

    fn try_from(xml: &[u8]) -> Result<Self> {
        quick_xml::de::from_reader(xml).map_err(Into::into)
    }
}

impl BusTimeResponse {
    /// Surface the first `<error>` element, if any, as a domain error.
    pub fn check(self) -> Result<Self> {
        if let Some(error) = self.errors.first() {
            return Err(error.to_error());
        }
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireError {
    pub msg: String,
}

impl WireError {
    fn to_error(&self) -> Error {
        let msg = self.msg.to_lowercase();
        if msg.contains("transaction limit") || msg.contains("exceeded") {
            return Error::QuotaExceeded(self.msg.clone());
        }
        unavailable!("bustime: {}", self.msg)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireRoute {
    pub rt: String,
    pub rtnm: String,
    pub rtclr: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireStop {
    pub stpid: String,
    pub stpnm: String,
    pub lat: f64,
    pub lon: f64,
}

impl From<WireStop> for StopRecord {
    fn from(stop: WireStop) -> Self {
        Self {
            id: stop.stpid,
            location: Coordinate { lat: stop.lat, lng: stop.lon },
            name: stop.stpnm,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WirePrediction {
    /// `A` for arrival, `D` for departure.
    pub typ: String,
    pub stpid: String,
    pub stpnm: String,
    pub vid: String,
    pub dstp: u32,
    pub rt: String,
    pub rtdir: String,
    pub des: String,
    pub prdtm: String,
}

impl TryFrom<WirePrediction> for Prediction {
    type Error = Error;

    fn try_from(prd: WirePrediction) -> Result<Self> {
        Ok(Self {
            arrives_at: parse_timestamp(&prd.prdtm)?,
            is_arrival: prd.typ.eq_ignore_ascii_case("A"),
            route: prd.rt,
            destination: prd.des,
            direction: prd.rtdir,
            stop_id: prd.stpid,
            vehicle_id: prd.vid,
            feet_to_stop: prd.dstp,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireVehicle {
    pub vid: String,
    pub tmstmp: String,
    pub lat: f64,
    pub lon: f64,
    pub hdg: u16,
    pub pid: String,
    pub rt: String,
    pub des: String,
    pub spd: u16,
}

impl TryFrom<WireVehicle> for VehicleRecord {
    type Error = Error;

    fn try_from(vehicle: WireVehicle) -> Result<Self> {
        Ok(Self {
            updated_at: parse_timestamp(&vehicle.tmstmp)?,
            location: Coordinate { lat: vehicle.lat, lng: vehicle.lon },
            vehicle_id: vehicle.vid,
            heading: vehicle.hdg,
            speed: vehicle.spd,
            pattern_id: vehicle.pid,
            route: vehicle.rt,
            destination: vehicle.des,
            next_stop: None,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WirePattern {
    pub pid: String,
    pub rtdir: String,
    pub pt: Vec<WirePoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WirePoint {
    pub seq: u32,
    pub lat: f64,
    pub lon: f64,
}

impl From<WirePattern> for Pattern {
    fn from(mut pattern: WirePattern) -> Self {
        pattern.pt.sort_by_key(|pt| pt.seq);
        Self {
            pid: pattern.pid,
            direction: pattern.rtdir,
            points: pattern.pt.into_iter().map(|pt| Coordinate { lat: pt.lat, lng: pt.lon }).collect(),
        }
    }
}
