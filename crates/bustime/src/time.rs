//! BusTime timestamps.
//!
//! The API reports local Pittsburgh time as `YYYYMMDD HH:MM`, with seconds on
//! some calls (`YYYYMMDD HH:MM:SS`).

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use realtime::{Error, Result};

/// Time zone the agency reports in.
pub const TIME_ZONE: Tz = chrono_tz::America::New_York;

const FORMATS: [&str; 2] = ["%Y%m%d %H:%M:%S", "%Y%m%d %H:%M"];

/// Parse a BusTime timestamp into UTC.
///
/// Local times repeated by the autumn clock change resolve to the earlier
/// instant.
///
/// # Errors
///
/// Returns `Error::InvalidFormat` when the value matches neither format or
/// names a local time skipped by the spring clock change.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    let naive = FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| Error::InvalidFormat(format!("unrecognised timestamp: {value}")))?;

    TIME_ZONE
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| Error::InvalidFormat(format!("nonexistent local time: {value}")))
}
