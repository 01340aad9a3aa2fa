//! Sensor readings and the chart points derived from them.
//!
//! Readings arrive from the ingestion side in a loose wire format
//! ([`RawReading`]) and are normalized here into [`Reading`] values with
//! UTC timestamps. Everything downstream works on sorted `Reading` slices and
//! produces [`AggregatedPoint`]s.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single sensor observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, temperature: f64, humidity: f64) -> Self {
        Self {
            timestamp,
            temperature,
            humidity,
        }
    }

    /// The reading as a chart point, values rounded to one decimal.
    pub fn to_point(&self) -> AggregatedPoint {
        AggregatedPoint {
            timestamp: self.timestamp,
            temperature: round1(self.temperature),
            humidity: round1(self.humidity),
            source_count: 1,
        }
    }
}

/// A rendered chart point.
///
/// The timestamp may be a representative time (e.g. the mean of a bucket)
/// rather than the time of any one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregatedPoint {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    /// How many raw readings contributed to this point
    pub source_count: usize,
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Sorts readings ascending by timestamp, keeping the input order of ties.
pub fn sort_chronologically(readings: &mut [Reading]) {
    readings.sort_by_key(|r| r.timestamp);
}

/// Timestamp as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Milliseconds since the Unix epoch
    Millis(i64),
    /// RFC 3339, or a naive ISO-8601 local time
    Text(String),
}

/// A reading as supplied by the ingestion collaborator. Unknown fields
/// (battery, voltage, device name, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawReading {
    pub timestamp: RawTimestamp,
    pub temperature: f64,
    pub humidity: f64,
}

impl RawReading {
    /// Normalizes the reading, resolving naive local times in `tz`.
    pub fn into_reading<Tz: TimeZone>(self, tz: &Tz) -> Result<Reading> {
        let timestamp = match self.timestamp {
            RawTimestamp::Millis(ms) => {
                DateTime::from_timestamp_millis(ms).ok_or_else(|| Error::MalformedTimestamp {
                    value: ms.to_string(),
                    reason: "out of range".to_string(),
                })?
            }
            RawTimestamp::Text(text) => parse_timestamp(&text, tz)?,
        };

        for (field, value) in [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
        ] {
            if !value.is_finite() {
                return Err(Error::NonFiniteValue {
                    field,
                    timestamp: timestamp.to_rfc3339(),
                });
            }
        }

        Ok(Reading::new(timestamp, self.temperature, self.humidity))
    }
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an absolute RFC 3339 timestamp, or a naive local timestamp in `tz`.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant;
/// local times skipped by a DST jump are rejected.
pub fn parse_timestamp<Tz: TimeZone>(text: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| Error::MalformedTimestamp {
            value: text.to_string(),
            reason: "not RFC 3339 or ISO-8601".to_string(),
        })?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => Err(Error::MalformedTimestamp {
            value: text.to_string(),
            reason: "local time does not exist".to_string(),
        }),
    }
}

/// Readings that survived normalization.
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub readings: Vec<Reading>,
    pub dropped: usize,
}

/// Normalizes a batch of raw readings, dropping (and logging) the corrupt ones.
pub fn parse_readings<Tz, I>(raw: I, tz: &Tz) -> Parsed
where
    Tz: TimeZone,
    I: IntoIterator<Item = RawReading>,
{
    let mut parsed = Parsed::default();
    for r in raw {
        match r.into_reading(tz) {
            Ok(reading) => parsed.readings.push(reading),
            Err(err) => {
                tracing::warn!(%err, "dropping reading");
                parsed.dropped += 1;
            }
        }
    }
    parsed
}

/// Parses a JSON array of raw readings. Entries that do not deserialize are
/// dropped individually rather than failing the whole batch.
pub fn parse_readings_json<Tz: TimeZone>(bytes: &[u8], tz: &Tz) -> Result<Parsed> {
    let entries: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;
    let mut shape_errors = 0;
    let raw = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<RawReading>(entry) {
            Ok(raw) => Some(raw),
            Err(err) => {
                tracing::warn!(%err, "dropping unreadable entry");
                shape_errors += 1;
                None
            }
        })
        .collect::<Vec<_>>();

    let mut parsed = parse_readings(raw, tz);
    parsed.dropped += shape_errors;
    Ok(parsed)
}
