//! Sources of historical readings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::reading::{Reading, parse_readings_json};

/// Supplies the readings of a trailing window. Order is not guaranteed.
#[async_trait]
pub trait ReadingStore {
    async fn readings(&self, window_hours: u32) -> Result<Vec<Reading>>;
}

pub type SharedStore = Arc<dyn ReadingStore + Send + Sync + 'static>;

/// Keeps the readings in `[end - window_hours, end]`. Without an explicit
/// end the window closes at the newest reading.
fn within_window(
    readings: Vec<Reading>,
    window_hours: u32,
    end: Option<DateTime<Utc>>,
) -> Vec<Reading> {
    let Some(end) = end.or_else(|| readings.iter().map(|r| r.timestamp).max()) else {
        return readings;
    };
    let start = end - TimeDelta::hours(i64::from(window_hours));
    readings
        .into_iter()
        .filter(|r| r.timestamp >= start && r.timestamp <= end)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    readings: Vec<Reading>,
    end: Option<DateTime<Utc>>,
}

impl MemoryStore {
    pub fn new(readings: Vec<Reading>) -> Self {
        Self {
            readings,
            end: None,
        }
    }

    pub fn ending_at(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn readings(&self, window_hours: u32) -> Result<Vec<Reading>> {
        Ok(within_window(self.readings.clone(), window_hours, self.end))
    }
}

/// A JSON array of raw readings on disk, re-read on every request so that
/// appended data shows up.
#[derive(Debug, Clone)]
pub struct JsonFileStore<Tz> {
    path: PathBuf,
    tz: Tz,
    end: Option<DateTime<Utc>>,
}

impl<Tz: TimeZone> JsonFileStore<Tz> {
    /// Naive timestamps in the file are read as local times in `tz`.
    pub fn new(path: impl Into<PathBuf>, tz: Tz) -> Self {
        Self {
            path: path.into(),
            tz,
            end: None,
        }
    }

    pub fn ending_at(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }
}

#[async_trait]
impl<Tz> ReadingStore for JsonFileStore<Tz>
where
    Tz: TimeZone + Send + Sync,
{
    async fn readings(&self, window_hours: u32) -> Result<Vec<Reading>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let parsed = parse_readings_json(&bytes, &self.tz)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        if parsed.dropped > 0 {
            tracing::warn!(
                dropped = parsed.dropped,
                path = %self.path.display(),
                "skipped malformed readings"
            );
        }

        let readings = within_window(parsed.readings, window_hours, self.end);
        tracing::debug!(
            readings = readings.len(),
            window_hours,
            path = %self.path.display(),
            "loaded readings"
        );
        Ok(readings)
    }
}
