//! Summary statistics and trend indicators over raw readings.

use serde::Serialize;

use crate::reading::{Reading, round1};

/// Summary of the raw readings in the displayed range.
///
/// Serialized as `{min, max, avgHumidity, count}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    #[serde(rename = "min")]
    pub min_temperature: f64,
    #[serde(rename = "max")]
    pub max_temperature: f64,
    #[serde(rename = "avgHumidity")]
    pub avg_humidity: f64,
    pub count: usize,
}

/// Summarizes `readings`, or `None` when there is nothing to summarize.
pub fn summarize(readings: &[Reading]) -> Option<Statistics> {
    if readings.is_empty() {
        return None;
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut humidity = 0.0;
    for r in readings {
        min = min.min(r.temperature);
        max = max.max(r.temperature);
        humidity += r.humidity;
    }

    Some(Statistics {
        min_temperature: round1(min),
        max_temperature: round1(max),
        avg_humidity: round1(humidity / readings.len() as f64),
        count: readings.len(),
    })
}

/// The statistics currently on display. An empty reading set leaves the
/// previous values in place rather than clearing them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatisticsPanel {
    current: Option<Statistics>,
}

impl StatisticsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the displayed statistics changed.
    pub fn update(&mut self, latest: Option<Statistics>) -> bool {
        match latest {
            Some(stats) if self.current != Some(stats) => {
                self.current = Some(stats);
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<&Statistics> {
        self.current.as_ref()
    }
}

/// Direction of change between two successive readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    /// Changes smaller than `threshold` in magnitude count as stable.
    pub fn between(previous: f64, current: f64, threshold: f64) -> Self {
        let delta = current - previous;
        if delta.abs() < threshold {
            Trend::Stable
        } else if delta > 0.0 {
            Trend::Rising
        } else {
            Trend::Falling
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn reading(temperature: f64, humidity: f64) -> Reading {
        Reading::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            temperature,
            humidity,
        )
    }

    #[test]
    fn test_summarize() {
        let stats = summarize(&[reading(20.0, 40.0), reading(25.0, 45.0)]).unwrap();
        assert_eq!(stats.min_temperature, 20.0);
        assert_eq!(stats.max_temperature, 25.0);
        assert_eq!(stats.avg_humidity, 42.5);
        assert_eq!(stats.count, 2);
    }

    #[test]
    fn test_summarize_rounds() {
        let stats = summarize(&[reading(20.04, 40.0), reading(25.06, 41.0), reading(22.0, 41.0)])
            .unwrap();
        assert_eq!(stats.min_temperature, 20.0);
        assert_eq!(stats.max_temperature, 25.1);
        assert_eq!(stats.avg_humidity, 40.7);
    }

    #[test]
    fn test_statistics_field_names() {
        let stats = summarize(&[reading(20.0, 40.0), reading(25.0, 45.0)]).unwrap();
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"min": 20.0, "max": 25.0, "avgHumidity": 42.5, "count": 2})
        );
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn test_panel_keeps_previous_on_empty() {
        let mut panel = StatisticsPanel::new();
        assert!(panel.current().is_none());

        let stats = summarize(&[reading(20.0, 40.0)]);
        assert!(panel.update(stats));
        assert!(!panel.update(None));
        assert_eq!(panel.current().copied(), stats);
        assert!(!panel.update(stats));
    }

    #[test]
    fn test_trend() {
        assert_eq!(Trend::between(20.0, 20.05, 0.1), Trend::Stable);
        assert_eq!(Trend::between(20.0, 20.3, 0.1), Trend::Rising);
        assert_eq!(Trend::between(20.0, 19.5, 0.1), Trend::Falling);
        assert_eq!(Trend::between(50.0, 50.9, 1.0), Trend::Stable);
        assert_eq!(Trend::between(50.0, 52.0, 1.0), Trend::Rising);
    }
}
