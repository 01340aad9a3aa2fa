//! Fixed-width time bucketing.
//!
//! Readings are grouped by the local wall-clock interval they fall in and each
//! non-empty group collapses to its mean. Groups are keyed by the bucket's
//! local start time, so two buckets on different days or hours never collide.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Timelike, Utc};

use crate::reading::{AggregatedPoint, Reading, round1};

/// Running sums for one bucket.
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    temperature: f64,
    humidity: f64,
    millis: i128,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, reading: &Reading) {
        self.temperature += reading.temperature;
        self.humidity += reading.humidity;
        self.millis += i128::from(reading.timestamp.timestamp_millis());
        self.count += 1;
    }

    fn point(&self) -> Option<AggregatedPoint> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        let mean_millis = i64::try_from(self.millis / self.count as i128).ok()?;
        Some(AggregatedPoint {
            // mean arrival time, not the bucket boundary
            timestamp: DateTime::from_timestamp_millis(mean_millis)?,
            temperature: round1(self.temperature / n),
            humidity: round1(self.humidity / n),
            source_count: self.count,
        })
    }
}

/// Key of the `interval_minutes` bucket containing `ts`: the bucket's local
/// start time expressed as naive epoch milliseconds.
///
/// Intervals restart at the top of every hour, so a width that does not
/// divide 60 leaves a short final bucket in each hour.
pub fn bucket_key<Tz: TimeZone>(ts: &DateTime<Utc>, interval_minutes: u32, tz: &Tz) -> i64 {
    let interval = interval_minutes.max(1);
    let local = ts.with_timezone(tz).naive_local();
    let hour_start =
        local.date().and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(local.hour()));
    let minute = local.minute() / interval * interval;
    (hour_start + TimeDelta::minutes(i64::from(minute)))
        .and_utc()
        .timestamp_millis()
}

/// Collapses readings into one mean point per non-empty bucket.
///
/// Means are rounded to one decimal; each point's timestamp is the mean of
/// its readings' timestamps. Output is sorted ascending by that timestamp.
pub fn aggregate<Tz: TimeZone>(
    readings: &[Reading],
    interval_minutes: u32,
    tz: &Tz,
) -> Vec<AggregatedPoint> {
    let mut buckets: BTreeMap<i64, Accumulator> = BTreeMap::new();
    for reading in readings {
        buckets
            .entry(bucket_key(&reading.timestamp, interval_minutes, tz))
            .or_default()
            .add(reading);
    }

    let mut points: Vec<AggregatedPoint> = buckets.values().filter_map(Accumulator::point).collect();
    points.sort_by_key(|p| p.timestamp);

    tracing::debug!(
        readings = readings.len(),
        buckets = points.len(),
        interval_minutes,
        "bucketed readings"
    );
    points
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    fn at(day: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, h, m, s).unwrap()
    }

    #[test]
    fn test_mean_of_one_bucket() {
        let readings = vec![
            Reading::new(at(1, 10, 1, 0), 20.0, 40.0),
            Reading::new(at(1, 10, 4, 0), 22.0, 45.0),
        ];
        let points = aggregate(&readings, 10, &Utc);

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].temperature, 21.0);
        assert_eq!(points[0].humidity, 42.5);
        assert_eq!(points[0].source_count, 2);
        assert_eq!(points[0].timestamp, at(1, 10, 2, 30));
    }

    #[test]
    fn test_empty() {
        assert!(aggregate(&[], 10, &Utc).is_empty());
    }

    #[test]
    fn test_singleton_passes_through() {
        let r = Reading::new(at(1, 10, 7, 13), 19.94, 50.01);
        let points = aggregate(&[r], 10, &Utc);
        assert_eq!(points, vec![r.to_point()]);
    }

    #[test]
    fn test_same_hour_different_days_do_not_collide() {
        let readings = vec![
            Reading::new(at(1, 10, 1, 0), 20.0, 40.0),
            Reading::new(at(2, 10, 1, 0), 30.0, 40.0),
        ];
        let points = aggregate(&readings, 10, &Utc);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].temperature, 20.0);
        assert_eq!(points[1].temperature, 30.0);
    }

    #[test]
    fn test_output_sorted_for_unsorted_input() {
        let readings = vec![
            Reading::new(at(1, 12, 0, 0), 3.0, 0.0),
            Reading::new(at(1, 10, 0, 0), 1.0, 0.0),
            Reading::new(at(1, 11, 0, 0), 2.0, 0.0),
        ];
        let points = aggregate(&readings, 10, &Utc);
        let temps: Vec<f64> = points.iter().map(|p| p.temperature).collect();
        assert_eq!(temps, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_buckets_follow_local_time() {
        // +05:45: UTC 04:15 is local 10:00
        let tz = FixedOffset::east_opt(5 * 3600 + 45 * 60).unwrap();
        let before = bucket_key(&at(1, 4, 14, 0), 10, &tz);
        let start = bucket_key(&at(1, 4, 15, 0), 10, &tz);
        let end = bucket_key(&at(1, 4, 24, 59), 10, &tz);
        assert_ne!(before, start);
        assert_eq!(start, end);
    }

    #[test]
    fn test_day_of_minute_readings() {
        let start = at(1, 0, 0, 0);
        let readings: Vec<Reading> = (0..1440)
            .map(|i| Reading::new(start + TimeDelta::minutes(i), 20.0, 50.0))
            .collect();
        let points = aggregate(&readings, 10, &Utc);

        assert_eq!(points.len(), 144);
        assert!(points.iter().all(|p| p.source_count == 10));
        assert!(points.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
}
