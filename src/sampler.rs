//! Adaptive downsampling for width-constrained displays.
//!
//! A reading set larger than the display's point budget is reduced by picking
//! evenly spaced indices and smoothing each interior pick over a small
//! neighbourhood. The first and last picks are never smoothed, so the visible
//! extremes of the chart are real readings.

use std::num::NonZero;

use crate::display::DisplayClass;
use crate::reading::{AggregatedPoint, Reading, round1};

/// Weight lost per index of distance from the window center.
const WEIGHT_DECAY: f64 = 0.3;
/// Floor on any sample's weight; keeps every weighted mean well defined.
const MIN_WEIGHT: f64 = 0.1;

/// Reduces sorted `readings` to the point budget of `class` over a
/// `window_hours` window.
///
/// Sets already within budget are returned whole, rounded to one decimal.
pub fn sample(readings: &[Reading], class: DisplayClass, window_hours: u32) -> Vec<AggregatedPoint> {
    let target = class.target_points(window_hours);
    if readings.len() <= target.get() {
        tracing::debug!(
            readings = readings.len(),
            target = target.get(),
            "within point budget, not sampling"
        );
        return readings.iter().map(Reading::to_point).collect();
    }

    let points = uniform_sample(readings, target);
    tracing::debug!(
        readings = readings.len(),
        points = points.len(),
        ?class,
        window_hours,
        "sampled readings"
    );
    points
}

/// Picks exactly `target` points from sorted `readings` at evenly spaced
/// indices. Interior points are weighted means of their neighbourhood but keep
/// the timestamp of the reading at the picked index.
pub fn uniform_sample(readings: &[Reading], target: NonZero<usize>) -> Vec<AggregatedPoint> {
    let n = readings.len();
    if n == 0 {
        return Vec::new();
    }
    let target = target.get();
    if target == 1 {
        return vec![readings[0].to_point()];
    }

    let step = (n - 1) as f64 / (target - 1) as f64;
    let radius = (n / target / 2).max(1);

    (0..target)
        .map(|i| {
            let index = ((i as f64 * step).round() as usize).min(n - 1);
            if i == 0 || i == target - 1 {
                readings[index].to_point()
            } else {
                smoothed(readings, index, radius)
            }
        })
        .collect()
}

/// Weight of a sample `distance` indices from its window's center.
pub fn sample_weight(distance: usize) -> f64 {
    (1.0 - WEIGHT_DECAY * distance as f64).max(MIN_WEIGHT)
}

fn smoothed(readings: &[Reading], index: usize, radius: usize) -> AggregatedPoint {
    let lo = index.saturating_sub(radius);
    let hi = (index + radius).min(readings.len() - 1);
    let window = &readings[lo..=hi];
    // center of the clipped window, which drifts off `index` near the edges
    let center = window.len() / 2;

    let mut temperature = 0.0;
    let mut humidity = 0.0;
    let mut total = 0.0;
    for (i, r) in window.iter().enumerate() {
        let weight = sample_weight(i.abs_diff(center));
        temperature += r.temperature * weight;
        humidity += r.humidity * weight;
        total += weight;
    }

    AggregatedPoint {
        timestamp: readings[index].timestamp,
        temperature: round1(temperature / total),
        humidity: round1(humidity / total),
        source_count: window.len(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn series(n: usize, f: impl Fn(usize) -> f64) -> Vec<Reading> {
        (0..n)
            .map(|i| Reading::new(start() + TimeDelta::minutes(i as i64), f(i), 50.0 + f(i) / 10.0))
            .collect()
    }

    fn target(n: usize) -> NonZero<usize> {
        NonZero::new(n).unwrap()
    }

    #[test]
    fn test_sample_weight() {
        assert_eq!(sample_weight(0), 1.0);
        assert!((sample_weight(1) - 0.7).abs() < 1e-12);
        assert!((sample_weight(2) - 0.4).abs() < 1e-12);
        assert!((sample_weight(3) - MIN_WEIGHT).abs() < 1e-12);
        assert_eq!(sample_weight(4), MIN_WEIGHT);
        assert_eq!(sample_weight(50), MIN_WEIGHT);
    }

    #[test]
    fn test_fast_path_returns_everything() {
        let readings = series(10, |i| 20.0 + i as f64 * 0.123);
        let points = sample(&readings, DisplayClass::Narrow, 24);

        assert_eq!(points.len(), readings.len());
        for (p, r) in points.iter().zip(&readings) {
            assert_eq!(p.temperature, round1(r.temperature));
            assert_eq!(p.timestamp, r.timestamp);
        }
    }

    #[test]
    fn test_length_matches_target() {
        let readings = series(1440, |i| (i as f64 / 60.0).sin() * 5.0 + 20.0);
        let points = sample(&readings, DisplayClass::Narrow, 24);
        assert_eq!(points.len(), 36);
        assert!(points.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_endpoints_are_exact() {
        let readings = series(1000, |i| ((i * 7919) % 97) as f64 / 3.0);
        let points = sample(&readings, DisplayClass::Medium, 12);
        let first = points.first().unwrap();
        let last = points.last().unwrap();

        assert_eq!(first.temperature, round1(readings[0].temperature));
        assert_eq!(last.temperature, round1(readings[999].temperature));
        assert_eq!(first.humidity, round1(readings[0].humidity));
        assert_eq!(last.humidity, round1(readings[999].humidity));
        assert_eq!(first.timestamp, readings[0].timestamp);
        assert_eq!(last.timestamp, readings[999].timestamp);
        assert_eq!(first.source_count, 1);
    }

    #[test]
    fn test_symmetric_window_on_ramp() {
        // step 11, radius 5: the second pick is index 11 over 6..=16
        let readings = series(100, |i| i as f64);
        let points = uniform_sample(&readings, target(10));

        assert_eq!(points[1].temperature, 11.0);
        assert_eq!(points[1].humidity, 51.1);
        assert_eq!(points[1].timestamp, readings[11].timestamp);
        assert_eq!(points[1].source_count, 11);
    }

    #[test]
    fn test_spike_is_damped() {
        let readings = series(100, |i| if i == 11 { 30.0 } else { 20.0 });
        let points = uniform_sample(&readings, target(10));
        // 20 + 10 / (1 + 2 * (0.7 + 0.4 + 0.1 * 3))
        assert_eq!(points[1].temperature, 22.6);
        // humidity follows at a tenth of the amplitude: 52 + 1 / 3.8
        assert_eq!(points[1].humidity, 52.3);
        assert_eq!(points[2].humidity, 52.0);
    }

    #[test]
    fn test_single_target() {
        let readings = series(50, |i| i as f64);
        let points = uniform_sample(&readings, target(1));
        assert_eq!(points, vec![readings[0].to_point()]);
    }

    #[test]
    fn test_empty() {
        assert!(sample(&[], DisplayClass::Narrow, 24).is_empty());
        assert!(uniform_sample(&[], target(5)).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let readings = series(777, |i| (i as f64).sqrt());
        assert_eq!(
            sample(&readings, DisplayClass::Narrow, 48),
            sample(&readings, DisplayClass::Narrow, 48)
        );
    }
}
