//! Synthetic readings: a daily temperature cycle with humidity moving the
//! opposite way, plus uniform noise.

use std::f64::consts::TAU;

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use rand::Rng;

use crate::reading::Reading;

#[derive(Debug, Clone)]
pub struct Simulation {
    pub start: DateTime<Utc>,
    pub hours: u32,
    pub interval: TimeDelta,
    pub base_temperature: f64,
    /// Peak deviation from the base over a day
    pub temperature_swing: f64,
    pub base_humidity: f64,
    pub humidity_swing: f64,
    /// Half-width of the uniform noise added to both values
    pub noise: f64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            start: DateTime::<Utc>::default(),
            hours: 24,
            interval: TimeDelta::minutes(1),
            base_temperature: 22.0,
            temperature_swing: 4.0,
            base_humidity: 55.0,
            humidity_swing: 12.0,
            noise: 0.3,
        }
    }
}

/// Hour of day at which the cycle crosses its base on the way up.
const CYCLE_OFFSET_HOURS: f64 = 9.0;

impl Simulation {
    pub fn count(&self) -> usize {
        let step = self.interval.num_seconds().max(1);
        (i64::from(self.hours) * 3600 / step) as usize
    }

    /// Generates `count()` readings, or fewer if the series would run past
    /// the representable date range.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Vec<Reading> {
        let step = self.interval.num_seconds().max(1);
        let noise = self.noise.abs();
        let count = self.count();

        let readings: Vec<Reading> = (0..count)
            .map_while(|i| {
                let seconds = i64::try_from(i).ok()?.checked_mul(step)?;
                let timestamp = self
                    .start
                    .checked_add_signed(TimeDelta::try_seconds(seconds)?)?;
                let hour = f64::from(timestamp.num_seconds_from_midnight()) / 3600.0;
                let phase = ((hour - CYCLE_OFFSET_HOURS) / 24.0 * TAU).sin();

                let temperature =
                    self.base_temperature + self.temperature_swing * phase + rng.random_range(-noise..=noise);
                let humidity = (self.base_humidity - self.humidity_swing * phase
                    + rng.random_range(-noise..=noise))
                .clamp(0.0, 100.0);
                Some(Reading::new(timestamp, temperature, humidity))
            })
            .collect();

        if readings.len() < count {
            tracing::warn!(
                requested = count,
                generated = readings.len(),
                "simulation ran past the supported date range"
            );
        }
        readings
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn simulation() -> Simulation {
        Simulation {
            start: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            hours: 48,
            interval: TimeDelta::minutes(10),
            ..Default::default()
        }
    }

    #[test]
    fn test_count_and_order() {
        let readings = simulation().generate(&mut StdRng::seed_from_u64(7));
        assert_eq!(readings.len(), 288);
        assert!(readings.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(readings.iter().all(|r| (0.0..=100.0).contains(&r.humidity)));
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = simulation().generate(&mut StdRng::seed_from_u64(42));
        let b = simulation().generate(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_stops_at_end_of_date_range() {
        let sim = Simulation {
            hours: 4_000_000_000,
            interval: TimeDelta::seconds(4_000_000_000),
            ..simulation()
        };
        assert_eq!(sim.count(), 3600);

        let readings = sim.generate(&mut StdRng::seed_from_u64(1));
        assert!(!readings.is_empty());
        assert!(readings.len() < sim.count());
        assert!(readings.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_daily_cycle_without_noise() {
        let sim = Simulation {
            noise: 0.0,
            ..simulation()
        };
        let readings = sim.generate(&mut StdRng::seed_from_u64(0));
        // warmest at 15:00, coolest at 03:00
        let at = |h: usize| readings[h * 6].temperature;
        assert!((at(15) - 26.0).abs() < 1e-9);
        assert!((at(3) - 18.0).abs() < 1e-9);
        assert!(readings[15 * 6].humidity < readings[3 * 6].humidity);
    }
}
