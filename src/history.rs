//! History tracking for live readings
//!
//! Holds the readings of the currently selected window in timestamp order.
//! Readings older than the window, measured back from the newest reading,
//! are evicted as new ones arrive.

use std::collections::VecDeque;

use chrono::TimeDelta;

use crate::reading::{Reading, sort_chronologically};

/// Readings within a trailing time window, oldest first
#[derive(Clone, Debug)]
pub struct ReadingHistory {
    data: VecDeque<Reading>,
    window: TimeDelta,
}

impl ReadingHistory {
    /// Create an empty history spanning `window_hours`
    pub fn new(window_hours: u32) -> Self {
        Self {
            data: VecDeque::new(),
            window: TimeDelta::hours(i64::from(window_hours)),
        }
    }

    /// Create a history seeded with `readings` in any order
    pub fn from_readings(mut readings: Vec<Reading>, window_hours: u32) -> Self {
        sort_chronologically(&mut readings);
        let mut history = Self {
            data: readings.into(),
            window: TimeDelta::hours(i64::from(window_hours)),
        };
        history.cleanup_old_data();
        history
    }

    /// Add a reading, keeping timestamp order. A reading that ties with
    /// existing ones goes after them.
    pub fn push(&mut self, reading: Reading) {
        match self.data.back() {
            Some(last) if last.timestamp > reading.timestamp => {
                let at = self
                    .data
                    .partition_point(|r| r.timestamp <= reading.timestamp);
                self.data.insert(at, reading);
            }
            _ => self.data.push_back(reading),
        }
        self.cleanup_old_data();
    }

    /// Change the retention window, evicting anything now outside it
    pub fn set_window_hours(&mut self, window_hours: u32) {
        self.window = TimeDelta::hours(i64::from(window_hours));
        self.cleanup_old_data();
    }

    /// Remove readings older than the window
    fn cleanup_old_data(&mut self) {
        let Some(newest) = self.data.back().map(|r| r.timestamp) else {
            return;
        };
        let cutoff = newest - self.window;

        while let Some(front) = self.data.front() {
            if front.timestamp < cutoff {
                self.data.pop_front();
            } else {
                break;
            }
        }
    }

    /// An independent copy of the current readings
    pub fn snapshot(&self) -> Vec<Reading> {
        self.data.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.data.back()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}
