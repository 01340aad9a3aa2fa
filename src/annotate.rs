//! Day-boundary markers for a rendered point sequence.

use std::collections::BTreeMap;

use chrono::{TimeZone, Timelike};
use serde::Serialize;

use crate::reading::AggregatedPoint;

/// Label drawn next to a day-boundary marker.
pub const MIDNIGHT_LABEL: &str = "00:00";

/// A vertical marker at a position in the point sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub index: usize,
    pub label: &'static str,
}

/// Annotations keyed by an id derived from the calendar date.
pub type Annotations = BTreeMap<String, Annotation>;

/// Marks the first point of each local date that falls within
/// `tolerance_minutes` after midnight. Dates with no such point get no marker.
pub fn annotate_midnights<Tz: TimeZone>(
    points: &[AggregatedPoint],
    tolerance_minutes: u32,
    tz: &Tz,
) -> Annotations {
    let mut annotations = Annotations::new();
    for (index, point) in points.iter().enumerate() {
        let local = point.timestamp.with_timezone(tz);
        if local.hour() != 0 || local.minute() > tolerance_minutes {
            continue;
        }
        annotations
            .entry(format!("midnight-{}", local.date_naive()))
            .or_insert(Annotation {
                index,
                label: MIDNIGHT_LABEL,
            });
    }
    annotations
}
