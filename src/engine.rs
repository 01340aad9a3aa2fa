//! The resampling pipeline: picks a reduction strategy for a window and
//! display, runs it, and bundles the result for rendering.

use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::annotate::{Annotations, annotate_midnights};
use crate::bucket;
use crate::config::EngineConfig;
use crate::display::{DisplayClass, RenderStyle};
use crate::reading::{AggregatedPoint, Reading, sort_chronologically};
use crate::sampler;
use crate::stats::{Statistics, summarize};

/// How a reading set was reduced to chart points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Every reading, unsampled
    Raw,
    /// Mean per fixed-width bucket
    Buckets { minutes: u32 },
    /// Adaptive sampling down to at most `target` points
    Sampled { target: usize },
}

/// Everything the renderer needs for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultBundle {
    pub points: Vec<AggregatedPoint>,
    pub annotations: Annotations,
    /// Summary of the raw readings; `None` when there were none
    pub statistics: Option<Statistics>,
    pub display: DisplayClass,
    pub strategy: Strategy,
    pub style: RenderStyle,
}

/// Stateless resampling engine. Every call is a pure function of its
/// arguments, the config and the time zone.
#[derive(Debug, Clone)]
pub struct Engine<Tz: TimeZone> {
    config: EngineConfig,
    tz: Tz,
}

impl<Tz: TimeZone> Engine<Tz> {
    pub fn new(config: EngineConfig, tz: Tz) -> Self {
        Self { config, tz }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn display_class(&self, width_px: u32) -> DisplayClass {
        DisplayClass::from_width(width_px, &self.config.breakpoints)
    }

    pub fn strategy(&self, window_hours: u32, class: DisplayClass) -> Strategy {
        let constrained = self.config.is_constrained(class);
        if window_hours == self.config.short_window_hours {
            if constrained {
                Strategy::Buckets {
                    minutes: self.config.short_bucket_minutes,
                }
            } else {
                Strategy::Raw
            }
        } else if constrained {
            Strategy::Sampled {
                target: class.target_points(window_hours).get(),
            }
        } else {
            Strategy::Buckets {
                minutes: self.config.bucket_minutes,
            }
        }
    }

    /// Reduces `readings` for a chart `width_px` pixels wide showing the last
    /// `window_hours` hours.
    pub fn resample(&self, readings: &[Reading], window_hours: u32, width_px: u32) -> ResultBundle {
        self.resample_for(readings, window_hours, self.display_class(width_px))
    }

    pub fn resample_for(
        &self,
        readings: &[Reading],
        window_hours: u32,
        display: DisplayClass,
    ) -> ResultBundle {
        let mut sorted = readings.to_vec();
        sort_chronologically(&mut sorted);

        let strategy = self.strategy(window_hours, display);
        let points = match strategy {
            Strategy::Raw => sorted.iter().map(Reading::to_point).collect(),
            Strategy::Buckets { minutes } => bucket::aggregate(&sorted, minutes, &self.tz),
            Strategy::Sampled { .. } => sampler::sample(&sorted, display, window_hours),
        };

        let annotations =
            annotate_midnights(&points, self.config.boundary_tolerance_minutes, &self.tz);
        let statistics = summarize(&sorted);
        let style = RenderStyle::new(self.config.is_constrained(display), points.len());

        let class = display;
        tracing::info!(
            readings = readings.len(),
            points = points.len(),
            annotations = annotations.len(),
            window_hours,
            ?class,
            ?strategy,
            "resampled"
        );

        ResultBundle {
            points,
            annotations,
            statistics,
            display,
            strategy,
            style,
        }
    }
}

/// Resamples with the default config in the local time zone.
pub fn resample(readings: &[Reading], window_hours: u32, width_px: u32) -> ResultBundle {
    Engine::new(EngineConfig::default(), Local).resample(readings, window_hours, width_px)
}
