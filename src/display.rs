//! Display-size classes and everything derived from them: how many points a
//! chart may show and how the chart should be styled.

use std::num::NonZero;

use serde::{Deserialize, Serialize};

/// Breakpoint category of the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayClass {
    Narrow,
    Medium,
    Wide,
}

/// Inclusive upper pixel widths of the narrow and medium classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoints {
    pub narrow: u32,
    pub medium: u32,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            narrow: 480,
            medium: 768,
        }
    }
}

/// Point density a display class can carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingProfile {
    pub points_per_hour: f64,
    pub min_points: usize,
}

const NARROW: SamplingProfile = SamplingProfile {
    points_per_hour: 1.5,
    min_points: 12,
};
const MEDIUM: SamplingProfile = SamplingProfile {
    points_per_hour: 2.5,
    min_points: 18,
};
const WIDE: SamplingProfile = SamplingProfile {
    points_per_hour: 3.5,
    min_points: 24,
};

/// Never fewer than this many points per two-hour span.
const POINTS_PER_TWO_HOURS: usize = 3;

impl DisplayClass {
    pub fn from_width(width_px: u32, breakpoints: &Breakpoints) -> Self {
        if width_px <= breakpoints.narrow {
            DisplayClass::Narrow
        } else if width_px <= breakpoints.medium {
            DisplayClass::Medium
        } else {
            DisplayClass::Wide
        }
    }

    pub fn profile(self) -> SamplingProfile {
        match self {
            DisplayClass::Narrow => NARROW,
            DisplayClass::Medium => MEDIUM,
            DisplayClass::Wide => WIDE,
        }
    }

    /// Number of points a chart of `window_hours` may show on this class.
    pub fn target_points(self, window_hours: u32) -> NonZero<usize> {
        let profile = self.profile();
        let by_rate = ((f64::from(window_hours) * profile.points_per_hour).ceil() as usize)
            .max(profile.min_points);
        let by_span = (window_hours as usize).div_ceil(2) * POINTS_PER_TWO_HOURS;
        NonZero::new(by_rate.max(by_span)).unwrap_or(NonZero::<usize>::MIN)
    }
}

/// Chart styling for one render. Built fresh for every computation; nothing
/// about it is shared between renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderStyle {
    /// Bezier curve tension
    pub tension: f64,
    pub point_radius: f64,
    pub point_hover_radius: f64,
    pub line_width: f64,
    /// Upper bound on x-axis tick labels
    pub max_ticks: usize,
    pub legend_padding: u32,
    pub legend_font_size: u32,
    /// Vertical grid lines
    pub x_grid: bool,
    pub y_grid_line_width: f64,
    /// strftime pattern for x-axis labels
    pub time_format: &'static str,
}

impl RenderStyle {
    pub fn new(constrained: bool, point_count: usize) -> Self {
        if constrained {
            Self {
                tension: 0.6,
                point_radius: 2.0,
                point_hover_radius: 4.0,
                line_width: 2.0,
                max_ticks: (point_count / 4).clamp(3, 6),
                legend_padding: 15,
                legend_font_size: 12,
                x_grid: false,
                y_grid_line_width: 0.5,
                time_format: "%H:%M",
            }
        } else {
            Self {
                tension: 0.4,
                point_radius: 4.0,
                point_hover_radius: 6.0,
                line_width: 3.0,
                max_ticks: 8,
                legend_padding: 20,
                legend_font_size: 13,
                x_grid: true,
                y_grid_line_width: 1.0,
                time_format: "%H:%M:%S",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_width_breakpoints() {
        let bp = Breakpoints::default();
        assert_eq!(DisplayClass::from_width(320, &bp), DisplayClass::Narrow);
        assert_eq!(DisplayClass::from_width(480, &bp), DisplayClass::Narrow);
        assert_eq!(DisplayClass::from_width(481, &bp), DisplayClass::Medium);
        assert_eq!(DisplayClass::from_width(768, &bp), DisplayClass::Medium);
        assert_eq!(DisplayClass::from_width(769, &bp), DisplayClass::Wide);
    }

    #[test]
    fn test_target_points() {
        assert_eq!(DisplayClass::Narrow.target_points(24).get(), 36);
        assert_eq!(DisplayClass::Medium.target_points(24).get(), 60);
        assert_eq!(DisplayClass::Wide.target_points(24).get(), 84);
        assert_eq!(DisplayClass::Medium.target_points(48).get(), 120);
    }

    #[test]
    fn test_target_points_floors() {
        // class minimum
        assert_eq!(DisplayClass::Narrow.target_points(1).get(), 12);
        assert_eq!(DisplayClass::Medium.target_points(2).get(), 18);
        assert_eq!(DisplayClass::Wide.target_points(0).get(), 24);
        // three points per two-hour span beats ceil(25 * 1.5) = 38
        assert_eq!(DisplayClass::Narrow.target_points(25).get(), 39);
    }

    #[test]
    fn test_render_style_constrained_ticks() {
        assert_eq!(RenderStyle::new(true, 4).max_ticks, 3);
        assert_eq!(RenderStyle::new(true, 20).max_ticks, 5);
        assert_eq!(RenderStyle::new(true, 200).max_ticks, 6);
        assert_eq!(RenderStyle::new(false, 4).max_ticks, 8);
        assert!(!RenderStyle::new(true, 10).x_grid);
        assert!(RenderStyle::new(false, 10).x_grid);
    }
}
