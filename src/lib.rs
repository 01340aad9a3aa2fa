//! Adaptive resampling of temperature and humidity readings for charts with a
//! bounded point budget.

pub mod annotate;
pub mod bucket;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod display;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod monitor;
pub mod reading;
pub mod sampler;
pub mod simulate;
pub mod stats;
pub mod store;

pub use config::EngineConfig;
pub use engine::{Engine, ResultBundle, Strategy, resample};
pub use error::{Error, Result};
pub use reading::{AggregatedPoint, Reading};
