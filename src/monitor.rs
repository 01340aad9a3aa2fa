//! Live recomputation loop.
//!
//! The monitor owns the readings of the selected window and republishes a
//! chart whenever something that affects it changes: a live reading arrives,
//! the window changes, or the display settles into a different width class.
//! Every recomputation works on its own snapshot of the readings, and a
//! failed reload leaves the last published chart in place.

use anyhow::Result;
use chrono::TimeZone;
use tokio::sync::mpsc;

use crate::debounce::Debouncer;
use crate::display::DisplayClass;
use crate::engine::{Engine, ResultBundle};
use crate::events::{LatestReading, Message, Update};
use crate::history::ReadingHistory;
use crate::reading::Reading;
use crate::stats::{StatisticsPanel, Trend};
use crate::store::SharedStore;

pub struct Monitor<Tz: TimeZone> {
    engine: Engine<Tz>,
    store: SharedStore,
    history: ReadingHistory,
    window_hours: u32,
    width_px: u32,
    display: DisplayClass,
    locale: Option<String>,
    resize: Debouncer<u32>,
    statistics: StatisticsPanel,
    latest: Option<Reading>,
    current: Option<ResultBundle>,
    updates: mpsc::Sender<Update>,
}

impl<Tz> Monitor<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
{
    pub fn new(
        engine: Engine<Tz>,
        store: SharedStore,
        window_hours: u32,
        width_px: u32,
        updates: mpsc::Sender<Update>,
    ) -> Self {
        let display = engine.display_class(width_px);
        let resize = Debouncer::new(engine.config().debounce());
        Self {
            engine,
            store,
            history: ReadingHistory::new(window_hours),
            window_hours,
            width_px,
            display,
            locale: None,
            resize,
            statistics: StatisticsPanel::new(),
            latest: None,
            current: None,
            updates,
        }
    }

    /// The most recently published chart
    pub fn current(&self) -> Option<&ResultBundle> {
        self.current.as_ref()
    }

    /// Last applied (debounced) surface width
    pub fn width_px(&self) -> u32 {
        self.width_px
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Loads the initial window, then processes messages until the sender
    /// side closes or nobody is listening for updates anymore. Returns the
    /// monitor in its final state.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Message>) -> Result<Self> {
        self.load_window(self.window_hours).await?;

        loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some(message) => self.process_message(message).await?,
                    None => break,
                },
                width_px = self.resize.ready() => self.apply_width(width_px).await?,
            }
        }

        if self.resize.is_pending() {
            tracing::debug!("discarding pending resize on shutdown");
        }
        Ok(self)
    }

    async fn process_message(&mut self, message: Message) -> Result<()> {
        match message {
            Message::Reading(reading) => {
                self.publish_latest(reading).await?;
                self.history.push(reading);
                self.recompute().await?;
            }
            Message::Resize(width_px) => self.resize.push(width_px),
            Message::Window(hours) => self.load_window(hours).await?,
            Message::Locale(tag) => {
                tracing::debug!(locale = %tag, "locale changed");
                self.locale = Some(tag);
            }
        }
        Ok(())
    }

    async fn publish_latest(&mut self, reading: Reading) -> Result<()> {
        let config = self.engine.config();
        let (temperature_trend, humidity_trend) = match &self.latest {
            Some(prev) => (
                Some(Trend::between(
                    prev.temperature,
                    reading.temperature,
                    config.temperature_trend_threshold,
                )),
                Some(Trend::between(
                    prev.humidity,
                    reading.humidity,
                    config.humidity_trend_threshold,
                )),
            ),
            None => (None, None),
        };
        self.latest = Some(reading);

        self.updates
            .send(Update::Latest(LatestReading {
                reading,
                temperature_trend,
                humidity_trend,
            }))
            .await?;
        Ok(())
    }

    async fn apply_width(&mut self, width_px: u32) -> Result<()> {
        self.width_px = width_px;
        let class = self.engine.display_class(width_px);
        if class == self.display {
            tracing::debug!(width_px, ?class, "resize within display class");
            return Ok(());
        }

        tracing::info!(width_px, from = ?self.display, to = ?class, "display class changed");
        self.display = class;
        self.recompute().await
    }

    async fn load_window(&mut self, window_hours: u32) -> Result<()> {
        match self.store.readings(window_hours).await {
            Ok(readings) => {
                self.history = ReadingHistory::from_readings(readings, window_hours);
                self.window_hours = window_hours;
                self.recompute().await
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    window_hours,
                    current = self.window_hours,
                    "failed to load readings, keeping current chart"
                );
                Ok(())
            }
        }
    }

    async fn recompute(&mut self) -> Result<()> {
        let snapshot = self.history.snapshot();
        let mut bundle = self
            .engine
            .resample_for(&snapshot, self.window_hours, self.display);

        self.statistics.update(bundle.statistics);
        bundle.statistics = self.statistics.current().copied();

        self.current = Some(bundle.clone());
        self.updates.send(Update::Bundle(bundle)).await?;
        Ok(())
    }
}
