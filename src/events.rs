use async_trait::async_trait;
use chrono::TimeZone;
use extend::ext;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::SendError};

use crate::{
    engine::ResultBundle,
    error::Result,
    reading::{RawReading, Reading},
    stats::Trend,
};

/// Messages sent into the monitor
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A live reading was pushed by the ingestion side
    Reading(Reading),
    /// The render surface changed width (pixels)
    Resize(u32),
    /// A different time window (hours) was selected
    Window(u32),
    /// The display language changed; labels only, no recomputation
    Locale(String),
}

/// A [`Message`] as written on the wire, one JSON object per line, e.g.
/// `{"resize": 640}` or `{"reading": {"timestamp": ..., ...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Reading(RawReading),
    Resize(u32),
    Window(u32),
    Locale(String),
}

impl Command {
    pub fn into_message<Tz: TimeZone>(self, tz: &Tz) -> Result<Message> {
        Ok(match self {
            Command::Reading(raw) => Message::Reading(raw.into_reading(tz)?),
            Command::Resize(px) => Message::Resize(px),
            Command::Window(hours) => Message::Window(hours),
            Command::Locale(tag) => Message::Locale(tag),
        })
    }
}

/// The newest live reading and how it moved relative to the one before.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestReading {
    pub reading: Reading,
    /// `None` for the first reading seen
    pub temperature_trend: Option<Trend>,
    pub humidity_trend: Option<Trend>,
}

/// Updates published by the monitor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Update {
    /// A freshly computed chart
    Bundle(ResultBundle),
    Latest(LatestReading),
}

#[ext(name = MessageSenderExt)]
#[async_trait]
pub impl mpsc::Sender<Message> {
    async fn reading(&self, reading: Reading) -> std::result::Result<(), SendError<Message>> {
        self.send(Message::Reading(reading)).await
    }

    async fn resize(&self, width_px: u32) -> std::result::Result<(), SendError<Message>> {
        self.send(Message::Resize(width_px)).await
    }

    async fn window(&self, hours: u32) -> std::result::Result<(), SendError<Message>> {
        self.send(Message::Window(hours)).await
    }

    async fn locale(
        &self,
        tag: impl Into<String> + Send,
    ) -> std::result::Result<(), SendError<Message>> {
        self.send(Message::Locale(tag.into())).await
    }
}
