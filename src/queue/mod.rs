//! Message-queue boundary and event intake.
//!
//! [`QueuePublisher`] is the outbound seam for queue-backed targets.
//! The only bundled implementation, [`LoggingPublisher`], records the
//! publish instead of talking to a broker; a real AMQP client plugs in
//! behind the same trait. [`EventFeed`] is the inbound seam the run
//! loop consumes from, with [`JsonLineFeed`] reading one JSON event
//! per line.

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::dispatch::SourceEvent;

#[derive(Debug, thiserror::Error)]
#[error("publish to topic '{topic}' failed: {message}")]
pub struct PublishError {
    pub topic: String,
    pub message: String,
}

#[async_trait]
pub trait QueuePublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &Value) -> Result<(), PublishError>;
}

/// Stand-in publisher that logs the payload and reports success.
#[derive(Debug, Default)]
pub struct LoggingPublisher;

#[async_trait]
impl QueuePublisher for LoggingPublisher {
    async fn publish(&self, topic: &str, payload: &Value) -> Result<(), PublishError> {
        tracing::info!(topic = %topic, payload = %payload, "publish (logging backend)");
        Ok(())
    }
}

#[async_trait]
pub trait EventFeed: Send {
    /// Next event, or `None` when the feed is exhausted.
    async fn next_event(&mut self) -> Option<SourceEvent>;
}

/// Reads newline-delimited JSON events. Blank lines are skipped;
/// malformed lines are logged and skipped so one bad event cannot
/// stall the feed.
pub struct JsonLineFeed<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLineFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventFeed for JsonLineFeed<R> {
    async fn next_event(&mut self) -> Option<SourceEvent> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(error) => {
                    tracing::warn!(error = %error, "event feed read error, stopping");
                    return None;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SourceEvent>(&line) {
                Ok(event) => return Some(event),
                Err(error) => {
                    tracing::warn!(error = %error, "skipping malformed event line");
                }
            }
        }
    }
}
