//! Sequential replay of movement records against the ingestion API.
//!
//! The replay client submits each record through a [`MovementTransport`],
//! pauses for a fixed delay, and converts every per-record failure into a
//! result entry so the loop never aborts. Transport and sleeping are
//! capability traits so tests can substitute deterministic stand-ins.

use std::io::Write;
use std::time::Duration;

use serde::ser::Serializer;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::record::MovementRecord;

/// Records processed between progress notices.
const PROGRESS_INTERVAL: usize = 100;

/// Default pause between consecutive requests.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);

/// Successful reply from the ingestion API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    /// HTTP status code returned by the API.
    pub status: u16,
    /// Parsed JSON response body.
    pub body: Value,
}

/// Submits one movement record to the ingestion API.
pub trait MovementTransport {
    /// Posts the record and returns the status and parsed JSON body.
    ///
    /// Any HTTP status counts as a reply; only failures to send the request
    /// or to decode the body as JSON are errors.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the request cannot be completed or
    /// the response body is not JSON.
    fn submit(&self, movement: &MovementRecord) -> Result<TransportReply, TransportError>;
}

/// Blocking pause between requests.
pub trait ReplaySleeper {
    /// Sleeps for the given duration.
    fn sleep(&self, duration: Duration);
}

/// Thread-blocking sleeper used outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl ReplaySleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Outcome status for one replayed record.
///
/// Serializes as the numeric HTTP code on success and the literal string
/// `"error"` on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayStatus {
    /// The request completed with this HTTP status code.
    Code(u16),
    /// The request failed before a JSON reply was available.
    Error,
}

impl Serialize for ReplayStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Code(code) => serializer.serialize_u16(*code),
            Self::Error => serializer.serialize_str("error"),
        }
    }
}

/// Result entry for one replayed movement.
///
/// Exactly one of `response` and `error` is present, matching `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayRecord {
    /// The movement that was submitted.
    pub movement: MovementRecord,
    /// Numeric HTTP status, or the literal `"error"`.
    pub status: ReplayStatus,
    /// Parsed JSON response body; present on success only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    /// Failure message; present on failure only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplayRecord {
    fn success(movement: MovementRecord, reply: TransportReply) -> Self {
        Self {
            movement,
            status: ReplayStatus::Code(reply.status),
            response: Some(reply.body),
            error: None,
        }
    }

    fn failure(movement: MovementRecord, error: &TransportError) -> Self {
        Self {
            movement,
            status: ReplayStatus::Error,
            response: None,
            error: Some(error.to_string()),
        }
    }
}

/// Sequential, best-effort replay client.
///
/// Processing is fully synchronous: one request, one sleep, next record.
/// Total wall time is roughly `records x (request latency + delay)`.
pub struct ReplayClient {
    transport: Box<dyn MovementTransport>,
    sleeper: Box<dyn ReplaySleeper>,
    delay: Duration,
}

impl ReplayClient {
    /// Creates a client over the given transport with a thread sleeper.
    #[must_use]
    pub fn new(transport: Box<dyn MovementTransport>, delay: Duration) -> Self {
        Self::with_sleeper(transport, Box::new(ThreadSleeper), delay)
    }

    /// Creates a client with an explicit sleeper.
    #[must_use]
    pub fn with_sleeper(
        transport: Box<dyn MovementTransport>,
        sleeper: Box<dyn ReplaySleeper>,
        delay: Duration,
    ) -> Self {
        Self {
            transport,
            sleeper,
            delay,
        }
    }

    /// Submits every record in order and returns one result entry each.
    ///
    /// Failures are captured per record; the loop never retries and never
    /// aborts. A progress notice is written to `progress` every 100 records.
    pub fn replay(
        &self,
        movements: &[MovementRecord],
        progress: &mut dyn Write,
    ) -> Vec<ReplayRecord> {
        let total = movements.len();
        let mut results = Vec::with_capacity(total);

        for (index, movement) in movements.iter().enumerate() {
            let result = match self.transport.submit(movement) {
                Ok(reply) => {
                    debug!(status = reply.status, "movement submitted");
                    ReplayRecord::success(movement.clone(), reply)
                }
                Err(error) => {
                    warn!(%error, "movement submission failed");
                    ReplayRecord::failure(movement.clone(), &error)
                }
            };
            results.push(result);

            let processed = index + 1;
            if processed.is_multiple_of(PROGRESS_INTERVAL) {
                write_notice(progress, &format!("Processed {processed}/{total} movements"));
            }

            self.sleeper.sleep(self.delay);
        }

        results
    }
}

/// Writes a console notice, ignoring sink failures.
pub(crate) fn write_notice(out: &mut dyn Write, message: &str) {
    if let Err(error) = writeln!(out, "{message}") {
        drop(error);
    }
}
