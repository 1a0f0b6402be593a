//! Reqwest-backed movement transport adapter.
//!
//! This adapter owns transport details only: request serialization, timeout,
//! and JSON decoding of replies into [`TransportReply`] values.

use std::time::Duration;

use reqwest::blocking::Client;
use url::Url;

use crate::error::TransportError;
use crate::record::MovementRecord;
use crate::replay::{MovementTransport, TransportReply};

/// Path of the ingestion endpoint below the API base URL.
const MOVEMENTS_PATH: &str = "api/v1/movements";

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest response excerpt quoted in decode errors.
const PREVIEW_CHAR_LIMIT: usize = 160;

/// Movement transport that POSTs each record to one HTTP endpoint.
pub struct HttpMovementTransport {
    client: Client,
    endpoint: Url,
}

impl HttpMovementTransport {
    /// Builds a transport for the given API base URL with the default
    /// request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the endpoint cannot be derived from
    /// the base URL or the HTTP client cannot be constructed.
    pub fn new(base_url: &Url) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Builds a transport with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the endpoint cannot be derived from
    /// the base URL or the HTTP client cannot be constructed.
    pub fn with_timeout(base_url: &Url, timeout: Duration) -> Result<Self, TransportError> {
        let endpoint = join_movements_path(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| TransportError::Transport {
                message: error.to_string(),
            })?;
        Ok(Self { client, endpoint })
    }

    /// Returns the fully resolved ingestion endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl MovementTransport for HttpMovementTransport {
    fn submit(&self, movement: &MovementRecord) -> Result<TransportReply, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(movement)
            .send()
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().map_err(map_transport_error)?;
        let parsed =
            serde_json::from_slice(body.as_ref()).map_err(|error| TransportError::Decode {
                message: format!("invalid JSON reply ({error}): {}", body_preview(body.as_ref())),
            })?;

        Ok(TransportReply {
            status,
            body: parsed,
        })
    }
}

/// Derives the ingestion endpoint from the configured base URL.
///
/// `Url::join` treats a base without a trailing slash as a file, so one is
/// appended first to keep any base path intact.
fn join_movements_path(base_url: &Url) -> Result<Url, TransportError> {
    let invalid = |message: String| TransportError::InvalidEndpoint {
        value: base_url.to_string(),
        message,
    };

    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(MOVEMENTS_PATH).map_err(|error| invalid(error.to_string()))
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            message: error.to_string(),
        }
    } else {
        TransportError::Transport {
            message: error.to_string(),
        }
    }
}

/// Compacts and truncates a response body for error messages.
fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
