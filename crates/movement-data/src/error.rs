//! Error types for the movement-data crate.
//!
//! This module defines semantic error enums for output-file writes and the
//! replay transport, following the project's error handling conventions with
//! `thiserror`.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors writing generated datasets or replay results to disk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    /// The value could not be serialized to JSON.
    #[error("failed to serialize output JSON: {message}")]
    Serialize {
        /// Description of the serialization failure.
        message: String,
    },

    /// The output file could not be written.
    #[error("failed to write output file at '{path}': {message}")]
    WriteError {
        /// Path to the output file.
        path: Utf8PathBuf,
        /// Description of the I/O error.
        message: String,
    },
}

/// Errors surfaced by a movement transport.
///
/// Every variant is converted into a per-record replay result; none aborts
/// the replay loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The ingestion endpoint could not be derived from the configured base
    /// URL.
    #[error("invalid endpoint derived from '{value}': {message}")]
    InvalidEndpoint {
        /// The configured base URL.
        value: String,
        /// Description of the URL error.
        message: String,
    },

    /// The request timed out.
    #[error("request timed out: {message}")]
    Timeout {
        /// Description of the timeout.
        message: String,
    },

    /// The request could not be completed.
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The response body was not valid JSON.
    #[error("failed to decode response: {message}")]
    Decode {
        /// Description of the decode failure, with a body excerpt.
        message: String,
    },
}
