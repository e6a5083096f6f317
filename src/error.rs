// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `dlink_dsp` library.
//!
//! Failures are grouped by where they happen: the secure socket transport,
//! the sign-in handshake, the device API itself, the remote shell scraper
//! and JSON parsing.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The secure socket failed, closed, or could not be opened.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The device answered the sign-in request with something unexpected.
    #[error("handshake failed: {message} (response: {response})")]
    Handshake {
        /// What was wrong with the reply.
        message: String,
        /// The raw reply, kept for diagnosis.
        response: String,
    },

    /// The device rejected a command.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Scraping a value over the remote shell failed.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// A response could not be interpreted.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The operation needs a completed `login`.
    #[error("device is not connected")]
    NotConnected,

    /// A socket or LED index beyond what the model provides.
    #[error("index {index} is out of range for a device with {count} outlets")]
    InvalidIndex {
        /// The requested index.
        index: usize,
        /// Number of outlets of the configured model.
        count: usize,
    },
}

/// Errors raised by the secure socket transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The peer or the local side closed the connection.
    #[error("connection closed (code {code}): {reason}")]
    Closed {
        /// WebSocket close code, `1006` when no close frame was received.
        code: u16,
        /// Close reason sent by the peer.
        reason: String,
    },

    /// A socket-level error occurred on an open connection.
    #[error("socket error: {0}")]
    Socket(String),

    /// The target address could not be turned into a URL.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The channel is not open.
    #[error("channel is not open")]
    NotOpen,

    /// The channel already went through a connection attempt.
    #[error("channel was already opened once")]
    AlreadyUsed,

    /// A bounded wait expired.
    #[error("request timed out after {0} ms")]
    Timeout(u64),
}

/// Non-zero `code` returned by the device.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("device returned code {code}: {message}")]
pub struct ApiError {
    /// Numeric code reported by the device.
    pub code: i64,
    /// Message reported by the device, if any.
    pub message: String,
}

impl ApiError {
    /// Device code for a rejected token on setting queries.
    pub const DEVICE_FORBIDDEN: i64 = 424;
    /// Generic "forbidden / invalid credentials" code.
    pub const FORBIDDEN: i64 = 403;

    /// Creates a new API error.
    #[must_use]
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Maps the device-specific 424 onto 403, leaving other codes untouched.
    #[must_use]
    pub fn remap_forbidden(mut self) -> Self {
        if self.code == Self::DEVICE_FORBIDDEN {
            self.code = Self::FORBIDDEN;
        }
        self
    }
}

/// Errors raised while scraping a value over the remote shell.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The marker was seen but the expected key was not found.
    #[error("key {key} not found in scraped text")]
    KeyNotFound {
        /// The key that was looked for.
        key: String,
        /// The captured text.
        text: String,
    },

    /// The shell session ended before the marker was observed.
    #[error("remote shell ended before the target was found")]
    SessionEnded,

    /// A bounded wait expired.
    #[error("remote shell timed out after {0} ms")]
    Timeout(u64),

    /// The shell connection failed.
    #[error("remote shell I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to parsing device responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
