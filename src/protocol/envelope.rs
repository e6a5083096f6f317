// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The common request envelope.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::session::Session;

/// Fields every request carries next to its payload.
///
/// `device_id` and `device_token` are only present once the handshake
/// completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Monotonic request id, echoed by the reply.
    pub sequence_id: u64,
    /// Client session tag.
    pub local_cid: Value,
    /// Unix seconds.
    pub timestamp: i64,
    /// Always empty.
    pub client_id: String,
    /// Device id learnt during the handshake.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Token derived from PIN, salt and device id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_token: Option<String>,
    /// The command payload.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    /// Wraps `payload`, taking the next sequence id from `session`.
    pub fn wrap(payload: Map<String, Value>, session: &mut Session) -> Self {
        let sequence_id = session.next_sequence();
        let device_id = session.device_id().map(str::to_string);
        let device_token = if device_id.is_some() {
            session.token()
        } else {
            None
        };

        Self {
            sequence_id,
            local_cid: session.local_cid().clone(),
            timestamp: chrono::Utc::now().timestamp(),
            client_id: String::new(),
            device_id,
            device_token,
            payload,
        }
    }

    /// Serializes to JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, ParseError> {
        serde_json::to_string(self).map_err(ParseError::Json)
    }
}
