// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! Changes come from `event` frames the plug pushes when an outlet or its
//! LED is switched, whether by this client, another app, or the button.
//!
//! # Examples
//!
//! ```
//! use dlink_dsp::state::{StateChange, SwitchState};
//! use dlink_dsp::types::ModelVariant;
//!
//! let mut state = SwitchState::new(ModelVariant::Multi);
//!
//! // Apply returns true if state actually changed
//! assert!(state.apply(&StateChange::socket(2, true)));
//! assert!(!state.apply(&StateChange::socket(2, true)));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{SettingType, value_as_bool};

/// A change of one outlet or LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateChange {
    /// An outlet relay switched.
    Socket {
        /// Zero-based outlet index.
        index: usize,
        /// New state.
        on: bool,
    },
    /// An outlet LED switched.
    Led {
        /// Zero-based outlet index.
        index: usize,
        /// New state.
        on: bool,
    },
}

impl StateChange {
    /// Creates an outlet change.
    #[must_use]
    pub const fn socket(index: usize, on: bool) -> Self {
        Self::Socket { index, on }
    }

    /// Creates an LED change.
    #[must_use]
    pub const fn led(index: usize, on: bool) -> Self {
        Self::Led { index, on }
    }

    /// Returns the outlet index.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Socket { index, .. } | Self::Led { index, .. } => *index,
        }
    }

    /// Returns the new state.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        match self {
            Self::Socket { on, .. } | Self::Led { on, .. } => *on,
        }
    }

    /// Extracts a change from a pushed `event` frame.
    ///
    /// The metadata is read from `event.metadata`, falling back to a
    /// top-level `metadata` object. Returns `None` for frames that are not
    /// events or that describe an unsupported setting type.
    #[must_use]
    pub fn from_event(frame: &Value) -> Option<Self> {
        if frame.get("command").and_then(Value::as_str) != Some("event") {
            return None;
        }

        let metadata = frame
            .get("event")
            .and_then(|e| e.get("metadata"))
            .or_else(|| frame.get("metadata"))?;

        let kind = SettingType::from_code(metadata.get("type")?.as_u64()?)?;
        let index = usize::try_from(metadata.get("idx").and_then(Value::as_u64).unwrap_or(0)).ok()?;
        let on = value_as_bool(metadata.get("value")?)?;

        Some(match kind {
            SettingType::Socket => Self::socket(index, on),
            SettingType::Led => Self::led(index, on),
        })
    }
}
