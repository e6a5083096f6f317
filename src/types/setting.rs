// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Setting entries exchanged with `get_setting` / `set_setting`.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Setting type codes understood by this library.
///
/// The firmware knows more codes; only the switch and the LED are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingType {
    /// Outlet relay.
    Socket,
    /// Outlet status LED.
    Led,
}

impl SettingType {
    /// Returns the numeric code used on the wire.
    #[must_use]
    pub const fn code(&self) -> u32 {
        match self {
            Self::Socket => 16,
            Self::Led => 41,
        }
    }

    /// Maps a wire code back to a type.
    #[must_use]
    pub const fn from_code(code: u64) -> Option<Self> {
        match code {
            16 => Some(Self::Socket),
            41 => Some(Self::Led),
            _ => None,
        }
    }
}

/// One entry of a `setting` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    /// Wire type code.
    #[serde(rename = "type")]
    pub kind: u32,
    /// Outlet index, zero-based.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<usize>,
    /// Carries the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SettingMetadata>,
}

/// Metadata of a setting entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingMetadata {
    /// Raw value, `1` for on and `0` for off.
    pub value: Value,
}

impl Setting {
    /// Builds the single entry sent by `set_setting`.
    #[must_use]
    pub fn set(kind: SettingType, idx: usize, on: bool) -> Self {
        Self {
            kind: kind.code(),
            idx: Some(idx),
            metadata: Some(SettingMetadata {
                value: json!(u8::from(on)),
            }),
        }
    }

    /// Builds the entry sent by `get_setting`.
    #[must_use]
    pub fn query(kind: SettingType) -> Self {
        Self {
            kind: kind.code(),
            idx: None,
            metadata: None,
        }
    }

    /// Interprets the value as a boolean.
    ///
    /// Numbers are on when non-zero; booleans and `"1"`/`"true"` strings are
    /// accepted too.
    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        self.metadata.as_ref().and_then(|m| value_as_bool(&m.value))
    }
}

/// Interprets a JSON value the way the device encodes switch states.
#[must_use]
pub fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
