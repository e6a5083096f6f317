// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `get_setting` and `set_setting` requests.

use serde_json::{Map, Value};

use super::Command;
use crate::types::{Setting, SettingType};

/// Reads or writes outlet settings.
///
/// # Examples
///
/// ```
/// use dlink_dsp::command::{Command, SettingCommand};
/// use dlink_dsp::types::SettingType;
///
/// let get = SettingCommand::get(SettingType::Socket);
/// assert_eq!(get.payload()["setting"][0]["type"], 16);
///
/// let led = SettingCommand::set(SettingType::Led, 3, false);
/// assert_eq!(led.payload()["setting"][0]["idx"], 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SettingCommand {
    /// Query every entry of a type.
    Get(SettingType),
    /// Write one entry.
    Set(Setting),
}

impl SettingCommand {
    /// Creates a query for all entries of `kind`.
    #[must_use]
    pub const fn get(kind: SettingType) -> Self {
        Self::Get(kind)
    }

    /// Creates a write switching entry `idx` of `kind`.
    #[must_use]
    pub fn set(kind: SettingType, idx: usize, on: bool) -> Self {
        Self::Set(Setting::set(kind, idx, on))
    }
}

impl Command for SettingCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::Get(_) => "get_setting",
            Self::Set(_) => "set_setting",
        }
    }

    fn fields(&self) -> Map<String, Value> {
        let entry = match self {
            Self::Get(kind) => Setting::query(*kind),
            Self::Set(setting) => setting.clone(),
        };
        let mut fields = Map::new();
        fields.insert(
            "setting".to_string(),
            Value::Array(vec![serde_json::to_value(entry).unwrap_or(Value::Null)]),
        );
        fields
    }
}
