// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsers for scraped file contents.

use crate::error::ExtractionError;
use crate::types::DeviceInfo;

/// Finds `key` in loosely JSON-shaped `"key":value` text.
///
/// The text is split on commas and newlines. For each piece the part before
/// the first colon is taken as the key (surrounding quotes and anything
/// before an opening quote dropped), the rest as the value with its quotes
/// stripped. Braces and shell noise around the pairs are tolerated.
///
/// # Errors
///
/// Returns `ExtractionError::KeyNotFound` when no piece has exactly `key`.
///
/// # Examples
///
/// ```
/// use dlink_dsp::telnet::token_from_config;
///
/// let text = r#"{"DeviceToken":"abc123","Other":1}"#;
/// assert_eq!(token_from_config(text, "DeviceToken").unwrap(), "abc123");
/// ```
pub fn token_from_config(text: &str, key: &str) -> Result<String, ExtractionError> {
    text.split([',', '\n'])
        .filter_map(|piece| piece.split_once(':'))
        .find_map(|(raw_key, raw_value)| {
            let name = raw_key.trim().trim_end_matches('"');
            let name = name.rsplit('"').next().unwrap_or(name);
            (name == key).then(|| unquote(raw_value))
        })
        .ok_or_else(|| ExtractionError::KeyNotFound {
            key: key.to_string(),
            text: text.to_string(),
        })
}

fn unquote(value: &str) -> String {
    value
        .trim()
        .trim_end_matches('}')
        .trim()
        .trim_matches('"')
        .to_string()
}

/// Collects the known `key=value` lines of a multicast-DNS service record.
///
/// The key is the last whitespace-separated word before `=`, so indented
/// or prefixed lines still match. Unknown keys are ignored.
///
/// # Examples
///
/// ```
/// use dlink_dsp::telnet::device_info_from_record;
///
/// let info = device_info_from_record("mac=B0:C5:54:00:11:22\nmodel=DSP-W245\nfoo=bar");
/// assert_eq!(info.mac.as_deref(), Some("B0:C5:54:00:11:22"));
/// assert_eq!(info.model.as_deref(), Some("DSP-W245"));
/// ```
#[must_use]
pub fn device_info_from_record(text: &str) -> DeviceInfo {
    let mut info = DeviceInfo::default();
    for line in text.lines() {
        let Some((raw_key, value)) = line.split_once('=') else {
            continue;
        };
        let Some(key) = raw_key.split_whitespace().next_back() else {
            continue;
        };
        info.set_field(key, value.trim());
    }
    info
}
