// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `get_setting` / `set_setting` reply parsing.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ParseError};
use crate::types::{Setting, SettingType};

/// Reply to a setting request.
///
/// The plug answers `{"code": 0, "setting": [...]}` on success and a
/// non-zero `code` with an optional `message` otherwise.
///
/// # Examples
///
/// ```
/// use dlink_dsp::response::SettingReply;
/// use serde_json::json;
///
/// let reply = SettingReply::parse(&json!({
///     "code": 0,
///     "setting": [{"type": 16, "idx": 0, "metadata": {"value": 1}}]
/// }))
/// .unwrap();
/// assert_eq!(reply.first_state().unwrap(), true);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SettingReply {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    setting: Vec<Setting>,
}

/// Why a reply was not accepted.
#[derive(Debug)]
pub enum ReplyError {
    /// The reply could not be read.
    Parse(ParseError),
    /// The plug reported an error code.
    Api(ApiError),
}

impl From<ReplyError> for crate::error::Error {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::Parse(e) => e.into(),
            ReplyError::Api(e) => e.into(),
        }
    }
}

impl ReplyError {
    /// Reports the plug's 424 as 403; see [`ApiError::remap_forbidden`].
    #[must_use]
    pub fn remap_forbidden(self) -> Self {
        match self {
            Self::Api(api) => Self::Api(api.remap_forbidden()),
            other => other,
        }
    }
}

impl SettingReply {
    /// Reads a reply and checks its `code`.
    ///
    /// # Errors
    ///
    /// Returns `ReplyError::Parse` if the reply has no `code` or is not
    /// shaped like a setting reply, and `ReplyError::Api` for a non-zero
    /// code. A missing `message` becomes `"unknown error"`.
    pub fn parse(value: &Value) -> Result<Self, ReplyError> {
        let reply = Self::deserialize(value)
            .map_err(|e| ReplyError::Parse(ParseError::Json(e)))?;
        match reply.code {
            None => Err(ReplyError::Parse(ParseError::MissingField("code".to_string()))),
            Some(0) => Ok(reply),
            Some(code) => Err(ReplyError::Api(ApiError::new(
                code,
                reply.message.as_deref().unwrap_or("unknown error"),
            ))),
        }
    }

    /// Returns the raw setting entries.
    #[must_use]
    pub fn settings(&self) -> &[Setting] {
        &self.setting
    }

    /// Returns the state echoed by the first entry.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if there is no entry or it has no
    /// boolean value.
    pub fn first_state(&self) -> Result<bool, ParseError> {
        self.setting
            .first()
            .and_then(Setting::is_on)
            .ok_or_else(|| ParseError::MissingField("setting[0].metadata.value".to_string()))
    }

    /// Returns the states of all entries of `kind`, ordered by `idx`.
    ///
    /// Entries without an `idx` keep their position in the reply. Values
    /// that are not booleans read as off.
    #[must_use]
    pub fn states(&self, kind: SettingType) -> Vec<bool> {
        let mut entries: Vec<(usize, bool)> = self
            .setting
            .iter()
            .filter(|s| s.kind == kind.code())
            .enumerate()
            .map(|(position, s)| (s.idx.unwrap_or(position), s.is_on().unwrap_or(false)))
            .collect();
        entries.sort_by_key(|(idx, _)| *idx);
        entries.into_iter().map(|(_, on)| on).collect()
    }

    /// Returns the state of the entry of `kind` with `idx == index`.
    ///
    /// Falls back to the entry at that position when no entry carries the
    /// index.
    #[must_use]
    pub fn state_at(&self, kind: SettingType, index: usize) -> Option<bool> {
        let mut of_kind = self.setting.iter().filter(|s| s.kind == kind.code());
        let by_idx = of_kind.clone().find(|s| s.idx == Some(index));
        by_idx
            .or_else(|| of_kind.nth(index).filter(|s| s.idx.is_none()))
            .and_then(Setting::is_on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_zero_code_is_api_error() {
        let err = SettingReply::parse(&json!({"code": 424, "message": "forbidden"})).unwrap_err();
        match err {
            ReplyError::Api(api) => {
                assert_eq!(api.code, 424);
                assert_eq!(api.message, "forbidden");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn remap_forbidden_keeps_message() {
        let err = SettingReply::parse(&json!({"code": 424, "message": "m"}))
            .unwrap_err()
            .remap_forbidden();
        assert!(matches!(err, ReplyError::Api(ref api) if api.code == 403 && api.message == "m"));
    }

    #[test]
    fn missing_message_is_unknown_error() {
        let err = SettingReply::parse(&json!({"code": 5})).unwrap_err();
        assert!(matches!(err, ReplyError::Api(ref api) if api.message == "unknown error"));
    }

    #[test]
    fn missing_code_is_parse_error() {
        let err = SettingReply::parse(&json!({"setting": []})).unwrap_err();
        assert!(matches!(
            err,
            ReplyError::Parse(ParseError::MissingField(ref f)) if f == "code"
        ));
    }

    #[test]
    fn states_sorted_by_idx() {
        let reply = SettingReply::parse(&json!({
            "code": 0,
            "setting": [
                {"type": 16, "idx": 2, "metadata": {"value": 1}},
                {"type": 41, "idx": 0, "metadata": {"value": 1}},
                {"type": 16, "idx": 0, "metadata": {"value": 1}},
                {"type": 16, "idx": 3, "metadata": {"value": 0}},
                {"type": 16, "idx": 1, "metadata": {"value": 0}}
            ]
        }))
        .unwrap();

        assert_eq!(reply.states(SettingType::Socket), vec![true, false, true, false]);
        assert_eq!(reply.state_at(SettingType::Socket, 2), Some(true));
        assert_eq!(reply.state_at(SettingType::Socket, 3), Some(false));
        assert_eq!(reply.state_at(SettingType::Socket, 7), None);
    }

    #[test]
    fn state_at_without_idx_uses_position() {
        let reply = SettingReply::parse(&json!({
            "code": 0,
            "setting": [{"type": 16, "metadata": {"value": 1}}]
        }))
        .unwrap();
        assert_eq!(reply.state_at(SettingType::Socket, 0), Some(true));
    }

    #[test]
    fn first_state_requires_entry() {
        let reply = SettingReply::parse(&json!({"code": 0})).unwrap();
        assert!(reply.first_state().is_err());
    }
}
