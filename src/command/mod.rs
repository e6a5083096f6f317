// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command payloads for the plug's JSON API.
//!
//! Every request is a JSON object with a `command` field plus
//! command-specific fields. The command channel wraps the payload in the
//! common envelope (sequence id, timestamp, token) before sending it.
//!
//! # Available Commands
//!
//! | Command Type | `command` | Purpose |
//! |-------------|-----------|---------|
//! | [`SignInCommand`] | `sign_in` | Start the authenticated session |
//! | [`SettingCommand::Get`] | `get_setting` | Read outlet states |
//! | [`SettingCommand::Set`] | `set_setting` | Switch an outlet or LED |
//!
//! # Examples
//!
//! ```
//! use dlink_dsp::command::{Command, SettingCommand};
//! use dlink_dsp::types::SettingType;
//!
//! let cmd = SettingCommand::set(SettingType::Socket, 0, true);
//! assert_eq!(cmd.name(), "set_setting");
//!
//! let payload = cmd.payload();
//! assert_eq!(payload["command"], "set_setting");
//! assert_eq!(payload["setting"][0]["metadata"]["value"], 1);
//! ```

mod setting;
mod sign_in;

pub use setting::SettingCommand;
pub use sign_in::{SIGN_IN_SCOPES, SignInCommand};

use serde_json::{Map, Value};

/// Payload carried by keepalive ping frames.
pub const KEEP_ALIVE_PAYLOAD: &str = r#"{"command":"keep_alive"}"#;

/// A request that can be sent to the plug.
pub trait Command {
    /// Returns the value of the `command` field.
    fn name(&self) -> &'static str;

    /// Returns the command-specific fields, without `command`.
    fn fields(&self) -> Map<String, Value>;

    /// Returns the complete payload, `command` included.
    fn payload(&self) -> Map<String, Value> {
        let mut payload = self.fields();
        payload.insert("command".to_string(), Value::from(self.name()));
        payload
    }
}
