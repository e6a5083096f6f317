// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `sign_in` handshake request.

use serde_json::{Map, Value};

use super::Command;

/// Capability scopes the firmware expects in `sign_in`.
pub const SIGN_IN_SCOPES: &[&str] = &[
    "user",
    "device:status",
    "device:control",
    "viewing",
    "photo",
    "policy",
    "client",
    "event",
];

/// Opens the authenticated session. The reply carries `salt`, `device_id`
/// and `local_cid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInCommand {
    scopes: Vec<String>,
}

impl SignInCommand {
    /// Creates a sign-in request declaring the default scopes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: SIGN_IN_SCOPES.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Returns the declared scopes.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

impl Default for SignInCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for SignInCommand {
    fn name(&self) -> &'static str {
        "sign_in"
    }

    fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("scope".to_string(), Value::from(self.scopes.clone()));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_all_scopes() {
        let payload = SignInCommand::new().payload();
        let scopes = payload["scope"].as_array().unwrap();
        assert_eq!(scopes.len(), SIGN_IN_SCOPES.len());
        assert_eq!(scopes[1], "device:status");
    }

    #[test]
    fn default_declares_all_scopes() {
        assert_eq!(SignInCommand::default(), SignInCommand::new());
    }
}
