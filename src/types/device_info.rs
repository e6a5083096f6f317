// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hardware metadata advertised by the plug.

use serde::{Deserialize, Serialize};

use super::ModelVariant;

/// Device metadata read from the plug's multicast-DNS service record.
///
/// Every field is optional because the record may omit any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// MAC address.
    pub mac: Option<String>,
    /// Model name, e.g. `DSP-W245`.
    pub model: Option<String>,
    /// Hardware revision.
    pub hw_ver: Option<String>,
    /// Firmware version.
    pub fw_ver: Option<String>,
    /// mydlink agent version.
    pub md_ver: Option<String>,
}

impl DeviceInfo {
    /// Returns the model variant implied by the model name, if known.
    #[must_use]
    pub fn variant(&self) -> Option<ModelVariant> {
        self.model.as_deref().map(ModelVariant::from_model_name)
    }

    /// Stores `value` under `key` when the key is one of the known fields.
    ///
    /// Returns `false` for keys that are ignored.
    pub fn set_field(&mut self, key: &str, value: &str) -> bool {
        let slot = match key {
            "mac" => &mut self.mac,
            "model" => &mut self.model,
            "hw_ver" => &mut self.hw_ver,
            "fw_ver" => &mut self.fw_ver,
            "md_ver" => &mut self.md_ver,
            _ => return false,
        };
        *slot = Some(value.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_field_ignores_unknown_keys() {
        let mut info = DeviceInfo::default();
        assert!(info.set_field("model", "DSP-W245"));
        assert!(!info.set_field("serial", "123"));
        assert_eq!(info.model.as_deref(), Some("DSP-W245"));
        assert_eq!(info.variant(), Some(ModelVariant::Multi));
    }
}
