// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authentication token derivation.
//!
//! The device expects every post-handshake request to carry a token of the
//! form `<device_id>-<hex(sha1(pin || salt))>`.

use sha1::{Digest, Sha1};

/// Derives the device token from the PIN, the server salt and the device id.
///
/// Returns `None` until both `salt` and `device_id` are known.
///
/// # Examples
///
/// ```
/// use dlink_dsp::token::derive_token;
///
/// let token = derive_token("123456", Some("salt"), Some("AABBCCDDEEFF")).unwrap();
/// assert!(token.starts_with("AABBCCDDEEFF-"));
/// assert_eq!(derive_token("123456", None, Some("AABBCCDDEEFF")), None);
/// ```
#[must_use]
pub fn derive_token(pin: &str, salt: Option<&str>, device_id: Option<&str>) -> Option<String> {
    let (salt, device_id) = (salt?, device_id?);

    let mut hasher = Sha1::new();
    hasher.update(pin.as_bytes());
    hasher.update(salt.as_bytes());
    let digest = hex::encode(hasher.finalize());

    Some(format!("{device_id}-{digest}"))
}

/// Cached token that is recomputed only when its inputs change.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    inputs: Option<(String, String, String)>,
    token: Option<String>,
}

impl TokenCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the cached token.
    pub fn invalidate(&mut self) {
        self.inputs = None;
        self.token = None;
    }

    /// Returns the token for the given inputs, reusing the cached value when
    /// they match the last computation.
    pub fn get(&mut self, pin: &str, salt: Option<&str>, device_id: Option<&str>) -> Option<String> {
        let (Some(salt), Some(device_id)) = (salt, device_id) else {
            return None;
        };

        let fresh = match &self.inputs {
            Some((p, s, d)) => p != pin || s != salt || d != device_id,
            None => true,
        };
        if fresh {
            self.token = derive_token(pin, Some(salt), Some(device_id));
            self.inputs = Some((pin.to_string(), salt.to_string(), device_id.to_string()));
        }
        self.token.clone()
    }

    /// Returns the cached token without recomputing.
    #[must_use]
    pub fn cached(&self) -> Option<&str> {
        self.token.as_deref()
    }
}
