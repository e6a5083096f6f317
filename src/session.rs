// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device session record.
//!
//! One [`Session`] belongs to one [`Device`](crate::Device). It holds the
//! credentials, the values learnt during the handshake and the request
//! sequence counter. The command channel and the auth layer share it behind
//! an `Arc<parking_lot::RwLock<_>>`.

use serde_json::Value;
use uuid::Uuid;

use crate::state::{StateChange, SwitchState};
use crate::token::TokenCache;
use crate::types::ModelVariant;

/// Number of trailing device id characters used as the short id.
const SHORT_ID_LEN: usize = 4;

/// Upper bound (exclusive) of the random sequence seed and client tag.
const SEED_RANGE: u128 = 10_000;

/// Credentials and handshake state of one plug.
#[derive(Debug, Clone)]
pub struct Session {
    pin: String,
    salt: Option<String>,
    device_id: Option<String>,
    short_id: Option<String>,
    local_cid: Value,
    model: ModelVariant,
    sequence: u64,
    connected: bool,
    token: TokenCache,
    switches: SwitchState,
}

/// Returns a random value in `0..SEED_RANGE`.
fn random_seed() -> u64 {
    u64::try_from(Uuid::new_v4().as_u128() % SEED_RANGE).unwrap_or_default()
}

impl Session {
    /// Creates a session with the given PIN and model.
    ///
    /// The sequence counter starts at a random offset.
    #[must_use]
    pub fn new(pin: impl Into<String>, model: ModelVariant) -> Self {
        Self {
            pin: pin.into(),
            salt: None,
            device_id: None,
            short_id: None,
            local_cid: Value::from(random_seed()),
            model,
            sequence: random_seed(),
            connected: false,
            token: TokenCache::new(),
            switches: SwitchState::new(model),
        }
    }

    /// Returns the next sequence id. The counter is incremented first.
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Returns the last sequence id handed out.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the PIN or token currently used for signing.
    #[must_use]
    pub fn pin(&self) -> &str {
        &self.pin
    }

    /// Replaces the PIN and invalidates the derived token.
    pub fn set_pin(&mut self, pin: impl Into<String>) {
        self.pin = pin.into();
        self.token.invalidate();
    }

    /// Returns the salt issued by the last handshake.
    #[must_use]
    pub fn salt(&self) -> Option<&str> {
        self.salt.as_deref()
    }

    /// Returns the device id learnt during the handshake.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    /// Returns the last four characters of the device id.
    #[must_use]
    pub fn short_id(&self) -> Option<&str> {
        self.short_id.as_deref()
    }

    /// Returns the client tag sent in every envelope.
    #[must_use]
    pub fn local_cid(&self) -> &Value {
        &self.local_cid
    }

    /// Returns the model variant.
    #[must_use]
    pub fn model(&self) -> ModelVariant {
        self.model
    }

    /// Replaces the model variant.
    pub fn set_model(&mut self, model: ModelVariant) {
        self.model = model;
        self.switches.resize(model);
    }

    /// Returns the outlet states pushed by the plug so far.
    #[must_use]
    pub fn switches(&self) -> &SwitchState {
        &self.switches
    }

    /// Records a pushed change. Returns `true` if a state changed.
    pub fn apply_change(&mut self, change: &StateChange) -> bool {
        self.switches.apply(change)
    }

    /// Returns whether the handshake completed on the current connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Stores the values returned by a successful sign-in and marks the
    /// session connected.
    pub fn complete_handshake(
        &mut self,
        salt: impl Into<String>,
        device_id: impl Into<String>,
        local_cid: Option<Value>,
    ) {
        let device_id = device_id.into();
        let start = device_id.len().saturating_sub(SHORT_ID_LEN);
        self.short_id = device_id.get(start..).map(str::to_string);
        self.salt = Some(salt.into());
        self.device_id = Some(device_id);
        if let Some(cid) = local_cid {
            self.local_cid = cid;
        }
        self.token.invalidate();
        self.connected = true;
    }

    /// Forgets the handshake values after a disconnect. The PIN is kept.
    pub fn clear_handshake(&mut self) {
        self.salt = None;
        self.device_id = None;
        self.short_id = None;
        self.token.invalidate();
        self.connected = false;
    }

    /// Returns the derived token, or `None` before the handshake.
    ///
    /// The token is only recomputed when the PIN or salt changed.
    pub fn token(&mut self) -> Option<String> {
        self.token
            .get(&self.pin, self.salt.as_deref(), self.device_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_increments_before_use() {
        let mut session = Session::new("pin", ModelVariant::Default);
        let start = session.sequence();
        assert_eq!(session.next_sequence(), start + 1);
        assert_eq!(session.next_sequence(), start + 2);
    }

    #[test]
    fn token_absent_before_handshake() {
        let mut session = Session::new("pin", ModelVariant::Default);
        assert!(session.token().is_none());
    }

    #[test]
    fn handshake_sets_ids() {
        let mut session = Session::new("pin", ModelVariant::Default);
        session.complete_handshake("salt", "AABBCCDDEEFF", Some(Value::from(42)));

        assert!(session.is_connected());
        assert_eq!(session.device_id(), Some("AABBCCDDEEFF"));
        assert_eq!(session.short_id(), Some("EEFF"));
        assert_eq!(session.local_cid(), &Value::from(42));
        assert!(session.token().unwrap().starts_with("AABBCCDDEEFF-"));
    }

    #[test]
    fn short_id_of_short_device_id() {
        let mut session = Session::new("pin", ModelVariant::Default);
        session.complete_handshake("salt", "AB", None);
        assert_eq!(session.short_id(), Some("AB"));
    }

    #[test]
    fn set_pin_changes_token() {
        let mut session = Session::new("old", ModelVariant::Default);
        session.complete_handshake("salt", "dev", None);
        let before = session.token().unwrap();

        session.set_pin("new");
        let after = session.token().unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn set_model_resizes_switch_cache() {
        let mut session = Session::new("pin", ModelVariant::Default);
        assert!(!session.apply_change(&StateChange::socket(3, true)));

        session.set_model(ModelVariant::Multi);
        assert!(session.apply_change(&StateChange::socket(3, true)));
        assert_eq!(session.switches().socket(3), Some(true));
    }

    #[test]
    fn clear_handshake_keeps_pin() {
        let mut session = Session::new("pin", ModelVariant::Default);
        session.complete_handshake("salt", "dev", None);
        session.clear_handshake();

        assert!(!session.is_connected());
        assert!(session.salt().is_none());
        assert!(session.device_id().is_none());
        assert_eq!(session.pin(), "pin");
    }
}
