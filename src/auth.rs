// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection establishment and the `sign_in` handshake.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::command::{Command, SignInCommand};
use crate::config::DeviceConfig;
use crate::error::{Error, Result};
use crate::event::EventBus;
use crate::protocol::{CommandChannel, Connector};
use crate::session::Session;
use crate::telnet::TelnetScraper;

/// Values a successful `sign_in` reply carries.
#[derive(Debug)]
struct Handshake {
    salt: String,
    device_id: String,
    local_cid: Option<Value>,
}

impl Handshake {
    /// Validates a `sign_in` reply.
    fn from_reply(reply: &Value) -> Result<Self> {
        let malformed = |message: &str| Error::Handshake {
            message: message.to_string(),
            response: reply.to_string(),
        };

        match reply.get("code").and_then(Value::as_i64) {
            Some(0) | None => {}
            Some(code) => return Err(malformed(&format!("sign-in rejected with code {code}"))),
        }

        let salt = reply
            .get("salt")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("reply has no salt"))?;
        let device_id = reply
            .get("device_id")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("reply has no device_id"))?;
        let local_cid = reply.get("local_cid").filter(|v| !v.is_null()).cloned();

        Ok(Self {
            salt: salt.to_string(),
            device_id: device_id.to_string(),
            local_cid,
        })
    }
}

/// Owns the command channel of one plug and signs in on it.
///
/// A channel is single-use: `login` opens a fresh one whenever the current
/// channel is missing or no longer ready. Concurrent `login` calls are
/// serialized.
pub struct AuthSession<C: Connector> {
    config: DeviceConfig,
    connector: C,
    session: Arc<RwLock<Session>>,
    events: EventBus,
    channel: RwLock<Option<Arc<CommandChannel>>>,
    login_lock: tokio::sync::Mutex<()>,
}

impl<C: Connector> std::fmt::Debug for AuthSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("host", &self.config.host())
            .field("connected", &self.session.read().is_connected())
            .finish_non_exhaustive()
    }
}

impl<C: Connector> AuthSession<C> {
    /// Creates a signed-out session for `config`.
    #[must_use]
    pub fn new(config: DeviceConfig, connector: C, events: EventBus) -> Self {
        let session = Session::new(config.pin(), config.model());
        Self {
            config,
            connector,
            session: Arc::new(RwLock::new(session)),
            events,
            channel: RwLock::new(None),
            login_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Returns the shared session record.
    #[must_use]
    pub fn session(&self) -> &Arc<RwLock<Session>> {
        &self.session
    }

    /// Returns the current channel, ready or not.
    #[must_use]
    pub fn channel(&self) -> Option<Arc<CommandChannel>> {
        self.channel.read().clone()
    }

    /// Returns `true` when the channel is open and the handshake completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.session.read().is_connected()
            && self.channel.read().as_ref().is_some_and(|c| c.is_ready())
    }

    /// Connects if needed and signs in.
    ///
    /// With telnet token sourcing enabled, the token is read first and
    /// replaces the PIN before the socket is opened.
    ///
    /// # Errors
    ///
    /// Returns an extraction error if the token cannot be read, a transport
    /// error if the socket fails and `Error::Handshake` if the reply is not
    /// a valid sign-in reply.
    pub async fn login(&self) -> Result<()> {
        let _guard = self.login_lock.lock().await;

        if self.config.telnet_token() {
            let token = TelnetScraper::from_config(&self.config).read_token().await?;
            self.session.write().set_pin(token);
        }

        let channel = self.ready_channel().await?;
        let command = SignInCommand::new();
        tracing::debug!(host = %self.config.host(), "Signing in");
        let reply = channel
            .request(&command, self.config.request_timeout())
            .await?;

        let handshake = Handshake::from_reply(&reply)?;
        let mut session = self.session.write();
        session.complete_handshake(handshake.salt, handshake.device_id, handshake.local_cid);
        tracing::info!(
            host = %self.config.host(),
            device_id = session.device_id().unwrap_or_default(),
            "Signed in"
        );
        Ok(())
    }

    /// Returns the current channel if ready, otherwise opens a new one.
    async fn ready_channel(&self) -> Result<Arc<CommandChannel>> {
        if let Some(channel) = self.channel().filter(|c| c.is_ready()) {
            return Ok(channel);
        }

        let channel = Arc::new(CommandChannel::new(
            Arc::clone(&self.session),
            self.events.clone(),
            self.config.keep_alive(),
        ));
        *self.channel.write() = Some(Arc::clone(&channel));
        channel.open(&self.connector, &self.config.ws_url()).await?;
        Ok(channel)
    }

    /// Sends a command on the signed-in channel and waits for its reply.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConnected` before a successful `login`, otherwise
    /// whatever the channel reports.
    pub async fn request<K: Command + ?Sized>(&self, command: &K) -> Result<Value> {
        let channel = self
            .channel()
            .filter(|c| c.is_ready() && self.session.read().is_connected())
            .ok_or(Error::NotConnected)?;
        channel.request(command, self.config.request_timeout()).await
    }

    /// Replaces the PIN. The open socket and any handshake in flight are
    /// left alone; the next request signs with the new token.
    pub fn set_pin(&self, pin: impl Into<String>) {
        self.session.write().set_pin(pin);
    }

    /// Closes the channel and forgets the handshake.
    pub async fn disconnect(&self) {
        let channel = self.channel.write().take();
        if let Some(channel) = channel {
            channel.close().await;
        }
        self.session.write().clear_handshake();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn handshake_reads_required_fields() {
        let reply = json!({"sequence_id": 1, "code": 0, "salt": "s", "device_id": "AABB", "local_cid": 7});
        let handshake = Handshake::from_reply(&reply).unwrap();
        assert_eq!(handshake.salt, "s");
        assert_eq!(handshake.device_id, "AABB");
        assert_eq!(handshake.local_cid, Some(Value::from(7)));
    }

    #[test]
    fn handshake_without_salt_keeps_raw_reply() {
        let reply = json!({"sequence_id": 1, "device_id": "AABB"});
        let err = Handshake::from_reply(&reply).unwrap_err();
        match err {
            Error::Handshake { message, response } => {
                assert!(message.contains("salt"));
                assert!(response.contains("AABB"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn handshake_rejected_by_code() {
        let reply = json!({"code": 424, "salt": "s", "device_id": "d"});
        assert!(matches!(
            Handshake::from_reply(&reply),
            Err(Error::Handshake { .. })
        ));
    }

    #[test]
    fn handshake_local_cid_is_optional() {
        let reply = json!({"salt": "s", "device_id": "d", "local_cid": null});
        assert!(Handshake::from_reply(&reply).unwrap().local_cid.is_none());
    }
}
