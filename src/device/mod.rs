// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level device abstraction for DSP-W smart plugs.
//!
//! [`Device`] combines the sign-in handshake and the command channel into
//! switch, LED and state operations. Every operation except
//! [`Device::login`], [`Device::device_info`] and the accessors requires a
//! completed login.
//!
//! # Events
//!
//! The plug pushes an `event` frame whenever an outlet or LED switches,
//! including switches made by other apps or the button. These update
//! [`Device::state`] and are published to [`Device::subscribe`] receivers
//! together with connection lifecycle events.
//!
//! ```no_run
//! use dlink_dsp::{Device, DeviceConfig, DeviceEvent};
//!
//! # async fn example() -> dlink_dsp::Result<()> {
//! let device = Device::new(DeviceConfig::new("192.168.1.60").with_pin("123456"));
//! let mut events = device.subscribe();
//! device.login().await?;
//!
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if let DeviceEvent::Switched { on, index } = event {
//!             println!("outlet {index} is now {}", if on { "on" } else { "off" });
//!         }
//!     }
//! });
//! # Ok(())
//! # }
//! ```

use tokio::sync::broadcast;

use crate::auth::AuthSession;
use crate::command::SettingCommand;
use crate::config::DeviceConfig;
use crate::error::{Error, ExtractionError, ParseError, Result};
use crate::event::{DeviceEvent, EventBus};
use crate::protocol::{Connector, WssConnector};
use crate::response::{ReplyError, SettingReply};
use crate::state::SwitchState;
use crate::telnet::TelnetScraper;
use crate::types::{DeviceInfo, ModelVariant, SettingType};

/// A DSP-W smart plug.
///
/// The connector type parameter defaults to the production
/// [`WssConnector`]; tests substitute an in-memory one.
///
/// # Examples
///
/// ```no_run
/// use dlink_dsp::{Device, DeviceConfig};
/// use dlink_dsp::types::ModelVariant;
///
/// # async fn example() -> dlink_dsp::Result<()> {
/// let device = Device::new(
///     DeviceConfig::new("192.168.1.60")
///         .with_pin("123456")
///         .with_model(ModelVariant::Multi),
/// );
/// device.login().await?;
///
/// device.switch_socket(true, 2).await?;
/// let all = device.query_all_states().await?;
/// println!("outlets: {all:?}");
///
/// device.disconnect().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Device<C: Connector = WssConnector> {
    auth: AuthSession<C>,
    events: EventBus,
}

impl Device<WssConnector> {
    /// Creates a device that connects over WebSocket-over-TLS.
    ///
    /// No I/O happens until [`login`](Self::login).
    #[must_use]
    pub fn new(config: DeviceConfig) -> Self {
        Self::with_connector(config, WssConnector::new())
    }
}

impl<C: Connector> Device<C> {
    /// Creates a device using a custom transport connector.
    #[must_use]
    pub fn with_connector(config: DeviceConfig, connector: C) -> Self {
        let events = EventBus::new();
        Self {
            auth: AuthSession::new(config, connector, events.clone()),
            events,
        }
    }

    // ========== Connection ==========

    /// Connects if needed and performs the `sign_in` handshake.
    ///
    /// # Errors
    ///
    /// See [`AuthSession::login`].
    pub async fn login(&self) -> Result<()> {
        self.auth.login().await
    }

    /// Replaces the PIN and invalidates the derived token.
    pub fn set_pin(&self, pin: impl Into<String>) {
        self.auth.set_pin(pin);
    }

    /// Returns `true` when signed in on an open connection. No I/O.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.auth.is_ready()
    }

    /// Closes the connection and clears the signed-in state.
    pub async fn disconnect(&self) {
        self.auth.disconnect().await;
    }

    // ========== Switching ==========

    /// Switches outlet `index` and returns the state the plug echoed.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidIndex` for an index the model lacks,
    /// `Error::NotConnected` before login and `Error::Api` when the plug
    /// reports a non-zero code.
    pub async fn switch_socket(&self, on: bool, index: usize) -> Result<bool> {
        self.switch(SettingType::Socket, on, index).await
    }

    /// Switches the LED of outlet `index` and returns the echoed state.
    ///
    /// # Errors
    ///
    /// Same as [`switch_socket`](Self::switch_socket).
    pub async fn switch_led(&self, on: bool, index: usize) -> Result<bool> {
        self.switch(SettingType::Led, on, index).await
    }

    async fn switch(&self, kind: SettingType, on: bool, index: usize) -> Result<bool> {
        self.check_index(index)?;
        let reply = self.auth.request(&SettingCommand::set(kind, index, on)).await?;
        let state = SettingReply::parse(&reply)?.first_state()?;
        tracing::debug!(?kind, index, on = state, "Switched");
        Ok(state)
    }

    // ========== Queries ==========

    /// Returns the state of outlet `index`.
    ///
    /// # Errors
    ///
    /// As [`switch_socket`](Self::switch_socket), except that the plug's
    /// code 424 is reported as 403. Returns `ParseError::MissingField` if
    /// the reply lacks the outlet.
    pub async fn query_state(&self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        let reply = self.query_sockets().await?;
        reply
            .state_at(SettingType::Socket, index)
            .ok_or_else(|| ParseError::MissingField(format!("setting idx {index}")).into())
    }

    /// Returns the states of all outlets, ordered by index.
    ///
    /// # Errors
    ///
    /// Same as [`query_state`](Self::query_state).
    pub async fn query_all_states(&self) -> Result<Vec<bool>> {
        let reply = self.query_sockets().await?;
        Ok(reply.states(SettingType::Socket))
    }

    async fn query_sockets(&self) -> Result<SettingReply> {
        let reply = self
            .auth
            .request(&SettingCommand::get(SettingType::Socket))
            .await?;
        Ok(SettingReply::parse(&reply).map_err(ReplyError::remap_forbidden)?)
    }

    /// Reads hardware metadata over the remote shell and adopts the model
    /// variant it implies.
    ///
    /// Does not need a login.
    ///
    /// # Errors
    ///
    /// Returns an `Error::Extraction` if the remote shell fails.
    pub async fn device_info(&self) -> Result<DeviceInfo> {
        let info = TelnetScraper::from_config(self.auth.config())
            .read_device_info()
            .await?;
        if let Some(variant) = info.variant() {
            self.auth.session().write().set_model(variant);
        }
        Ok(info)
    }

    /// Reads the device token over the remote shell without adopting it.
    ///
    /// # Errors
    ///
    /// Returns the extraction failure.
    pub async fn read_token(&self) -> std::result::Result<String, ExtractionError> {
        TelnetScraper::from_config(self.auth.config()).read_token().await
    }

    // ========== Accessors ==========

    /// Subscribes to connection and switch events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }

    /// Returns a snapshot of the states pushed by the plug.
    #[must_use]
    pub fn state(&self) -> SwitchState {
        self.auth.session().read().switches().clone()
    }

    /// Returns the device id learnt at sign-in.
    #[must_use]
    pub fn device_id(&self) -> Option<String> {
        self.auth.session().read().device_id().map(str::to_string)
    }

    /// Returns the last four characters of the device id.
    #[must_use]
    pub fn short_id(&self) -> Option<String> {
        self.auth.session().read().short_id().map(str::to_string)
    }

    /// Returns the model variant.
    #[must_use]
    pub fn model(&self) -> ModelVariant {
        self.auth.session().read().model()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        self.auth.config()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let count = self.model().outlet_count();
        if index < count {
            Ok(())
        } else {
            Err(Error::InvalidIndex { index, count })
        }
    }
}
