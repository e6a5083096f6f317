// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection configuration for a plug.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::ModelVariant;

/// Configuration for one plug.
///
/// # Examples
///
/// ```
/// use dlink_dsp::DeviceConfig;
/// use dlink_dsp::types::ModelVariant;
/// use std::time::Duration;
///
/// // Simple configuration
/// let config = DeviceConfig::new("192.168.1.60").with_pin("123456");
///
/// // With all options
/// let config = DeviceConfig::new("192.168.1.60")
///     .with_port(8080)
///     .with_model(ModelVariant::Multi)
///     .with_keep_alive(Duration::from_secs(10))
///     .with_telnet_token()
///     .with_request_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.ws_url(), "wss://192.168.1.60:8080/SwitchCamera");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    pin: String,
    #[serde(default)]
    model: ModelVariant,
    #[serde(default = "default_keep_alive_secs")]
    keep_alive_secs: u64,
    #[serde(default)]
    telnet_token: bool,
    #[serde(default = "default_telnet_port")]
    telnet_port: u16,
    #[serde(default)]
    request_timeout_ms: Option<u64>,
}

fn default_port() -> u16 {
    DeviceConfig::DEFAULT_PORT
}

fn default_telnet_port() -> u16 {
    DeviceConfig::DEFAULT_TELNET_PORT
}

fn default_keep_alive_secs() -> u64 {
    DeviceConfig::DEFAULT_KEEP_ALIVE.as_secs()
}

impl DeviceConfig {
    /// Default secure socket port.
    pub const DEFAULT_PORT: u16 = 8080;
    /// Default remote shell port.
    pub const DEFAULT_TELNET_PORT: u16 = 23;
    /// Default keepalive interval.
    pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);
    /// Path of the command endpoint.
    pub const WS_PATH: &'static str = "/SwitchCamera";

    /// Creates a configuration for the plug at `host`.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            pin: String::new(),
            model: ModelVariant::Default,
            keep_alive_secs: Self::DEFAULT_KEEP_ALIVE.as_secs(),
            telnet_token: false,
            telnet_port: Self::DEFAULT_TELNET_PORT,
            request_timeout_ms: None,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the PIN printed on the device label, or a previously scraped token.
    #[must_use]
    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = pin.into();
        self
    }

    /// Sets the model variant.
    #[must_use]
    pub fn with_model(mut self, model: ModelVariant) -> Self {
        self.model = model;
        self
    }

    /// Sets the keepalive interval. Sub-second parts are dropped and zero
    /// disables keepalive.
    #[must_use]
    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive_secs = interval.as_secs();
        self
    }

    /// Reads the device token over the remote shell before signing in.
    #[must_use]
    pub fn with_telnet_token(mut self) -> Self {
        self.telnet_token = true;
        self
    }

    /// Sets the remote shell port.
    #[must_use]
    pub fn with_telnet_port(mut self, port: u16) -> Self {
        self.telnet_port = port;
        self
    }

    /// Bounds every correlated request and remote shell session.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the configured PIN.
    #[must_use]
    pub fn pin(&self) -> &str {
        &self.pin
    }

    /// Returns the model variant.
    #[must_use]
    pub fn model(&self) -> ModelVariant {
        self.model
    }

    /// Returns the keepalive interval; zero means disabled.
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Returns whether the token is read over the remote shell.
    #[must_use]
    pub fn telnet_token(&self) -> bool {
        self.telnet_token
    }

    /// Returns the remote shell port.
    #[must_use]
    pub fn telnet_port(&self) -> u16 {
        self.telnet_port
    }

    /// Returns the bound on request waits, if any.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Returns the secure socket URL.
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("wss://{}:{}{}", self.host, self.port, Self::WS_PATH)
    }
}
