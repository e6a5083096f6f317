// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TCP remote shell client.

use std::time::Duration;

use tokio::net::TcpStream;

use super::{
    DEVICE_CONFIG_PATH, MDNS_CONFIG_PATH, SERVICE_MARKER, ShellScript, TOKEN_KEY,
    device_info_from_record, run_script, token_from_config,
};
use crate::config::DeviceConfig;
use crate::error::ExtractionError;
use crate::types::DeviceInfo;

/// Reads values from a plug over its remote shell.
///
/// Each call opens its own TCP connection and closes it when done.
#[derive(Debug, Clone)]
pub struct TelnetScraper {
    host: String,
    port: u16,
    timeout: Option<Duration>,
}

impl TelnetScraper {
    /// Creates a scraper for `host` on the default port, without a timeout.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DeviceConfig::DEFAULT_TELNET_PORT,
            timeout: None,
        }
    }

    /// Creates a scraper using the host, shell port and request timeout of
    /// `config`.
    #[must_use]
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self {
            host: config.host().to_string(),
            port: config.telnet_port(),
            timeout: config.request_timeout(),
        }
    }

    /// Sets the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Bounds each session, connection included.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Logs in, prints `path` and returns the first chunk containing
    /// `marker`.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::Io` if the connection fails,
    /// `ExtractionError::SessionEnded` if the shell closes before the marker
    /// and `ExtractionError::Timeout` if the configured timeout expires.
    pub async fn scrape(&self, path: &str, marker: &str) -> Result<String, ExtractionError> {
        let session = self.session(ShellScript::new(path, marker));
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, session).await.map_err(|_| {
                tracing::warn!(host = %self.host, path, "Remote shell timed out");
                ExtractionError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
            })?,
            None => session.await,
        }
    }

    async fn session(&self, script: ShellScript) -> Result<String, ExtractionError> {
        tracing::debug!(host = %self.host, port = self.port, "Opening remote shell");
        let mut stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        let text = run_script(&mut stream, script).await?;
        tracing::debug!(host = %self.host, len = text.len(), "Remote shell target read");
        Ok(text)
    }

    /// Reads the rotating device token from the mydlink configuration.
    ///
    /// # Errors
    ///
    /// Fails like [`scrape`](Self::scrape), or with
    /// `ExtractionError::KeyNotFound` if the file has no token entry.
    pub async fn read_token(&self) -> Result<String, ExtractionError> {
        let text = self.scrape(DEVICE_CONFIG_PATH, TOKEN_KEY).await?;
        let token = token_from_config(&text, TOKEN_KEY)?;
        tracing::info!(host = %self.host, "Device token read over remote shell");
        Ok(token)
    }

    /// Reads hardware metadata from the multicast-DNS service record.
    ///
    /// # Errors
    ///
    /// Fails like [`scrape`](Self::scrape).
    pub async fn read_device_info(&self) -> Result<DeviceInfo, ExtractionError> {
        let text = self.scrape(MDNS_CONFIG_PATH, SERVICE_MARKER).await?;
        Ok(device_info_from_record(&text))
    }
}
