// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `dlink_dsp` - A Rust library to control D-Link DSP-W smart plugs.
//!
//! The plugs expose a JSON command API over WebSocket-over-TLS on port 8080
//! (self-signed certificate) and a plaintext remote shell on port 23. This
//! library signs in with the PIN printed on the label, or with the rotating
//! device token read over the shell, and switches outlets and their LEDs.
//!
//! # Supported Features
//!
//! - **Sign-in**: salted SHA-1 token derivation, token sourcing over telnet
//! - **Outlet control**: switch relays and status LEDs, query outlet states
//! - **Events**: state changes pushed by the plug, connection lifecycle
//! - **Device info**: MAC, model and versions from the service record
//!
//! # Supported Models
//!
//! - Single outlet (`default`): DSP-W115 and similar
//! - Four outlet power strip (`multi`): DSP-W245
//!
//! # Quick Start
//!
//! ```no_run
//! use dlink_dsp::{Device, DeviceConfig};
//!
//! #[tokio::main]
//! async fn main() -> dlink_dsp::Result<()> {
//!     let device = Device::new(DeviceConfig::new("192.168.1.60").with_pin("123456"));
//!     device.login().await?;
//!
//!     device.switch_socket(true, 0).await?;
//!     println!("on: {}", device.query_state(0).await?);
//!
//!     device.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Unknown PIN
//!
//! When the label PIN no longer works, the token can be read over the
//! remote shell right before signing in:
//!
//! ```no_run
//! use dlink_dsp::{Device, DeviceConfig};
//!
//! #[tokio::main]
//! async fn main() -> dlink_dsp::Result<()> {
//!     let device = Device::new(DeviceConfig::new("192.168.1.60").with_telnet_token());
//!     device.login().await?;
//!     device.switch_led(false, 0).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod command;
mod config;
mod device;
pub mod error;
pub mod event;
pub mod protocol;
pub mod response;
pub mod session;
pub mod state;
pub mod telnet;
pub mod token;
pub mod types;

pub use auth::AuthSession;
pub use command::{Command, SettingCommand, SignInCommand};
pub use config::DeviceConfig;
pub use device::Device;
pub use error::{ApiError, Error, ExtractionError, ParseError, Result, TransportError};
pub use event::{DeviceEvent, EventBus};
pub use protocol::{CommandChannel, Connector, WssConnector};
pub use response::SettingReply;
pub use state::{StateChange, SwitchState};
pub use telnet::TelnetScraper;
pub use token::derive_token;
pub use types::{DeviceInfo, ModelVariant, SettingType};
