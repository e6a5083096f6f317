// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted remote shell scraping.
//!
//! The plugs run a plaintext shell on port 23 with fixed credentials. When
//! the label PIN is unknown or rejected, the rotating device token can be
//! read from the mydlink configuration file instead. The same mechanism
//! reads hardware metadata from the multicast-DNS service record.
//!
//! # Layers
//!
//! - [`ShellScript`]: prompt-driven automaton. Feed it received text, get
//!   back what to send.
//! - [`run_script`]: drives a script over any async byte stream.
//! - [`TelnetScraper`]: connects over TCP and runs the two extraction
//!   routines built on the above.
//!
//! # Examples
//!
//! ```no_run
//! use dlink_dsp::telnet::TelnetScraper;
//!
//! # async fn example() -> Result<(), dlink_dsp::error::ExtractionError> {
//! let scraper = TelnetScraper::new("192.168.1.60");
//! let token = scraper.read_token().await?;
//! println!("device token: {token}");
//! # Ok(())
//! # }
//! ```

mod extract;
mod scraper;
mod script;

pub use extract::{device_info_from_record, token_from_config};
pub use scraper::TelnetScraper;
pub use script::{ShellAction, ShellScript, run_script};

/// Fixed shell user.
pub const USERNAME: &str = "admin";

/// Fixed shell password.
pub const PASSWORD: &str = "123456";

/// File holding the rotating device token.
pub const DEVICE_CONFIG_PATH: &str = "/mydlink/config/device.cfg";

/// Key of the token inside [`DEVICE_CONFIG_PATH`].
pub const TOKEN_KEY: &str = "DeviceToken";

/// Multicast-DNS responder configuration holding the service record.
pub const MDNS_CONFIG_PATH: &str = "/var/tmp/mDNSResponder.conf";

/// Marker present in the service record.
pub const SERVICE_MARKER: &str = "_dhnap._tcp";

/// End-of-transmission byte that ends the shell session.
pub const EOT: u8 = 0x04;
