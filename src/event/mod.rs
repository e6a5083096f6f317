// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session notifications.
//!
//! The command channel publishes connection lifecycle events (`ready`,
//! `close`, `error`) and pushed switch events (`switched`, `switched-led`)
//! on an [`EventBus`] backed by tokio's broadcast channel.
//!
//! # Examples
//!
//! ```
//! use dlink_dsp::event::{DeviceEvent, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(DeviceEvent::Switched { on: true, index: 0 });
//! ```

mod device_event;
mod event_bus;

pub use device_event::DeviceEvent;
pub use event_bus::EventBus;
