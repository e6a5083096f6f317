// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use crate::state::StateChange;

/// Notifications emitted by a device session.
///
/// # Examples
///
/// ```
/// use dlink_dsp::event::DeviceEvent;
///
/// let closed = DeviceEvent::Closed { code: 1000, reason: String::new() };
/// assert!(closed.is_connection());
///
/// let switched = DeviceEvent::Switched { on: true, index: 0 };
/// assert!(switched.is_state_change());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The secure socket is open.
    Ready,

    /// The secure socket closed.
    Closed {
        /// WebSocket close code, `1006` when no close frame was received.
        code: u16,
        /// Close reason.
        reason: String,
    },

    /// The secure socket reported an error.
    Error {
        /// Description of the error.
        message: String,
    },

    /// The plug reported an outlet switching.
    Switched {
        /// New state.
        on: bool,
        /// Zero-based outlet index.
        index: usize,
    },

    /// The plug reported an outlet LED switching.
    SwitchedLed {
        /// New state.
        on: bool,
        /// Zero-based outlet index.
        index: usize,
    },
}

impl DeviceEvent {
    /// Returns `true` for connection lifecycle events.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Ready | Self::Closed { .. } | Self::Error { .. })
    }

    /// Returns `true` for pushed switch events.
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::Switched { .. } | Self::SwitchedLed { .. })
    }

    /// Creates the event matching a pushed state change.
    #[must_use]
    pub fn from_change(change: &StateChange) -> Self {
        match *change {
            StateChange::Socket { index, on } => Self::Switched { on, index },
            StateChange::Led { index, on } => Self::SwitchedLed { on, index },
        }
    }

    /// Returns the notification name used by the device protocol.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Closed { .. } => "close",
            Self::Error { .. } => "error",
            Self::Switched { .. } => "switched",
            Self::SwitchedLed { .. } => "switched-led",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_change_maps_kind() {
        assert_eq!(
            DeviceEvent::from_change(&StateChange::socket(1, true)),
            DeviceEvent::Switched { on: true, index: 1 }
        );
        assert_eq!(
            DeviceEvent::from_change(&StateChange::led(2, false)),
            DeviceEvent::SwitchedLed { on: false, index: 2 }
        );
    }

    #[test]
    fn names() {
        assert_eq!(DeviceEvent::Ready.name(), "ready");
        assert_eq!(
            DeviceEvent::SwitchedLed { on: true, index: 0 }.name(),
            "switched-led"
        );
    }

    #[test]
    fn classification() {
        let error = DeviceEvent::Error {
            message: "reset".to_string(),
        };
        assert!(error.is_connection());
        assert!(!error.is_state_change());
    }
}
