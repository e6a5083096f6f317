// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outlet and LED state tracking.

use serde::{Deserialize, Serialize};

use crate::types::ModelVariant;

use super::StateChange;

/// Last known outlet and LED states.
///
/// Sized by the model variant: one slot for single plugs, four for strips.
/// Slots stay `None` until the plug pushes an event for them; query replies
/// do not update this record.
///
/// # Examples
///
/// ```
/// use dlink_dsp::state::SwitchState;
/// use dlink_dsp::types::ModelVariant;
///
/// let mut state = SwitchState::new(ModelVariant::Default);
/// state.set_socket(0, true);
/// assert_eq!(state.socket(0), Some(true));
/// assert_eq!(state.socket(1), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchState {
    sockets: Vec<Option<bool>>,
    leds: Vec<Option<bool>>,
}

impl SwitchState {
    /// Creates an empty state for the given model.
    #[must_use]
    pub fn new(model: ModelVariant) -> Self {
        Self {
            sockets: vec![None; model.outlet_count()],
            leds: vec![None; model.outlet_count()],
        }
    }

    /// Returns the state of an outlet.
    #[must_use]
    pub fn socket(&self, index: usize) -> Option<bool> {
        self.sockets.get(index).copied().flatten()
    }

    /// Returns the state of an LED.
    #[must_use]
    pub fn led(&self, index: usize) -> Option<bool> {
        self.leds.get(index).copied().flatten()
    }

    /// Returns all outlet states in index order.
    #[must_use]
    pub fn sockets(&self) -> &[Option<bool>] {
        &self.sockets
    }

    /// Sets an outlet state. Out-of-range indexes are ignored.
    pub fn set_socket(&mut self, index: usize, on: bool) {
        if let Some(slot) = self.sockets.get_mut(index) {
            *slot = Some(on);
        }
    }

    /// Sets an LED state. Out-of-range indexes are ignored.
    pub fn set_led(&mut self, index: usize, on: bool) {
        if let Some(slot) = self.leds.get_mut(index) {
            *slot = Some(on);
        }
    }

    /// Resizes for a different model, keeping known slots that still exist.
    pub fn resize(&mut self, model: ModelVariant) {
        self.sockets.resize(model.outlet_count(), None);
        self.leds.resize(model.outlet_count(), None);
    }

    /// Applies a change. Returns `true` if the state actually changed.
    pub fn apply(&mut self, change: &StateChange) -> bool {
        let slot = match change {
            StateChange::Socket { index, .. } => self.sockets.get_mut(*index),
            StateChange::Led { index, .. } => self.leds.get_mut(*index),
        };
        match slot {
            Some(slot) if *slot != Some(change.is_on()) => {
                *slot = Some(change.is_on());
                true
            }
            _ => false,
        }
    }
}
