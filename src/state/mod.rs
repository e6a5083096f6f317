// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outlet state tracking.
//!
//! [`SwitchState`] holds the last pushed state of every outlet and LED, and
//! [`StateChange`] is one pushed change that can be applied to it.

mod state_change;
mod switch_state;

pub use state_change::StateChange;
pub use switch_state::SwitchState;
