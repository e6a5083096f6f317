// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response parsing for the plug's JSON replies.
//!
//! Replies are matched to requests by the command channel; this module
//! only interprets their bodies. The `sign_in` reply is handled by the auth
//! layer itself.

mod setting;

pub use setting::{ReplyError, SettingReply};
