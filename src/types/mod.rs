// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for plug control.
//!
//! # Types
//!
//! - [`ModelVariant`] - Single outlet or four-outlet strip
//! - [`SettingType`] - Switch or LED, with their wire codes
//! - [`Setting`] - One entry of a `setting` array
//! - [`DeviceInfo`] - Metadata scraped from the service record

mod device_info;
mod model;
mod setting;

pub use device_info::DeviceInfo;
pub use model::ModelVariant;
pub use setting::{Setting, SettingMetadata, SettingType, value_as_bool};
