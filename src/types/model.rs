// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hardware model variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// The hardware variant of a plug, which fixes its number of outlets.
///
/// # Examples
///
/// ```
/// use dlink_dsp::types::ModelVariant;
///
/// assert_eq!(ModelVariant::Default.outlet_count(), 1);
/// assert_eq!(ModelVariant::Multi.outlet_count(), 4);
/// assert_eq!(ModelVariant::from_model_name("DSP-W245"), ModelVariant::Multi);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    /// Single-outlet plug (e.g. DSP-W115, DSP-W215).
    #[default]
    Default,
    /// Four-outlet power strip (DSP-W245).
    Multi,
}

impl ModelVariant {
    /// Model suffixes that identify a four-outlet strip.
    const MULTI_SUFFIXES: &'static [&'static str] = &["W245"];

    /// Returns the number of switchable outlets (and LEDs).
    #[must_use]
    pub const fn outlet_count(&self) -> usize {
        match self {
            Self::Default => 1,
            Self::Multi => 4,
        }
    }

    /// Returns the lowercase name used in configuration.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Multi => "multi",
        }
    }

    /// Derives the variant from a reported model name such as `DSP-W245`.
    ///
    /// Only the part after the last hyphen is considered.
    #[must_use]
    pub fn from_model_name(model: &str) -> Self {
        let suffix = model.rsplit('-').next().unwrap_or(model).trim();
        if Self::MULTI_SUFFIXES
            .iter()
            .any(|s| s.eq_ignore_ascii_case(suffix))
        {
            Self::Multi
        } else {
            Self::Default
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelVariant {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "multi" => Ok(Self::Multi),
            other => Err(ParseError::UnexpectedFormat(format!(
                "unknown model variant: {other}"
            ))),
        }
    }
}
