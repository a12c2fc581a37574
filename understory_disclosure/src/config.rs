// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Controller configuration.
//!
//! Timing is themed per element: the controller reads custom properties from
//! the element's computed style each time it animates, so a stylesheet can
//! change durations and easings without touching code. [`DisclosureConfig`]
//! names those properties and supplies the timing used when they are absent.
//!
//! ```
//! use understory_disclosure::{CubicBezier, DisclosureConfig, Timing};
//!
//! let config = DisclosureConfig {
//!     default_timing: Timing::new(0.3, CubicBezier::EASE_IN_OUT),
//!     ..DisclosureConfig::default()
//! };
//! assert_eq!(config.open.duration, "--details-open-duration");
//! assert_eq!(config.content_height_property, "--details-content-height");
//! ```

use alloc::string::String;

use crate::error::ConfigurationError;
use crate::state::Direction;
use crate::timing::{Timing, parse_duration, parse_easing};

/// Names of the custom properties holding one direction's timing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingProperties {
    /// Property holding a CSS time (`0.2s`, `200ms`).
    pub duration: String,
    /// Property holding a CSS easing (`cubic-bezier(..)` or a keyword).
    pub easing: String,
}

impl TimingProperties {
    /// Resolve raw property values into a [`Timing`].
    ///
    /// A missing or blank value takes the matching half of `fallback`; a
    /// present value must parse.
    pub fn resolve(
        duration: Option<&str>,
        easing: Option<&str>,
        fallback: Timing,
    ) -> Result<Timing, ConfigurationError> {
        let duration = match present(duration) {
            Some(value) => parse_duration(value)?,
            None => fallback.duration,
        };
        let easing = match present(easing) {
            Some(value) => parse_easing(value)?,
            None => fallback.easing,
        };
        Ok(Timing::new(duration, easing))
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Per-controller configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct DisclosureConfig {
    /// Timing properties for opening.
    pub open: TimingProperties,
    /// Timing properties for closing.
    pub close: TimingProperties,
    /// Timing used for any property that is not set.
    pub default_timing: Timing,
    /// Property the cached summary height is published to.
    pub summary_height_property: String,
    /// Property the cached content height is published to.
    pub content_height_property: String,
}

impl DisclosureConfig {
    /// Timing property names for `direction`.
    pub fn timing_properties(&self, direction: Direction) -> &TimingProperties {
        match direction {
            Direction::Open => &self.open,
            Direction::Close => &self.close,
        }
    }
}

impl Default for DisclosureConfig {
    fn default() -> Self {
        Self {
            open: TimingProperties {
                duration: "--details-open-duration".into(),
                easing: "--details-open-easing".into(),
            },
            close: TimingProperties {
                duration: "--details-close-duration".into(),
                easing: "--details-close-easing".into(),
            },
            default_timing: Timing::default(),
            summary_height_property: "--details-summary-height".into(),
            content_height_property: "--details-content-height".into(),
        }
    }
}
