// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Height measurement.
//!
//! A closed disclosure does not lay out its content, so the expanded height
//! cannot be read from the element itself. [`HeightOracle`] combines the
//! summary's height with the height of the [`ContentMirror`], a hidden clone
//! of the content that always lays out.
//!
//! Every measurement below happens inside a single
//! [`FrameScheduler::measure`] call, so the numbers of one sample are
//! consistent with each other.

use alloc::format;
use alloc::string::String;

use crate::config::{DisclosureConfig, TimingProperties};
use crate::error::ConfigurationError;
use crate::host::{Dom, FrameScheduler, Host};
use crate::mirror::ContentMirror;
use crate::state::Direction;
use crate::timing::Timing;

/// Summary and content heights read in one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeightSample {
    /// Height of the summary.
    pub summary: f64,
    /// Height of the content, as measured through the mirror.
    pub content: f64,
}

impl HeightSample {
    /// Height of the whole element when open.
    pub fn expanded(&self) -> f64 {
        self.summary + self.content
    }
}

/// Start and end heights of one animation.
///
/// ```
/// use understory_disclosure::Keyframes;
///
/// let frames = Keyframes::new(40.0, 240.0);
/// assert_eq!(frames.to_css(), ["40px", "240px"]);
/// assert_eq!(frames.at(0.5), 140.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframes {
    /// Height at the start.
    pub from: f64,
    /// Height at the end.
    pub to: f64,
}

impl Keyframes {
    /// Create keyframes from `from` to `to`.
    pub const fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }

    /// The keyframes as CSS pixel lengths.
    pub fn to_css(&self) -> [String; 2] {
        [format!("{}px", self.from), format!("{}px", self.to)]
    }

    /// Height at eased progress `t` (not clamped, so easings may overshoot).
    pub fn at(&self, t: f64) -> f64 {
        self.from + (self.to - self.from) * t
    }
}

/// Measures the heights an animation runs between.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeightOracle<N> {
    details: N,
    summary: N,
}

impl<N: Copy> HeightOracle<N> {
    /// Create an oracle for `details` whose trigger is `summary`.
    pub fn new(details: N, summary: N) -> Self {
        Self { details, summary }
    }

    /// The measured element.
    pub fn details(&self) -> N {
        self.details
    }

    /// Height of the summary alone, which is the closed height.
    pub async fn measure_collapsed<H>(&self, host: &H) -> f64
    where
        H: Dom<Node = N> + FrameScheduler,
    {
        host.measure(|| host.outer_height(self.summary)).await
    }

    /// Height of the element as currently rendered.
    pub async fn measure_current<H>(&self, host: &H) -> f64
    where
        H: Dom<Node = N> + FrameScheduler,
    {
        host.measure(|| host.outer_height(self.details)).await
    }

    /// Height of the element when fully open.
    ///
    /// Always taken from the mirror, so it is valid while closed.
    pub async fn measure_expanded<H>(&self, host: &H, mirror: &ContentMirror<H>) -> f64
    where
        H: Host<Node = N>,
    {
        host.measure(|| host.outer_height(self.summary) + mirror.read_height())
            .await
    }

    /// Summary and content heights from one read pass.
    pub async fn sample<H>(&self, host: &H, mirror: &ContentMirror<H>) -> HeightSample
    where
        H: Host<Node = N>,
    {
        host.measure(|| HeightSample {
            summary: host.outer_height(self.summary),
            content: mirror.read_height(),
        })
        .await
    }

    /// Keyframes for a transition in `direction`, starting from the current height.
    pub async fn keyframes<H>(
        &self,
        host: &H,
        mirror: &ContentMirror<H>,
        direction: Direction,
    ) -> Keyframes
    where
        H: Host<Node = N>,
    {
        host.measure(|| {
            let from = host.outer_height(self.details);
            let summary = host.outer_height(self.summary);
            let to = match direction {
                Direction::Open => summary + mirror.read_height(),
                Direction::Close => summary,
            };
            Keyframes::new(from, to)
        })
        .await
    }

    /// Timing for `direction` from the element's computed custom properties.
    ///
    /// Missing or blank properties use `config.default_timing`.
    pub async fn read_animation_parameters<H>(
        &self,
        host: &H,
        config: &DisclosureConfig,
        direction: Direction,
    ) -> Result<Timing, ConfigurationError>
    where
        H: Dom<Node = N> + FrameScheduler,
    {
        let properties = config.timing_properties(direction);
        let (duration, easing) = host
            .measure(|| {
                (
                    host.computed_style_property(self.details, &properties.duration),
                    host.computed_style_property(self.details, &properties.easing),
                )
            })
            .await;
        TimingProperties::resolve(duration.as_deref(), easing.as_deref(), config.default_timing)
    }
}
