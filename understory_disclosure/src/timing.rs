// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animation timing: durations and cubic Bézier easing.
//!
//! Themes configure the open and close animations with CSS-like values. This
//! module turns those strings into a [`Timing`]:
//!
//! - Durations are CSS `<time>` values and are always normalized to seconds.
//!   Bare numbers are taken to already be seconds.
//! - Easings are `cubic-bezier(x1, y1, x2, y2)` functions or one of the
//!   keywords `linear`, `ease`, `ease-in`, `ease-out`, and `ease-in-out`.
//!
//! ```
//! use understory_disclosure::timing::{CubicBezier, parse_duration, parse_easing};
//!
//! assert_eq!(parse_duration("500ms").unwrap(), 0.5);
//! assert_eq!(parse_duration("0.2s").unwrap(), 0.2);
//!
//! let easing = parse_easing("cubic-bezier(0.1,0.2,0.3,0.4)").unwrap();
//! assert_eq!(easing.control_points(), [0.1, 0.2, 0.3, 0.4]);
//! assert_eq!(parse_easing("ease-out").unwrap(), CubicBezier::EASE_OUT);
//!
//! assert!(parse_easing("banana").is_err());
//! ```
//!
//! Parsing never falls back silently: a value that is present but malformed
//! is a [`ConfigurationError`]. Falling back to defaults for *missing* values
//! is the caller's decision (see [`DisclosureConfig`](crate::DisclosureConfig)).

use alloc::string::{String, ToString};
use core::fmt;

use kurbo::{CubicBez, ParamCurve};

use crate::error::ConfigurationError;

/// Bisection steps used to invert the x(t) component of an easing curve.
const EASE_ITERATIONS: usize = 48;

/// A CSS `cubic-bezier()` easing function.
///
/// The curve runs from `(0, 0)` to `(1, 1)`; the wrapped array holds the two
/// inner control points as `[x1, y1, x2, y2]`. The x coordinates are within
/// `0..=1`, which keeps progress monotonic in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier(pub [f64; 4]);

impl CubicBezier {
    /// `linear`.
    pub const LINEAR: Self = Self([0.0, 0.0, 1.0, 1.0]);
    /// `ease`.
    pub const EASE: Self = Self([0.25, 0.1, 0.25, 1.0]);
    /// `ease-in`.
    pub const EASE_IN: Self = Self([0.42, 0.0, 1.0, 1.0]);
    /// `ease-out`.
    pub const EASE_OUT: Self = Self([0.0, 0.0, 0.58, 1.0]);
    /// `ease-in-out`.
    pub const EASE_IN_OUT: Self = Self([0.42, 0.0, 0.58, 1.0]);

    /// Look up a CSS easing keyword (case-sensitive, lower case).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "linear" => Some(Self::LINEAR),
            "ease" => Some(Self::EASE),
            "ease-in" => Some(Self::EASE_IN),
            "ease-out" => Some(Self::EASE_OUT),
            "ease-in-out" => Some(Self::EASE_IN_OUT),
            _ => None,
        }
    }

    /// The control values as `[x1, y1, x2, y2]`.
    pub fn control_points(&self) -> [f64; 4] {
        self.0
    }

    /// The full curve from `(0, 0)` to `(1, 1)`.
    pub fn curve(&self) -> CubicBez {
        let [x1, y1, x2, y2] = self.0;
        CubicBez::new((0.0, 0.0), (x1, y1), (x2, y2), (1.0, 1.0))
    }

    /// Map linear time progress in `0..=1` to eased progress.
    ///
    /// Progress outside `0..=1` is clamped. The x component of the curve is
    /// inverted by bisection, which is exact enough for animation frames.
    pub fn ease(&self, progress: f64) -> f64 {
        let progress = progress.clamp(0.0, 1.0);
        if progress <= 0.0 {
            return 0.0;
        }
        if progress >= 1.0 {
            return 1.0;
        }
        let curve = self.curve();
        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..EASE_ITERATIONS {
            let mid = (lo + hi) * 0.5;
            if curve.eval(mid).x < progress {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        curve.eval((lo + hi) * 0.5).y
    }
}

impl fmt::Display for CubicBezier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x1, y1, x2, y2] = self.0;
        write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})")
    }
}

/// Duration and easing for one animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    /// Duration in seconds.
    pub duration: f64,
    /// Easing curve.
    pub easing: CubicBezier,
}

impl Timing {
    /// Create a timing from a duration in seconds and an easing.
    pub const fn new(duration: f64, easing: CubicBezier) -> Self {
        Self { duration, easing }
    }
}

impl Default for Timing {
    /// 0.2 seconds, `ease-out`.
    fn default() -> Self {
        Self::new(0.2, CubicBezier::EASE_OUT)
    }
}

/// Parse a CSS `<time>` value into seconds.
///
/// Accepts `s` and `ms` units (in any letter case) and bare numbers, which are
/// treated as seconds. Negative and non-finite values are rejected.
pub fn parse_duration(value: &str) -> Result<f64, ConfigurationError> {
    let lower = value.trim().to_ascii_lowercase();
    let (number, scale) = if let Some(ms) = lower.strip_suffix("ms") {
        (ms, 1000.0)
    } else if let Some(s) = lower.strip_suffix('s') {
        (s, 1.0)
    } else {
        (lower.as_str(), 1.0)
    };
    match number.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(n / scale),
        _ => Err(ConfigurationError::Duration {
            value: value.to_string(),
        }),
    }
}

/// Parse a CSS easing value into a [`CubicBezier`].
pub fn parse_easing(value: &str) -> Result<CubicBezier, ConfigurationError> {
    let lower = value.trim().to_ascii_lowercase();
    if let Some(keyword) = CubicBezier::from_keyword(&lower) {
        return Ok(keyword);
    }
    let malformed = || ConfigurationError::Easing {
        value: String::from(value),
    };
    let args = lower
        .strip_prefix("cubic-bezier(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(malformed)?;

    let mut points = [0.0; 4];
    let mut count = 0;
    for part in args.split(',') {
        let parsed = part
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(malformed)?;
        if let Some(slot) = points.get_mut(count) {
            *slot = parsed;
        }
        count += 1;
    }
    if count != 4 {
        return Err(ConfigurationError::EasingArity {
            value: String::from(value),
            count,
        });
    }
    for x in [points[0], points[2]] {
        if !(0.0..=1.0).contains(&x) {
            return Err(ConfigurationError::EasingRange {
                value: String::from(value),
                x,
            });
        }
    }
    Ok(CubicBezier(points))
}
