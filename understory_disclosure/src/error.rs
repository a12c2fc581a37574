// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Only two things can fail in this crate:
//!
//! - [`ConfigurationError`]: a themed duration or easing value could not be
//!   parsed. The open/close attempt that read it is aborted before any visual
//!   state is written, and the error is returned to whoever awaited it.
//! - [`AttachError`]: the element handed to
//!   [`Disclosure::attach`](crate::Disclosure::attach) is not a usable
//!   disclosure, or a [`Registry`](crate::Registry) already tracks it.
//!
//! Everything else (for example requesting `open()` while already open) is a
//! silent no-op rather than an error.

use alloc::string::String;

use thiserror::Error;

/// A malformed animation configuration value.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigurationError {
    /// The duration is not a non-negative CSS time (`0.2s`, `200ms`, or a bare number of seconds).
    #[error("could not parse duration value {value:?}")]
    Duration {
        /// The raw value as read from configuration.
        value: String,
    },
    /// The easing is neither `cubic-bezier(..)` nor a known keyword.
    #[error("could not parse easing value {value:?}")]
    Easing {
        /// The raw value as read from configuration.
        value: String,
    },
    /// `cubic-bezier(..)` did not contain exactly four control values.
    #[error("easing value {value:?} has {count} control values, expected 4")]
    EasingArity {
        /// The raw value as read from configuration.
        value: String,
        /// How many comma-separated values were found.
        count: usize,
    },
    /// An x control value of `cubic-bezier(..)` is outside `0..=1`.
    #[error("easing value {value:?} has x control value {x} outside 0..=1")]
    EasingRange {
        /// The raw value as read from configuration.
        value: String,
        /// The offending x coordinate.
        x: f64,
    },
}

/// Failure to attach a controller to an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AttachError {
    /// The element has no summary (trigger) child.
    #[error("disclosure element has no summary")]
    MissingSummary,
    /// The element has no content wrapper child.
    #[error("disclosure element has no content wrapper")]
    MissingContent,
    /// A controller is already registered for the element.
    #[error("disclosure element already has a controller")]
    AlreadyAttached,
}
