// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_disclosure --heading-base-level=0

//! Understory Disclosure: animated open/close for disclosure (details/summary) widgets.
//!
//! ## Overview
//!
//! A disclosure is a summary (the trigger) plus a collapsible content region.
//! Browsers snap it open and closed; this crate animates its height instead.
//! A [`Disclosure`] controller per element owns:
//!
//! - the open/closed/opening/closing state machine ([`state`]),
//! - height measurement through a hidden clone of the content ([`mirror`],
//!   [`height`]),
//! - cancellation: a newer request supersedes an older one, and at most one
//!   animation is ever live per element,
//! - nested synchronization: a disclosure containing another re-measures
//!   when the inner one changes ([`propagation`], [`Registry`]).
//!
//! ## Hosts
//!
//! The controller never touches a document directly. It talks to a host
//! through the traits in [`host`]: document access, batched read and write
//! phases, an animation primitive, an interaction-disable fallback and size
//! observation. Every layout read happens in a read phase and every write in
//! a write phase, so a host can batch them per frame.
//!
//! The `headless` feature provides an in-memory host and a frame driver,
//! used by the tests and demos.
//!
//! ## Theming
//!
//! Durations and easings come from custom properties on the element
//! (`--details-open-duration`, `--details-open-easing`,
//! `--details-close-duration`, `--details-close-easing`) and fall back to
//! 0.2 seconds `ease-out`. Cached heights are published back as
//! `--details-summary-height` and `--details-content-height`. See
//! [`DisclosureConfig`].
//!
//! ```
//! use understory_disclosure::{Keyframes, StateClasses, timing};
//!
//! // A closed disclosure with a 40px summary and 200px of content opens
//! // through these keyframes.
//! let frames = Keyframes::new(40.0, 40.0 + 200.0);
//! assert_eq!(frames.to_css(), ["40px", "240px"]);
//!
//! assert_eq!(timing::parse_duration("500ms").unwrap(), 0.5);
//!
//! let names: Vec<_> = (StateClasses::ANIMATED | StateClasses::OPENING)
//!     .class_names()
//!     .collect();
//! assert_eq!(names, ["details-animated", "details-animated--opening"]);
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for dependencies such as `kurbo` and `tracing`.
//! - `libm`: `no_std` floating-point math for `kurbo`.
//! - `headless`: the [`headless`] module (requires `std`).
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod config;
pub mod controller;
pub mod error;
pub mod height;
pub mod host;
pub mod mirror;
pub mod propagation;
pub mod registry;
pub mod state;
pub mod timing;

#[cfg(any(test, feature = "headless"))]
pub mod headless;

pub use config::{DisclosureConfig, TimingProperties};
pub use controller::Disclosure;
pub use error::{AttachError, ConfigurationError};
pub use height::{HeightOracle, HeightSample, Keyframes};
pub use mirror::ContentMirror;
pub use registry::Registry;
pub use state::{Direction, DisclosureState, StateClasses};
pub use timing::{CubicBezier, Timing};
