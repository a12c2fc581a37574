// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless host: an in-memory implementation of every collaborator trait.
//!
//! - [`Document`]: a node arena with simple block layout.
//! - [`FrameQueue`]: read and write phases opened explicitly per frame.
//! - [`Timeline`]: height animations advanced by explicit time steps.
//! - [`HeadlessHost`]: all of the above behind the [`host`](crate::host) traits.
//! - [`Stage`]: runs frames on a single-threaded executor and routes host
//!   notifications to the controllers in its [`Registry`](crate::Registry).
//!
//! Enabled with the `headless` feature.
//!
//! ```
//! use understory_disclosure::DisclosureState;
//! use understory_disclosure::headless::{Element, Stage};
//!
//! let mut stage = Stage::new();
//! let details = {
//!     let mut doc = stage.host().document_mut();
//!     let parts = doc.insert_details(None, 40.0, false);
//!     doc.insert(Some(parts.content), Element::block(200.0));
//!     parts.details
//! };
//! let controller = stage.attach(details).unwrap();
//!
//! stage.open(details).unwrap();
//! assert_eq!(controller.state(), DisclosureState::Opening);
//!
//! stage.finish_animations();
//! assert_eq!(controller.state(), DisclosureState::Open);
//! assert_eq!(stage.host().document().outer_height(details), 240.0);
//! ```

mod animator;
mod document;
mod host;
mod scheduler;
mod stage;

pub use animator::{HeadlessAnimation, StartedAnimation, Timeline};
pub use document::{DetailsParts, Document, Element, NodeId, NodeKind};
pub use host::{HeadlessGuard, HeadlessHost, HostEvent};
pub use scheduler::FrameQueue;
pub use stage::{Controller, FRAME_STEP, OpHandle, Stage};
