// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator traits.
//!
//! The controller never touches a document directly. A host supplies:
//!
//! - [`Dom`]: structure, layout reads, and attribute/class/style writes.
//! - [`FrameScheduler`]: batched read and write phases. Every layout read the
//!   controller makes goes through [`FrameScheduler::measure`] and every write
//!   through [`FrameScheduler::mutate`]. Within one frame, reads queued before
//!   a write observe the document before any write of that frame.
//! - [`Animator`]: starts height animations and hands back an [`Animation`]
//!   that can be stopped and awaited.
//! - [`InteractionBlocker`]: the fallback used when the document cannot mark
//!   a subtree inert natively.
//! - [`SizeObserver`]: size-change observation. Hosts deliver the resulting
//!   notifications through [`Registry`](crate::Registry).
//!
//! [`Host`] is the union of all of them and is implemented automatically.
//!
//! All methods take `&self`: controllers share the host behind an `Rc` and
//! hosts use interior mutability.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::future::Future;
use core::hash::Hash;

use crate::height::Keyframes;
use crate::state::StateClasses;
use crate::timing::Timing;

/// Which part of a content mirror a node is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MirrorPart {
    /// Outer container placed inside the summary. Hidden and non-interactive.
    Container,
    /// Inner wrapper whose height is the content height.
    Inner,
}

/// Document access.
pub trait Dom {
    /// Node handle.
    type Node: Copy + Eq + Hash + Debug;

    /// The summary (trigger) child of a disclosure element.
    fn summary(&self, details: Self::Node) -> Option<Self::Node>;

    /// The content wrapper child of a disclosure element.
    fn content(&self, details: Self::Node) -> Option<Self::Node>;

    /// Children of `node`, in order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Whether `node` is a mirror container (of any controller).
    fn is_mirror(&self, node: Self::Node) -> bool;

    /// Create an empty mirror node and append it to `parent`.
    fn create_mirror(&self, parent: Self::Node, part: MirrorPart) -> Self::Node;

    /// Deep-clone `node`. The clone is detached until appended.
    fn clone_subtree(&self, node: Self::Node) -> Self::Node;

    /// Append a detached `child` to `parent`.
    fn append(&self, parent: Self::Node, child: Self::Node);

    /// Remove `node` and its subtree from the document.
    fn remove(&self, node: Self::Node);

    /// Whether the document supports marking subtrees inert natively.
    fn supports_inert(&self) -> bool;

    /// Set or clear native inertness.
    fn set_inert(&self, node: Self::Node, inert: bool);

    /// Hide or expose `node` to assistive technology.
    fn set_accessibility_hidden(&self, node: Self::Node, hidden: bool);

    /// Rendered outer height of `node` in pixels. A layout read.
    fn outer_height(&self, node: Self::Node) -> f64;

    /// Native open state of a disclosure element.
    fn is_open(&self, details: Self::Node) -> bool;

    /// Write the native open state.
    ///
    /// Hosts that report native toggles should report this write too; the
    /// controller recognizes and ignores the echo.
    fn set_open(&self, details: Self::Node, open: bool);

    /// Replace the presentation indicators of `details`.
    fn set_classes(&self, details: Self::Node, classes: StateClasses);

    /// Set (`Some`) or remove (`None`) an inline style property.
    fn set_style_property(&self, node: Self::Node, name: &str, value: Option<&str>);

    /// Computed value of a (possibly inherited) style property.
    fn computed_style_property(&self, node: Self::Node, name: &str) -> Option<String>;

    /// Remove the inline height left by an animation.
    fn clear_inline_height(&self, node: Self::Node);

    /// Announce that the content under `origin` changed size.
    ///
    /// Hosts route the notification to every attached ancestor disclosure
    /// (see [`Registry::content_update_route`](crate::Registry::content_update_route)).
    fn dispatch_content_update(&self, origin: Self::Node);
}

/// Batched read and write phases.
pub trait FrameScheduler {
    /// Resolves when the next read phase opens.
    fn read_phase(&self) -> impl Future<Output = ()>;

    /// Resolves when the next write phase opens.
    fn write_phase(&self) -> impl Future<Output = ()>;

    /// Run `f` in the next read phase.
    ///
    /// The phase slot is reserved when this is called, not when the returned
    /// future is first polled.
    fn measure<R>(&self, f: impl FnOnce() -> R) -> impl Future<Output = R> {
        let phase = self.read_phase();
        async move {
            phase.await;
            f()
        }
    }

    /// Run `f` in the next write phase.
    fn mutate<R>(&self, f: impl FnOnce() -> R) -> impl Future<Output = R> {
        let phase = self.write_phase();
        async move {
            phase.await;
            f()
        }
    }
}

/// How an animation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Completion {
    /// Ran to its end keyframe.
    Finished,
    /// Stopped before reaching its end.
    Cancelled,
}

/// A running height animation.
pub trait Animation {
    /// Stop the animation. Effective immediately: later completions report
    /// [`Completion::Cancelled`].
    fn stop(&self);

    /// Resolves once the animation finished or was stopped.
    fn finished(&self) -> impl Future<Output = Completion>;
}

/// Starts height animations.
pub trait Animator: Dom {
    /// Handle to a running animation. Clones refer to the same animation.
    type Animation: Animation + Clone;

    /// Animate the height of `node` through `keyframes`.
    ///
    /// Hosts keep the `to` height applied inline once the animation finishes;
    /// the controller clears it after committing.
    fn animate(&self, node: Self::Node, keyframes: &Keyframes, timing: &Timing)
    -> Self::Animation;
}

/// Token for a subtree made non-interactive by [`InteractionBlocker::disable`].
pub trait InteractionGuard {
    /// Restore interactivity.
    fn release(self);
}

/// Fallback for documents without native inertness.
pub trait InteractionBlocker: Dom {
    /// Guard type.
    type Guard: InteractionGuard;

    /// Make every focusable descendant of `container` unreachable.
    fn disable(&self, container: Self::Node) -> Self::Guard;
}

/// Size-change observation.
pub trait SizeObserver: Dom {
    /// Start reporting size changes of `node`.
    fn observe(&self, node: Self::Node);

    /// Stop reporting size changes of `node`.
    fn unobserve(&self, node: Self::Node);
}

/// Everything a controller needs from its host.
pub trait Host: FrameScheduler + Animator + InteractionBlocker + SizeObserver {}

impl<T> Host for T where T: FrameScheduler + Animator + InteractionBlocker + SizeObserver {}
