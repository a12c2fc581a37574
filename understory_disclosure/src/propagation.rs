// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Containment-scoped routes for content-update notifications.
//!
//! When a disclosure finishes animating, every disclosure that contains it
//! needs to re-measure, and nobody else does. A notification therefore starts
//! at its origin and bubbles outward through the origin's ancestors, the way
//! a DOM event bubbles. Nothing here knows about disclosures; the
//! [`Registry`](crate::Registry) filters the route down to attached
//! controllers.
//!
//! ## Minimal example
//!
//! ```
//! use understory_disclosure::propagation::{ParentLookup, Phase, Step, bubble_route};
//!
//! // 3 is inside 2, which is inside 1.
//! struct Chain;
//! impl ParentLookup<u32> for Chain {
//!     fn parent_of(&self, node: &u32) -> Option<u32> {
//!         (*node > 1).then(|| node - 1)
//!     }
//! }
//!
//! let route = bubble_route(3, &Chain);
//! assert_eq!(
//!     route.as_slice(),
//!     [
//!         Step { phase: Phase::Target, node: 3 },
//!         Step { phase: Phase::Bubble, node: 2 },
//!         Step { phase: Phase::Bubble, node: 1 },
//!     ]
//! );
//! ```

use smallvec::SmallVec;

/// Parent relation used to walk from an origin to the root.
///
/// The relation must be acyclic.
pub trait ParentLookup<K> {
    /// The parent of `node`, or `None` at a root.
    fn parent_of(&self, node: &K) -> Option<K>;
}

/// A lookup where every node is a root.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoParent;

impl<K> ParentLookup<K> for NoParent {
    fn parent_of(&self, _: &K) -> Option<K> {
        None
    }
}

/// Where a step sits in the route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The origin itself.
    Target,
    /// An ancestor of the origin.
    Bubble,
}

/// One stop on a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Step<K> {
    /// Phase of this step.
    pub phase: Phase,
    /// Node visited.
    pub node: K,
}

/// A route, usually short enough to stay inline.
pub type Route<K> = SmallVec<[Step<K>; 8]>;

/// The origin followed by its ancestors, innermost first.
pub fn bubble_route<K: Copy>(origin: K, parents: &impl ParentLookup<K>) -> Route<K> {
    let mut route = Route::new();
    route.push(Step {
        phase: Phase::Target,
        node: origin,
    });
    let mut current = origin;
    while let Some(parent) = parents.parent_of(&current) {
        route.push(Step {
            phase: Phase::Bubble,
            node: parent,
        });
        current = parent;
    }
    route
}
