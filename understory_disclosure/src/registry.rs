// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attached controllers, keyed by element.
//!
//! Hosts own the notification sources (toggle reports, size observations and
//! content updates); the registry answers which controllers each one
//! concerns. Removing a controller from the registry is what unbinding its
//! listeners amounts to.

use alloc::rc::Rc;
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::controller::Disclosure;
use crate::error::AttachError;
use crate::host::Host;
use crate::propagation::{ParentLookup, bubble_route};

/// Controllers by disclosure element.
pub struct Registry<H: Host> {
    entries: HashMap<H::Node, Rc<Disclosure<H>>>,
}

impl<H: Host> fmt::Debug for Registry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl<H: Host> Default for Registry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Host> Registry<H> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Track `controller` under its element.
    pub fn insert(&mut self, controller: Rc<Disclosure<H>>) -> Result<(), AttachError> {
        let details = controller.details();
        if self.entries.contains_key(&details) {
            return Err(AttachError::AlreadyAttached);
        }
        self.entries.insert(details, controller);
        Ok(())
    }

    /// The controller for `details`.
    pub fn get(&self, details: H::Node) -> Option<&Rc<Disclosure<H>>> {
        self.entries.get(&details)
    }

    /// Whether `details` has a controller.
    pub fn contains(&self, details: H::Node) -> bool {
        self.entries.contains_key(&details)
    }

    /// Stop tracking `details`. The caller decides whether to destroy it.
    pub fn remove(&mut self, details: H::Node) -> Option<Rc<Disclosure<H>>> {
        self.entries.remove(&details)
    }

    /// Number of tracked controllers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no controller is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every tracked controller, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<Disclosure<H>>> {
        self.entries.values()
    }

    /// Controllers observing `node` (a summary or a mirror).
    pub fn resize_targets(&self, node: H::Node) -> SmallVec<[Rc<Disclosure<H>>; 2]> {
        self.entries
            .values()
            .filter(|c| c.observes(node))
            .cloned()
            .collect()
    }

    /// Controllers a content update from `origin` reaches, innermost first.
    ///
    /// The route includes the origin's own controller, which ignores it.
    pub fn content_update_route(
        &self,
        origin: H::Node,
        parents: &impl ParentLookup<H::Node>,
    ) -> SmallVec<[Rc<Disclosure<H>>; 4]> {
        bubble_route(origin, parents)
            .iter()
            .filter_map(|step| self.entries.get(&step.node).cloned())
            .collect()
    }
}
