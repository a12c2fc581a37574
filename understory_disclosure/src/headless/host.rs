// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The headless host: every collaborator trait over one in-memory document.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell, RefMut};
use core::future::Future;

use hashbrown::HashMap;

use super::animator::{HeadlessAnimation, StartedAnimation, Timeline};
use super::document::{Document, Element, NodeId, NodeKind};
use super::scheduler::FrameQueue;
use crate::height::Keyframes;
use crate::host::{
    Animator, Dom, FrameScheduler, InteractionBlocker, InteractionGuard, MirrorPart, SizeObserver,
};
use crate::state::StateClasses;
use crate::timing::Timing;

/// Notification queued by the host for delivery by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// The native open state of `details` changed.
    Toggle {
        /// The disclosure element.
        details: NodeId,
        /// New native open state.
        open: bool,
    },
    /// Content under `origin` changed size.
    ContentUpdate {
        /// Where the update started.
        origin: NodeId,
    },
}

/// Focus lock over a mirror subtree, used when inertness is unsupported.
#[derive(Debug)]
pub struct HeadlessGuard {
    document: Rc<RefCell<Document>>,
    nodes: Vec<NodeId>,
    active: Rc<Cell<usize>>,
}

impl InteractionGuard for HeadlessGuard {
    fn release(self) {
        let mut document = self.document.borrow_mut();
        for &node in &self.nodes {
            if let Some(element) = document.element_mut(node) {
                element.focus_disabled = false;
            }
        }
        self.active.set(self.active.get().saturating_sub(1));
    }
}

/// In-memory host.
#[derive(Debug)]
pub struct HeadlessHost {
    document: Rc<RefCell<Document>>,
    frames: FrameQueue,
    timeline: Timeline,
    /// Observed nodes and their last reported height.
    observed: RefCell<HashMap<NodeId, Option<f64>>>,
    events: RefCell<VecDeque<HostEvent>>,
    inert_supported: bool,
    active_guards: Rc<Cell<usize>>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    /// A host with native inertness.
    pub fn new() -> Self {
        Self {
            document: Rc::new(RefCell::new(Document::new())),
            frames: FrameQueue::new(),
            timeline: Timeline::new(),
            observed: RefCell::new(HashMap::new()),
            events: RefCell::new(VecDeque::new()),
            inert_supported: true,
            active_guards: Rc::new(Cell::new(0)),
        }
    }

    /// A host without native inertness, forcing the interaction-guard fallback.
    pub fn without_inert() -> Self {
        Self {
            inert_supported: false,
            ..Self::new()
        }
    }

    /// Borrow the document.
    pub fn document(&self) -> Ref<'_, Document> {
        self.document.borrow()
    }

    /// Borrow the document mutably.
    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.document.borrow_mut()
    }

    /// Phase queues.
    pub fn frames(&self) -> &FrameQueue {
        &self.frames
    }

    /// Set the native open state as a script or the user agent would, queueing
    /// a toggle report if it changed.
    pub fn set_native_open(&self, details: NodeId, open: bool) {
        let changed = match self.document.borrow_mut().element_mut(details) {
            Some(element) if element.open != open => {
                element.open = open;
                true
            }
            _ => false,
        };
        if changed {
            self.events
                .borrow_mut()
                .push_back(HostEvent::Toggle { details, open });
        }
    }

    /// Drain queued notifications.
    pub fn take_events(&self) -> Vec<HostEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    /// Observed nodes whose height changed since the last call.
    ///
    /// A newly observed node is always reported once.
    pub fn take_resizes(&self) -> Vec<NodeId> {
        let document = self.document.borrow();
        let mut changed = Vec::new();
        for (&node, last) in self.observed.borrow_mut().iter_mut() {
            let height = document.outer_height(node);
            if *last != Some(height) {
                *last = Some(height);
                changed.push(node);
            }
        }
        changed.sort_unstable();
        changed
    }

    /// Whether `node` is observed.
    pub fn is_observed(&self, node: NodeId) -> bool {
        self.observed.borrow().contains_key(&node)
    }

    /// Interaction guards not yet released.
    pub fn active_guards(&self) -> usize {
        self.active_guards.get()
    }

    /// Advance animations by `dt` seconds. Returns how many were running.
    pub fn advance_animations(&self, dt: f64) -> usize {
        self.timeline.advance(&mut self.document.borrow_mut(), dt)
    }

    /// Stop every running animation of `node` from outside the controller.
    pub fn cancel_animations(&self, node: NodeId) {
        self.timeline.cancel(node);
    }

    /// Number of running animations.
    pub fn running_animations(&self) -> usize {
        self.timeline.running()
    }

    /// Every animation started so far.
    pub fn started_animations(&self) -> Vec<StartedAnimation> {
        self.timeline.started()
    }

    /// Most animations ever running at once on `node`.
    pub fn max_live_animations(&self, node: NodeId) -> usize {
        self.timeline.max_live(node)
    }

    fn with_element(&self, node: NodeId, f: impl FnOnce(&mut Element)) {
        if let Some(element) = self.document.borrow_mut().element_mut(node) {
            f(element);
        }
    }
}

impl Dom for HeadlessHost {
    type Node = NodeId;

    fn summary(&self, details: NodeId) -> Option<NodeId> {
        self.document().find_child(details, NodeKind::Summary)
    }

    fn content(&self, details: NodeId) -> Option<NodeId> {
        self.document().find_child(details, NodeKind::Content)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.document().children_of(node).to_vec()
    }

    fn is_mirror(&self, node: NodeId) -> bool {
        self.document().is_mirror(node)
    }

    fn create_mirror(&self, parent: NodeId, part: MirrorPart) -> NodeId {
        self.document_mut().insert(Some(parent), Element::mirror(part))
    }

    fn clone_subtree(&self, node: NodeId) -> NodeId {
        self.document_mut().clone_subtree(node)
    }

    fn append(&self, parent: NodeId, child: NodeId) {
        self.document_mut().append(parent, child);
    }

    fn remove(&self, node: NodeId) {
        self.document_mut().remove(node);
    }

    fn supports_inert(&self) -> bool {
        self.inert_supported
    }

    fn set_inert(&self, node: NodeId, inert: bool) {
        self.with_element(node, |e| e.inert = inert);
    }

    fn set_accessibility_hidden(&self, node: NodeId, hidden: bool) {
        self.with_element(node, |e| e.accessibility_hidden = hidden);
    }

    fn outer_height(&self, node: NodeId) -> f64 {
        self.document().outer_height(node)
    }

    fn is_open(&self, details: NodeId) -> bool {
        self.document().element(details).is_some_and(|e| e.open)
    }

    fn set_open(&self, details: NodeId, open: bool) {
        self.set_native_open(details, open);
    }

    fn set_classes(&self, details: NodeId, classes: StateClasses) {
        self.with_element(details, |e| e.classes = classes);
    }

    fn set_style_property(&self, node: NodeId, name: &str, value: Option<&str>) {
        let mut document = self.document_mut();
        match value {
            Some(value) => document.set_style(node, name, value),
            None => document.remove_style(node, name),
        }
    }

    fn computed_style_property(&self, node: NodeId, name: &str) -> Option<String> {
        self.document().computed_style(node, name).map(String::from)
    }

    fn clear_inline_height(&self, node: NodeId) {
        self.with_element(node, |e| e.inline_height = None);
    }

    fn dispatch_content_update(&self, origin: NodeId) {
        self.events
            .borrow_mut()
            .push_back(HostEvent::ContentUpdate { origin });
    }
}

impl FrameScheduler for HeadlessHost {
    fn read_phase(&self) -> impl Future<Output = ()> {
        self.frames.read_phase()
    }

    fn write_phase(&self) -> impl Future<Output = ()> {
        self.frames.write_phase()
    }
}

impl Animator for HeadlessHost {
    type Animation = HeadlessAnimation;

    fn animate(&self, node: NodeId, keyframes: &Keyframes, timing: &Timing) -> HeadlessAnimation {
        self.timeline
            .start(&mut self.document.borrow_mut(), node, *keyframes, *timing)
    }
}

impl InteractionBlocker for HeadlessHost {
    type Guard = HeadlessGuard;

    fn disable(&self, container: NodeId) -> HeadlessGuard {
        let mut document = self.document.borrow_mut();
        let mut nodes = Vec::new();
        for node in core::iter::once(container).chain(document.descendants(container)) {
            if let Some(element) = document.element_mut(node)
                && element.focusable
                && !element.focus_disabled
            {
                element.focus_disabled = true;
                nodes.push(node);
            }
        }
        self.active_guards.set(self.active_guards.get() + 1);
        HeadlessGuard {
            document: self.document.clone(),
            nodes,
            active: self.active_guards.clone(),
        }
    }
}

impl SizeObserver for HeadlessHost {
    fn observe(&self, node: NodeId) {
        self.observed.borrow_mut().entry(node).or_insert(None);
    }

    fn unobserve(&self, node: NodeId) {
        self.observed.borrow_mut().remove(&node);
    }
}
