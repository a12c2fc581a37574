// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory document: a generational node arena with block layout.
//!
//! Layout is deliberately simple. A node's outer height is its inline height
//! when one is set, otherwise its own height plus the heights of its in-flow
//! children. A closed disclosure skips its content child; mirror containers
//! are out of flow.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::host::MirrorPart;
use crate::propagation::ParentLookup;
use crate::state::StateClasses;

/// Identifier for a node in the document (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32, u32);

impl NodeId {
    const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Role of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Plain box.
    Block,
    /// Disclosure element.
    Details,
    /// Trigger of a disclosure.
    Summary,
    /// Collapsible content wrapper of a disclosure.
    Content,
    /// Part of a content mirror.
    Mirror(MirrorPart),
}

/// Attributes and style of a node.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Role.
    pub kind: NodeKind,
    /// Height contributed by the node itself, excluding children.
    pub own_height: f64,
    /// Whether the node is excluded from its parent's height.
    pub out_of_flow: bool,
    /// Native open state (disclosures only).
    pub open: bool,
    /// Inline height, overriding layout.
    pub inline_height: Option<f64>,
    /// Presentation indicators.
    pub classes: StateClasses,
    /// Native inertness.
    pub inert: bool,
    /// Hidden from assistive technology.
    pub accessibility_hidden: bool,
    /// Whether the node takes keyboard focus.
    pub focusable: bool,
    /// Focus disabled by an interaction guard.
    pub focus_disabled: bool,
    /// Inline style properties.
    pub style: BTreeMap<String, String>,
}

impl Element {
    fn new(kind: NodeKind, own_height: f64) -> Self {
        Self {
            kind,
            own_height,
            out_of_flow: false,
            open: false,
            inline_height: None,
            classes: StateClasses::empty(),
            inert: false,
            accessibility_hidden: false,
            focusable: false,
            focus_disabled: false,
            style: BTreeMap::new(),
        }
    }

    /// A plain box of the given height.
    pub fn block(height: f64) -> Self {
        Self::new(NodeKind::Block, height)
    }

    /// A disclosure element.
    pub fn details(open: bool) -> Self {
        Self {
            open,
            ..Self::new(NodeKind::Details, 0.0)
        }
    }

    /// A summary of the given height.
    pub fn summary(height: f64) -> Self {
        Self::new(NodeKind::Summary, height)
    }

    /// An empty content wrapper.
    pub fn content() -> Self {
        Self::new(NodeKind::Content, 0.0)
    }

    /// An empty mirror part. Containers are out of flow.
    pub fn mirror(part: MirrorPart) -> Self {
        Self {
            out_of_flow: part == MirrorPart::Container,
            ..Self::new(NodeKind::Mirror(part), 0.0)
        }
    }

    /// Mark the element focusable.
    pub fn focusable(mut self) -> Self {
        self.focusable = true;
        self
    }
}

/// The three nodes making up a disclosure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetailsParts {
    /// The disclosure element.
    pub details: NodeId,
    /// Its summary.
    pub summary: NodeId,
    /// Its content wrapper.
    pub content: NodeId,
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    element: Element,
}

/// Node arena.
#[derive(Clone, Debug, Default)]
pub struct Document {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node as the last child of `parent` (or detached if `None`).
    pub fn insert(&mut self, parent: Option<NodeId>, element: Element) -> NodeId {
        let node = |generation| Node {
            generation,
            parent: None,
            children: Vec::new(),
            element,
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(node(generation));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(node(generation)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        if let Some(p) = parent {
            self.link_parent(id, p);
        }
        id
    }

    /// Insert a disclosure with an empty content wrapper.
    pub fn insert_details(
        &mut self,
        parent: Option<NodeId>,
        summary_height: f64,
        open: bool,
    ) -> DetailsParts {
        let details = self.insert(parent, Element::details(open));
        let summary = self.insert(Some(details), Element::summary(summary_height));
        let content = self.insert(Some(details), Element::content());
        DetailsParts {
            details,
            summary,
            content,
        }
    }

    /// Remove a node and its subtree.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.parent_of(id) {
            self.unlink_parent(id, parent);
        }
        for child in self.children_of(id).to_vec() {
            self.remove(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        if !self.is_alive(parent) || !self.is_alive(child) {
            return;
        }
        if let Some(old) = self.parent_of(child) {
            self.unlink_parent(child, old);
        }
        self.link_parent(child, parent);
    }

    /// Deep-clone a subtree. The copy is detached.
    ///
    /// Inline heights are not copied; they belong to running animations.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let (mut element, children) = match self.node_opt(id) {
            Some(node) => (node.element.clone(), node.children.clone()),
            None => (Element::block(0.0), Vec::new()),
        };
        element.inline_height = None;
        let copy = self.insert(None, element);
        for child in children {
            let child_copy = self.clone_subtree(child);
            self.link_parent(child_copy, copy);
        }
        copy
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Whether the document has no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parent of a live node.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Children of a live node; empty for stale identifiers.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.node_opt(id) {
            Some(n) => &n.children,
            None => &[],
        }
    }

    /// Every node below `id`, depth first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children_of(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children_of(node).iter().rev().copied());
        }
        out
    }

    /// First child of `id` with the given role.
    pub fn find_child(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children_of(id)
            .iter()
            .copied()
            .find(|&c| self.element(c).is_some_and(|e| e.kind == kind))
    }

    /// Element of a live node.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node_opt(id).map(|n| &n.element)
    }

    /// Mutable element of a live node.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.node_opt_mut(id).map(|n| &mut n.element)
    }

    /// Whether `id` is part of a content mirror.
    pub fn is_mirror(&self, id: NodeId) -> bool {
        self.element(id)
            .is_some_and(|e| matches!(e.kind, NodeKind::Mirror(_)))
    }

    /// Set an inline style property.
    pub fn set_style(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(e) = self.element_mut(id) {
            e.style.insert(name.into(), value.into());
        }
    }

    /// Remove an inline style property.
    pub fn remove_style(&mut self, id: NodeId, name: &str) {
        if let Some(e) = self.element_mut(id) {
            e.style.remove(name);
        }
    }

    /// Change a node's own height.
    pub fn set_own_height(&mut self, id: NodeId, height: f64) {
        if let Some(e) = self.element_mut(id) {
            e.own_height = height;
        }
    }

    /// A style property as inherited from the nearest ancestor setting it.
    pub fn computed_style(&self, id: NodeId, name: &str) -> Option<&str> {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.node_opt(c)) {
            if let Some(value) = node.element.style.get(name) {
                return Some(value.as_str());
            }
            current = node.parent;
        }
        None
    }

    /// Rendered outer height of a node.
    pub fn outer_height(&self, id: NodeId) -> f64 {
        let Some(node) = self.node_opt(id) else {
            return 0.0;
        };
        if let Some(height) = node.element.inline_height {
            return height;
        }
        let collapsed = node.element.kind == NodeKind::Details && !node.element.open;
        let children: f64 = node
            .children
            .iter()
            .filter(|&&c| {
                self.element(c).is_some_and(|e| {
                    !e.out_of_flow && !(collapsed && e.kind == NodeKind::Content)
                })
            })
            .map(|&c| self.outer_height(c))
            .sum();
        node.element.own_height + children
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        if let Some(parent_node) = self.node_opt_mut(parent) {
            parent_node.children.push(id);
        }
        if let Some(node) = self.node_opt_mut(id) {
            node.parent = Some(parent);
        }
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        if let Some(p) = self.node_opt_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(node) = self.node_opt_mut(id) {
            node.parent = None;
        }
    }
}

impl ParentLookup<NodeId> for Document {
    fn parent_of(&self, node: &NodeId) -> Option<NodeId> {
        Self::parent_of(self, *node)
    }
}
