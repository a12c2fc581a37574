// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content mirror.
//!
//! A closed disclosure does not lay out its content, yet opening it needs the
//! content's height up front. The mirror is a hidden clone of the content,
//! placed inside the summary and taken out of flow, that always lays out.
//!
//! ```text
//! details
//! ├── summary
//! │   ├── ...trigger children...
//! │   └── mirror container      (hidden, inert, out of flow)
//! │       └── mirror inner      (observed, measured)
//! │           └── clone of content, nested mirrors stripped
//! └── content
//! ```
//!
//! The container is made non-interactive natively when the host supports
//! inertness. Otherwise it is hidden from assistive technology and its
//! focusable descendants are disabled through [`InteractionBlocker`]; the
//! returned guard is released whenever the mirror is torn down.

use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use smallvec::SmallVec;
use tracing::trace;

use crate::host::{Dom, Host, InteractionGuard, MirrorPart};

struct Built<H: Host> {
    container: H::Node,
    inner: H::Node,
    guard: Option<H::Guard>,
}

/// Hidden, non-interactive clone of a disclosure's content.
///
/// At most one mirror instance is alive per `ContentMirror`: building again
/// discards the previous one first.
pub struct ContentMirror<H: Host> {
    host: Rc<H>,
    summary: H::Node,
    content: H::Node,
    built: RefCell<Option<Built<H>>>,
    height: Cell<Option<f64>>,
    builds: Cell<u32>,
}

impl<H: Host> fmt::Debug for ContentMirror<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let built = self.built.borrow();
        f.debug_struct("ContentMirror")
            .field("summary", &self.summary)
            .field("content", &self.content)
            .field("container", &built.as_ref().map(|b| b.container))
            .field("inner", &built.as_ref().map(|b| b.inner))
            .field("guarded", &built.as_ref().is_some_and(|b| b.guard.is_some()))
            .field("height", &self.height.get())
            .field("builds", &self.builds.get())
            .finish_non_exhaustive()
    }
}

impl<H: Host> ContentMirror<H> {
    /// Create an unbuilt mirror of `content`, to be placed inside `summary`.
    pub fn new(host: Rc<H>, summary: H::Node, content: H::Node) -> Self {
        Self {
            host,
            summary,
            content,
            built: RefCell::new(None),
            height: Cell::new(None),
            builds: Cell::new(0),
        }
    }

    /// Build the mirror in the next write phase, replacing any previous one.
    pub async fn build(&self) {
        self.host.mutate(|| self.build_now()).await;
    }

    /// Discard and rebuild the mirror in one write phase.
    ///
    /// Call after the live content changed so the clone catches up.
    pub async fn rebuild(&self) {
        self.host.mutate(|| self.build_now()).await;
    }

    /// Tear the mirror down in the next write phase.
    pub async fn destroy(&self) {
        self.host.mutate(|| self.destroy_now()).await;
    }

    /// Height of the mirrored content, read in the next read phase.
    pub async fn measure_height(&self) -> f64 {
        self.host.measure(|| self.read_height()).await
    }

    /// The height from the most recent measurement.
    pub fn cached_height(&self) -> Option<f64> {
        self.height.get()
    }

    /// Whether a mirror is currently in the document.
    pub fn is_built(&self) -> bool {
        self.built.borrow().is_some()
    }

    /// The container node, if built.
    pub fn container(&self) -> Option<H::Node> {
        self.built.borrow().as_ref().map(|b| b.container)
    }

    /// The measured inner node, if built.
    pub fn inner(&self) -> Option<H::Node> {
        self.built.borrow().as_ref().map(|b| b.inner)
    }

    /// How many times the mirror has been built.
    pub fn build_count(&self) -> u32 {
        self.builds.get()
    }

    /// Read the inner node's height. Must run inside a read phase.
    pub(crate) fn read_height(&self) -> f64 {
        let inner = self.inner();
        let height = match inner {
            Some(inner) => self.host.outer_height(inner),
            None => self.height.get().unwrap_or(0.0),
        };
        self.height.set(Some(height));
        height
    }

    /// Build synchronously. Must run inside a write phase.
    pub(crate) fn build_now(&self) {
        self.destroy_now();
        let host = &*self.host;

        let container = host.create_mirror(self.summary, MirrorPart::Container);
        let inner = host.create_mirror(container, MirrorPart::Inner);
        let clone = host.clone_subtree(self.content);
        let stripped = strip_nested_mirrors(host, clone);
        host.append(inner, clone);

        let guard = if host.supports_inert() {
            host.set_inert(container, true);
            None
        } else {
            host.set_accessibility_hidden(container, true);
            Some(host.disable(container))
        };
        host.observe(inner);

        *self.built.borrow_mut() = Some(Built {
            container,
            inner,
            guard,
        });
        self.builds.set(self.builds.get() + 1);
        trace!(?container, stripped, builds = self.builds.get(), "built content mirror");
    }

    /// Tear down synchronously. Must run inside a write phase.
    pub(crate) fn destroy_now(&self) {
        let Some(built) = self.built.borrow_mut().take() else {
            return;
        };
        if let Some(guard) = built.guard {
            guard.release();
        }
        self.host.unobserve(built.inner);
        self.host.remove(built.container);
        self.height.set(None);
    }
}

/// Remove every mirror container below `root`. Returns how many were removed.
fn strip_nested_mirrors<D: Dom + ?Sized>(dom: &D, root: D::Node) -> usize {
    let mut stack: SmallVec<[D::Node; 16]> = SmallVec::new();
    stack.push(root);
    let mut removed = 0;
    while let Some(node) = stack.pop() {
        for child in dom.children(node) {
            if dom.is_mirror(child) {
                dom.remove(child);
                removed += 1;
            } else {
                stack.push(child);
            }
        }
    }
    removed
}
