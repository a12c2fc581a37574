// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Height animations for the headless host.
//!
//! Animations apply their current height as the node's inline height each
//! time the timeline advances. A finished animation leaves its end height in
//! place; a stopped one leaves whatever height it had reached.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::future::{Future, poll_fn};
use core::task::{Poll, Waker};

use hashbrown::HashMap;

use super::document::{Document, NodeId};
use crate::height::Keyframes;
use crate::host::{Animation, Completion};
use crate::timing::Timing;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
    Running,
    Finished,
    Cancelled,
}

#[derive(Debug)]
struct AnimationState {
    node: NodeId,
    keyframes: Keyframes,
    timing: Timing,
    elapsed: Cell<f64>,
    status: Cell<Status>,
    wakers: RefCell<Vec<Waker>>,
}

impl AnimationState {
    fn settle(&self, status: Status) {
        self.status.set(status);
        for waker in self.wakers.borrow_mut().drain(..) {
            waker.wake();
        }
    }
}

/// Handle to a headless animation. Clones share the animation.
#[derive(Clone, Debug)]
pub struct HeadlessAnimation(Rc<AnimationState>);

impl HeadlessAnimation {
    /// The animated node.
    pub fn node(&self) -> NodeId {
        self.0.node
    }

    /// Start and end heights.
    pub fn keyframes(&self) -> Keyframes {
        self.0.keyframes
    }

    /// Whether the animation is still running.
    pub fn is_running(&self) -> bool {
        self.0.status.get() == Status::Running
    }

    /// Linear time progress in `0..=1`.
    pub fn progress(&self) -> f64 {
        let duration = self.0.timing.duration;
        if duration <= 0.0 {
            return 1.0;
        }
        (self.0.elapsed.get() / duration).min(1.0)
    }
}

impl Animation for HeadlessAnimation {
    fn stop(&self) {
        if self.is_running() {
            self.0.settle(Status::Cancelled);
        }
    }

    fn finished(&self) -> impl Future<Output = Completion> {
        let state = self.0.clone();
        poll_fn(move |cx| match state.status.get() {
            Status::Finished => Poll::Ready(Completion::Finished),
            Status::Cancelled => Poll::Ready(Completion::Cancelled),
            Status::Running => {
                state.wakers.borrow_mut().push(cx.waker().clone());
                Poll::Pending
            }
        })
    }
}

/// Record of a started animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StartedAnimation {
    /// The animated node.
    pub node: NodeId,
    /// Start and end heights.
    pub keyframes: Keyframes,
    /// Duration and easing.
    pub timing: Timing,
}

/// Every animation of one document.
#[derive(Debug, Default)]
pub struct Timeline {
    running: RefCell<Vec<HeadlessAnimation>>,
    started: RefCell<Vec<StartedAnimation>>,
    max_live: RefCell<HashMap<NodeId, usize>>,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an animation and apply its start height.
    pub fn start(
        &self,
        document: &mut Document,
        node: NodeId,
        keyframes: Keyframes,
        timing: Timing,
    ) -> HeadlessAnimation {
        let animation = HeadlessAnimation(Rc::new(AnimationState {
            node,
            keyframes,
            timing,
            elapsed: Cell::new(0.0),
            status: Cell::new(Status::Running),
            wakers: RefCell::new(Vec::new()),
        }));
        if let Some(element) = document.element_mut(node) {
            element.inline_height = Some(keyframes.from);
        }

        let mut running = self.running.borrow_mut();
        running.retain(HeadlessAnimation::is_running);
        running.push(animation.clone());
        let live = running.iter().filter(|a| a.node() == node).count();
        let mut max_live = self.max_live.borrow_mut();
        let max = max_live.entry(node).or_insert(0);
        *max = (*max).max(live);

        self.started.borrow_mut().push(StartedAnimation {
            node,
            keyframes,
            timing,
        });
        animation
    }

    /// Advance every running animation by `dt` seconds.
    ///
    /// Returns how many animations were running before the step.
    pub fn advance(&self, document: &mut Document, dt: f64) -> usize {
        let running: Vec<_> = self
            .running
            .borrow()
            .iter()
            .filter(|a| a.is_running())
            .cloned()
            .collect();
        for animation in &running {
            let state = &animation.0;
            state.elapsed.set(state.elapsed.get() + dt);
            let progress = animation.progress();
            let height = if progress >= 1.0 {
                state.keyframes.to
            } else {
                state.keyframes.at(state.timing.easing.ease(progress))
            };
            if let Some(element) = document.element_mut(state.node) {
                element.inline_height = Some(height);
            }
            if progress >= 1.0 {
                state.settle(Status::Finished);
            }
        }
        self.running.borrow_mut().retain(HeadlessAnimation::is_running);
        running.len()
    }

    /// Stop every running animation of `node`, as if cancelled from outside.
    pub fn cancel(&self, node: NodeId) {
        let running: Vec<_> = self
            .running
            .borrow()
            .iter()
            .filter(|a| a.node() == node)
            .cloned()
            .collect();
        for animation in running {
            animation.stop();
        }
    }

    /// Number of running animations.
    pub fn running(&self) -> usize {
        self.running.borrow().iter().filter(|a| a.is_running()).count()
    }

    /// Every animation started so far, in order.
    pub fn started(&self) -> Vec<StartedAnimation> {
        self.started.borrow().clone()
    }

    /// Most animations ever running at once on `node`.
    pub fn max_live(&self, node: NodeId) -> usize {
        self.max_live.borrow().get(&node).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::Element;
    use crate::timing::CubicBezier;
    use core::pin::pin;
    use core::task::Context;

    fn poll(animation: &HeadlessAnimation) -> Poll<Completion> {
        let mut cx = Context::from_waker(Waker::noop());
        pin!(animation.finished()).poll(&mut cx)
    }

    fn setup() -> (Document, NodeId, Timeline) {
        let mut doc = Document::new();
        let node = doc.insert(None, Element::block(0.0));
        (doc, node, Timeline::new())
    }

    #[test]
    fn runs_to_end_height() {
        let (mut doc, node, timeline) = setup();
        let animation = timeline.start(
            &mut doc,
            node,
            Keyframes::new(40.0, 240.0),
            Timing::new(0.2, CubicBezier::LINEAR),
        );
        assert_eq!(doc.outer_height(node), 40.0);
        assert_eq!(poll(&animation), Poll::Pending);

        timeline.advance(&mut doc, 0.1);
        let mid = doc.outer_height(node);
        assert!((mid - 140.0) < 1e-6 && (140.0 - mid) < 1e-6, "mid was {mid}");

        timeline.advance(&mut doc, 0.1);
        assert_eq!(doc.outer_height(node), 240.0);
        assert_eq!(poll(&animation), Poll::Ready(Completion::Finished));
        assert_eq!(timeline.running(), 0);
    }

    #[test]
    fn stop_cancels_and_keeps_reached_height() {
        let (mut doc, node, timeline) = setup();
        let animation = timeline.start(
            &mut doc,
            node,
            Keyframes::new(0.0, 100.0),
            Timing::new(1.0, CubicBezier::LINEAR),
        );
        timeline.advance(&mut doc, 0.5);

        animation.stop();
        assert_eq!(poll(&animation), Poll::Ready(Completion::Cancelled));
        timeline.advance(&mut doc, 1.0);
        assert_eq!(doc.outer_height(node), 50.0);

        // Stopping a settled animation changes nothing.
        animation.stop();
        assert_eq!(poll(&animation), Poll::Ready(Completion::Cancelled));
    }

    #[test]
    fn zero_duration_finishes_on_first_step() {
        let (mut doc, node, timeline) = setup();
        let animation = timeline.start(
            &mut doc,
            node,
            Keyframes::new(10.0, 20.0),
            Timing::new(0.0, CubicBezier::EASE),
        );
        timeline.advance(&mut doc, 0.0);
        assert_eq!(poll(&animation), Poll::Ready(Completion::Finished));
        assert_eq!(doc.outer_height(node), 20.0);
    }

    #[test]
    fn tracks_overlapping_animations() {
        let (mut doc, node, timeline) = setup();
        let first = timeline.start(
            &mut doc,
            node,
            Keyframes::new(0.0, 1.0),
            Timing::default(),
        );
        assert_eq!(timeline.max_live(node), 1);

        first.stop();
        timeline.start(&mut doc, node, Keyframes::new(0.0, 1.0), Timing::default());
        assert_eq!(timeline.max_live(node), 1);

        timeline.start(&mut doc, node, Keyframes::new(0.0, 1.0), Timing::default());
        assert_eq!(timeline.max_live(node), 2);
        assert_eq!(timeline.started().len(), 3);

        timeline.cancel(node);
        assert_eq!(timeline.running(), 0);
    }
}
