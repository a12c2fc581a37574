// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The disclosure controller.
//!
//! [`Disclosure`] animates one disclosure element open and closed. It is
//! shared behind an `Rc` and every operation takes `&self`; internal state
//! lives in a `RefCell` that is never held across an await, so operations on
//! the same controller may interleave freely.
//!
//! ## Opening
//!
//! 1. Claim the transition (state becomes `Opening` immediately).
//! 2. Announce a content update so containing disclosures re-measure.
//! 3. Read the open timing (read phase).
//! 4. Write the opening indicator (write phase).
//! 5. Measure keyframes from the current to the expanded height (read phase).
//! 6. Stop any running animation and start the new one (write phase).
//! 7. Await the animation. When it finishes, commit `Open`: write the native
//!    open state, settle the indicators, clear the inline height, rebuild the
//!    mirror, re-cache heights and announce another content update. When it is
//!    cancelled, fall back to the committed state.
//!
//! Closing is symmetric, except that cached heights are refreshed before
//! measuring and the closing indicator is written together with the start of
//! the animation.
//!
//! ## Supersession
//!
//! A request that passes its guard owns the transition until a newer request
//! claims it. Each step above first checks that ownership; a superseded
//! request stops at its next step. An animation that finishes after its
//! request was superseded still commits the native open state, but leaves the
//! indicators to the newer request.
//!
//! [`destroy`](Disclosure::destroy) always wins: it supersedes everything,
//! stops the animation and restores the markup.

use alloc::format;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::config::DisclosureConfig;
use crate::error::{AttachError, ConfigurationError};
use crate::height::{HeightOracle, HeightSample, Keyframes};
use crate::host::{Animation, Completion, Host};
use crate::mirror::ContentMirror;
use crate::state::{Claim, Direction, DisclosureState, Lifecycle, StateClasses};
use crate::timing::Timing;

struct Running<A> {
    op: u64,
    handle: A,
}

struct State<H: Host> {
    lifecycle: Lifecycle,
    classes: StateClasses,
    animation: Option<Running<H::Animation>>,
    heights: HeightSample,
    destroyed: bool,
    /// Native open values this controller wrote whose toggle reports are still due.
    pending_echoes: SmallVec<[bool; 2]>,
    /// Operations whose request is still running.
    live_ops: SmallVec<[u64; 2]>,
}

impl<H: Host> State<H> {
    fn owns_animation(&self, op: u64) -> bool {
        self.animation.as_ref().is_some_and(|a| a.op == op)
    }
}

/// Removes an operation from `live_ops` when its request ends, however it ends.
struct LiveOp<'a, H: Host> {
    state: &'a RefCell<State<H>>,
    op: u64,
}

impl<H: Host> Drop for LiveOp<'_, H> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.live_ops.retain(|op| *op != self.op);
        }
    }
}

/// Animated controller for one disclosure element.
pub struct Disclosure<H: Host> {
    host: Rc<H>,
    details: H::Node,
    summary: H::Node,
    content: H::Node,
    config: DisclosureConfig,
    oracle: HeightOracle<H::Node>,
    mirror: ContentMirror<H>,
    state: RefCell<State<H>>,
}

impl<H: Host> fmt::Debug for Disclosure<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Disclosure")
            .field("details", &self.details)
            .field("state", &state.lifecycle.state())
            .field("open", &state.lifecycle.is_open())
            .field("classes", &state.classes)
            .field("heights", &state.heights)
            .field("animating", &state.animation.is_some())
            .field("destroyed", &state.destroyed)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Disclosure<H> {
    /// Attach a controller to `details`.
    ///
    /// Reads the native open state, writes the base indicator (plus the open
    /// indicator when open), builds the mirror, caches heights and starts
    /// observing the summary.
    pub async fn attach(
        host: Rc<H>,
        details: H::Node,
        config: DisclosureConfig,
    ) -> Result<Self, AttachError> {
        let summary = host.summary(details).ok_or(AttachError::MissingSummary)?;
        let content = host.content(details).ok_or(AttachError::MissingContent)?;
        let open = host.is_open(details);
        let classes = StateClasses::settled(open);

        let this = Self {
            mirror: ContentMirror::new(host.clone(), summary, content),
            oracle: HeightOracle::new(details, summary),
            host,
            details,
            summary,
            content,
            config,
            state: RefCell::new(State {
                lifecycle: Lifecycle::new(open),
                classes,
                animation: None,
                heights: HeightSample::default(),
                destroyed: false,
                pending_echoes: SmallVec::new(),
                live_ops: SmallVec::new(),
            }),
        };

        this.host
            .mutate(|| this.host.set_classes(details, classes))
            .await;
        this.mirror.build().await;
        this.refresh_heights().await;
        this.host.observe(summary);
        debug!(?details, open, "attached disclosure");
        Ok(this)
    }

    /// Animate open. A no-op when already open or opening.
    pub async fn open(&self) -> Result<(), ConfigurationError> {
        self.run(Direction::Open).await
    }

    /// Animate closed. A no-op when already closed or closing.
    pub async fn close(&self) -> Result<(), ConfigurationError> {
        self.run(Direction::Close).await
    }

    /// Close when open or opening, open otherwise.
    pub async fn toggle(&self) -> Result<(), ConfigurationError> {
        let direction = match self.state() {
            DisclosureState::Open | DisclosureState::Opening => Direction::Close,
            DisclosureState::Closed | DisclosureState::Closing => Direction::Open,
        };
        self.run(direction).await
    }

    /// React to the host reporting a native open-state change.
    ///
    /// Reports caused by this controller's own commits are ignored.
    pub async fn handle_toggle(&self, native_open: bool) -> Result<(), ConfigurationError> {
        {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return Ok(());
            }
            if state.pending_echoes.first() == Some(&native_open) {
                state.pending_echoes.remove(0);
                trace!(details = ?self.details, native_open, "ignored own toggle report");
                return Ok(());
            }
        }
        if native_open {
            self.open().await
        } else {
            self.close().await
        }
    }

    /// React to a content update announced by `origin`.
    ///
    /// Rebuilds the mirror so it reflects the changed content, then re-caches
    /// heights unless a transition is in flight. Self-originated updates are
    /// ignored.
    pub async fn handle_content_update(&self, origin: H::Node) {
        if origin == self.details || self.is_destroyed() {
            return;
        }
        trace!(details = ?self.details, ?origin, "content update");
        self.rebuild_mirror().await;
        if !self.is_busy() {
            self.refresh_heights().await;
        }
    }

    /// React to a size change of the summary or the mirror.
    pub async fn handle_resize(&self) {
        if self.is_busy() {
            return;
        }
        self.refresh_heights().await;
    }

    /// Detach: cancel everything, tear down the mirror, restore the markup.
    ///
    /// Leaves the native open state as last committed. Every later request or
    /// notification is ignored.
    pub async fn destroy(&self) {
        let animation = {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.lifecycle.invalidate();
            state.pending_echoes.clear();
            state.animation.take()
        };
        if let Some(running) = animation {
            running.handle.stop();
        }
        self.host.unobserve(self.summary);
        self.host
            .mutate(|| {
                self.mirror.destroy_now();
                self.host.set_classes(self.details, StateClasses::empty());
                self.host.clear_inline_height(self.details);
                self.host
                    .set_style_property(self.details, &self.config.summary_height_property, None);
                self.host
                    .set_style_property(self.details, &self.config.content_height_property, None);
            })
            .await;
        debug!(details = ?self.details, "destroyed disclosure");
    }

    /// Current state.
    pub fn state(&self) -> DisclosureState {
        self.state.borrow().lifecycle.state()
    }

    /// Committed open state.
    pub fn is_open(&self) -> bool {
        self.state.borrow().lifecycle.is_open()
    }

    /// Whether an open is in flight.
    pub fn is_opening(&self) -> bool {
        self.state.borrow().lifecycle.is_opening()
    }

    /// Whether a close is in flight.
    pub fn is_closing(&self) -> bool {
        self.state.borrow().lifecycle.is_closing()
    }

    /// Whether an animation is running.
    pub fn is_animating(&self) -> bool {
        self.state.borrow().animation.is_some()
    }

    /// Whether [`open`](Self::open) would do anything.
    pub fn can_open(&self) -> bool {
        let state = self.state.borrow();
        !state.destroyed && state.lifecycle.can_open()
    }

    /// Whether [`close`](Self::close) would do anything.
    pub fn can_close(&self) -> bool {
        let state = self.state.borrow();
        !state.destroyed && state.lifecycle.can_close()
    }

    /// Most recently cached heights.
    pub fn heights(&self) -> HeightSample {
        self.state.borrow().heights
    }

    /// Indicators as last written.
    pub fn classes(&self) -> StateClasses {
        self.state.borrow().classes
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }

    /// The controlled element.
    pub fn details(&self) -> H::Node {
        self.details
    }

    /// The summary (trigger) element.
    pub fn summary(&self) -> H::Node {
        self.summary
    }

    /// The content wrapper.
    pub fn content(&self) -> H::Node {
        self.content
    }

    /// The content mirror.
    pub fn mirror(&self) -> &ContentMirror<H> {
        &self.mirror
    }

    /// Configuration in use.
    pub fn config(&self) -> &DisclosureConfig {
        &self.config
    }

    /// Whether size changes of `node` concern this controller.
    pub fn observes(&self, node: H::Node) -> bool {
        !self.is_destroyed() && (node == self.summary || self.mirror.inner() == Some(node))
    }

    fn is_busy(&self) -> bool {
        let state = self.state.borrow();
        state.destroyed || state.animation.is_some() || state.lifecycle.state().is_transient()
    }

    fn is_current(&self, op: u64) -> bool {
        let state = self.state.borrow();
        !state.destroyed && state.lifecycle.is_current(op)
    }

    async fn run(&self, direction: Direction) -> Result<(), ConfigurationError> {
        let claim = {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                None
            } else {
                let claim = state.lifecycle.claim(direction);
                if let Some(claim) = claim {
                    state.live_ops.push(claim.op);
                }
                claim
            }
        };
        let Some(claim) = claim else {
            trace!(details = ?self.details, ?direction, state = %self.state(), "request ignored");
            return Ok(());
        };
        let _live = LiveOp {
            state: &self.state,
            op: claim.op,
        };
        trace!(details = ?self.details, ?direction, op = claim.op, "claimed transition");

        self.host.dispatch_content_update(self.details);

        let timing = match self
            .oracle
            .read_animation_parameters(&*self.host, &self.config, direction)
            .await
        {
            Ok(timing) => timing,
            Err(error) => {
                self.abandon(claim).await;
                warn!(details = ?self.details, ?direction, %error, "invalid animation timing");
                return Err(error);
            }
        };
        if !self.is_current(claim.op) {
            return Ok(());
        }

        match direction {
            Direction::Open => {
                self.host.mutate(|| self.write_opening(claim.op)).await;
            }
            Direction::Close => self.refresh_heights().await,
        }
        if !self.is_current(claim.op) {
            return Ok(());
        }

        let keyframes = self
            .oracle
            .keyframes(&*self.host, &self.mirror, direction)
            .await;
        let started = self
            .host
            .mutate(|| self.start_animation(claim.op, direction, &keyframes, &timing))
            .await;
        let Some(handle) = started else {
            return Ok(());
        };

        match handle.finished().await {
            Completion::Finished => self.commit(claim.op, direction).await,
            Completion::Cancelled => self.revert(claim.op).await,
        }
        Ok(())
    }

    /// Drop a claim that failed before animating.
    ///
    /// A superseded request that is still running gets the transition back.
    /// Otherwise the element falls back to its committed state, and any
    /// indicator a finished request left behind is settled.
    async fn abandon(&self, claim: Claim) {
        let stale = {
            let mut state = self.state.borrow_mut();
            let previous = claim
                .previous
                .filter(|previous| state.live_ops.contains(&previous.op));
            state.lifecycle.abandon(claim.op, previous);
            let settled = StateClasses::settled(state.lifecycle.is_open());
            previous.is_none() && state.classes != settled
        };
        if !stale {
            return;
        }
        self.host
            .mutate(|| {
                let classes = {
                    let mut state = self.state.borrow_mut();
                    if state.destroyed || state.lifecycle.state().is_transient() {
                        return;
                    }
                    state.classes = StateClasses::settled(state.lifecycle.is_open());
                    state.classes
                };
                self.host.set_classes(self.details, classes);
            })
            .await;
    }

    fn write_opening(&self, op: u64) {
        let classes = {
            let mut state = self.state.borrow_mut();
            if state.destroyed || !state.lifecycle.is_current(op) {
                return;
            }
            state.classes.insert(StateClasses::OPENING);
            state.classes.remove(StateClasses::CLOSING);
            state.classes
        };
        self.host.set_classes(self.details, classes);
    }

    fn start_animation(
        &self,
        op: u64,
        direction: Direction,
        keyframes: &Keyframes,
        timing: &Timing,
    ) -> Option<H::Animation> {
        let (previous, closing) = {
            let mut state = self.state.borrow_mut();
            if state.destroyed || !state.lifecycle.is_current(op) {
                return None;
            }
            let closing = (direction == Direction::Close).then(|| {
                state.classes.insert(StateClasses::CLOSING);
                state.classes.remove(StateClasses::OPENING | StateClasses::OPEN);
                state.classes
            });
            (state.animation.take(), closing)
        };
        if let Some(classes) = closing {
            self.host.set_classes(self.details, classes);
        }
        if let Some(previous) = previous {
            trace!(details = ?self.details, op = previous.op, "stopping superseded animation");
            previous.handle.stop();
        }
        let handle = self.host.animate(self.details, keyframes, timing);
        self.state.borrow_mut().animation = Some(Running {
            op,
            handle: handle.clone(),
        });
        trace!(
            details = ?self.details,
            ?direction,
            from = keyframes.from,
            to = keyframes.to,
            duration = timing.duration,
            "started animation"
        );
        Some(handle)
    }

    async fn commit(&self, op: u64, direction: Direction) {
        let open = direction.target_open();
        let current = self
            .host
            .mutate(|| {
                let (current, write_open, clear_height, classes) = {
                    let mut state = self.state.borrow_mut();
                    if state.destroyed {
                        return false;
                    }
                    if state.owns_animation(op) {
                        state.animation = None;
                    }
                    let current = state.lifecycle.finish(op, direction);
                    // A newer animation owns the inline height.
                    let clear_height = current || state.animation.is_none();
                    let write_open = self.host.is_open(self.details) != open;
                    if write_open {
                        state.pending_echoes.push(open);
                    }
                    if current {
                        state.classes = StateClasses::settled(open);
                    }
                    (current, write_open, clear_height, state.classes)
                };
                if write_open {
                    self.host.set_open(self.details, open);
                }
                if clear_height {
                    self.host.clear_inline_height(self.details);
                }
                if current {
                    self.host.set_classes(self.details, classes);
                }
                current
            })
            .await;
        if !current {
            return;
        }

        self.rebuild_mirror().await;
        self.refresh_heights().await;
        if self.is_destroyed() {
            return;
        }
        self.host.dispatch_content_update(self.details);
        debug!(details = ?self.details, open, "committed transition");
    }

    async fn revert(&self, op: u64) {
        self.host
            .mutate(|| {
                let classes = {
                    let mut state = self.state.borrow_mut();
                    if state.owns_animation(op) {
                        state.animation = None;
                    }
                    if state.destroyed || !state.lifecycle.cancel(op) {
                        return;
                    }
                    let open = state.lifecycle.is_open();
                    state.classes.remove(StateClasses::TRANSIENT);
                    state.classes.set(StateClasses::OPEN, open);
                    state.classes
                };
                self.host.set_classes(self.details, classes);
                self.host.clear_inline_height(self.details);
                trace!(details = ?self.details, op, "reverted cancelled transition");
            })
            .await;
    }

    async fn rebuild_mirror(&self) {
        self.host
            .mutate(|| {
                if !self.is_destroyed() {
                    self.mirror.build_now();
                }
            })
            .await;
    }

    /// Measure and publish the summary and content heights.
    async fn refresh_heights(&self) {
        if self.is_destroyed() {
            return;
        }
        let sample = self.oracle.sample(&*self.host, &self.mirror).await;
        let summary = format!("{}px", sample.summary);
        let content = format!("{}px", sample.content);
        self.host
            .mutate(|| {
                {
                    let mut state = self.state.borrow_mut();
                    if state.destroyed {
                        return;
                    }
                    state.heights = sample;
                }
                self.host.set_style_property(
                    self.details,
                    &self.config.summary_height_property,
                    Some(&summary),
                );
                self.host.set_style_property(
                    self.details,
                    &self.config.content_height_property,
                    Some(&content),
                );
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Dom;
    use crate::headless::{Element, HeadlessHost, NodeId, Stage};
    use crate::timing::CubicBezier;
    use alloc::string::String;
    use alloc::vec::Vec;

    const FRAME: f64 = 1.0 / 60.0;

    /// A closed disclosure with a 40px summary and 200px of content.
    fn closed_stage() -> (Stage, NodeId) {
        let mut stage = Stage::new();
        let details = {
            let mut doc = stage.host().document_mut();
            let parts = doc.insert_details(None, 40.0, false);
            doc.insert(Some(parts.content), Element::block(200.0));
            parts.details
        };
        stage.attach(details).unwrap();
        (stage, details)
    }

    fn height(stage: &Stage, node: NodeId) -> f64 {
        stage.host().document().outer_height(node)
    }

    fn inline_height(stage: &Stage, node: NodeId) -> Option<f64> {
        stage.host().document().element(node).unwrap().inline_height
    }

    #[test]
    fn attach_reads_native_state_and_caches_heights() {
        let (stage, details) = closed_stage();
        let controller = stage.controller(details).unwrap();

        assert_eq!(controller.state(), DisclosureState::Closed);
        assert_eq!(controller.classes(), StateClasses::ANIMATED);
        assert_eq!(
            controller.heights(),
            HeightSample {
                summary: 40.0,
                content: 200.0
            }
        );
        let doc = stage.host().document();
        let element = doc.element(details).unwrap();
        assert_eq!(
            element.style.get("--details-summary-height").map(String::as_str),
            Some("40px")
        );
        assert_eq!(
            element.style.get("--details-content-height").map(String::as_str),
            Some("200px")
        );
        assert!(controller.mirror().is_built());
        assert!(stage.host().is_observed(controller.summary()));
    }

    #[test]
    fn attach_open_element_writes_open_indicator() {
        let mut stage = Stage::new();
        let details = {
            let mut doc = stage.host().document_mut();
            let parts = doc.insert_details(None, 40.0, true);
            doc.insert(Some(parts.content), Element::block(60.0));
            parts.details
        };
        let controller = stage.attach(details).unwrap();

        assert_eq!(controller.state(), DisclosureState::Open);
        assert_eq!(
            controller.classes(),
            StateClasses::ANIMATED | StateClasses::OPEN
        );
    }

    #[test]
    fn attach_requires_summary_and_content() {
        let mut stage = Stage::new();
        let bare = stage
            .host()
            .document_mut()
            .insert(None, Element::details(false));
        assert_eq!(stage.attach(bare).unwrap_err(), AttachError::MissingSummary);

        stage
            .host()
            .document_mut()
            .insert(Some(bare), Element::summary(40.0));
        assert_eq!(stage.attach(bare).unwrap_err(), AttachError::MissingContent);
        assert!(stage.controller(bare).is_none());
    }

    #[test]
    fn attaching_twice_is_refused() {
        let (mut stage, details) = closed_stage();
        assert_eq!(
            stage.attach(details).unwrap_err(),
            AttachError::AlreadyAttached
        );
    }

    #[test]
    fn open_animates_from_summary_to_expanded_height() {
        let (mut stage, details) = closed_stage();
        let op = stage.open(details).unwrap();

        stage.finish_animations();

        assert_eq!(op.take(), Some(Ok(())));
        let started = stage.host().started_animations();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].keyframes.to_css(), ["40px", "240px"]);

        let controller = stage.controller(details).unwrap();
        assert!(controller.is_open());
        assert_eq!(controller.state(), DisclosureState::Open);
        assert_eq!(
            controller.classes(),
            StateClasses::ANIMATED | StateClasses::OPEN
        );
        assert!(stage.host().document().element(details).unwrap().open);
        assert_eq!(inline_height(&stage, details), None);
        assert_eq!(height(&stage, details), 240.0);
    }

    #[test]
    fn open_uses_themed_timing() {
        let (mut stage, details) = closed_stage();
        stage
            .host()
            .document_mut()
            .set_style(details, "--details-open-duration", "500ms");
        stage.host().document_mut().set_style(
            details,
            "--details-open-easing",
            "cubic-bezier(0.1,0.2,0.3,0.4)",
        );

        stage.open(details).unwrap();
        stage.finish_animations();

        let started = stage.host().started_animations();
        assert_eq!(
            started[0].timing,
            Timing::new(0.5, CubicBezier([0.1, 0.2, 0.3, 0.4]))
        );
    }

    #[test]
    fn opening_sets_transient_indicator_mid_flight() {
        let (mut stage, details) = closed_stage();
        stage.open(details).unwrap();

        stage.run_for(0.1, FRAME);

        let controller = stage.controller(details).unwrap();
        assert_eq!(controller.state(), DisclosureState::Opening);
        assert!(controller.is_animating());
        assert_eq!(
            controller.classes(),
            StateClasses::ANIMATED | StateClasses::OPENING
        );
        let mid = height(&stage, details);
        assert!(mid > 40.0 && mid < 240.0, "mid-flight height was {mid}");
    }

    #[test]
    fn open_when_open_resolves_immediately() {
        let (mut stage, details) = closed_stage();
        stage.open(details).unwrap();
        stage.finish_animations();
        let controller = stage.controller(details).unwrap();
        let builds = controller.mirror().build_count();

        // Guard fails synchronously, so the future is ready on first poll.
        assert_eq!(futures::executor::block_on(controller.open()), Ok(()));
        assert_eq!(stage.host().started_animations().len(), 1);
        assert_eq!(controller.mirror().build_count(), builds);
        assert_eq!(stage.host().take_events().len(), 0);
    }

    #[test]
    fn close_when_closed_resolves_immediately() {
        let (stage, details) = closed_stage();
        let controller = stage.controller(details).unwrap();

        assert_eq!(futures::executor::block_on(controller.close()), Ok(()));
        assert_eq!(controller.state(), DisclosureState::Closed);
        assert!(stage.host().started_animations().is_empty());
    }

    #[test]
    fn open_then_close_round_trips() {
        let (mut stage, details) = closed_stage();
        stage.open(details).unwrap();
        stage.finish_animations();
        stage.close(details).unwrap();
        stage.finish_animations();

        let controller = stage.controller(details).unwrap();
        assert_eq!(controller.state(), DisclosureState::Closed);
        assert!(!stage.host().document().element(details).unwrap().open);
        assert_eq!(height(&stage, details), 40.0);
        assert_eq!(inline_height(&stage, details), None);
        assert_eq!(controller.classes(), StateClasses::ANIMATED);

        let started = stage.host().started_animations();
        assert_eq!(started[1].keyframes.to_css(), ["240px", "40px"]);
    }

    #[test]
    fn close_before_open_finishes_ends_closed() {
        let (mut stage, details) = closed_stage();
        stage.open(details).unwrap();
        stage.run_for(0.1, FRAME);
        let mid = height(&stage, details);

        stage.close(details).unwrap();
        let controller = stage.controller(details).unwrap();
        assert_eq!(controller.state(), DisclosureState::Closing);
        assert!(!(controller.is_opening() && controller.is_closing()));

        stage.finish_animations();

        assert_eq!(controller.state(), DisclosureState::Closed);
        assert!(!controller.is_opening() && !controller.is_closing());
        assert_eq!(inline_height(&stage, details), None);
        assert_eq!(height(&stage, details), 40.0);
        assert_eq!(controller.classes(), StateClasses::ANIMATED);

        // The close starts from the interrupted height, not the expanded one.
        let started = stage.host().started_animations();
        assert_eq!(started.len(), 2);
        let from = started[1].keyframes.from;
        assert!(from >= mid && from < 240.0, "close started from {from}");
        assert_eq!(started[1].keyframes.to, 40.0);
    }

    #[test]
    fn reopening_while_closing_ends_open() {
        let (mut stage, details) = closed_stage();
        stage.open(details).unwrap();
        stage.finish_animations();

        stage.close(details).unwrap();
        stage.run_for(0.05, FRAME);
        stage.open(details).unwrap();
        stage.finish_animations();

        let controller = stage.controller(details).unwrap();
        assert_eq!(controller.state(), DisclosureState::Open);
        assert_eq!(
            controller.classes(),
            StateClasses::ANIMATED | StateClasses::OPEN
        );
        assert!(stage.host().document().element(details).unwrap().open);
        assert_eq!(height(&stage, details), 240.0);
    }

    #[test]
    fn rapid_requests_keep_one_live_animation() {
        let (mut stage, details) = closed_stage();
        for _ in 0..5 {
            stage.toggle(details).unwrap();
            stage.frame(FRAME);
            stage.toggle(details).unwrap();
            stage.toggle(details).unwrap();
            stage.frame(FRAME);
            stage.frame(FRAME);
        }
        stage.finish_animations();

        assert!(stage.host().max_live_animations(details) <= 1);
        let controller = stage.controller(details).unwrap();
        assert!(!controller.state().is_transient());
        assert_eq!(inline_height(&stage, details), None);
        let expected = if controller.is_open() { 240.0 } else { 40.0 };
        assert_eq!(height(&stage, details), expected);
        assert_eq!(
            stage.host().document().element(details).unwrap().open,
            controller.is_open()
        );
    }

    #[test]
    fn second_request_in_same_tick_sees_transition() {
        let (mut stage, details) = closed_stage();
        let controller = stage.controller(details).unwrap();

        stage.open(details).unwrap();
        assert!(controller.is_opening());
        assert!(!controller.can_open());
        assert!(controller.can_close());

        stage.open(details).unwrap();
        stage.finish_animations();
        assert_eq!(stage.host().started_animations().len(), 1);
    }

    #[test]
    fn malformed_timing_leaves_element_untouched() {
        let (mut stage, details) = closed_stage();
        stage
            .host()
            .document_mut()
            .set_style(details, "--details-open-easing", "banana");
        let before = stage.host().document().element(details).unwrap().clone();

        let op = stage.open(details).unwrap();
        stage.finish_animations();

        assert_eq!(
            op.take(),
            Some(Err(ConfigurationError::Easing {
                value: "banana".into()
            }))
        );
        let controller = stage.controller(details).unwrap();
        assert_eq!(controller.state(), DisclosureState::Closed);
        assert_eq!(controller.classes(), StateClasses::ANIMATED);
        assert!(stage.host().started_animations().is_empty());
        assert_eq!(stage.host().document().element(details).unwrap(), &before);
    }

    #[test]
    fn malformed_close_timing_keeps_running_open() {
        let (mut stage, details) = closed_stage();
        stage
            .host()
            .document_mut()
            .set_style(details, "--details-close-duration", "soon");
        stage.open(details).unwrap();
        stage.run_for(0.05, FRAME);

        let op = stage.close(details).unwrap();
        stage.frame(FRAME);
        assert!(matches!(
            op.take(),
            Some(Err(ConfigurationError::Duration { .. }))
        ));

        // The open was never stopped and is restored as the owner.
        let controller = stage.controller(details).unwrap();
        assert_eq!(controller.state(), DisclosureState::Opening);
        stage.finish_animations();
        assert_eq!(controller.state(), DisclosureState::Open);
    }

    #[test]
    fn malformed_close_before_open_animates_keeps_the_open() {
        let (mut stage, details) = closed_stage();
        stage
            .host()
            .document_mut()
            .set_style(details, "--details-close-duration", "soon");
        stage.open(details).unwrap();
        stage.frame(FRAME);

        // The open wrote its indicator but has not started animating yet.
        let controller = stage.controller(details).unwrap();
        assert_eq!(
            controller.classes(),
            StateClasses::ANIMATED | StateClasses::OPENING
        );
        assert!(!controller.is_animating());

        let op = stage.close(details).unwrap();
        stage.finish_animations();

        assert!(matches!(
            op.take(),
            Some(Err(ConfigurationError::Duration { .. }))
        ));
        assert_eq!(controller.state(), DisclosureState::Open);
        assert_eq!(
            controller.classes(),
            StateClasses::ANIMATED | StateClasses::OPEN
        );
        assert_eq!(
            stage.host().document().element(details).unwrap().classes,
            StateClasses::ANIMATED | StateClasses::OPEN
        );
        assert_eq!(stage.host().started_animations().len(), 1);
        assert_eq!(height(&stage, details), 240.0);
    }

    #[test]
    fn malformed_close_after_superseded_commit_settles_indicators() {
        let (mut stage, details) = closed_stage();
        stage
            .host()
            .document_mut()
            .set_style(details, "--details-close-duration", "soon");
        stage.open(details).unwrap();
        stage.run_for(0.05, FRAME);

        // The open finishes while the close is still waiting for its timing,
        // and this host flushes writes before the close's read.
        stage.host().advance_animations(1.0);
        let op = stage.close(details).unwrap();
        assert_eq!(stage.host().frames().open_writes(), 1);
        stage.spawn(async {});
        stage.finish_animations();

        assert!(matches!(
            op.take(),
            Some(Err(ConfigurationError::Duration { .. }))
        ));
        let controller = stage.controller(details).unwrap();
        assert_eq!(controller.state(), DisclosureState::Open);
        let expected = StateClasses::ANIMATED | StateClasses::OPEN;
        assert_eq!(controller.classes(), expected);
        let doc = stage.host().document();
        let element = doc.element(details).unwrap();
        assert_eq!(element.classes, expected);
        assert!(element.open);
        assert_eq!(element.inline_height, None);
    }

    #[test]
    fn superseded_commit_keeps_newer_start_height() {
        let (mut stage, details) = closed_stage();
        stage.open(details).unwrap();
        stage.run_for(0.05, FRAME);

        // Walk the close up to its animation start without advancing time.
        stage.close(details).unwrap();
        stage.frame(0.0);
        stage.frame(0.0);
        stage.host().frames().open_reads();
        stage.spawn(async {});

        // The open finishes now; its commit lands after the close starts.
        stage.host().advance_animations(1.0);
        stage.spawn(async {});
        assert_eq!(stage.host().frames().open_writes(), 2);
        stage.spawn(async {});

        let controller = stage.controller(details).unwrap();
        assert!(controller.is_closing());
        assert!(controller.is_animating());
        let from = stage.host().started_animations()[1].keyframes.from;
        assert_eq!(inline_height(&stage, details), Some(from));

        stage.finish_animations();
        assert_eq!(controller.state(), DisclosureState::Closed);
        assert_eq!(height(&stage, details), 40.0);
        assert_eq!(inline_height(&stage, details), None);
        assert!(stage.host().max_live_animations(details) <= 1);
    }

    #[test]
    fn resize_during_animation_waits_for_commit() {
        let (mut stage, details) = closed_stage();
        stage.open(details).unwrap();
        stage.run_for(0.05, FRAME);
        let controller = stage.controller(details).unwrap();
        assert!(controller.is_animating());

        stage
            .host()
            .document_mut()
            .set_own_height(controller.summary(), 48.0);
        stage.run_for(0.05, FRAME);

        assert!(controller.is_opening());
        assert_eq!(controller.heights().summary, 40.0);
        assert_eq!(
            stage
                .host()
                .document()
                .computed_style(details, "--details-summary-height"),
            Some("40px")
        );

        stage.finish_animations();
        assert_eq!(controller.heights().summary, 48.0);
        assert_eq!(
            stage
                .host()
                .document()
                .computed_style(details, "--details-summary-height"),
            Some("48px")
        );
    }

    #[test]
    fn content_update_during_animation_rebuilds_only() {
        let (mut stage, details) = closed_stage();
        stage.open(details).unwrap();
        stage.run_for(0.05, FRAME);
        let controller = stage.controller(details).unwrap();
        let builds = controller.mirror().build_count();

        let content = controller.content();
        stage
            .host()
            .document_mut()
            .insert(Some(content), Element::block(25.0));
        stage.host().dispatch_content_update(content);
        stage.run_for(0.05, FRAME);

        assert!(controller.is_opening());
        assert!(controller.mirror().build_count() > builds);
        assert_eq!(controller.heights().content, 200.0);
        assert_eq!(
            stage
                .host()
                .document()
                .computed_style(details, "--details-content-height"),
            Some("200px")
        );

        stage.finish_animations();
        assert_eq!(controller.heights().content, 225.0);
    }

    #[test]
    fn external_cancel_reverts_to_committed_state() {
        let (mut stage, details) = closed_stage();
        stage.open(details).unwrap();
        stage.run_for(0.05, FRAME);

        stage.host().cancel_animations(details);
        stage.settle();

        let controller = stage.controller(details).unwrap();
        assert_eq!(controller.state(), DisclosureState::Closed);
        assert_eq!(controller.classes(), StateClasses::ANIMATED);
        assert_eq!(inline_height(&stage, details), None);
        assert!(!stage.host().document().element(details).unwrap().open);
    }

    #[test]
    fn own_toggle_reports_are_ignored() {
        let (mut stage, details) = closed_stage();
        stage.open(details).unwrap();
        stage.finish_animations();

        // The commit wrote `open`; its report was delivered and swallowed.
        let controller = stage.controller(details).unwrap();
        assert_eq!(controller.state(), DisclosureState::Open);
        assert_eq!(stage.host().started_animations().len(), 1);
    }

    #[test]
    fn native_toggle_drives_controller() {
        let (mut stage, details) = closed_stage();
        stage.open(details).unwrap();
        stage.finish_animations();

        stage.set_native_open(details, false);
        stage.finish_animations();

        let controller = stage.controller(details).unwrap();
        assert_eq!(controller.state(), DisclosureState::Closed);
        assert_eq!(stage.host().started_animations().len(), 2);
    }

    #[test]
    fn activating_summary_toggles() {
        let (mut stage, details) = closed_stage();
        stage.activate(details);
        stage.finish_animations();
        assert!(stage.controller(details).unwrap().is_open());

        stage.activate(details);
        stage.finish_animations();
        assert!(!stage.controller(details).unwrap().is_open());
    }

    #[test]
    fn nested_open_updates_parent_cache() {
        let mut stage = Stage::new();
        let (parent, child) = {
            let mut doc = stage.host().document_mut();
            let parent = doc.insert_details(None, 40.0, true);
            let child = doc.insert_details(Some(parent.content), 50.0, false);
            doc.insert(Some(child.content), Element::block(100.0));
            doc.insert(Some(parent.content), Element::block(30.0));
            (parent.details, child.details)
        };
        stage.attach(parent).unwrap();
        stage.attach(child).unwrap();
        let outer = stage.controller(parent).unwrap();
        assert_eq!(outer.heights().content, 80.0);

        stage.open(child).unwrap();
        stage.finish_animations();

        assert_eq!(outer.heights().content, 180.0);
        assert_eq!(
            stage
                .host()
                .document()
                .element(parent)
                .unwrap()
                .style
                .get("--details-content-height")
                .map(String::as_str),
            Some("180px")
        );
        // The parent itself never animated.
        let animated: Vec<NodeId> = stage
            .host()
            .started_animations()
            .iter()
            .map(|a| a.node)
            .collect();
        assert_eq!(animated, [child]);
    }

    #[test]
    fn siblings_ignore_each_other() {
        let mut stage = Stage::new();
        let (a, b) = {
            let mut doc = stage.host().document_mut();
            let a = doc.insert_details(None, 40.0, false);
            doc.insert(Some(a.content), Element::block(10.0));
            let b = doc.insert_details(None, 40.0, false);
            doc.insert(Some(b.content), Element::block(10.0));
            (a.details, b.details)
        };
        stage.attach(a).unwrap();
        stage.attach(b).unwrap();
        let builds = stage.controller(b).unwrap().mirror().build_count();

        stage.open(a).unwrap();
        stage.finish_animations();

        assert_eq!(stage.controller(b).unwrap().mirror().build_count(), builds);
    }

    #[test]
    fn content_update_recaches_heights() {
        let (mut stage, details) = closed_stage();
        let content = stage.controller(details).unwrap().content();
        stage
            .host()
            .document_mut()
            .insert(Some(content), Element::block(25.0));

        // The mirror is a clone, so it only follows after a content update.
        stage.host().dispatch_content_update(content);
        stage.settle();

        let controller = stage.controller(details).unwrap();
        assert_eq!(controller.heights().content, 225.0);
    }

    #[test]
    fn summary_resize_is_observed() {
        let (mut stage, details) = closed_stage();
        let summary = stage.controller(details).unwrap().summary();
        stage.host().document_mut().set_own_height(summary, 48.0);

        stage.settle();

        assert_eq!(stage.controller(details).unwrap().heights().summary, 48.0);
    }

    #[test]
    fn destroy_during_animation_restores_markup() {
        let (mut stage, details) = closed_stage();
        stage.open(details).unwrap();
        stage.run_for(0.05, FRAME);
        let controller = stage.controller(details).unwrap();
        let summary = controller.summary();

        stage.detach(details);

        assert!(controller.is_destroyed());
        assert!(!controller.is_animating());
        assert!(!controller.mirror().is_built());
        let doc = stage.host().document();
        let element = doc.element(details).unwrap();
        assert!(element.classes.is_empty());
        assert_eq!(element.inline_height, None);
        assert!(element.style.is_empty());
        assert!(!element.open);
        assert!(doc.descendants(details).into_iter().all(|n| !doc.is_mirror(n)));
        drop(doc);
        assert!(!stage.host().is_observed(summary));
    }

    #[test]
    fn destroyed_controller_ignores_everything() {
        let (mut stage, details) = closed_stage();
        let controller = stage.controller(details).unwrap();
        let content = controller.content();
        stage.detach(details);
        let builds = controller.mirror().build_count();

        assert_eq!(futures::executor::block_on(controller.open()), Ok(()));
        assert_eq!(
            futures::executor::block_on(controller.handle_toggle(true)),
            Ok(())
        );
        futures::executor::block_on(controller.handle_content_update(content));
        futures::executor::block_on(controller.handle_resize());
        stage.finish_animations();

        assert_eq!(controller.state(), DisclosureState::Closed);
        assert!(!controller.can_open());
        assert_eq!(controller.mirror().build_count(), builds);
        assert!(stage.host().started_animations().is_empty());
        assert!(stage.host().document().element(details).unwrap().classes.is_empty());
    }

    #[test]
    fn fallback_guard_released_on_destroy() {
        let mut stage = Stage::with_host(HeadlessHost::without_inert());
        let details = {
            let mut doc = stage.host().document_mut();
            let parts = doc.insert_details(None, 40.0, false);
            doc.insert(Some(parts.content), Element::block(20.0).focusable());
            parts.details
        };
        stage.attach(details).unwrap();
        assert_eq!(stage.host().active_guards(), 1);

        stage.open(details).unwrap();
        stage.finish_animations();
        assert_eq!(stage.host().active_guards(), 1);

        stage.detach(details);
        assert_eq!(stage.host().active_guards(), 0);
    }

    #[test]
    fn zero_duration_still_commits() {
        let (mut stage, details) = closed_stage();
        stage
            .host()
            .document_mut()
            .set_style(details, "--details-open-duration", "0s");
        stage.open(details).unwrap();
        stage.finish_animations();
        assert!(stage.controller(details).unwrap().is_open());
        assert_eq!(height(&stage, details), 240.0);
    }
}
