// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame driver for the headless host.
//!
//! A [`Stage`] owns a [`HeadlessHost`], the [`Registry`] of attached
//! controllers and a single-threaded executor. Each [`Stage::frame`]:
//!
//! 1. delivers queued toggle and content-update notifications,
//! 2. opens the read phase and runs tasks,
//! 3. opens the write phase and runs tasks,
//! 4. advances animations and runs tasks,
//! 5. delivers size changes and any new notifications, and runs tasks.
//!
//! Requests spawned through the stage run until their first suspension
//! point immediately, so a request's claim is visible as soon as the call
//! returns.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;
use core::future::Future;

use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use tracing::{debug, trace, warn};

use super::document::NodeId;
use super::host::{HeadlessHost, HostEvent};
use crate::config::DisclosureConfig;
use crate::controller::Disclosure;
use crate::error::{AttachError, ConfigurationError};
use crate::registry::Registry;

/// Frames after which [`Stage::settle`] gives up.
const SETTLE_LIMIT: usize = 256;
/// Frames after which [`Stage::finish_animations`] gives up.
const FINISH_LIMIT: usize = 10_000;
/// Frame step used by [`Stage::finish_animations`].
pub const FRAME_STEP: f64 = 1.0 / 60.0;

/// Result slot of a spawned operation.
#[derive(Debug)]
pub struct OpHandle<T> {
    slot: Rc<RefCell<Option<T>>>,
}

impl<T> OpHandle<T> {
    /// Whether the operation completed.
    pub fn is_done(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Take the result if the operation completed.
    pub fn take(&self) -> Option<T> {
        self.slot.borrow_mut().take()
    }
}

/// A controller attached to the stage.
pub type Controller = Rc<Disclosure<HeadlessHost>>;

/// Headless host, registry and executor.
pub struct Stage {
    host: Rc<HeadlessHost>,
    registry: Registry<HeadlessHost>,
    pool: LocalPool,
    config: DisclosureConfig,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("host", &self.host)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    /// A stage over a fresh [`HeadlessHost`].
    pub fn new() -> Self {
        Self::with_host(HeadlessHost::new())
    }

    /// A stage over `host`.
    pub fn with_host(host: HeadlessHost) -> Self {
        Self {
            host: Rc::new(host),
            registry: Registry::new(),
            pool: LocalPool::new(),
            config: DisclosureConfig::default(),
        }
    }

    /// Use `config` for controllers attached from now on.
    pub fn with_config(mut self, config: DisclosureConfig) -> Self {
        self.config = config;
        self
    }

    /// The host.
    pub fn host(&self) -> &Rc<HeadlessHost> {
        &self.host
    }

    /// Attached controllers.
    pub fn registry(&self) -> &Registry<HeadlessHost> {
        &self.registry
    }

    /// The controller attached to `details`.
    pub fn controller(&self, details: NodeId) -> Option<Controller> {
        self.registry.get(details).cloned()
    }

    /// Attach a controller to `details` and run frames until it is ready.
    pub fn attach(&mut self, details: NodeId) -> Result<Controller, AttachError> {
        if self.registry.contains(details) {
            return Err(AttachError::AlreadyAttached);
        }
        let handle = self.spawn(Disclosure::attach(
            self.host.clone(),
            details,
            self.config.clone(),
        ));
        self.settle();
        let controller = Rc::new(
            handle
                .take()
                .expect("attach only waits on frame phases, which settle opens")?,
        );
        self.registry.insert(controller.clone())?;
        Ok(controller)
    }

    /// Remove the controller of `details` and destroy it.
    ///
    /// Returns `false` when nothing was attached.
    pub fn detach(&mut self, details: NodeId) -> bool {
        let Some(controller) = self.registry.remove(details) else {
            return false;
        };
        self.spawn(async move { controller.destroy().await });
        self.settle();
        true
    }

    /// Request `open` on the controller of `details`.
    pub fn open(&mut self, details: NodeId) -> Option<OpHandle<Result<(), ConfigurationError>>> {
        let controller = self.controller(details)?;
        Some(self.spawn(async move { controller.open().await }))
    }

    /// Request `close` on the controller of `details`.
    pub fn close(&mut self, details: NodeId) -> Option<OpHandle<Result<(), ConfigurationError>>> {
        let controller = self.controller(details)?;
        Some(self.spawn(async move { controller.close().await }))
    }

    /// Request `toggle` on the controller of `details`.
    pub fn toggle(&mut self, details: NodeId) -> Option<OpHandle<Result<(), ConfigurationError>>> {
        let controller = self.controller(details)?;
        Some(self.spawn(async move { controller.toggle().await }))
    }

    /// The user activates the summary of `details`.
    ///
    /// The native default is suppressed and the controller toggles instead.
    pub fn activate(&mut self, details: NodeId) -> bool {
        self.toggle(details).is_some()
    }

    /// Change the native open state from outside the controller.
    pub fn set_native_open(&mut self, details: NodeId, open: bool) {
        self.host.set_native_open(details, open);
    }

    /// Spawn `future` and run it until it first waits.
    pub fn spawn<T: 'static>(&mut self, future: impl Future<Output = T> + 'static) -> OpHandle<T> {
        let slot = Rc::new(RefCell::new(None));
        let result = slot.clone();
        self.spawn_detached(async move {
            let value = future.await;
            *result.borrow_mut() = Some(value);
        });
        self.pool.run_until_stalled();
        OpHandle { slot }
    }

    /// Run one frame, advancing animations by `dt` seconds.
    ///
    /// Returns whether any phase, notification or size change was processed.
    /// Running animations alone do not count.
    pub fn frame(&mut self, dt: f64) -> bool {
        self.pool.run_until_stalled();
        let mut busy = self.deliver_events();

        busy |= self.host.frames().open_reads() > 0;
        self.pool.run_until_stalled();
        busy |= self.host.frames().open_writes() > 0;
        self.pool.run_until_stalled();

        self.host.advance_animations(dt);
        self.pool.run_until_stalled();

        busy |= self.deliver_resizes();
        busy |= self.deliver_events();
        self.pool.run_until_stalled();
        busy
    }

    /// Run frames without advancing time until nothing is left to do.
    pub fn settle(&mut self) {
        for _ in 0..SETTLE_LIMIT {
            if !self.frame(0.0) {
                return;
            }
        }
        warn!("stage did not settle");
    }

    /// Run frames for `seconds` in steps of `dt`.
    pub fn run_for(&mut self, seconds: f64, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let mut elapsed = 0.0;
        while elapsed < seconds {
            self.frame(dt);
            elapsed += dt;
        }
    }

    /// Run frames until every animation finished and nothing is left to do.
    pub fn finish_animations(&mut self) {
        for _ in 0..FINISH_LIMIT {
            let busy = self.frame(FRAME_STEP);
            if !busy && self.host.running_animations() == 0 {
                return;
            }
        }
        warn!("animations did not finish");
    }

    fn spawn_detached(&self, future: impl Future<Output = ()> + 'static) {
        if let Err(error) = self.pool.spawner().spawn_local(future) {
            warn!(%error, "failed to spawn task");
        }
    }

    fn deliver_events(&mut self) -> bool {
        let events = self.host.take_events();
        for &event in &events {
            trace!(?event, "delivering");
            match event {
                HostEvent::Toggle { details, open } => {
                    if let Some(controller) = self.controller(details) {
                        self.spawn_detached(async move {
                            if let Err(error) = controller.handle_toggle(open).await {
                                debug!(?details, open, %error, "native toggle not animated");
                            }
                        });
                    }
                }
                HostEvent::ContentUpdate { origin } => {
                    let route = {
                        let document = self.host.document();
                        self.registry.content_update_route(origin, &*document)
                    };
                    for controller in route {
                        self.spawn_detached(async move {
                            controller.handle_content_update(origin).await;
                        });
                    }
                }
            }
        }
        !events.is_empty()
    }

    fn deliver_resizes(&mut self) -> bool {
        let resized = self.host.take_resizes();
        for &node in &resized {
            for controller in self.registry.resize_targets(node) {
                self.spawn_detached(async move { controller.handle_resize().await });
            }
        }
        !resized.is_empty()
    }
}
