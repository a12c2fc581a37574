// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame phases for the headless host.
//!
//! Each call to [`FrameQueue::read_phase`] or [`FrameQueue::write_phase`]
//! reserves a slot in the corresponding queue right away. Opening a phase
//! readies every slot reserved so far; slots reserved while the phase runs
//! wait for the next frame.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::future::{Future, poll_fn};
use core::mem;
use core::task::{Poll, Waker};

#[derive(Debug, Default)]
struct Slot {
    ready: Cell<bool>,
    waker: RefCell<Option<Waker>>,
}

/// Pending read and write phase slots.
#[derive(Debug, Default)]
pub struct FrameQueue {
    reads: RefCell<Vec<Rc<Slot>>>,
    writes: RefCell<Vec<Rc<Slot>>>,
}

impl FrameQueue {
    /// Create empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a slot in the next read phase.
    pub fn read_phase(&self) -> impl Future<Output = ()> + 'static {
        reserve(&self.reads)
    }

    /// Reserve a slot in the next write phase.
    pub fn write_phase(&self) -> impl Future<Output = ()> + 'static {
        reserve(&self.writes)
    }

    /// Open the read phase. Returns how many slots were readied.
    pub fn open_reads(&self) -> usize {
        open(&self.reads)
    }

    /// Open the write phase. Returns how many slots were readied.
    pub fn open_writes(&self) -> usize {
        open(&self.writes)
    }

    /// Slots waiting for a phase.
    pub fn pending(&self) -> usize {
        self.reads.borrow().len() + self.writes.borrow().len()
    }
}

fn reserve(queue: &RefCell<Vec<Rc<Slot>>>) -> impl Future<Output = ()> + 'static {
    let slot = Rc::new(Slot::default());
    queue.borrow_mut().push(slot.clone());
    poll_fn(move |cx| {
        if slot.ready.get() {
            Poll::Ready(())
        } else {
            *slot.waker.borrow_mut() = Some(cx.waker().clone());
            Poll::Pending
        }
    })
}

fn open(queue: &RefCell<Vec<Rc<Slot>>>) -> usize {
    let slots = mem::take(&mut *queue.borrow_mut());
    for slot in &slots {
        slot.ready.set(true);
        if let Some(waker) = slot.waker.borrow_mut().take() {
            waker.wake();
        }
    }
    slots.len()
}
