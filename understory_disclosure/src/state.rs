// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Disclosure state machine.
//!
//! A disclosure is either settled (`Closed` or `Open`) or moving towards one
//! of those (`Opening` or `Closing`). The committed open flag only changes
//! when an animation finishes; the in-flight direction is tracked separately
//! as a single optional transition, so "opening and closing at once" cannot
//! be represented.
//!
//! ## Transitions
//!
//! ```text
//! Closed --open--> Opening --finished--> Open
//! Open --close--> Closing --finished--> Closed
//! Opening --cancelled--> Closed
//! Closing --cancelled--> Open
//! Opening --close--> Closing    (supersedes the open)
//! Closing --open--> Opening     (supersedes the close)
//! ```
//!
//! ## Guards
//!
//! - `can_open = !opening && (closing || !open)`
//! - `can_close = !closing && (opening || open)`
//!
//! Requests that fail their guard are no-ops. Requests that pass it *claim*
//! the transition right away and receive an operation id; any later step of
//! an operation whose id is no longer current is skipped.

use core::fmt;

/// Observable state of a disclosure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisclosureState {
    /// Settled closed.
    Closed,
    /// Animating towards open.
    Opening,
    /// Settled open.
    Open,
    /// Animating towards closed.
    Closing,
}

impl DisclosureState {
    /// Whether an open or close is in flight.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }
}

impl fmt::Display for DisclosureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closing => "closing",
        })
    }
}

/// Direction of a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards open.
    Open,
    /// Towards closed.
    Close,
}

impl Direction {
    /// The committed open flag once a transition in this direction finishes.
    pub fn target_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// The transient state while moving in this direction.
    pub fn transient_state(self) -> DisclosureState {
        match self {
            Self::Open => DisclosureState::Opening,
            Self::Close => DisclosureState::Closing,
        }
    }
}

bitflags::bitflags! {
    /// Presentation indicators written to the disclosure element.
    ///
    /// Hosts render these as classes; see [`StateClasses::class_names`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct StateClasses: u8 {
        /// Base indicator, present while a controller is attached.
        const ANIMATED = 0b0000_0001;
        /// Committed open.
        const OPEN     = 0b0000_0010;
        /// Open animation in flight.
        const OPENING  = 0b0000_0100;
        /// Close animation in flight.
        const CLOSING  = 0b0000_1000;
    }
}

impl StateClasses {
    /// Both in-flight indicators.
    pub const TRANSIENT: Self = Self::OPENING.union(Self::CLOSING);

    const NAMES: [(Self, &'static str); 4] = [
        (Self::ANIMATED, "details-animated"),
        (Self::OPEN, "details-animated--open"),
        (Self::OPENING, "details-animated--opening"),
        (Self::CLOSING, "details-animated--closing"),
    ];

    /// Class names of the set indicators, base first.
    ///
    /// ```
    /// use understory_disclosure::StateClasses;
    ///
    /// let names: Vec<_> = (StateClasses::ANIMATED | StateClasses::OPEN)
    ///     .class_names()
    ///     .collect();
    /// assert_eq!(names, ["details-animated", "details-animated--open"]);
    /// ```
    pub fn class_names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }

    /// Indicators for a settled disclosure.
    pub fn settled(open: bool) -> Self {
        if open {
            Self::ANIMATED | Self::OPEN
        } else {
            Self::ANIMATED
        }
    }
}

/// An in-flight transition owned by one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Transition {
    pub(crate) direction: Direction,
    pub(crate) op: u64,
}

/// Ownership handed to a request that passed its guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Claim {
    pub(crate) op: u64,
    /// The transition this claim superseded, if any.
    pub(crate) previous: Option<Transition>,
}

/// Committed open flag plus the single in-flight transition.
#[derive(Clone, Debug)]
pub(crate) struct Lifecycle {
    open: bool,
    transition: Option<Transition>,
    next_op: u64,
}

impl Lifecycle {
    pub(crate) fn new(open: bool) -> Self {
        Self {
            open,
            transition: None,
            next_op: 1,
        }
    }

    pub(crate) fn state(&self) -> DisclosureState {
        match (self.transition, self.open) {
            (Some(t), _) => t.direction.transient_state(),
            (None, true) => DisclosureState::Open,
            (None, false) => DisclosureState::Closed,
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open
    }

    pub(crate) fn is_opening(&self) -> bool {
        self.is_moving(Direction::Open)
    }

    pub(crate) fn is_closing(&self) -> bool {
        self.is_moving(Direction::Close)
    }

    fn is_moving(&self, direction: Direction) -> bool {
        self.transition.is_some_and(|t| t.direction == direction)
    }

    pub(crate) fn can_open(&self) -> bool {
        !self.is_opening() && (self.is_closing() || !self.open)
    }

    pub(crate) fn can_close(&self) -> bool {
        !self.is_closing() && (self.is_opening() || self.open)
    }

    pub(crate) fn can(&self, direction: Direction) -> bool {
        match direction {
            Direction::Open => self.can_open(),
            Direction::Close => self.can_close(),
        }
    }

    /// Take ownership of a transition in `direction` if the guard allows it.
    pub(crate) fn claim(&mut self, direction: Direction) -> Option<Claim> {
        if !self.can(direction) {
            return None;
        }
        let op = self.next_op;
        self.next_op += 1;
        let previous = self.transition.replace(Transition { direction, op });
        Some(Claim { op, previous })
    }

    pub(crate) fn is_current(&self, op: u64) -> bool {
        self.transition.is_some_and(|t| t.op == op)
    }

    /// Record a finished animation.
    ///
    /// The committed flag always follows the finished direction; the
    /// transition is only cleared when `op` still owns it.
    pub(crate) fn finish(&mut self, op: u64, direction: Direction) -> bool {
        self.open = direction.target_open();
        let current = self.is_current(op);
        if current {
            self.transition = None;
        }
        current
    }

    /// Drop the transition of a cancelled operation. Returns whether `op` owned it.
    pub(crate) fn cancel(&mut self, op: u64) -> bool {
        let current = self.is_current(op);
        if current {
            self.transition = None;
        }
        current
    }

    /// Give up a claim that never started animating.
    ///
    /// `previous` is put back only when the caller knows its animation is
    /// still live; otherwise the element falls back to its committed state.
    pub(crate) fn abandon(&mut self, op: u64, previous: Option<Transition>) {
        if self.is_current(op) {
            self.transition = previous;
        }
    }

    /// Make every outstanding operation stale.
    pub(crate) fn invalidate(&mut self) {
        self.transition = None;
    }
}
