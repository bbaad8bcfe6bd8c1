//! Per-frame load state and in-flight load bookkeeping.
//!
//! A frame with a source url moves through these states:
//! 1. `Unloaded` - no content yet, the next activation fetches it
//! 2. `Loading` - a fetch (or deferred failure) is outstanding
//! 3. `Loaded` / `Failed` - settled, activations never fetch again
//!
//! Only a forced load moves a settled frame back to `Loading`.

use std::collections::HashMap;

use crate::transition::Ticket;
use crate::FrameId;

/// Load state of a single frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadState {
    /// Has no content and has never been fetched
    Unloaded,
    /// A load is outstanding
    Loading,
    /// Content was fetched, or was present from the start
    Loaded,
    /// The last load failed and a placeholder was put in place
    Failed,
}

impl LoadState {
    /// Check whether the frame needs no further automatic load.
    #[inline]
    pub fn is_settled(self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::Failed)
    }
}

/// An outstanding load and the transitions waiting to reveal its frame.
#[derive(Debug)]
struct InFlight<W> {
    ticket: Ticket,
    waiters: Vec<W>,
}

/// Load states of every frame a router has touched.
///
/// `W` is whatever a waiting transition needs to resume once the load
/// settles.
#[derive(Debug)]
pub(crate) struct LoadTable<W> {
    states: HashMap<FrameId, LoadState>,
    in_flight: HashMap<FrameId, InFlight<W>>,
}

impl<W> Default for LoadTable<W> {
    fn default() -> Self {
        Self {
            states: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }
}

impl<W> LoadTable<W> {
    /// Current state of `frame`, if it was ever recorded.
    pub fn state(&self, frame: &FrameId) -> Option<LoadState> {
        self.states.get(frame).copied()
    }

    /// State of `frame`, seeding it from whether the element already has
    /// content the first time the frame is seen.
    pub fn observe(&mut self, frame: &FrameId, has_content: impl FnOnce() -> bool) -> LoadState {
        *self.states.entry(frame.clone()).or_insert_with(|| {
            if has_content() {
                LoadState::Loaded
            } else {
                LoadState::Unloaded
            }
        })
    }

    /// Start a load for `frame` under `ticket`.
    ///
    /// A load already in flight is superseded: its waiters move to the new
    /// ticket and the old ticket's result will be reported as stale.
    pub fn begin(&mut self, frame: &FrameId, ticket: Ticket) {
        self.states.insert(frame.clone(), LoadState::Loading);
        match self.in_flight.get_mut(frame) {
            Some(in_flight) => in_flight.ticket = ticket,
            None => {
                self.in_flight.insert(
                    frame.clone(),
                    InFlight {
                        ticket,
                        waiters: Vec::new(),
                    },
                );
            }
        }
    }

    /// Register a waiter on the load in flight for `frame`.
    ///
    /// Returns the waiter back when nothing is in flight.
    pub fn wait(&mut self, frame: &FrameId, waiter: W) -> Result<(), W> {
        match self.in_flight.get_mut(frame) {
            Some(in_flight) => {
                in_flight.waiters.push(waiter);
                Ok(())
            }
            None => Err(waiter),
        }
    }

    /// Settle the load of `frame` that was issued under `ticket`.
    ///
    /// Returns the waiters to resume, or `None` when `ticket` is no longer
    /// the current load for the frame.
    pub fn settle(&mut self, frame: &FrameId, ticket: Ticket, ok: bool) -> Option<Vec<W>> {
        match self.in_flight.get(frame) {
            Some(in_flight) if in_flight.ticket == ticket => {}
            _ => return None,
        }
        let in_flight = self.in_flight.remove(frame)?;
        let state = if ok { LoadState::Loaded } else { LoadState::Failed };
        self.states.insert(frame.clone(), state);
        Some(in_flight.waiters)
    }
}
