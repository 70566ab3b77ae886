//! Scroll-driven "load more" trigger with at most one load in flight.
//!
//! The controller never performs I/O. A trigger comes back from
//! [`ScrollLoadController::position_changed`] as a [`LoadTicket`]; whoever holds the
//! ticket runs the fetch and hands the ticket back once the feed has been updated.

use tracing::{debug, info, warn};

use crate::constants::DEFAULT_VISIBLE_THRESHOLD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
}

/// Last scroll position reported by the reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollPosition {
    pub visible_count: usize,
    pub total_count: usize,
    pub last_visible_index: usize,
}

/// Completion handle for one triggered load. Deliberately not `Clone`: a load
/// completes exactly once.
#[must_use = "a load ticket must be handed back to the controller"]
#[derive(Debug, PartialEq, Eq)]
pub struct LoadTicket {
    id: u64,
}

impl LoadTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug)]
pub struct ScrollLoadController {
    visible_threshold: usize,
    state: LoadState,
    // loading until the first non-empty feed is seen
    warming_up: bool,
    position: ScrollPosition,
    issued: u64,
}

impl Default for ScrollLoadController {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBLE_THRESHOLD)
    }
}

impl ScrollLoadController {
    pub fn new(visible_threshold: usize) -> Self {
        Self {
            visible_threshold,
            state: LoadState::Loading,
            warming_up: true,
            position: ScrollPosition::default(),
            issued: 0,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    /// Still waiting for the first non-empty feed.
    pub fn is_warming_up(&self) -> bool {
        self.warming_up
    }

    pub fn visible_threshold(&self) -> usize {
        self.visible_threshold
    }

    pub fn position(&self) -> ScrollPosition {
        self.position
    }

    /// Feed a scroll update. Returns a ticket when a load should start now.
    pub fn position_changed(
        &mut self,
        visible_count: usize,
        total_count: usize,
        last_visible_index: usize,
    ) -> Option<LoadTicket> {
        self.position = ScrollPosition {
            visible_count,
            total_count,
            last_visible_index,
        };

        if self.warming_up {
            if total_count == 0 {
                return None;
            }
            self.warming_up = false;
            self.state = LoadState::Idle;
            info!(total_count, "feed has a baseline, load-more enabled");
        }
        self.check_load_more()
    }

    /// Record the feed length without evaluating the trigger, e.g. right after a
    /// page was merged and before the load is completed.
    pub fn record_total_count(&mut self, total_count: usize) {
        self.position.total_count = total_count;
    }

    /// The load behind `ticket` finished and the feed is up to date. Goes back to
    /// idle and re-evaluates straight away, so a small page can trigger the next load.
    pub fn request_completed(&mut self, ticket: LoadTicket) -> Option<LoadTicket> {
        if !self.release(ticket) {
            return None;
        }
        self.check_load_more()
    }

    /// The load behind `ticket` failed or had nothing to fetch. Goes back to idle
    /// and waits for the next scroll update instead of re-triggering.
    pub fn request_abandoned(&mut self, ticket: LoadTicket) {
        self.release(ticket);
    }

    fn release(&mut self, ticket: LoadTicket) -> bool {
        if self.state != LoadState::Loading || ticket.id != self.issued {
            warn!(ticket = ticket.id, current = self.issued, "ignoring stale load ticket");
            return false;
        }
        self.state = LoadState::Idle;
        true
    }

    /// Starts a load when at most `visible_threshold` blocks are left below the last
    /// visible one, i.e. `last_visible_index + 1 + visible_threshold >= total_count`.
    /// The shorter `last_visible_index + visible_threshold >= total_count` is off by
    /// one: with a threshold of 10 and 30 blocks it fires at index 20, not 19.
    fn check_load_more(&mut self) -> Option<LoadTicket> {
        if self.state == LoadState::Loading {
            return None;
        }
        let ScrollPosition {
            total_count,
            last_visible_index,
            ..
        } = self.position;
        let reach = last_visible_index
            .saturating_add(1)
            .saturating_add(self.visible_threshold);
        if reach < total_count {
            return None;
        }

        self.state = LoadState::Loading;
        self.issued += 1;
        debug!(
            ticket = self.issued,
            last_visible_index, total_count, "threshold reached, loading more"
        );
        Some(LoadTicket { id: self.issued })
    }
}
