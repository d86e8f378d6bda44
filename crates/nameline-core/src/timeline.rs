//! The accumulated (events, snapshots) pair and its presentation ordering.
//!
//! A [`Timeline`] owns two index-aligned arrays: the classified events in
//! arrival order and, for each index, the snapshot immediately after that
//! event was folded. Folding is strictly left-to-right over arrival order;
//! the presentation ordering (dedup by transaction id, then chronological
//! sort) is a derived index list that never disturbs the fold sequence.

use std::collections::HashSet;

use crate::classify::ClassifiedEvent;
use crate::model::{FoldMode, Snapshot, StateDelta, fold};

/// Index-aligned (classified event, snapshot-after) sequences for one
/// session, plus the derived presentation ordering.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    events: Vec<ClassifiedEvent>,
    snapshots: Vec<Snapshot>,
}

impl Timeline {
    /// Empty timeline; its implicit predecessor snapshot is
    /// `Snapshot::default()`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sanitized delta against the latest snapshot and append
    /// both the event and the resulting snapshot.
    ///
    /// This is the only mutation path, which keeps the
    /// `events.len() == snapshots.len()` invariant by construction.
    pub fn apply(&mut self, event: ClassifiedEvent, delta: &StateDelta, mode: FoldMode) {
        let next = match self.snapshots.last() {
            Some(prev) => fold(prev, delta, mode),
            None => fold(&Snapshot::default(), delta, mode),
        };
        self.events.push(event);
        self.snapshots.push(next);
    }

    /// Number of applied events (equals the number of snapshots).
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when no event has been applied yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The classified events in arrival order.
    #[must_use]
    pub fn events(&self) -> &[ClassifiedEvent] {
        &self.events
    }

    /// The snapshots in arrival order; `snapshots()[i]` is the state
    /// immediately after `events()[i]`.
    #[must_use]
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// The state after the most recent event, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Compute the presentation ordering:
    ///
    /// 1. keep only the **first** arrival index per distinct transaction
    ///    id (later duplicates are excluded entirely);
    /// 2. stable-sort the survivors ascending by event timestamp, so ties
    ///    preserve arrival order.
    ///
    /// Assumes one event per transaction id; if upstream ever emits two
    /// distinct kinds under one id, the second is dropped here.
    #[must_use]
    pub fn presentation_order(&self) -> Vec<usize> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut order: Vec<usize> = (0..self.events.len())
            .filter(|&i| seen.insert(self.events[i].tx_id.as_str()))
            .collect();
        order.sort_by_key(|&i| self.events[i].ts);
        order
    }

    /// The deduplicated, chronologically ordered (event, snapshot) pairs.
    #[must_use]
    pub fn presented(&self) -> Vec<(&ClassifiedEvent, &Snapshot)> {
        self.presentation_order()
            .into_iter()
            .map(|i| (&self.events[i], &self.snapshots[i]))
            .collect()
    }
}
