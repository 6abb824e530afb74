//! Bounded journal of the transitions a machine performed.
//!
//! The journal is a ring: once full, recording a transition drops the oldest
//! record, so a warm journal never allocates.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

/// What kind of re-link a transition performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TransitionKind {
    /// The machine installed a new root from the outside (`start`).
    Start,
    /// A state replaced itself.
    Switch,
    /// A state attached (or replaced) its sub-state.
    SubState,
    /// The machine exited its whole chain (`stop`).
    Stop,
}

/// Record of a single transition.
///
/// # Example
///
/// ```rust
/// use statepool::core::{TransitionKind, TransitionRecord};
/// use chrono::Utc;
///
/// let record = TransitionRecord {
///     kind: TransitionKind::Switch,
///     depth: 1,
///     from: Some("Walk"),
///     to: Some("Run"),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(record.to, Some("Run"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransitionRecord {
    pub kind: TransitionKind,
    /// Chain depth the transition happened at; the root is at depth 0
    pub depth: usize,
    /// State that occupied the slot before, if any
    pub from: Option<&'static str>,
    /// State that occupies the slot after, `None` when the slot was emptied
    pub to: Option<&'static str>,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

/// Ordered, bounded history of transitions.
#[derive(Clone, Debug, Serialize)]
pub struct TransitionHistory {
    records: VecDeque<TransitionRecord>,
    capacity: usize,
    total: u64,
}

impl Default for TransitionHistory {
    fn default() -> Self {
        Self::new(32)
    }
}

impl TransitionHistory {
    /// Create a journal keeping the `capacity` most recent records.
    ///
    /// A capacity of zero disables recording.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// Append a record, dropping the oldest one when full.
    pub fn record(&mut self, record: TransitionRecord) {
        self.total += 1;
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Retained records, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TransitionRecord> + '_ {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of transitions ever recorded, including dropped ones.
    pub fn total_recorded(&self) -> u64 {
        self.total
    }

    /// States that entered a slot, in order.
    ///
    /// Starts with the `from` of the oldest retained record when it has one.
    pub fn path(&self) -> Vec<&'static str> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(from) = self.records.front().and_then(|first| first.from) {
            path.push(from);
        }
        path.extend(self.records.iter().filter_map(|record| record.to));
        path
    }

    /// Time between the oldest and newest retained records.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.front()?, self.records.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
