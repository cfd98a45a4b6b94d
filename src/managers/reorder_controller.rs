//! Optimistic mutation state machine for one course editing session.
//!
//! Each accepted action moves the controller from `Idle` to `Pending`, carrying
//! the optimistic collection (already visible) and the collection it replaced.
//! The outcome of the sync call either commits the optimistic state or rolls
//! back to the previous one. Only one delta is ever in flight; actions arriving
//! meanwhile wait in a FIFO queue and are applied once the in-flight delta has
//! resolved.

use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::managers::tab_collection::{TabCollection, TabCollectionTrait};
use crate::types::course::CourseKey;
use crate::types::delta::{TabAction, TabChange, TabDelta};
use crate::types::errors::{SyncError, TabError};
use crate::types::tab::TabSnapshot;

/// Where the controller is in the current mutation attempt.
#[derive(Debug, Clone)]
pub enum ControllerState {
    Idle,
    Pending {
        previous: TabCollection,
        delta: TabDelta,
    },
}

/// What happened to a submitted action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Applied optimistically; the delta must now be persisted.
    InFlight(TabDelta),
    /// Waiting behind the in-flight delta, at this queue position.
    Queued(usize),
    /// The session is closed.
    Ignored,
}

/// Outcome reported while resolving the in-flight delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// The optimistic state is now authoritative.
    Committed(TabSnapshot),
    /// Persisting failed and the last confirmed state is back in place.
    RolledBack {
        restored: TabSnapshot,
        error: SyncError,
    },
    /// A queued action failed local validation and was dropped.
    ActionRejected { action: TabAction, error: TabError },
    /// A queued action was applied and its delta is now in flight.
    NextInFlight(TabDelta),
    /// The session ended before the result arrived; nothing changed.
    Discarded,
}

/// Translates author actions into collection mutations and tracks sync state.
pub struct ReorderController {
    course_key: CourseKey,
    collection: TabCollection,
    state: ControllerState,
    queue: VecDeque<TabAction>,
    closed: bool,
}

impl ReorderController {
    pub fn new(course_key: CourseKey, collection: TabCollection) -> Self {
        Self {
            course_key,
            collection,
            state: ControllerState::Idle,
            queue: VecDeque::new(),
            closed: false,
        }
    }

    pub fn course_key(&self) -> &CourseKey {
        &self.course_key
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ControllerState::Idle)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The delta currently being persisted, if any.
    pub fn in_flight(&self) -> Option<&TabDelta> {
        match &self.state {
            ControllerState::Pending { delta, .. } => Some(delta),
            ControllerState::Idle => None,
        }
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// The state shown to the author, optimistic while a sync is pending.
    pub fn snapshot(&self) -> TabSnapshot {
        self.collection.snapshot()
    }

    /// The last state the handler acknowledged (or the seed).
    pub fn confirmed_snapshot(&self) -> TabSnapshot {
        match &self.state {
            ControllerState::Pending { previous, .. } => previous.snapshot(),
            ControllerState::Idle => self.collection.snapshot(),
        }
    }

    /// Accept an author action.
    ///
    /// When idle the action is applied at once; a validation error is returned
    /// and nothing changes. While a delta is in flight the action is queued.
    pub fn submit(&mut self, action: TabAction) -> Result<Submission, TabError> {
        if self.closed {
            return Ok(Submission::Ignored);
        }
        if !self.is_idle() {
            self.queue.push_back(action);
            debug!(
                "[{}] queued action behind in-flight sync ({} waiting)",
                self.course_key,
                self.queue.len()
            );
            return Ok(Submission::Queued(self.queue.len()));
        }

        let delta = self.begin(action)?;
        Ok(Submission::InFlight(delta))
    }

    /// Resolve the in-flight delta with the sync outcome.
    ///
    /// Returns the events produced, ending with `NextInFlight` when a queued
    /// action took the in-flight slot.
    pub fn resolve(&mut self, outcome: Result<(), SyncError>) -> Vec<ControllerEvent> {
        if self.closed {
            self.state = ControllerState::Idle;
            return vec![ControllerEvent::Discarded];
        }

        let previous = match std::mem::replace(&mut self.state, ControllerState::Idle) {
            ControllerState::Pending { previous, .. } => previous,
            ControllerState::Idle => return Vec::new(),
        };

        let mut events = Vec::new();
        match outcome {
            Ok(()) => {
                info!("[{}] tab order committed", self.course_key);
                events.push(ControllerEvent::Committed(self.collection.snapshot()));
            }
            Err(error) => {
                warn!("[{}] rolling back tab change: {}", self.course_key, error);
                self.collection = previous;
                events.push(ControllerEvent::RolledBack {
                    restored: self.collection.snapshot(),
                    error,
                });
            }
        }

        while let Some(action) = self.queue.pop_front() {
            match self.begin(action.clone()) {
                Ok(delta) => {
                    events.push(ControllerEvent::NextInFlight(delta));
                    break;
                }
                Err(error) => {
                    debug!("[{}] dropping queued action: {}", self.course_key, error);
                    events.push(ControllerEvent::ActionRejected { action, error });
                }
            }
        }

        events
    }

    /// End the session. Any later result is discarded.
    pub fn close(&mut self) {
        self.closed = true;
        self.queue.clear();
    }

    /// Apply an action to the current collection and enter `Pending`.
    fn begin(&mut self, action: TabAction) -> Result<TabDelta, TabError> {
        let previous = self.collection.clone();
        let (change, removed) = self.apply(action)?;

        let delta = TabDelta {
            change,
            order: self.collection.records().to_vec(),
            removed,
        };
        debug!(
            "[{}] applied {:?}, syncing order {:?}",
            self.course_key,
            delta.change,
            delta.order_ids()
        );
        self.state = ControllerState::Pending {
            previous,
            delta: delta.clone(),
        };
        Ok(delta)
    }

    fn apply(&mut self, action: TabAction) -> Result<(TabChange, Vec<String>), TabError> {
        match action {
            TabAction::Add {
                descriptor,
                at_index,
            } => {
                let index = at_index.unwrap_or(self.collection.len());
                let tab_id = descriptor.tab_id.clone();
                self.collection.insert(descriptor, index)?;
                Ok((TabChange::Created { tab_id, index }, Vec::new()))
            }
            TabAction::Remove { tab_id } => {
                self.collection.remove(&tab_id)?;
                Ok((
                    TabChange::Removed {
                        tab_id: tab_id.clone(),
                    },
                    vec![tab_id],
                ))
            }
            TabAction::Move { tab_id, to_index } => {
                let from = self
                    .collection
                    .position(&tab_id)
                    .ok_or_else(|| TabError::NotFound(tab_id.clone()))?;
                self.collection.move_tab(&tab_id, to_index)?;
                Ok((
                    TabChange::Reordered {
                        tab_id,
                        from,
                        to: to_index,
                    },
                    Vec::new(),
                ))
            }
            TabAction::ToggleVisibility { tab_id } => {
                let snapshot = self.collection.toggle_visibility(&tab_id)?;
                let is_hidden = snapshot.get(&tab_id).map(|t| t.is_hidden).unwrap_or(false);
                Ok((
                    TabChange::VisibilityChanged { tab_id, is_hidden },
                    Vec::new(),
                ))
            }
        }
    }
}
