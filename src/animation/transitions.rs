//! Bookkeeping for camera transitions handed to the renderer.
//!
//! The renderer animates; this module only tracks which transition is the
//! current one and when its loading flag must be released. Only the most
//! recent transition can complete: an older id reported late is ignored.

use crate::core::camera::CameraTarget;
use instant::Instant;
use std::time::Duration;

pub type TransitionId = u64;

/// Why the camera is moving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionType {
    Shop,
    Location,
    FitBounds,
    Explore,
    ClusterExpansion,
    Nearby,
}

/// Final state of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Completed,
    TimedOut,
}

/// How a transition stopped holding the loading flag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionOutcome {
    pub id: TransitionId,
    pub transition_type: TransitionType,
    pub target: CameraTarget,
    pub state: TransitionState,
}

impl TransitionOutcome {
    pub fn timed_out(&self) -> bool {
        self.state == TransitionState::TimedOut
    }
}

/// A camera transition in flight
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub id: TransitionId,
    pub transition_type: TransitionType,
    pub target: CameraTarget,
    pub started_at: Instant,
    deadline: Instant,
}

impl Transition {
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    fn finish(self, state: TransitionState) -> TransitionOutcome {
        TransitionOutcome {
            id: self.id,
            transition_type: self.transition_type,
            target: self.target,
            state,
        }
    }
}

/// Tracks at most one running transition
#[derive(Debug)]
pub struct TransitionManager {
    active: Option<Transition>,
    next_id: TransitionId,
    timeout: Duration,
}

impl TransitionManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            active: None,
            next_id: 1,
            timeout,
        }
    }

    /// Starts a transition, superseding any running one and its deadline
    pub fn start(
        &mut self,
        transition_type: TransitionType,
        target: CameraTarget,
        now: Instant,
    ) -> TransitionId {
        let id = self.next_id;
        self.next_id += 1;

        if let Some(previous) = self.active.take() {
            log::debug!(
                "transition {} ({:?}) superseded by {}",
                previous.id,
                previous.transition_type,
                id
            );
        }

        self.active = Some(Transition {
            id,
            transition_type,
            target,
            started_at: now,
            deadline: now + self.timeout,
        });
        id
    }

    /// Completion signal from the renderer; ignored unless `id` is current
    pub fn complete(&mut self, id: TransitionId) -> Option<TransitionOutcome> {
        match &self.active {
            Some(active) if active.id == id => self
                .active
                .take()
                .map(|t| t.finish(TransitionState::Completed)),
            Some(active) => {
                log::debug!("ignoring completion of {} while {} is running", id, active.id);
                None
            }
            None => None,
        }
    }

    /// Releases the current transition once its deadline has passed
    pub fn poll_timeout(&mut self, now: Instant) -> Option<TransitionOutcome> {
        if self.active.as_ref()?.deadline > now {
            return None;
        }
        let transition = self.active.take()?;
        log::debug!(
            "transition {} timed out after {:?}",
            transition.id,
            now.duration_since(transition.started_at)
        );
        Some(transition.finish(TransitionState::TimedOut))
    }

    /// Releases transition `id` as timed out without waiting for its
    /// deadline; used when the host runs its own timer
    pub fn expire(&mut self, id: TransitionId) -> Option<TransitionOutcome> {
        if !self.active.as_ref().is_some_and(|t| t.id == id) {
            return None;
        }
        let transition = self.active.take()?;
        log::debug!("transition {} expired by host timer", transition.id);
        Some(transition.finish(TransitionState::TimedOut))
    }

    /// Drops the current transition without an outcome, e.g. when the
    /// renderer rejected the request
    pub fn abandon(&mut self, id: TransitionId) {
        if self.active.as_ref().is_some_and(|t| t.id == id) {
            self.active = None;
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&Transition> {
        self.active.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
