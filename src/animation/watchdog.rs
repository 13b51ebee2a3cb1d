//! Async race between a renderer's completion signal and a ceiling timer.
//!
//! Hosts that drive the engine from a tokio runtime can await a transition
//! instead of polling [`TransitionManager::poll_timeout`], then hand the
//! outcome to [`MapEngine::on_watchdog`]. Whichever side loses the race is
//! dropped.
//!
//! [`TransitionManager::poll_timeout`]: crate::animation::transitions::TransitionManager::poll_timeout
//! [`MapEngine::on_watchdog`]: crate::core::map::MapEngine::on_watchdog

use crate::animation::transitions::TransitionId;
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogOutcome {
    /// The renderer reported the end of this transition
    Completed(TransitionId),
    /// The ceiling elapsed first
    TimedOut,
    /// The sender was dropped without reporting
    Abandoned,
}

/// Waits for `completion` or `ceiling`, whichever comes first
pub async fn await_transition(
    completion: oneshot::Receiver<TransitionId>,
    ceiling: Duration,
) -> WatchdogOutcome {
    tokio::select! {
        result = completion => match result {
            Ok(id) => WatchdogOutcome::Completed(id),
            Err(_) => WatchdogOutcome::Abandoned,
        },
        _ = tokio::time::sleep(ceiling) => {
            log::debug!("transition watchdog fired after {:?}", ceiling);
            WatchdogOutcome::TimedOut
        }
    }
}
