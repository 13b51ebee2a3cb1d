pub mod transitions;
#[cfg(feature = "tokio-runtime")]
pub mod watchdog;

// Re-export commonly used types for convenience
pub use transitions::{
    Transition, TransitionId, TransitionManager, TransitionOutcome, TransitionState,
    TransitionType,
};
#[cfg(feature = "tokio-runtime")]
pub use watchdog::{await_transition, WatchdogOutcome};
