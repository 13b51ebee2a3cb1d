pub mod logo;
pub mod manager;
pub mod marker;
pub mod overlay;

pub use logo::{LogoCache, LogoStatus};
pub use manager::{MarkerManager, SyncReport};
pub use marker::{LogoState, MarkerAttrs, MarkerHandle, MarkerKind, MarkerSource, MarkerTier};
pub use overlay::{InstallOutcome, OverlayManager};
