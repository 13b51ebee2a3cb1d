use crate::animation::transitions::TransitionId;
use crate::core::geo::LatLng;
use crate::navigation::state::SelectionState;
use serde::{Deserialize, Serialize};

/// Signals delivered to the engine by the renderer and the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapEvent {
    /// A shop marker was clicked
    MarkerClick { shop_id: String },
    /// A cluster symbol was clicked
    ClusterClick { cluster_id: String },
    /// Click on the country hit-test layer
    CountryClick { name: String, code: String },
    /// Pointer moved over a country, or left every country
    CountryHover { code: Option<String> },
    /// Zoom started
    ZoomStart { zoom: f64 },
    /// Zoom ended
    ZoomEnd { zoom: f64 },
    /// Map view has changed (center, zoom)
    ViewChanged { center: LatLng, zoom: f64 },
    /// Renderer finished all pending work
    Idle,
    /// Map style finished (re)loading
    StyleLoaded,
    /// A requested fly-to finished
    TransitionEnd { id: TransitionId },
    /// A requested image finished loading
    LogoLoaded { url: String, ok: bool },
    /// Browser back/forward changed the path
    HistoryNavigated { path: String },
}

impl MapEvent {
    /// Gesture-driven camera events
    pub fn is_camera_event(&self) -> bool {
        matches!(
            self,
            MapEvent::ZoomStart { .. } | MapEvent::ZoomEnd { .. } | MapEvent::ViewChanged { .. }
        )
    }
}

/// Notifications the engine hands back to the host
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A marker click selected a shop
    ShopSelected { shop_id: String },
    /// The user clicked a country the app does not cover
    UnsupportedCountryClicked { name: String, code: String },
    /// The loading flag was released
    TransitionComplete { id: TransitionId, timed_out: bool },
    /// The navigable selection changed
    SelectionChanged(SelectionState),
}
