//! # brewmap
//!
//! Viewport and marker lifecycle engine for an interactive coffee-shop map.
//!
//! The crate keeps the map camera, clustered markers, selection highlighting,
//! boundary overlays and the navigable selection state (location / shop /
//! filter) in agreement. The map-rendering SDK itself stays outside: it is
//! reached through the [`MapSurface`] trait, and browser history through
//! [`HistoryAdapter`].

pub mod animation;
pub mod core;
pub mod data;
pub mod input;
pub mod layers;
pub mod navigation;
pub mod prelude;
pub mod rendering;
pub mod spatial;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    camera::ViewportController,
    config::{EngineOptions, EngineProfile},
    geo::{LatLng, LatLngBounds, Point},
    map::MapEngine,
    viewport::Viewport,
};

pub use data::{
    catalog::Catalog,
    feature::{Country, FeatureMetadata, Location, PointFeature},
};

pub use input::events::{EngineEvent, MapEvent};

pub use layers::{
    manager::MarkerManager,
    marker::{MarkerHandle, MarkerTier},
    overlay::OverlayManager,
};

pub use navigation::{
    history::{HistoryAdapter, MemoryHistory},
    state::{FilterMode, NavMode, SelectionState, ShopVisitStack},
    sync::NavigationSync,
};

pub use rendering::{recording::RecordingSurface, surface::MapSurface};

pub use spatial::{
    clustering::{Cluster, Clustering},
    geometry::OverlayPolygon,
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Map style is not loaded yet")]
    StyleNotReady,

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Malformed boundary for location {location}: {reason}")]
    MalformedBoundary { location: String, reason: String },

    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    #[error("Unknown shop: {0}")]
    UnknownShop(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error type alias for convenience
pub type Error = MapError;
