//! Prelude module for common brewmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use brewmap::prelude::*;`

pub use crate::core::{
    camera::{CameraTarget, ViewportController},
    config::{
        CameraConfig, ClusterConfig, EngineOptions, EngineProfile, MarkerTierConfig,
        OverlayConfig, OverlayPalette, Theme,
    },
    geo::{LatLng, LatLngBounds, Point},
    map::MapEngine,
    viewport::Viewport,
};

pub use crate::data::{
    catalog::Catalog,
    feature::{Country, FeatureMetadata, Location, PointFeature},
};

pub use crate::layers::{
    manager::{MarkerManager, SyncReport},
    marker::{MarkerAttrs, MarkerHandle, MarkerKind, MarkerTier},
    overlay::OverlayManager,
};

pub use crate::navigation::{
    history::{HistoryAdapter, MemoryHistory},
    route::Route,
    state::{FilterMode, GeolocationFix, NavMode, SelectionState, ShopVisitStack},
    sync::{NavigationSync, SelectionChange},
};

pub use crate::input::events::{EngineEvent, MapEvent};

pub use crate::rendering::{
    recording::{RecordingSurface, SurfaceCall},
    surface::{CursorStyle, FlyTo, LayerSpec, MapSurface, MarkerPatch, MarkerSpec},
};

pub use crate::spatial::clustering::{Cluster, ClusterOutput, Clustering};

pub use crate::{Error as MapError, Result};

pub use std::time::Duration;

pub use instant::Instant;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
