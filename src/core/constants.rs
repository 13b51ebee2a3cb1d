//! Engine-wide defaults for clustering, marker tiers and the camera.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// World pixel size of zoom level 0 used by the clustering projection.
pub const TILE_SIZE: f64 = 512.0;

/// Cluster radius in screen pixels.
pub const DEFAULT_CLUSTER_RADIUS_PX: f64 = 50.0;

/// At and above this zoom every feature renders on its own.
pub const DEFAULT_CLUSTER_MAX_ZOOM: f64 = 14.0;

/// Below this zoom markers always use the simple dot tier.
pub const SIMPLE_BELOW_ZOOM: f64 = 10.0;

/// Below this zoom a dense neighbourhood keeps markers in the simple tier.
pub const LOGO_ZOOM: f64 = 13.0;

/// Text labels are attached to detailed markers at and above this zoom.
pub const LABEL_ZOOM: f64 = 15.0;

/// Neighbour count above which a neighbourhood counts as dense.
pub const HIGH_DENSITY_THRESHOLD: u32 = 8;

/// Radius of the live density query, in screen pixels.
pub const DENSITY_RADIUS_PX: f64 = 40.0;

/// Detailed badge diameter, unselected / selected (px).
pub const BADGE_SIZE: f64 = 36.0;
pub const BADGE_SIZE_SELECTED: f64 = 48.0;

/// Length of the pointer drawn beneath a selected badge (px).
pub const POINTER_LENGTH: f64 = 10.0;

/// Extra radius added to a selected simple dot (px).
pub const SIMPLE_SELECTED_GROWTH: f64 = 3.0;

/// Zoom used when a shop is focused (never zooms out past the current zoom).
pub const SHOP_ZOOM: f64 = 15.0;

/// Zoom used when a location is focused.
pub const CITY_ZOOM: f64 = 12.0;

/// Camera used for explore / world mode.
pub const WORLD_CENTER: (f64, f64) = (20.0, 0.0);
pub const WORLD_ZOOM: f64 = 1.5;

/// Bounding box of a filtered set is scaled by this factor before fitting.
pub const FIT_PADDING_FACTOR: f64 = 1.2;

/// `(max span in degrees, zoom)` buckets for fit-to-bounds, finest first.
pub const FIT_ZOOM_BUCKETS: [(f64, f64); 8] = [
    (0.05, 14.0),
    (0.1, 13.0),
    (0.5, 12.0),
    (1.0, 11.0),
    (2.0, 10.0),
    (5.0, 8.0),
    (10.0, 6.0),
    (40.0, 4.0),
];

/// Zoom used when the span exceeds every bucket.
pub const FIT_FALLBACK_ZOOM: f64 = 2.0;

/// Ceiling on how long a camera transition may hold the loading flag.
pub const TRANSITION_TIMEOUT_MS: u64 = 4000;

/// Default fly-to animation duration.
pub const FLY_DURATION_MS: u64 = 1200;

/// Targets closer than these are treated as the current view.
pub const CENTER_EPSILON_DEG: f64 = 1e-6;
pub const ZOOM_EPSILON: f64 = 1e-3;

/// A geolocation fix within this distance of a location center selects it.
pub const NEARBY_RADIUS_KM: f64 = 50.0;

/// Number of logo load results remembered across marker recreation.
pub const LOGO_CACHE_SIZE: usize = 512;

/// Extent of the world overlay polygon (Web Mercator latitude limit).
pub const WORLD_EXTENT_LAT: f64 = 85.051129;
