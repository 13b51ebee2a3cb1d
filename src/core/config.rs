//! Configuration for clustering, marker tiers, camera behaviour and overlays
//!
//! Options resolve from a profile preset, or load from a (partial) JSON
//! document whose missing fields fall back to the defaults.

use crate::core::constants::*;
use crate::core::geo::LatLng;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineProfile {
    Balanced,
    /// Fewer detailed markers and no fade-in, for low-end devices
    Lightweight,
    Custom(EngineOptions),
}

impl EngineProfile {
    pub fn resolve(&self) -> EngineOptions {
        match self {
            Self::Balanced => EngineOptions::default(),
            Self::Lightweight => EngineOptions {
                clustering: ClusterConfig {
                    radius_px: 70.0,
                    max_zoom: 15.0,
                    ..ClusterConfig::default()
                },
                markers: MarkerTierConfig {
                    logo_zoom: 14.0,
                    label_zoom: 16.0,
                    high_density: 5,
                    fade_in: false,
                    ..MarkerTierConfig::default()
                },
                camera: CameraConfig {
                    fly_duration_ms: 600,
                    ..CameraConfig::default()
                },
                overlay: OverlayConfig::default(),
            },
            Self::Custom(options) => options.clone(),
        }
    }
}

impl Default for EngineProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub clustering: ClusterConfig,
    pub markers: MarkerTierConfig,
    pub camera: CameraConfig,
    pub overlay: OverlayConfig,
}

impl EngineOptions {
    /// Parses options from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let options: EngineOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Rejects threshold combinations that would break tier ordering
    pub fn validate(&self) -> Result<()> {
        let m = &self.markers;
        if m.logo_zoom < m.simple_below_zoom {
            return Err(MapError::Config(format!(
                "logo_zoom ({}) must not be below simple_below_zoom ({})",
                m.logo_zoom, m.simple_below_zoom
            )));
        }
        if m.label_zoom < m.logo_zoom {
            return Err(MapError::Config(format!(
                "label_zoom ({}) must not be below logo_zoom ({})",
                m.label_zoom, m.logo_zoom
            )));
        }
        if self.clustering.radius_px <= 0.0 {
            return Err(MapError::Config("cluster radius must be positive".into()));
        }
        if self.camera.fit_padding_factor < 1.0 {
            return Err(MapError::Config(
                "fit_padding_factor must be at least 1.0".into(),
            ));
        }
        if self.camera.transition_timeout_ms == 0 {
            return Err(MapError::Config(
                "transition_timeout_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Grouping radius in screen pixels
    pub radius_px: f64,
    /// At and above this zoom clustering is disabled
    pub max_zoom: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius_px: DEFAULT_CLUSTER_RADIUS_PX,
            max_zoom: DEFAULT_CLUSTER_MAX_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerTierConfig {
    pub simple_below_zoom: f64,
    pub logo_zoom: f64,
    pub label_zoom: f64,
    pub high_density: u32,
    pub density_radius_px: f64,
    pub badge_size: f64,
    pub badge_size_selected: f64,
    pub pointer_length: f64,
    pub simple_selected_growth: f64,
    pub fade_in: bool,
    pub selected_color: String,
    pub default_accent: String,
    pub light_border: String,
    pub dark_border: String,
}

impl Default for MarkerTierConfig {
    fn default() -> Self {
        Self {
            simple_below_zoom: SIMPLE_BELOW_ZOOM,
            logo_zoom: LOGO_ZOOM,
            label_zoom: LABEL_ZOOM,
            high_density: HIGH_DENSITY_THRESHOLD,
            density_radius_px: DENSITY_RADIUS_PX,
            badge_size: BADGE_SIZE,
            badge_size_selected: BADGE_SIZE_SELECTED,
            pointer_length: POINTER_LENGTH,
            simple_selected_growth: SIMPLE_SELECTED_GROWTH,
            fade_in: true,
            selected_color: "#e4572e".to_string(),
            default_accent: "#6f4e37".to_string(),
            light_border: "#ffffff".to_string(),
            dark_border: "#1c1c1e".to_string(),
        }
    }
}

impl MarkerTierConfig {
    pub fn border_color(&self, theme: Theme) -> &str {
        match theme {
            Theme::Light => &self.light_border,
            Theme::Dark => &self.dark_border,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub shop_zoom: f64,
    pub city_zoom: f64,
    pub world_center: LatLng,
    pub world_zoom: f64,
    pub fit_padding_factor: f64,
    pub fly_duration_ms: u64,
    pub transition_timeout_ms: u64,
    pub nearby_radius_km: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            shop_zoom: SHOP_ZOOM,
            city_zoom: CITY_ZOOM,
            world_center: LatLng::new(WORLD_CENTER.0, WORLD_CENTER.1),
            world_zoom: WORLD_ZOOM,
            fit_padding_factor: FIT_PADDING_FACTOR,
            fly_duration_ms: FLY_DURATION_MS,
            transition_timeout_ms: TRANSITION_TIMEOUT_MS,
            nearby_radius_km: NEARBY_RADIUS_KM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayPalette {
    pub fill_color: String,
    pub fill_opacity: f64,
    pub outline_color: String,
    pub outline_width: f64,
}

impl Default for OverlayPalette {
    fn default() -> Self {
        Self {
            fill_color: "#f4efe9".to_string(),
            fill_opacity: 0.55,
            outline_color: "#6f4e37".to_string(),
            outline_width: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub light: OverlayPalette,
    pub dark: OverlayPalette,
    /// Vector tileset holding country polygons for the hit-test layer
    pub country_source_url: String,
    pub country_source_layer: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            light: OverlayPalette::default(),
            dark: OverlayPalette {
                fill_color: "#0e0e10".to_string(),
                fill_opacity: 0.6,
                outline_color: "#c8a27a".to_string(),
                outline_width: 1.5,
            },
            country_source_url: "mapbox://mapbox.country-boundaries-v1".to_string(),
            country_source_layer: "country_boundaries".to_string(),
        }
    }
}

impl OverlayConfig {
    pub fn palette(&self, theme: Theme) -> &OverlayPalette {
        match theme {
            Theme::Light => &self.light,
            Theme::Dark => &self.dark,
        }
    }
}
