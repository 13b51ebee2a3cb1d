//! Boundary to the map-rendering SDK.
//!
//! The engine never draws. Everything it wants on screen goes through
//! [`MapSurface`]: markers are created, patched in place or removed; vector
//! and GeoJSON content is installed as sources plus layers; the camera is
//! asked to fly. Completion of a fly-to comes back as
//! [`MapEvent::TransitionEnd`](crate::input::events::MapEvent::TransitionEnd)
//! carrying the same transition id.

use crate::animation::transitions::TransitionId;
use crate::core::geo::{LatLng, Point};
use crate::layers::marker::{LogoState, MarkerAttrs, MarkerTier};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Renderer-side marker identifier
pub type SurfaceMarkerId = u64;

/// Everything needed to create a marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    /// Feature id or cluster id
    pub key: String,
    pub position: LatLng,
    pub attrs: MarkerAttrs,
}

/// In-place update of an existing marker; `None` fields are left as they are
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkerPatch {
    pub position: Option<LatLng>,
    pub tier: Option<MarkerTier>,
    pub diameter: Option<f64>,
    pub fill_color: Option<String>,
    pub border_color: Option<String>,
    pub pointer: Option<bool>,
    pub offset: Option<Point>,
    /// `Some(None)` removes the label
    pub label: Option<Option<String>>,
    /// `Some(None)` removes the logo slot
    pub logo: Option<Option<LogoState>>,
    pub selected: Option<bool>,
    pub z_index: Option<i32>,
}

impl MarkerPatch {
    pub fn is_empty(&self) -> bool {
        *self == MarkerPatch::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Fill,
    Line,
}

/// Layer description in the renderer's style vocabulary
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub kind: LayerKind,
    pub source: String,
    /// Layer name inside a vector tileset
    pub source_layer: Option<String>,
    pub paint: Value,
}

impl LayerSpec {
    pub fn new(id: &str, kind: LayerKind, source: &str, paint: Value) -> Self {
        Self {
            id: id.to_string(),
            kind,
            source: source.to_string(),
            source_layer: None,
            paint,
        }
    }

    pub fn with_source_layer(mut self, source_layer: &str) -> Self {
        self.source_layer = Some(source_layer.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceData {
    /// Inline GeoJSON document
    GeoJson(Value),
    /// Vector tileset provided by the renderer
    Vector { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
}

/// Camera animation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyTo {
    pub transition_id: TransitionId,
    pub center: LatLng,
    pub zoom: f64,
    pub duration_ms: u64,
}

/// Primitive operations of the map renderer
pub trait MapSurface {
    fn add_marker(&mut self, spec: &MarkerSpec) -> Result<SurfaceMarkerId>;
    fn patch_marker(&mut self, id: SurfaceMarkerId, patch: &MarkerPatch) -> Result<()>;
    fn remove_marker(&mut self, id: SurfaceMarkerId) -> Result<()>;

    /// Starts loading an image; the outcome arrives as
    /// [`MapEvent::LogoLoaded`](crate::input::events::MapEvent::LogoLoaded)
    fn request_image(&mut self, url: &str);

    fn is_style_loaded(&self) -> bool;
    fn has_source(&self, id: &str) -> bool;
    fn add_source(&mut self, id: &str, source: &SourceData) -> Result<()>;
    fn remove_source(&mut self, id: &str) -> Result<()>;
    fn has_layer(&self, id: &str) -> bool;
    fn add_layer(&mut self, layer: &LayerSpec) -> Result<()>;
    fn remove_layer(&mut self, id: &str) -> Result<()>;
    fn set_paint_property(&mut self, layer_id: &str, property: &str, value: Value) -> Result<()>;

    fn set_cursor(&mut self, cursor: CursorStyle);
    fn fly_to(&mut self, request: &FlyTo) -> Result<()>;
}
