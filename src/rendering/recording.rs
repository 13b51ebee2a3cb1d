//! Headless [`MapSurface`] that records every call.
//!
//! Used by the test-suite and the demo binary. It keeps enough renderer
//! state (markers, sources, layers, paint) to answer the readiness queries
//! the engine makes, and it can be told to fail specific operations.

use crate::core::geo::LatLng;
use crate::prelude::{HashMap, HashSet};
use crate::rendering::surface::{
    CursorStyle, FlyTo, LayerSpec, MapSurface, MarkerPatch, MarkerSpec, SourceData,
    SurfaceMarkerId,
};
use crate::{MapError, Result};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    AddMarker { key: String, id: SurfaceMarkerId },
    PatchMarker { id: SurfaceMarkerId, patch: MarkerPatch },
    RemoveMarker { id: SurfaceMarkerId },
    RequestImage { url: String },
    AddSource { id: String },
    RemoveSource { id: String },
    AddLayer { id: String },
    RemoveLayer { id: String },
    SetPaint { layer: String, property: String, value: Value },
    SetCursor(CursorStyle),
    FlyTo(FlyTo),
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Vec<SurfaceCall>,
    next_marker_id: SurfaceMarkerId,
    markers: HashMap<SurfaceMarkerId, MarkerSpec>,
    sources: HashMap<String, SourceData>,
    layers: Vec<LayerSpec>,
    paint: HashMap<(String, String), Value>,
    cursor: CursorStyle,
    style_loaded: bool,
    failing_markers: HashSet<String>,
    failing_layers: HashSet<String>,
}

impl RecordingSurface {
    /// A surface whose style has already loaded
    pub fn new() -> Self {
        Self {
            style_loaded: true,
            next_marker_id: 1,
            ..Self::default()
        }
    }

    /// A surface still waiting for its style
    pub fn unloaded() -> Self {
        Self {
            style_loaded: false,
            ..Self::new()
        }
    }

    pub fn set_style_loaded(&mut self, loaded: bool) {
        self.style_loaded = loaded;
    }

    /// Simulates a style swap: every source and layer is dropped
    pub fn reload_style(&mut self) {
        self.sources.clear();
        self.layers.clear();
        self.paint.clear();
        self.style_loaded = false;
    }

    /// Makes `add_marker` fail for `key`
    pub fn fail_marker(&mut self, key: &str) {
        self.failing_markers.insert(key.to_string());
    }

    /// Makes `add_layer` fail for `id`
    pub fn fail_layer(&mut self, id: &str) {
        self.failing_layers.insert(id.to_string());
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn count_calls(&self, predicate: impl Fn(&SurfaceCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn marker(&self, key: &str) -> Option<(SurfaceMarkerId, &MarkerSpec)> {
        self.markers
            .iter()
            .find(|(_, spec)| spec.key == key)
            .map(|(id, spec)| (*id, spec))
    }

    pub fn marker_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.markers.values().map(|spec| spec.key.clone()).collect();
        keys.sort();
        keys
    }

    pub fn source(&self, id: &str) -> Option<&SourceData> {
        self.sources.get(id)
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.id.as_str()).collect()
    }

    /// Paint value set after the layer was added, if any
    pub fn paint(&self, layer: &str, property: &str) -> Option<&Value> {
        self.paint.get(&(layer.to_string(), property.to_string()))
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    pub fn fly_requests(&self) -> Vec<FlyTo> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::FlyTo(request) => Some(*request),
                _ => None,
            })
            .collect()
    }

    pub fn last_fly_to(&self) -> Option<FlyTo> {
        self.fly_requests().last().copied()
    }

    /// Where the camera ends up once the last fly-to finishes
    pub fn camera(&self) -> Option<(LatLng, f64)> {
        self.last_fly_to().map(|fly| (fly.center, fly.zoom))
    }

    fn require_style(&self) -> Result<()> {
        if self.style_loaded {
            Ok(())
        } else {
            Err(MapError::StyleNotReady)
        }
    }
}

impl MapSurface for RecordingSurface {
    fn add_marker(&mut self, spec: &MarkerSpec) -> Result<SurfaceMarkerId> {
        if self.failing_markers.contains(&spec.key) {
            return Err(MapError::Surface(format!("cannot create marker {}", spec.key)));
        }
        if !spec.position.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "{}: {:?}",
                spec.key, spec.position
            )));
        }
        let id = self.next_marker_id;
        self.next_marker_id += 1;
        self.markers.insert(id, spec.clone());
        self.calls.push(SurfaceCall::AddMarker {
            key: spec.key.clone(),
            id,
        });
        Ok(id)
    }

    fn patch_marker(&mut self, id: SurfaceMarkerId, patch: &MarkerPatch) -> Result<()> {
        let spec = self
            .markers
            .get_mut(&id)
            .ok_or_else(|| MapError::Surface(format!("no marker {id}")))?;
        if let Some(position) = patch.position {
            spec.position = position;
        }
        spec.attrs.apply(patch);
        self.calls.push(SurfaceCall::PatchMarker {
            id,
            patch: patch.clone(),
        });
        Ok(())
    }

    fn remove_marker(&mut self, id: SurfaceMarkerId) -> Result<()> {
        self.markers
            .remove(&id)
            .ok_or_else(|| MapError::Surface(format!("no marker {id}")))?;
        self.calls.push(SurfaceCall::RemoveMarker { id });
        Ok(())
    }

    fn request_image(&mut self, url: &str) {
        self.calls.push(SurfaceCall::RequestImage {
            url: url.to_string(),
        });
    }

    fn is_style_loaded(&self) -> bool {
        self.style_loaded
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_source(&mut self, id: &str, source: &SourceData) -> Result<()> {
        self.require_style()?;
        if self.sources.contains_key(id) {
            return Err(MapError::Surface(format!("source {id} already exists")));
        }
        self.sources.insert(id.to_string(), source.clone());
        self.calls.push(SurfaceCall::AddSource { id: id.to_string() });
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<()> {
        self.require_style()?;
        if self.layers.iter().any(|layer| layer.source == id) {
            return Err(MapError::Surface(format!("source {id} is still in use")));
        }
        self.sources
            .remove(id)
            .ok_or_else(|| MapError::Surface(format!("no source {id}")))?;
        self.calls.push(SurfaceCall::RemoveSource { id: id.to_string() });
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|layer| layer.id == id)
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<()> {
        self.require_style()?;
        if self.failing_layers.contains(&layer.id) {
            return Err(MapError::Surface(format!("cannot add layer {}", layer.id)));
        }
        if self.has_layer(&layer.id) {
            return Err(MapError::Surface(format!("layer {} already exists", layer.id)));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(MapError::Surface(format!(
                "layer {} references missing source {}",
                layer.id, layer.source
            )));
        }
        self.layers.push(layer.clone());
        self.calls.push(SurfaceCall::AddLayer {
            id: layer.id.clone(),
        });
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<()> {
        self.require_style()?;
        let index = self
            .layers
            .iter()
            .position(|layer| layer.id == id)
            .ok_or_else(|| MapError::Surface(format!("no layer {id}")))?;
        self.layers.remove(index);
        self.paint.retain(|(layer, _), _| layer != id);
        self.calls.push(SurfaceCall::RemoveLayer { id: id.to_string() });
        Ok(())
    }

    fn set_paint_property(&mut self, layer_id: &str, property: &str, value: Value) -> Result<()> {
        self.require_style()?;
        if !self.has_layer(layer_id) {
            return Err(MapError::Surface(format!("no layer {layer_id}")));
        }
        self.paint
            .insert((layer_id.to_string(), property.to_string()), value.clone());
        self.calls.push(SurfaceCall::SetPaint {
            layer: layer_id.to_string(),
            property: property.to_string(),
            value,
        });
        Ok(())
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        self.cursor = cursor;
        self.calls.push(SurfaceCall::SetCursor(cursor));
    }

    fn fly_to(&mut self, request: &FlyTo) -> Result<()> {
        if !request.center.is_valid() {
            return Err(MapError::InvalidCoordinates(format!("{:?}", request.center)));
        }
        self.calls.push(SurfaceCall::FlyTo(*request));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::surface::LayerKind;
    use serde_json::json;

    #[test]
    fn test_layers_need_style_and_source() {
        let mut surface = RecordingSurface::unloaded();
        let layer = LayerSpec::new("fill", LayerKind::Fill, "src", json!({}));
        assert!(matches!(
            surface.add_source("src", &SourceData::GeoJson(json!({}))),
            Err(MapError::StyleNotReady)
        ));

        surface.set_style_loaded(true);
        assert!(surface.add_layer(&layer).is_err());
        surface.add_source("src", &SourceData::GeoJson(json!({}))).unwrap();
        surface.add_layer(&layer).unwrap();
        assert!(surface.add_layer(&layer).is_err());
        assert!(surface.remove_source("src").is_err());
    }

    #[test]
    fn test_reload_style_drops_layers() {
        let mut surface = RecordingSurface::new();
        surface.add_source("src", &SourceData::GeoJson(json!({}))).unwrap();
        surface.reload_style();
        assert!(!surface.has_source("src"));
        assert!(!surface.is_style_loaded());
    }
}
