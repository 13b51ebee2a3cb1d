//! Vector overlays drawn beneath the markers.
//!
//! Three independent groups, each isolated from the others' failures:
//!
//! * a transparent country fill used only for hit-testing clicks and hovers
//!   on countries the app does not cover;
//! * the world overlay, a polygon covering the globe with a hole cut out for
//!   every supported city;
//! * an outline traced along those holes.
//!
//! Every add is preceded by a remove of the same id, and nothing is touched
//! before the style reports loaded; setup requested earlier is deferred until
//! [`OverlayManager::on_style_loaded`].

use crate::core::config::{OverlayConfig, OverlayPalette, Theme};
use crate::data::catalog::Catalog;
use crate::rendering::surface::{CursorStyle, LayerKind, LayerSpec, MapSurface, SourceData};
use crate::spatial::geometry::{world_overlay, OverlayPolygon};
use crate::Result;
use serde_json::json;

pub const COUNTRY_SOURCE: &str = "brewmap-countries";
pub const COUNTRY_LAYER: &str = "brewmap-country-hit";
pub const WORLD_SOURCE: &str = "brewmap-world";
pub const WORLD_LAYER: &str = "brewmap-world-fill";
pub const OUTLINE_SOURCE: &str = "brewmap-city-outlines";
pub const OUTLINE_LAYER: &str = "brewmap-city-outline";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// `installed` of the three groups made it onto the surface
    Installed { installed: usize, holes: usize },
    /// The style is not ready; setup runs on the style-loaded signal
    Deferred,
}

pub struct OverlayManager {
    config: OverlayConfig,
    theme: Theme,
    pending: bool,
    installed: bool,
    overlay: Option<OverlayPolygon>,
    cursor: CursorStyle,
}

impl OverlayManager {
    pub fn new(config: OverlayConfig, theme: Theme) -> Self {
        Self {
            config,
            theme,
            pending: false,
            installed: false,
            overlay: None,
            cursor: CursorStyle::Default,
        }
    }

    /// Installs (or reinstalls) every overlay group from `catalog`
    pub fn install<S: MapSurface>(&mut self, surface: &mut S, catalog: &Catalog) -> InstallOutcome {
        if !surface.is_style_loaded() {
            log::debug!("style not loaded; deferring overlay setup");
            self.pending = true;
            return InstallOutcome::Deferred;
        }
        self.pending = false;

        let overlay = world_overlay(
            catalog
                .locations()
                .iter()
                .filter(|location| catalog.is_location_supported(location)),
        );
        let palette = self.config.palette(self.theme).clone();
        let mut installed = 0;

        let groups = [
            (
                COUNTRY_SOURCE,
                SourceData::Vector {
                    url: self.config.country_source_url.clone(),
                },
                LayerSpec::new(
                    COUNTRY_LAYER,
                    LayerKind::Fill,
                    COUNTRY_SOURCE,
                    json!({ "fill-color": "#000000", "fill-opacity": 0.0 }),
                )
                .with_source_layer(&self.config.country_source_layer),
            ),
            (
                WORLD_SOURCE,
                SourceData::GeoJson(overlay.to_geojson()),
                LayerSpec::new(WORLD_LAYER, LayerKind::Fill, WORLD_SOURCE, fill_paint(&palette)),
            ),
            (
                OUTLINE_SOURCE,
                SourceData::GeoJson(overlay.outlines_geojson()),
                LayerSpec::new(
                    OUTLINE_LAYER,
                    LayerKind::Line,
                    OUTLINE_SOURCE,
                    line_paint(&palette),
                ),
            ),
        ];

        for (source_id, source, layer) in &groups {
            match replace_group(surface, source_id, source, layer) {
                Ok(()) => installed += 1,
                Err(e) => log::warn!("overlay layer {} not installed: {}", layer.id, e),
            }
        }

        let holes = overlay.holes.len();
        log::info!(
            "overlays installed ({} of {} layers, {} city holes)",
            installed,
            groups.len(),
            holes
        );
        self.overlay = Some(overlay);
        self.installed = installed > 0;
        InstallOutcome::Installed { installed, holes }
    }

    /// Style-loaded signal: runs deferred setup, or reinstalls after a
    /// style swap dropped the layers
    pub fn on_style_loaded<S: MapSurface>(
        &mut self,
        surface: &mut S,
        catalog: &Catalog,
    ) -> Option<InstallOutcome> {
        let lost = self.installed && !surface.has_layer(WORLD_LAYER);
        (self.pending || lost).then(|| self.install(surface, catalog))
    }

    /// Paint-only update for a theme change; geometry is left alone
    pub fn apply_theme<S: MapSurface>(&mut self, surface: &mut S, theme: Theme) {
        self.theme = theme;
        if !self.installed || !surface.is_style_loaded() {
            return;
        }
        let palette = self.config.palette(theme).clone();
        let updates = [
            (WORLD_LAYER, "fill-color", json!(palette.fill_color)),
            (WORLD_LAYER, "fill-opacity", json!(palette.fill_opacity)),
            (OUTLINE_LAYER, "line-color", json!(palette.outline_color)),
            (OUTLINE_LAYER, "line-width", json!(palette.outline_width)),
        ];
        for (layer, property, value) in updates {
            if !surface.has_layer(layer) {
                continue;
            }
            if let Err(e) = surface.set_paint_property(layer, property, value) {
                log::warn!("failed to set {} on {}: {}", property, layer, e);
            }
        }
    }

    /// Country click; returns `(name, code)` when the country is unsupported
    pub fn country_clicked(
        &self,
        catalog: &Catalog,
        name: &str,
        code: &str,
    ) -> Option<(String, String)> {
        if catalog.is_country_supported(code) {
            None
        } else {
            Some((name.to_string(), code.to_uppercase()))
        }
    }

    /// Pointer cursor over unsupported countries, default elsewhere
    pub fn country_hovered<S: MapSurface>(
        &mut self,
        surface: &mut S,
        catalog: &Catalog,
        code: Option<&str>,
    ) {
        let cursor = match code {
            Some(code) if !catalog.is_country_supported(code) => CursorStyle::Pointer,
            _ => CursorStyle::Default,
        };
        if cursor != self.cursor {
            self.cursor = cursor;
            surface.set_cursor(cursor);
        }
    }

    pub fn overlay(&self) -> Option<&OverlayPolygon> {
        self.overlay.as_ref()
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

fn fill_paint(palette: &OverlayPalette) -> serde_json::Value {
    json!({
        "fill-color": palette.fill_color,
        "fill-opacity": palette.fill_opacity,
    })
}

fn line_paint(palette: &OverlayPalette) -> serde_json::Value {
    json!({
        "line-color": palette.outline_color,
        "line-width": palette.outline_width,
    })
}

/// Removes the layer and its source if present, then adds both again
fn replace_group<S: MapSurface>(
    surface: &mut S,
    source_id: &str,
    source: &SourceData,
    layer: &LayerSpec,
) -> Result<()> {
    if surface.has_layer(&layer.id) {
        surface.remove_layer(&layer.id)?;
    }
    if surface.has_source(source_id) {
        surface.remove_source(source_id)?;
    }
    surface.add_source(source_id, source)?;
    surface.add_layer(layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use crate::data::feature::{Location, PointFeature};
    use crate::rendering::recording::RecordingSurface;

    fn catalog() -> Catalog {
        let square = vec![
            LatLng::new(40.70, -74.02),
            LatLng::new(40.74, -74.02),
            LatLng::new(40.74, -73.98),
            LatLng::new(40.70, -73.98),
        ];
        Catalog::new(
            vec![PointFeature::at("bb", 40.72, -74.0).in_location("new-york", "soho")],
            vec![
                Location::new("new-york", "us", None).with_boundary(square.clone()),
                // unsupported: no shops, not flagged
                Location::new("oslo", "no", None).with_boundary(square),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_setup_deferred_until_style_loads() {
        let catalog = catalog();
        let mut surface = RecordingSurface::unloaded();
        let mut overlays = OverlayManager::new(OverlayConfig::default(), Theme::Light);

        assert_eq!(overlays.install(&mut surface, &catalog), InstallOutcome::Deferred);
        assert!(surface.layer_ids().is_empty());

        surface.set_style_loaded(true);
        let outcome = overlays.on_style_loaded(&mut surface, &catalog).unwrap();
        assert_eq!(outcome, InstallOutcome::Installed { installed: 3, holes: 1 });
        assert_eq!(surface.layer_ids(), vec![COUNTRY_LAYER, WORLD_LAYER, OUTLINE_LAYER]);
        assert!(overlays.on_style_loaded(&mut surface, &catalog).is_none());
    }

    #[test]
    fn test_reinstall_removes_before_adding() {
        let catalog = catalog();
        let mut surface = RecordingSurface::new();
        let mut overlays = OverlayManager::new(OverlayConfig::default(), Theme::Light);
        overlays.install(&mut surface, &catalog);
        // a second install would fail on duplicate ids without the removals
        let outcome = overlays.install(&mut surface, &catalog);
        assert_eq!(outcome, InstallOutcome::Installed { installed: 3, holes: 1 });
    }

    #[test]
    fn test_style_swap_triggers_reinstall() {
        let catalog = catalog();
        let mut surface = RecordingSurface::new();
        let mut overlays = OverlayManager::new(OverlayConfig::default(), Theme::Light);
        overlays.install(&mut surface, &catalog);

        surface.reload_style();
        surface.set_style_loaded(true);
        assert!(overlays.on_style_loaded(&mut surface, &catalog).is_some());
        assert!(surface.has_layer(WORLD_LAYER));
    }

    #[test]
    fn test_failing_layer_is_isolated() {
        let catalog = catalog();
        let mut surface = RecordingSurface::new();
        surface.fail_layer(COUNTRY_LAYER);
        let mut overlays = OverlayManager::new(OverlayConfig::default(), Theme::Light);

        let outcome = overlays.install(&mut surface, &catalog);
        assert_eq!(outcome, InstallOutcome::Installed { installed: 2, holes: 1 });
        assert!(surface.has_layer(WORLD_LAYER));
        assert!(surface.has_layer(OUTLINE_LAYER));
    }

    #[test]
    fn test_theme_toggle_only_sets_paint() {
        let catalog = catalog();
        let mut surface = RecordingSurface::new();
        let config = OverlayConfig::default();
        let mut overlays = OverlayManager::new(config.clone(), Theme::Light);
        overlays.install(&mut surface, &catalog);
        surface.clear_calls();

        overlays.apply_theme(&mut surface, Theme::Dark);
        assert_eq!(
            surface.paint(WORLD_LAYER, "fill-color"),
            Some(&json!(config.dark.fill_color))
        );
        assert!(surface
            .calls()
            .iter()
            .all(|call| matches!(call, crate::rendering::recording::SurfaceCall::SetPaint { .. })));
    }

    #[test]
    fn test_unsupported_country_interaction() {
        let catalog = catalog();
        let mut surface = RecordingSurface::new();
        let mut overlays = OverlayManager::new(OverlayConfig::default(), Theme::Light);

        assert!(overlays.country_clicked(&catalog, "United States", "us").is_none());
        assert_eq!(
            overlays.country_clicked(&catalog, "Norway", "no"),
            Some(("Norway".to_string(), "NO".to_string()))
        );

        overlays.country_hovered(&mut surface, &catalog, Some("NO"));
        assert_eq!(surface.cursor(), CursorStyle::Pointer);
        overlays.country_hovered(&mut surface, &catalog, Some("NO"));
        overlays.country_hovered(&mut surface, &catalog, None);
        assert_eq!(surface.cursor(), CursorStyle::Default);
        assert_eq!(surface.calls().len(), 2);
    }
}
