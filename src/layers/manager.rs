//! Owned registry of the markers currently on a surface.
//!
//! Every change to the visible marker set goes through [`MarkerManager::sync`],
//! which only ever creates, removes or patches: a feature that stays visible
//! keeps its renderer marker across zoom, pan, theme and selection changes.

use crate::core::config::{MarkerTierConfig, Theme};
use crate::core::constants::LOGO_CACHE_SIZE;
use crate::core::geo::LatLng;
use crate::core::viewport::project;
use crate::layers::logo::LogoCache;
use crate::layers::marker::{
    select_tier, LogoState, MarkerHandle, MarkerSource, MarkerTier, StyleContext,
};
use crate::prelude::{HashMap, HashSet};
use crate::rendering::surface::{MapSurface, MarkerSpec};
use crate::spatial::clustering::ClusterOutput;
use crate::spatial::index::{SpatialIndex, SpatialItem};

/// What one [`MarkerManager::sync`] pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub removed: usize,
    pub patched: usize,
    /// Items whose surface call failed and were left for the next pass
    pub skipped: usize,
    pub tier: MarkerTier,
    pub density: u32,
}

impl SyncReport {
    fn new(tier: MarkerTier, density: u32) -> Self {
        Self {
            created: 0,
            removed: 0,
            patched: 0,
            skipped: 0,
            tier,
            density,
        }
    }

    /// True when the pass did not touch the surface
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.removed == 0 && self.patched == 0
    }
}

pub struct MarkerManager {
    config: MarkerTierConfig,
    handles: HashMap<String, MarkerHandle>,
    selected: Option<String>,
    tier: MarkerTier,
    zoom: f64,
    theme: Theme,
    logos: LogoCache,
}

impl MarkerManager {
    pub fn new(config: MarkerTierConfig, theme: Theme) -> Self {
        Self {
            config,
            handles: HashMap::default(),
            selected: None,
            tier: MarkerTier::Simple,
            zoom: 0.0,
            theme,
            logos: LogoCache::new(LOGO_CACHE_SIZE),
        }
    }

    /// Map-wide density for the tier decision: the highest neighbour count of
    /// any visible single, preferring a precomputed value on the feature
    pub fn density(&self, output: &ClusterOutput<'_>, zoom: f64) -> u32 {
        let live: Vec<LatLng> = output
            .singles
            .iter()
            .filter_map(|feature| feature.valid_position())
            .chain(
                output
                    .clusters
                    .iter()
                    .flat_map(|cluster| cluster.member_positions().iter().copied()),
            )
            .collect();

        let index = SpatialIndex::bulk_load(
            live.iter()
                .enumerate()
                .map(|(i, pos)| SpatialItem::new(i.to_string(), project(pos, zoom), ()))
                .collect(),
        );

        output
            .singles
            .iter()
            .filter_map(|feature| {
                feature.metadata.density.or_else(|| {
                    feature.valid_position().map(|pos| {
                        let neighbours = index.count_within(
                            &project(&pos, zoom),
                            self.config.density_radius_px,
                        );
                        neighbours.saturating_sub(1) as u32
                    })
                })
            })
            .max()
            .unwrap_or(0)
    }

    /// Brings the surface in line with `output` at `zoom`
    pub fn sync<S: MapSurface>(
        &mut self,
        surface: &mut S,
        output: &ClusterOutput<'_>,
        zoom: f64,
    ) -> SyncReport {
        let density = self.density(output, zoom);
        self.tier = select_tier(&self.config, zoom, density);
        self.zoom = zoom;
        let mut report = SyncReport::new(self.tier, density);

        let mut desired: Vec<(String, LatLng, MarkerSource)> =
            Vec::with_capacity(output.singles.len() + output.clusters.len());
        for feature in &output.singles {
            match feature.valid_position() {
                Some(position) => desired.push((
                    feature.id.clone(),
                    position,
                    MarkerSource::from_feature(feature),
                )),
                None => log::debug!("feature {} has no usable coordinates", feature.id),
            }
        }
        for cluster in &output.clusters {
            desired.push((
                cluster.id.clone(),
                cluster.center,
                MarkerSource::Cluster {
                    count: cluster.count(),
                },
            ));
        }

        let wanted: HashSet<&str> = desired.iter().map(|(key, _, _)| key.as_str()).collect();
        let stale: Vec<String> = self
            .handles
            .keys()
            .filter(|key| !wanted.contains(key.as_str()))
            .cloned()
            .collect();
        for key in stale {
            if let Some(handle) = self.handles.remove(&key) {
                if let Err(e) = surface.remove_marker(handle.surface_id) {
                    log::warn!("failed to remove marker {}: {}", key, e);
                }
                report.removed += 1;
            }
        }

        let ctx = StyleContext {
            config: &self.config,
            tier: self.tier,
            zoom,
            theme: self.theme,
        };

        for (key, position, source) in desired {
            let selected = self.selected.as_deref() == Some(key.as_str());
            let logo = match (ctx.tier, &source) {
                (MarkerTier::Detailed, MarkerSource::Shop { logo_url, .. }) => {
                    let (state, request) = self.logos.prepare(logo_url.as_deref());
                    if let (true, Some(url)) = (request, logo_url.as_deref()) {
                        surface.request_image(url);
                    }
                    state
                }
                _ => LogoState::Placeholder,
            };
            let attrs = ctx.attrs(&source, selected, logo);

            if let Some(handle) = self.handles.get_mut(&key) {
                let mut patch = handle.attrs.diff(&attrs);
                if !handle.position.approx_eq(&position, f64::EPSILON) {
                    patch.position = Some(position);
                }
                handle.source = source;
                if patch.is_empty() {
                    continue;
                }
                match surface.patch_marker(handle.surface_id, &patch) {
                    Ok(()) => {
                        handle.attrs = attrs;
                        handle.position = position;
                        report.patched += 1;
                    }
                    Err(e) => {
                        log::warn!("failed to update marker {}: {}", key, e);
                        report.skipped += 1;
                    }
                }
                continue;
            }

            let spec = MarkerSpec {
                key: key.clone(),
                position,
                attrs,
            };
            match surface.add_marker(&spec) {
                Ok(surface_id) => {
                    self.handles.insert(
                        key.clone(),
                        MarkerHandle {
                            key,
                            surface_id,
                            position,
                            source,
                            attrs: spec.attrs,
                        },
                    );
                    report.created += 1;
                }
                Err(e) => {
                    log::warn!("failed to create marker {}: {}", key, e);
                    report.skipped += 1;
                }
            }
        }

        if !report.is_noop() {
            log::debug!(
                "marker sync at zoom {:.2}: {:?} tier, +{} -{} ~{}",
                zoom,
                report.tier,
                report.created,
                report.removed,
                report.patched
            );
        }
        report
    }

    /// Moves the selection highlight; patches at most two markers
    pub fn set_selected<S: MapSurface>(&mut self, surface: &mut S, shop_id: Option<&str>) -> usize {
        if self.selected.as_deref() == shop_id {
            return 0;
        }
        let previous = std::mem::replace(&mut self.selected, shop_id.map(str::to_string));

        [previous.as_deref(), shop_id]
            .into_iter()
            .flatten()
            .filter(|key| self.restyle(surface, key))
            .count()
    }

    /// Re-applies border colors for `theme`; no marker is recreated
    pub fn set_theme<S: MapSurface>(&mut self, surface: &mut S, theme: Theme) -> usize {
        if self.theme == theme {
            return 0;
        }
        self.theme = theme;
        let keys: Vec<String> = self.handles.keys().cloned().collect();
        keys.iter().filter(|key| self.restyle(surface, key)).count()
    }

    /// Image load result reported by the host
    pub fn on_logo_loaded<S: MapSurface>(&mut self, surface: &mut S, url: &str, ok: bool) -> usize {
        self.logos.resolve(url, ok);
        if self.tier != MarkerTier::Detailed {
            return 0;
        }
        let keys: Vec<String> = self
            .handles
            .values()
            .filter(|handle| handle.source.logo_url() == Some(url))
            .map(|handle| handle.key.clone())
            .collect();
        keys.iter().filter(|key| self.restyle(surface, key)).count()
    }

    /// Removes every marker from the surface
    pub fn clear<S: MapSurface>(&mut self, surface: &mut S) -> usize {
        let removed = self.handles.len();
        for (key, handle) in self.handles.drain() {
            if let Err(e) = surface.remove_marker(handle.surface_id) {
                log::warn!("failed to remove marker {}: {}", key, e);
            }
        }
        self.selected = None;
        removed
    }

    fn restyle<S: MapSurface>(&mut self, surface: &mut S, key: &str) -> bool {
        let Some(handle) = self.handles.get_mut(key) else {
            return false;
        };
        let ctx = StyleContext {
            config: &self.config,
            tier: self.tier,
            zoom: self.zoom,
            theme: self.theme,
        };
        let logo = match ctx.tier {
            MarkerTier::Detailed => self.logos.state_for(handle.source.logo_url()),
            MarkerTier::Simple => LogoState::Placeholder,
        };
        let selected = self.selected.as_deref() == Some(key);
        let attrs = ctx.attrs(&handle.source, selected, logo);
        let patch = handle.attrs.diff(&attrs);
        if patch.is_empty() {
            return false;
        }
        match surface.patch_marker(handle.surface_id, &patch) {
            Ok(()) => {
                handle.attrs = attrs;
                true
            }
            Err(e) => {
                log::warn!("failed to restyle marker {}: {}", key, e);
                false
            }
        }
    }

    pub fn handle(&self, key: &str) -> Option<&MarkerHandle> {
        self.handles.get(key)
    }

    pub fn handles(&self) -> impl Iterator<Item = &MarkerHandle> {
        self.handles.values()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn tier(&self) -> MarkerTier {
        self.tier
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn config(&self) -> &MarkerTierConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::viewport::Viewport;
    use crate::data::feature::PointFeature;
    use crate::rendering::recording::{RecordingSurface, SurfaceCall};
    use crate::spatial::clustering::Clustering;

    fn soho() -> Vec<PointFeature> {
        (0..5)
            .map(|i| {
                PointFeature::at(format!("shop-{i}"), 40.7230 + i as f64 * 0.0004, -74.0020)
                    .with_logo(&format!("https://cdn/logo-{i}.png"))
            })
            .collect()
    }

    fn sync_at(
        manager: &mut MarkerManager,
        surface: &mut RecordingSurface,
        clustering: &mut Clustering,
        features: &[PointFeature],
        zoom: f64,
    ) -> SyncReport {
        let output = clustering.cluster(features, &Viewport::new(LatLng::new(40.72, -74.0), zoom));
        manager.sync(surface, &output, zoom)
    }

    #[test]
    fn test_resync_of_unchanged_set_is_noop() {
        let features = soho();
        let mut manager = MarkerManager::new(MarkerTierConfig::default(), Theme::Light);
        let mut surface = RecordingSurface::new();
        let mut clustering = Clustering::default();

        let first = sync_at(&mut manager, &mut surface, &mut clustering, &features, 16.0);
        assert_eq!(first.created, 5);
        assert_eq!(first.tier, MarkerTier::Detailed);

        let again = sync_at(&mut manager, &mut surface, &mut clustering, &features, 16.0);
        assert!(again.is_noop());
    }

    #[test]
    fn test_zoom_within_tier_patches_instead_of_recreating() {
        let features = soho();
        let mut manager = MarkerManager::new(MarkerTierConfig::default(), Theme::Light);
        let mut surface = RecordingSurface::new();
        let mut clustering = Clustering::default();

        sync_at(&mut manager, &mut surface, &mut clustering, &features, 14.0);
        let ids: Vec<u64> = features
            .iter()
            .map(|f| manager.handle(&f.id).unwrap().surface_id)
            .collect();

        // crossing the label threshold only patches
        let report = sync_at(&mut manager, &mut surface, &mut clustering, &features, 15.5);
        assert_eq!(report.created, 0);
        assert_eq!(report.removed, 0);
        assert_eq!(report.patched, 5);
        for (feature, id) in features.iter().zip(ids) {
            assert_eq!(manager.handle(&feature.id).unwrap().surface_id, id);
        }
    }

    #[test]
    fn test_clusters_replace_singles_when_zooming_out() {
        let features = soho();
        let mut manager = MarkerManager::new(MarkerTierConfig::default(), Theme::Light);
        let mut surface = RecordingSurface::new();
        let mut clustering = Clustering::default();

        sync_at(&mut manager, &mut surface, &mut clustering, &features, 16.0);
        let report = sync_at(&mut manager, &mut surface, &mut clustering, &features, 2.0);
        assert_eq!(report.removed, 5);
        assert_eq!(report.created, 1);
        assert_eq!(surface.marker_keys(), vec!["cluster:shop-0:5".to_string()]);
    }

    #[test]
    fn test_selection_touches_at_most_two_markers() {
        let features = soho();
        let mut manager = MarkerManager::new(MarkerTierConfig::default(), Theme::Light);
        let mut surface = RecordingSurface::new();
        let mut clustering = Clustering::default();
        sync_at(&mut manager, &mut surface, &mut clustering, &features, 16.0);
        surface.clear_calls();

        assert_eq!(manager.set_selected(&mut surface, Some("shop-1")), 1);
        assert_eq!(manager.set_selected(&mut surface, Some("shop-3")), 2);
        assert_eq!(manager.set_selected(&mut surface, Some("shop-3")), 0);
        assert_eq!(
            surface.count_calls(|c| matches!(c, SurfaceCall::PatchMarker { .. })),
            3
        );
        assert_eq!(
            surface.count_calls(|c| matches!(c, SurfaceCall::AddMarker { .. } | SurfaceCall::RemoveMarker { .. })),
            0
        );

        let (_, spec) = surface.marker("shop-3").unwrap();
        assert!(spec.attrs.selected && spec.attrs.pointer);
        assert!(!surface.marker("shop-1").unwrap().1.attrs.selected);
    }

    #[test]
    fn test_failed_creation_skips_only_that_marker() {
        let features = soho();
        let mut manager = MarkerManager::new(MarkerTierConfig::default(), Theme::Light);
        let mut surface = RecordingSurface::new();
        surface.fail_marker("shop-2");
        let mut clustering = Clustering::default();

        let report = sync_at(&mut manager, &mut surface, &mut clustering, &features, 16.0);
        assert_eq!(report.created, 4);
        assert_eq!(report.skipped, 1);
        assert!(manager.handle("shop-2").is_none());
    }

    #[test]
    fn test_logo_requested_once_and_patched_on_load() {
        let features = soho();
        let mut manager = MarkerManager::new(MarkerTierConfig::default(), Theme::Light);
        let mut surface = RecordingSurface::new();
        let mut clustering = Clustering::default();

        sync_at(&mut manager, &mut surface, &mut clustering, &features, 16.0);
        sync_at(&mut manager, &mut surface, &mut clustering, &features, 16.5);
        assert_eq!(
            surface.count_calls(|c| matches!(c, SurfaceCall::RequestImage { .. })),
            5
        );

        assert_eq!(manager.on_logo_loaded(&mut surface, "https://cdn/logo-0.png", true), 1);
        assert_eq!(
            manager.handle("shop-0").unwrap().attrs.logo,
            Some(LogoState::Ready("https://cdn/logo-0.png".into()))
        );
        assert_eq!(manager.on_logo_loaded(&mut surface, "https://cdn/logo-1.png", false), 1);
        assert_eq!(
            manager.handle("shop-1").unwrap().attrs.logo,
            Some(LogoState::Placeholder)
        );
    }

    #[test]
    fn test_theme_change_restyles_in_place() {
        let features = soho();
        let mut manager = MarkerManager::new(MarkerTierConfig::default(), Theme::Light);
        let mut surface = RecordingSurface::new();
        let mut clustering = Clustering::default();
        sync_at(&mut manager, &mut surface, &mut clustering, &features, 16.0);

        assert_eq!(manager.set_theme(&mut surface, Theme::Dark), 5);
        assert_eq!(manager.set_theme(&mut surface, Theme::Dark), 0);
        assert_eq!(surface.marker_count(), 5);
    }

    #[test]
    fn test_precomputed_density_keeps_simple_tier() {
        let features: Vec<PointFeature> = soho().into_iter().map(|f| f.with_density(20)).collect();
        let mut manager = MarkerManager::new(MarkerTierConfig::default(), Theme::Light);
        let mut surface = RecordingSurface::new();
        let mut clustering = Clustering::default();

        let report = sync_at(&mut manager, &mut surface, &mut clustering, &features, 14.0);
        assert_eq!(report.density, 20);
        assert_eq!(report.tier, MarkerTier::Detailed);

        let mut spread = features.clone();
        for (i, f) in spread.iter_mut().enumerate() {
            f.position = Some(LatLng::new(40.0 + i as f64, -74.0));
        }
        let report = sync_at(&mut manager, &mut surface, &mut clustering, &spread, 11.0);
        assert_eq!(report.tier, MarkerTier::Simple);
    }
}
