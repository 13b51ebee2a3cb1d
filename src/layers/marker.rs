//! Marker appearance: the tier policy and the attributes derived from it.
//!
//! A marker's look is a pure function of its source (shop or cluster), the
//! tier chosen for the update cycle, the zoom, the theme and whether it is
//! selected. Handles store the last attributes sent to the renderer, and
//! [`MarkerAttrs::diff`] turns a restyle into the smallest in-place patch.

use crate::core::config::{MarkerTierConfig, Theme};
use crate::core::geo::{LatLng, Point};
use crate::data::feature::PointFeature;
use crate::rendering::surface::{MarkerPatch, SurfaceMarkerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerTier {
    /// Small accent-colored dot
    Simple,
    /// Logo badge, with a label at high zoom
    Detailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Shop,
    Cluster { count: usize },
}

/// Loading state of a detailed marker's logo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoState {
    /// Shimmer until the host reports the image
    Loading,
    Ready(String),
    /// No logo, or it failed to load
    Placeholder,
}

/// What a marker is drawn from. Kept on the handle so restyling needs no
/// access to the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerSource {
    Shop {
        name: String,
        accent_color: Option<String>,
        logo_url: Option<String>,
    },
    Cluster {
        count: usize,
    },
}

impl MarkerSource {
    pub fn from_feature(feature: &PointFeature) -> Self {
        Self::Shop {
            name: feature.metadata.name.clone(),
            accent_color: feature.metadata.accent_color.clone(),
            logo_url: feature.metadata.logo_url.clone(),
        }
    }

    pub fn kind(&self) -> MarkerKind {
        match self {
            Self::Shop { .. } => MarkerKind::Shop,
            Self::Cluster { count } => MarkerKind::Cluster { count: *count },
        }
    }

    pub fn logo_url(&self) -> Option<&str> {
        match self {
            Self::Shop { logo_url, .. } => logo_url.as_deref(),
            Self::Cluster { .. } => None,
        }
    }
}

/// Visual attributes of one marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerAttrs {
    pub kind: MarkerKind,
    pub tier: MarkerTier,
    pub diameter: f64,
    pub fill_color: String,
    pub border_color: String,
    /// Pointer drawn beneath a selected badge
    pub pointer: bool,
    /// Anchor offset in pixels (negative y is up)
    pub offset: Point,
    pub label: Option<String>,
    pub logo: Option<LogoState>,
    pub selected: bool,
    pub z_index: i32,
    /// Only honoured on creation
    pub fade_in: bool,
}

impl MarkerAttrs {
    /// Patch turning `self` into `next`; empty when nothing visible changed
    pub fn diff(&self, next: &MarkerAttrs) -> MarkerPatch {
        fn changed<T: PartialEq + Clone>(old: &T, new: &T) -> Option<T> {
            (old != new).then(|| new.clone())
        }

        MarkerPatch {
            position: None,
            tier: changed(&self.tier, &next.tier),
            diameter: changed(&self.diameter, &next.diameter),
            fill_color: changed(&self.fill_color, &next.fill_color),
            border_color: changed(&self.border_color, &next.border_color),
            pointer: changed(&self.pointer, &next.pointer),
            offset: changed(&self.offset, &next.offset),
            label: changed(&self.label, &next.label),
            logo: changed(&self.logo, &next.logo),
            selected: changed(&self.selected, &next.selected),
            z_index: changed(&self.z_index, &next.z_index),
        }
    }

    pub fn apply(&mut self, patch: &MarkerPatch) {
        if let Some(tier) = patch.tier {
            self.tier = tier;
        }
        if let Some(diameter) = patch.diameter {
            self.diameter = diameter;
        }
        if let Some(color) = &patch.fill_color {
            self.fill_color = color.clone();
        }
        if let Some(color) = &patch.border_color {
            self.border_color = color.clone();
        }
        if let Some(pointer) = patch.pointer {
            self.pointer = pointer;
        }
        if let Some(offset) = patch.offset {
            self.offset = offset;
        }
        if let Some(label) = &patch.label {
            self.label = label.clone();
        }
        if let Some(logo) = &patch.logo {
            self.logo = logo.clone();
        }
        if let Some(selected) = patch.selected {
            self.selected = selected;
        }
        if let Some(z_index) = patch.z_index {
            self.z_index = z_index;
        }
    }
}

/// A marker as the manager tracks it
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerHandle {
    /// Feature id or cluster id
    pub key: String,
    pub surface_id: SurfaceMarkerId,
    pub position: LatLng,
    pub source: MarkerSource,
    pub attrs: MarkerAttrs,
}

/// Tier for one update cycle.
///
/// Monotonic in zoom for a fixed density: once a zoom is high enough for
/// detailed markers, every higher zoom is too.
pub fn select_tier(config: &MarkerTierConfig, zoom: f64, density: u32) -> MarkerTier {
    let crowded = zoom < config.logo_zoom && density > config.high_density;
    if zoom < config.simple_below_zoom || crowded {
        MarkerTier::Simple
    } else {
        MarkerTier::Detailed
    }
}

/// Dot diameter of a simple marker at `zoom`
fn simple_diameter(zoom: f64) -> f64 {
    match zoom {
        z if z < 6.0 => 6.0,
        z if z < 9.0 => 8.0,
        z if z < 12.0 => 10.0,
        _ => 12.0,
    }
}

fn cluster_diameter(count: usize) -> f64 {
    (28.0 + 4.0 * (count.max(1) as f64).log2()).min(64.0)
}

/// Styling inputs shared by every marker of one update cycle
#[derive(Debug, Clone, Copy)]
pub struct StyleContext<'a> {
    pub config: &'a MarkerTierConfig,
    pub tier: MarkerTier,
    pub zoom: f64,
    pub theme: Theme,
}

impl StyleContext<'_> {
    /// Attributes for `source`; `logo` is only used by detailed shop markers
    pub fn attrs(&self, source: &MarkerSource, selected: bool, logo: LogoState) -> MarkerAttrs {
        let config = self.config;
        let border = config.border_color(self.theme).to_string();

        match source {
            MarkerSource::Cluster { count } => MarkerAttrs {
                kind: MarkerKind::Cluster { count: *count },
                tier: MarkerTier::Simple,
                diameter: cluster_diameter(*count),
                fill_color: config.default_accent.clone(),
                border_color: border,
                pointer: false,
                offset: Point::default(),
                label: Some(count.to_string()),
                logo: None,
                selected: false,
                z_index: 5,
                fade_in: config.fade_in,
            },
            MarkerSource::Shop {
                name, accent_color, ..
            } => {
                let accent = accent_color
                    .clone()
                    .unwrap_or_else(|| config.default_accent.clone());
                let z_index = if selected { 10 } else { 0 };

                match self.tier {
                    MarkerTier::Simple => {
                        let growth = if selected {
                            2.0 * config.simple_selected_growth
                        } else {
                            0.0
                        };
                        MarkerAttrs {
                            kind: MarkerKind::Shop,
                            tier: MarkerTier::Simple,
                            diameter: simple_diameter(self.zoom) + growth,
                            fill_color: if selected {
                                config.selected_color.clone()
                            } else {
                                accent
                            },
                            border_color: border,
                            pointer: false,
                            offset: Point::default(),
                            label: None,
                            logo: None,
                            selected,
                            z_index,
                            fade_in: config.fade_in,
                        }
                    }
                    MarkerTier::Detailed => {
                        let (diameter, offset) = if selected {
                            let lift = config.badge_size_selected / 2.0 + config.pointer_length;
                            (config.badge_size_selected, Point::new(0.0, -lift))
                        } else {
                            (config.badge_size, Point::default())
                        };
                        MarkerAttrs {
                            kind: MarkerKind::Shop,
                            tier: MarkerTier::Detailed,
                            diameter,
                            fill_color: accent,
                            border_color: if selected {
                                config.selected_color.clone()
                            } else {
                                border
                            },
                            pointer: selected,
                            offset,
                            label: (self.zoom >= config.label_zoom).then(|| name.clone()),
                            logo: Some(logo),
                            selected,
                            z_index,
                            fade_in: config.fade_in,
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> MarkerSource {
        MarkerSource::from_feature(
            &PointFeature::at("bb", 40.72, -74.0)
                .with_accent("#0055ff")
                .with_logo("https://cdn/bb.png"),
        )
    }

    #[test]
    fn test_tier_is_monotonic_in_zoom() {
        let config = MarkerTierConfig::default();
        for density in [0, 3, config.high_density, config.high_density + 1, 100] {
            let mut seen_detailed = false;
            let mut zoom = 0.0;
            while zoom <= 22.0 {
                let tier = select_tier(&config, zoom, density);
                if seen_detailed {
                    assert_eq!(tier, MarkerTier::Detailed, "regressed at zoom {zoom}, density {density}");
                }
                seen_detailed |= tier == MarkerTier::Detailed;
                zoom += 0.25;
            }
            assert!(seen_detailed);
        }
    }

    #[test]
    fn test_dense_neighbourhood_stays_simple_until_logo_zoom() {
        let config = MarkerTierConfig::default();
        let dense = config.high_density + 1;
        assert_eq!(select_tier(&config, 11.0, dense), MarkerTier::Simple);
        assert_eq!(select_tier(&config, 11.0, 0), MarkerTier::Detailed);
        assert_eq!(select_tier(&config, config.logo_zoom, dense), MarkerTier::Detailed);
        assert_eq!(select_tier(&config, 9.9, 0), MarkerTier::Simple);
    }

    #[test]
    fn test_selected_detailed_marker_is_lifted() {
        let config = MarkerTierConfig::default();
        let ctx = StyleContext {
            config: &config,
            tier: MarkerTier::Detailed,
            zoom: 14.0,
            theme: Theme::Light,
        };

        let plain = ctx.attrs(&shop(), false, LogoState::Loading);
        let selected = ctx.attrs(&shop(), true, LogoState::Loading);

        assert_eq!(plain.diameter, config.badge_size);
        assert!(!plain.pointer);
        assert_eq!(selected.diameter, config.badge_size_selected);
        assert!(selected.pointer);
        assert_eq!(
            selected.offset.y,
            -(config.badge_size_selected / 2.0 + config.pointer_length)
        );
        // below label zoom
        assert!(selected.label.is_none());
    }

    #[test]
    fn test_label_only_at_label_zoom() {
        let config = MarkerTierConfig::default();
        let ctx = StyleContext {
            config: &config,
            tier: MarkerTier::Detailed,
            zoom: config.label_zoom,
            theme: Theme::Dark,
        };
        let attrs = ctx.attrs(&shop(), false, LogoState::Placeholder);
        assert_eq!(attrs.label.as_deref(), Some("bb"));
        assert_eq!(attrs.border_color, config.dark_border);
    }

    #[test]
    fn test_selected_simple_marker_grows_and_recolors() {
        let config = MarkerTierConfig::default();
        let ctx = StyleContext {
            config: &config,
            tier: MarkerTier::Simple,
            zoom: 4.0,
            theme: Theme::Light,
        };
        let plain = ctx.attrs(&shop(), false, LogoState::Loading);
        let selected = ctx.attrs(&shop(), true, LogoState::Loading);

        assert_eq!(plain.fill_color, "#0055ff");
        assert_eq!(selected.fill_color, config.selected_color);
        assert!(selected.diameter > plain.diameter);
        assert!(plain.logo.is_none());
    }

    #[test]
    fn test_diff_only_carries_changes() {
        let config = MarkerTierConfig::default();
        let ctx = StyleContext {
            config: &config,
            tier: MarkerTier::Detailed,
            zoom: 14.0,
            theme: Theme::Light,
        };
        let before = ctx.attrs(&shop(), false, LogoState::Loading);
        assert!(before.diff(&before).is_empty());

        let after = ctx.attrs(&shop(), false, LogoState::Ready("https://cdn/bb.png".into()));
        let patch = before.diff(&after);
        assert!(patch.logo.is_some());
        assert!(patch.diameter.is_none());
        assert!(patch.selected.is_none());

        let mut applied = before.clone();
        applied.apply(&patch);
        assert_eq!(applied, after);
    }
}
