//! Camera policy: where the map should look for each kind of selection.
//!
//! The controller turns selections into fly-to requests, drops requests that
//! would not move the camera, and owns the `is_transitioning` flag through a
//! [`TransitionManager`].

use crate::animation::transitions::{
    TransitionId, TransitionManager, TransitionOutcome, TransitionState, TransitionType,
};
use crate::core::config::CameraConfig;
use crate::core::constants::{
    CENTER_EPSILON_DEG, FIT_FALLBACK_ZOOM, FIT_ZOOM_BUCKETS, ZOOM_EPSILON,
};
use crate::core::geo::{LatLng, LatLngBounds};
use crate::core::viewport::Viewport;
use crate::data::feature::Location;
use crate::rendering::surface::{FlyTo, MapSurface};
use crate::spatial::geometry::centroid;
use instant::Instant;
use std::time::Duration;

/// Center and zoom the camera is asked to reach
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTarget {
    pub center: LatLng,
    pub zoom: f64,
}

impl CameraTarget {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self { center, zoom }
    }

    pub fn approx_eq(&self, other: &CameraTarget) -> bool {
        self.center.approx_eq(&other.center, CENTER_EPSILON_DEG)
            && (self.zoom - other.zoom).abs() < ZOOM_EPSILON
    }
}

impl From<&Viewport> for CameraTarget {
    fn from(viewport: &Viewport) -> Self {
        Self::new(viewport.center, viewport.zoom)
    }
}

/// Zoom for a padded span in degrees, from the fixed bucket table
pub fn fit_zoom(span_deg: f64) -> f64 {
    FIT_ZOOM_BUCKETS
        .iter()
        .find(|(max_span, _)| span_deg < *max_span)
        .map(|(_, zoom)| *zoom)
        .unwrap_or(FIT_FALLBACK_ZOOM)
}

/// Camera target framing every valid position, or `None` when there is none
pub fn fit_target(positions: &[LatLng], padding_factor: f64) -> Option<CameraTarget> {
    let valid: Vec<LatLng> = positions.iter().copied().filter(LatLng::is_valid).collect();
    let padded = LatLngBounds::from_points(&valid)?.padded(padding_factor);
    Some(CameraTarget::new(padded.center(), fit_zoom(padded.max_span())))
}

pub struct ViewportController {
    viewport: Viewport,
    config: CameraConfig,
    transitions: TransitionManager,
}

impl ViewportController {
    pub fn new(config: CameraConfig, viewport: Viewport) -> Self {
        let transitions =
            TransitionManager::new(Duration::from_millis(config.transition_timeout_ms));
        Self {
            viewport,
            config,
            transitions,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitions.is_transitioning()
    }

    /// Target of the transition in flight, if any
    pub fn in_flight(&self) -> Option<CameraTarget> {
        self.transitions.active().map(|t| t.target)
    }

    /// Camera position reported by the renderer (gestures, animation frames)
    pub fn observe(&mut self, center: LatLng, zoom: f64) {
        self.viewport.set_center(center);
        self.viewport.set_zoom(zoom);
    }

    /// Centers on a shop without zooming out
    pub fn focus_shop<S: MapSurface>(
        &mut self,
        surface: &mut S,
        position: Option<LatLng>,
        now: Instant,
    ) -> Option<TransitionId> {
        let Some(center) = position.filter(LatLng::is_valid) else {
            log::debug!("shop has no coordinates; camera stays");
            return None;
        };
        let zoom = self.viewport.zoom.max(self.config.shop_zoom);
        self.fly_to(surface, CameraTarget::new(center, zoom), TransitionType::Shop, now)
    }

    /// Frames a location: centroid of its shops, else its stored center.
    ///
    /// With two or more shops the zoom comes from their padded span; otherwise
    /// city zoom.
    pub fn focus_location<S: MapSurface>(
        &mut self,
        surface: &mut S,
        location: &Location,
        shop_positions: &[LatLng],
        now: Instant,
    ) -> Option<TransitionId> {
        let valid: Vec<LatLng> = shop_positions
            .iter()
            .copied()
            .filter(LatLng::is_valid)
            .collect();
        let Some(center) = centroid(&valid).or(location.center.filter(LatLng::is_valid)) else {
            log::debug!("location {} has no coordinates; camera stays", location.id);
            return None;
        };
        let zoom = if valid.len() < 2 {
            self.config.city_zoom
        } else {
            LatLngBounds::from_points(&valid)
                .map(|bounds| fit_zoom(bounds.padded(self.config.fit_padding_factor).max_span()))
                .unwrap_or(self.config.city_zoom)
        };
        self.fly_to(surface, CameraTarget::new(center, zoom), TransitionType::Location, now)
    }

    /// Frames a set of positions with padding
    pub fn fit_to<S: MapSurface>(
        &mut self,
        surface: &mut S,
        positions: &[LatLng],
        now: Instant,
    ) -> Option<TransitionId> {
        let target = fit_target(positions, self.config.fit_padding_factor)?;
        self.fly_to(surface, target, TransitionType::FitBounds, now)
    }

    /// Fixed world view
    pub fn explore<S: MapSurface>(&mut self, surface: &mut S, now: Instant) -> Option<TransitionId> {
        let target = CameraTarget::new(self.config.world_center, self.config.world_zoom);
        self.fly_to(surface, target, TransitionType::Explore, now)
    }

    /// Centers on a point at city zoom (geolocation outside coverage)
    pub fn focus_point<S: MapSurface>(
        &mut self,
        surface: &mut S,
        point: LatLng,
        now: Instant,
    ) -> Option<TransitionId> {
        if !point.is_valid() {
            return None;
        }
        let target = CameraTarget::new(point, self.config.city_zoom);
        self.fly_to(surface, target, TransitionType::Nearby, now)
    }

    /// Requests a transition unless it would not move the camera.
    ///
    /// A target matching the current viewport (with nothing in flight) or the
    /// target already in flight is dropped.
    pub fn fly_to<S: MapSurface>(
        &mut self,
        surface: &mut S,
        target: CameraTarget,
        transition_type: TransitionType,
        now: Instant,
    ) -> Option<TransitionId> {
        if let Some(in_flight) = self.in_flight() {
            if in_flight.approx_eq(&target) {
                log::debug!("{:?} transition already in flight", transition_type);
                return None;
            }
        } else if CameraTarget::from(&self.viewport).approx_eq(&target) {
            log::debug!("{:?} transition skipped; camera already there", transition_type);
            return None;
        }

        let id = self.transitions.start(transition_type, target, now);
        let request = FlyTo {
            transition_id: id,
            center: target.center,
            zoom: target.zoom,
            duration_ms: self.config.fly_duration_ms,
        };
        if let Err(e) = surface.fly_to(&request) {
            log::warn!("fly-to rejected: {}", e);
            self.transitions.abandon(id);
            return None;
        }
        Some(id)
    }

    /// Renderer reported the end of transition `id`
    pub fn on_transition_end(&mut self, id: TransitionId) -> Option<TransitionOutcome> {
        let outcome = self.transitions.complete(id)?;
        self.settle(&outcome);
        Some(outcome)
    }

    /// Releases a transition whose completion never arrived
    pub fn poll_timeout(&mut self, now: Instant) -> Option<TransitionOutcome> {
        let outcome = self.transitions.poll_timeout(now)?;
        self.settle(&outcome);
        Some(outcome)
    }

    /// Host timer fired for transition `id`
    pub fn expire(&mut self, id: TransitionId) -> Option<TransitionOutcome> {
        let outcome = self.transitions.expire(id)?;
        self.settle(&outcome);
        Some(outcome)
    }

    fn settle(&mut self, outcome: &TransitionOutcome) {
        // On timeout the camera stays wherever the renderer last reported
        if outcome.state == TransitionState::Completed {
            self.viewport.set_center(outcome.target.center);
            self.viewport.set_zoom(outcome.target.zoom);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::recording::RecordingSurface;

    fn controller(zoom: f64) -> ViewportController {
        ViewportController::new(
            CameraConfig::default(),
            Viewport::new(LatLng::new(20.0, 0.0), zoom),
        )
    }

    #[test]
    fn test_fit_zoom_buckets() {
        assert_eq!(fit_zoom(0.024), 14.0);
        assert_eq!(fit_zoom(0.05), 13.0);
        assert_eq!(fit_zoom(0.3), 12.0);
        assert_eq!(fit_zoom(1.5), 10.0);
        assert_eq!(fit_zoom(7.0), 6.0);
        assert_eq!(fit_zoom(39.9), 4.0);
        assert_eq!(fit_zoom(120.0), FIT_FALLBACK_ZOOM);
    }

    #[test]
    fn test_small_span_uses_highest_bucket() {
        let positions = [LatLng::new(40.70, -74.00), LatLng::new(40.72, -73.99)];
        let target = fit_target(&positions, 1.2).unwrap();
        assert_eq!(target.zoom, 14.0);
        assert!(target.center.approx_eq(&LatLng::new(40.71, -73.995), 1e-9));
        assert!(fit_target(&[], 1.2).is_none());
    }

    #[test]
    fn test_shop_focus_never_zooms_out() {
        let mut surface = RecordingSurface::new();
        let now = Instant::now();

        let mut camera = controller(17.0);
        camera.focus_shop(&mut surface, Some(LatLng::new(40.72, -74.0)), now);
        assert_eq!(surface.last_fly_to().unwrap().zoom, 17.0);

        let mut camera = controller(5.0);
        camera.focus_shop(&mut surface, Some(LatLng::new(40.72, -74.0)), now);
        assert_eq!(surface.last_fly_to().unwrap().zoom, 15.0);
    }

    #[test]
    fn test_missing_coordinates_are_noop() {
        let mut surface = RecordingSurface::new();
        let mut camera = controller(5.0);
        let now = Instant::now();

        assert!(camera.focus_shop(&mut surface, None, now).is_none());
        let location = Location::new("nowhere", "xx", None);
        assert!(camera.focus_location(&mut surface, &location, &[], now).is_none());
        assert!(surface.fly_requests().is_empty());
        assert!(!camera.is_transitioning());
    }

    #[test]
    fn test_location_uses_shop_centroid() {
        let mut surface = RecordingSurface::new();
        let mut camera = controller(5.0);
        let location = Location::new("nyc", "us", Some(LatLng::new(0.0, 0.0)));
        let shops = [
            LatLng::new(40.70, -74.00),
            LatLng::new(40.70, -74.00),
            LatLng::new(40.76, -73.96),
        ];

        camera.focus_location(&mut surface, &location, &shops, Instant::now());
        let fly = surface.last_fly_to().unwrap();
        // centroid, not the bounds center
        assert!(fly.center.approx_eq(&LatLng::new(40.72, -73.9866666666), 1e-6));
        // 0.06 * 1.2 = 0.072
        assert_eq!(fly.zoom, 13.0);
    }

    #[test]
    fn test_location_zoom_follows_shop_span() {
        let now = Instant::now();
        let location = Location::new("nyc", "us", Some(LatLng::new(40.71, -74.0)));

        let mut surface = RecordingSurface::new();
        let mut camera = controller(5.0);
        let tight = [LatLng::new(40.72, -74.0), LatLng::new(40.74, -74.0)];
        camera.focus_location(&mut surface, &location, &tight, now);
        assert_eq!(surface.last_fly_to().unwrap().zoom, 14.0);

        // one shop or none: city zoom
        let mut surface = RecordingSurface::new();
        let mut camera = controller(5.0);
        camera.focus_location(&mut surface, &location, &tight[..1], now);
        assert_eq!(surface.last_fly_to().unwrap().zoom, CameraConfig::default().city_zoom);

        let mut surface = RecordingSurface::new();
        let mut camera = controller(5.0);
        camera.focus_location(&mut surface, &location, &[], now);
        let fly = surface.last_fly_to().unwrap();
        assert_eq!(fly.center, LatLng::new(40.71, -74.0));
        assert_eq!(fly.zoom, CameraConfig::default().city_zoom);
    }

    #[test]
    fn test_redundant_transitions_are_suppressed() {
        let mut surface = RecordingSurface::new();
        let mut camera = controller(1.5);
        let now = Instant::now();

        // explore from the world view does nothing
        assert!(camera.explore(&mut surface, now).is_none());

        let shop = Some(LatLng::new(40.72, -74.0));
        let id = camera.focus_shop(&mut surface, shop, now).unwrap();
        assert!(camera.focus_shop(&mut surface, shop, now).is_none());
        assert_eq!(surface.fly_requests().len(), 1);

        camera.on_transition_end(id);
        assert!(!camera.is_transitioning());
        assert!(camera.focus_shop(&mut surface, shop, now).is_none());
    }

    #[test]
    fn test_timeout_keeps_last_reported_camera() {
        let mut surface = RecordingSurface::new();
        let mut camera = controller(3.0);
        let now = Instant::now();

        camera.focus_shop(&mut surface, Some(LatLng::new(40.72, -74.0)), now);
        camera.observe(LatLng::new(30.0, -50.0), 8.0);

        let outcome = camera
            .poll_timeout(now + Duration::from_millis(4000))
            .unwrap();
        assert!(outcome.timed_out());
        assert!(!camera.is_transitioning());
        assert_eq!(camera.viewport().zoom, 8.0);
    }

    #[test]
    fn test_new_transition_supersedes_old_completion() {
        let mut surface = RecordingSurface::new();
        let mut camera = controller(3.0);
        let now = Instant::now();

        let first = camera
            .focus_shop(&mut surface, Some(LatLng::new(40.72, -74.0)), now)
            .unwrap();
        let second = camera
            .fit_to(&mut surface, &[LatLng::new(51.5, -0.1), LatLng::new(51.6, 0.0)], now)
            .unwrap();

        assert!(camera.on_transition_end(first).is_none());
        assert!(camera.is_transitioning());
        assert!(camera.on_transition_end(second).is_some());
    }
}
