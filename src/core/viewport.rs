use crate::core::constants::{CENTER_EPSILON_DEG, TILE_SIZE, ZOOM_EPSILON};
use crate::core::geo::{LatLng, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// The camera of the map: center and zoom, plus the allowed zoom range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom: zoom.clamp(0.0, 22.0),
            min_zoom: 0.0,
            max_zoom: 22.0,
        }
    }

    /// Sets the center, clamping latitude to the projectable range
    pub fn set_center(&mut self, center: LatLng) {
        self.center = LatLng::new(LatLng::clamp_lat(center.lat), center.lng);
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    /// Integer zoom used for pixel-space grouping decisions
    pub fn zoom_level(&self) -> u8 {
        self.zoom.floor().clamp(0.0, 24.0) as u8
    }

    /// Projects a LatLng to world pixel coordinates (Web Mercator) at `zoom`,
    /// defaulting to the current zoom
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        project(lat_lng, zoom.unwrap_or(self.zoom))
    }

    /// Inverse of [`Viewport::project`]
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        unproject(pixel, zoom.unwrap_or(self.zoom))
    }

    /// True when center and zoom match within the redundancy epsilons
    pub fn approx_eq(&self, other: &Viewport) -> bool {
        self.center.approx_eq(&other.center, CENTER_EPSILON_DEG)
            && (self.zoom - other.zoom).abs() < ZOOM_EPSILON
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::default(), 1.0)
    }
}

/// Web Mercator projection of `lat_lng` into world pixels at `zoom`
pub fn project(lat_lng: &LatLng, zoom: f64) -> Point {
    let scale = TILE_SIZE * 2_f64.powf(zoom);
    let lat_rad = LatLng::clamp_lat(lat_lng.lat).to_radians();

    let x = (lat_lng.lng + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * scale;

    Point::new(x, y)
}

/// Inverse Web Mercator projection from world pixels at `zoom`
pub fn unproject(pixel: &Point, zoom: f64) -> LatLng {
    let scale = TILE_SIZE * 2_f64.powf(zoom);

    let lng = pixel.x / scale * 360.0 - 180.0;
    let n = PI - 2.0 * PI * pixel.y / scale;
    let lat = n.sinh().atan().to_degrees();

    LatLng::new(lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_round_trip() {
        let viewport = Viewport::new(LatLng::new(40.7128, -74.0060), 10.0);
        let pixel = viewport.project(&viewport.center, None);
        let back = viewport.unproject(&pixel, None);

        assert!(back.approx_eq(&viewport.center, 1e-9));
    }

    #[test]
    fn test_project_origin_is_world_center() {
        let p = project(&LatLng::new(0.0, 0.0), 0.0);
        assert!((p.x - TILE_SIZE / 2.0).abs() < 1e-9);
        assert!((p.y - TILE_SIZE / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_distance_doubles_per_zoom() {
        let a = LatLng::new(51.5, -0.12);
        let b = LatLng::new(51.51, -0.10);
        let d10 = project(&a, 10.0).distance_to(&project(&b, 10.0));
        let d11 = project(&a, 11.0).distance_to(&project(&b, 11.0));
        assert!((d11 / d10 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_clamping() {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(2.0, 18.0);
        viewport.set_zoom(25.0);
        assert_eq!(viewport.zoom, 18.0);
        viewport.set_zoom(-1.0);
        assert_eq!(viewport.zoom, 2.0);
    }

    #[test]
    fn test_approx_eq() {
        let a = Viewport::new(LatLng::new(10.0, 10.0), 12.0);
        let mut b = a.clone();
        assert!(a.approx_eq(&b));
        b.set_zoom(12.5);
        assert!(!a.approx_eq(&b));
    }
}
