//! Overlay geometry: the world-covering polygon with one hole per supported
//! city, and the outline rings drawn along those holes.
//!
//! Ring convention (lng = x, lat = y, y up): the outer ring is clockwise and
//! every hole counter-clockwise. The renderer fills a hole wound the same way
//! as the outer ring, so orientation is enforced here rather than trusted
//! from the stored boundary order.

use crate::core::constants::WORLD_EXTENT_LAT;
use crate::core::geo::LatLng;
use crate::data::feature::Location;
use crate::{MapError, Result};

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::algorithm::winding_order::{Winding, WindingOrder};
use geo::{Centroid, Coord, LineString, MultiPoint};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingOrientation {
    Clockwise,
    CounterClockwise,
}

/// A polygon with holes, each ring closed (first point repeated last)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayPolygon {
    pub outer_ring: Vec<LatLng>,
    pub holes: Vec<Vec<LatLng>>,
    /// Location id for each entry of `holes`
    pub hole_ids: Vec<String>,
}

impl OverlayPolygon {
    /// GeoJSON Feature with `[lng, lat]` positions
    pub fn to_geojson(&self) -> Value {
        let rings: Vec<Value> = std::iter::once(&self.outer_ring)
            .chain(self.holes.iter())
            .map(|ring| ring_to_json(ring))
            .collect();
        json!({
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "Polygon", "coordinates": rings }
        })
    }

    /// GeoJSON MultiLineString tracing every hole, for the outline layer
    pub fn outlines_geojson(&self) -> Value {
        let lines: Vec<Value> = self.holes.iter().map(|ring| ring_to_json(ring)).collect();
        json!({
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "MultiLineString", "coordinates": lines }
        })
    }
}

fn ring_to_json(ring: &[LatLng]) -> Value {
    Value::Array(ring.iter().map(|p| json!([p.lng, p.lat])).collect())
}

fn to_line_string(points: &[LatLng]) -> LineString<f64> {
    LineString::from(points.iter().map(|&p| Coord::from(p)).collect::<Vec<_>>())
}

fn from_line_string(ring: &LineString<f64>) -> Vec<LatLng> {
    ring.coords().map(|&c| LatLng::from(c)).collect()
}

/// Orientation of a ring, or `None` when it encloses no area
pub fn ring_orientation(points: &[LatLng]) -> Option<RingOrientation> {
    let mut ring = to_line_string(points);
    ring.close();
    match ring.winding_order()? {
        WindingOrder::Clockwise => Some(RingOrientation::Clockwise),
        WindingOrder::CounterClockwise => Some(RingOrientation::CounterClockwise),
    }
}

/// Clockwise ring covering the projectable world
pub fn world_ring() -> Vec<LatLng> {
    let lat = WORLD_EXTENT_LAT;
    vec![
        LatLng::new(-lat, -180.0),
        LatLng::new(lat, -180.0),
        LatLng::new(lat, 180.0),
        LatLng::new(-lat, 180.0),
        LatLng::new(-lat, -180.0),
    ]
}

/// Validates a location boundary and returns it closed and counter-clockwise
pub fn build_hole(location: &Location) -> Result<Vec<LatLng>> {
    let malformed = |reason: &str| MapError::MalformedBoundary {
        location: location.id.clone(),
        reason: reason.to_string(),
    };

    if location.boundary.iter().any(|p| !p.is_valid()) {
        return Err(malformed("invalid coordinate"));
    }

    let mut points: Vec<LatLng> = Vec::with_capacity(location.boundary.len() + 1);
    for &p in &location.boundary {
        if points.last() != Some(&p) {
            points.push(p);
        }
    }
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.len() < 3 {
        return Err(malformed("fewer than 3 distinct points"));
    }

    let mut ring = to_line_string(&points);
    ring.close();

    if ring.winding_order().is_none() {
        return Err(malformed("ring encloses no area"));
    }
    if is_self_intersecting(&ring) {
        return Err(malformed("ring is self-intersecting"));
    }

    ring.make_ccw_winding();
    Ok(from_line_string(&ring))
}

/// Closed rings that cross or touch themselves anywhere except at shared
/// vertices of consecutive segments
pub fn is_self_intersecting(ring: &LineString<f64>) -> bool {
    let segments: Vec<geo::Line<f64>> = ring.lines().collect();
    let n = segments.len();

    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match line_intersection(segments[i], segments[j]) {
                None => {}
                Some(LineIntersection::SinglePoint { .. }) if adjacent => {}
                Some(LineIntersection::Collinear { intersection })
                    if adjacent && intersection.start == intersection.end => {}
                Some(_) => return true,
            }
        }
    }
    false
}

/// World overlay with one hole per location in `locations`.
///
/// A malformed boundary skips that location only.
pub fn world_overlay<'a, I>(locations: I) -> OverlayPolygon
where
    I: IntoIterator<Item = &'a Location>,
{
    let mut overlay = OverlayPolygon {
        outer_ring: world_ring(),
        ..OverlayPolygon::default()
    };

    for location in locations {
        if location.boundary.is_empty() {
            log::debug!("location {} has no boundary; no hole", location.id);
            continue;
        }
        match build_hole(location) {
            Ok(hole) => {
                overlay.holes.push(hole);
                overlay.hole_ids.push(location.id.clone());
            }
            Err(e) => log::warn!("skipping overlay hole: {}", e),
        }
    }

    overlay
}

/// Centroid of a point set, `None` when empty
pub fn centroid(points: &[LatLng]) -> Option<LatLng> {
    let multi: MultiPoint<f64> = points
        .iter()
        .map(|&p| geo::Point::from(Coord::from(p)))
        .collect::<Vec<_>>()
        .into();
    multi.centroid().map(|c| LatLng::new(c.y(), c.x()))
}

/// Whether `point` lies inside the closed ring `boundary`
pub fn ring_contains(boundary: &[LatLng], point: &LatLng) -> bool {
    use geo::Contains;

    if boundary.len() < 3 {
        return false;
    }
    let polygon = geo::Polygon::new(to_line_string(boundary), Vec::new());
    polygon.contains(&geo::Point::from(Coord::from(*point)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_cw() -> Vec<LatLng> {
        // lng/lat square walked clockwise (y up)
        vec![
            LatLng::new(40.70, -74.02),
            LatLng::new(40.74, -74.02),
            LatLng::new(40.74, -73.98),
            LatLng::new(40.70, -73.98),
        ]
    }

    fn located(id: &str, boundary: Vec<LatLng>) -> Location {
        Location::new(id, "us", None).with_boundary(boundary)
    }

    #[test]
    fn test_world_ring_is_clockwise() {
        assert_eq!(ring_orientation(&world_ring()), Some(RingOrientation::Clockwise));
    }

    #[test]
    fn test_clockwise_ring_becomes_counter_clockwise_hole() {
        let stored = square_cw();
        assert_eq!(ring_orientation(&stored), Some(RingOrientation::Clockwise));

        let hole = build_hole(&located("nyc", stored)).unwrap();
        assert_eq!(ring_orientation(&hole), Some(RingOrientation::CounterClockwise));
        assert_eq!(hole.first(), hole.last());
    }

    #[test]
    fn test_counter_clockwise_ring_stays_counter_clockwise() {
        let mut stored = square_cw();
        stored.reverse();
        let hole = build_hole(&located("nyc", stored)).unwrap();
        assert_eq!(ring_orientation(&hole), Some(RingOrientation::CounterClockwise));
    }

    #[test]
    fn test_every_hole_opposes_outer_ring() {
        let mut reversed = square_cw();
        reversed.reverse();
        let locations = vec![located("a", square_cw()), located("b", reversed)];
        let overlay = world_overlay(&locations);

        let outer = ring_orientation(&overlay.outer_ring).unwrap();
        assert_eq!(overlay.holes.len(), 2);
        for hole in &overlay.holes {
            assert_ne!(ring_orientation(hole).unwrap(), outer);
        }
    }

    #[test]
    fn test_malformed_boundaries_skip_only_that_location() {
        let bowtie = vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(1.0, 1.0),
            LatLng::new(1.0, 0.0),
            LatLng::new(0.0, 1.0),
        ];
        let two_points = vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0), LatLng::new(0.0, 0.0)];
        let locations = vec![
            located("bowtie", bowtie),
            located("short", two_points),
            located("good", square_cw()),
            located("empty", Vec::new()),
        ];

        let overlay = world_overlay(&locations);
        assert_eq!(overlay.hole_ids, vec!["good".to_string()]);
    }

    #[test]
    fn test_build_hole_errors() {
        let err = build_hole(&located("short", vec![LatLng::new(0.0, 0.0); 4])).unwrap_err();
        assert!(matches!(err, MapError::MalformedBoundary { .. }));

        let collinear = vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0), LatLng::new(0.0, 2.0)];
        assert!(build_hole(&located("line", collinear)).is_err());
    }

    #[test]
    fn test_geojson_shape() {
        let overlay = world_overlay(&[located("nyc", square_cw())]);
        let value = overlay.to_geojson();
        let rings = value["geometry"]["coordinates"].as_array().unwrap();
        assert_eq!(rings.len(), 2);
        // positions are [lng, lat]
        assert_eq!(rings[0][0], json!([-180.0, -WORLD_EXTENT_LAT]));
        assert_eq!(overlay.outlines_geojson()["geometry"]["coordinates"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_centroid_and_contains() {
        let c = centroid(&[LatLng::new(0.0, 0.0), LatLng::new(2.0, 4.0)]).unwrap();
        assert!(c.approx_eq(&LatLng::new(1.0, 2.0), 1e-12));
        assert!(centroid(&[]).is_none());

        assert!(ring_contains(&square_cw(), &LatLng::new(40.72, -74.0)));
        assert!(!ring_contains(&square_cw(), &LatLng::new(41.0, -74.0)));
    }
}
