//! Content records consumed from the data layer.
//!
//! Shops arrive from the CMS with nullable coordinates and several spellings
//! of the same recommendation flag. Both are normalised here, at the
//! ingestion boundary, so the rest of the engine only sees one canonical
//! shape.

use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};

/// Rendering and routing hints attached to a point feature
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureMetadata {
    pub name: String,
    pub slug: String,
    pub location_id: Option<String>,
    pub area_slug: Option<String>,
    pub country_code: Option<String>,
    pub logo_url: Option<String>,
    pub accent_color: Option<String>,
    /// Precomputed neighbour count, when the content layer supplies one
    pub density: Option<u32>,
    pub recommended: bool,
}

/// A shop on the map. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawShop")]
pub struct PointFeature {
    pub id: String,
    pub position: Option<LatLng>,
    pub metadata: FeatureMetadata,
}

impl PointFeature {
    pub fn new(id: impl Into<String>, position: Option<LatLng>) -> Self {
        let id = id.into();
        let metadata = FeatureMetadata {
            name: id.clone(),
            slug: id.clone(),
            ..FeatureMetadata::default()
        };
        Self {
            id,
            position,
            metadata,
        }
    }

    /// Shorthand for a feature with known coordinates
    pub fn at(id: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self::new(id, Some(LatLng::new(lat, lng)))
    }

    pub fn in_location(mut self, location_id: &str, area_slug: &str) -> Self {
        self.metadata.location_id = Some(location_id.to_string());
        self.metadata.area_slug = Some(area_slug.to_string());
        self
    }

    pub fn with_slug(mut self, slug: &str) -> Self {
        self.metadata.slug = slug.to_string();
        self
    }

    pub fn with_logo(mut self, url: &str) -> Self {
        self.metadata.logo_url = Some(url.to_string());
        self
    }

    pub fn with_accent(mut self, color: &str) -> Self {
        self.metadata.accent_color = Some(color.to_string());
        self
    }

    pub fn with_density(mut self, density: u32) -> Self {
        self.metadata.density = Some(density);
        self
    }

    pub fn recommended(mut self, recommended: bool) -> Self {
        self.metadata.recommended = recommended;
        self
    }

    /// Coordinates usable for rendering, if any
    pub fn valid_position(&self) -> Option<LatLng> {
        self.position.filter(LatLng::is_valid)
    }
}

/// Wire shape of a shop record as the content layer delivers it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShop {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    slug: Option<String>,
    lat: Option<f64>,
    #[serde(alias = "lon")]
    lng: Option<f64>,
    location_id: Option<String>,
    area_slug: Option<String>,
    country_code: Option<String>,
    logo_url: Option<String>,
    accent_color: Option<String>,
    density: Option<u32>,
    recommended: Option<bool>,
    #[serde(rename = "isRecommended")]
    is_recommended_camel: Option<bool>,
    #[serde(rename = "is_recommended")]
    is_recommended_snake: Option<bool>,
    #[serde(rename = "Recommended")]
    recommended_title: Option<bool>,
}

impl From<RawShop> for PointFeature {
    fn from(raw: RawShop) -> Self {
        let recommended = [
            raw.recommended,
            raw.is_recommended_camel,
            raw.is_recommended_snake,
            raw.recommended_title,
        ]
        .into_iter()
        .flatten()
        .any(|flag| flag);

        let position = match (raw.lat, raw.lng) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
            _ => None,
        };

        let slug = raw.slug.unwrap_or_else(|| raw.id.clone());
        let name = if raw.name.is_empty() {
            raw.id.clone()
        } else {
            raw.name
        };

        PointFeature {
            id: raw.id,
            position,
            metadata: FeatureMetadata {
                name,
                slug,
                location_id: raw.location_id,
                area_slug: raw.area_slug,
                country_code: raw.country_code,
                logo_url: raw.logo_url,
                accent_color: raw.accent_color,
                density: raw.density,
                recommended,
            },
        }
    }
}

/// A city the app covers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub country_slug: String,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub center: Option<LatLng>,
    /// Ordered boundary ring; at least three points when present
    #[serde(default)]
    pub boundary: Vec<LatLng>,
    /// Explicitly flagged as supported by the content layer
    #[serde(default)]
    pub supported: bool,
}

impl Location {
    pub fn new(id: &str, country_slug: &str, center: Option<LatLng>) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            slug: id.to_string(),
            country_slug: country_slug.to_string(),
            country_code: Some(country_slug.to_uppercase()),
            center,
            boundary: Vec::new(),
            supported: false,
        }
    }

    pub fn with_boundary(mut self, boundary: Vec<LatLng>) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn flagged_supported(mut self) -> Self {
        self.supported = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub supported: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_spellings_normalise() {
        let shops: Vec<PointFeature> = serde_json::from_str(
            r#"[
                { "id": "a", "lat": 1.0, "lng": 2.0, "isRecommended": true },
                { "id": "b", "lat": 1.0, "lng": 2.0, "is_recommended": true },
                { "id": "c", "lat": 1.0, "lng": 2.0, "Recommended": true },
                { "id": "d", "lat": 1.0, "lng": 2.0, "recommended": false },
                { "id": "e", "lat": 1.0, "lng": 2.0 }
            ]"#,
        )
        .unwrap();

        let flags: Vec<bool> = shops.iter().map(|s| s.metadata.recommended).collect();
        assert_eq!(flags, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_nullable_coordinates() {
        let shop: PointFeature =
            serde_json::from_str(r#"{ "id": "x", "lat": null, "lng": 3.0 }"#).unwrap();
        assert!(shop.position.is_none());
        assert_eq!(shop.metadata.slug, "x");

        let shop: PointFeature =
            serde_json::from_str(r#"{ "id": "y", "lat": 95.0, "lon": 3.0 }"#).unwrap();
        assert!(shop.position.is_some());
        assert!(shop.valid_position().is_none());
    }

    #[test]
    fn test_camel_case_metadata() {
        let shop: PointFeature = serde_json::from_str(
            r##"{ "id": "bb", "name": "Blue Bottle", "slug": "blue-bottle", "lat": 40.72, "lng": -74.0,
                 "locationId": "new-york", "areaSlug": "soho", "logoUrl": "https://cdn/bb.png",
                 "accentColor": "#0055ff" }"##,
        )
        .unwrap();
        assert_eq!(shop.metadata.location_id.as_deref(), Some("new-york"));
        assert_eq!(shop.metadata.area_slug.as_deref(), Some("soho"));
        assert_eq!(shop.metadata.logo_url.as_deref(), Some("https://cdn/bb.png"));
        assert_eq!(shop.metadata.name, "Blue Bottle");
    }
}
