//! Shareable URL paths for selections.
//!
//! `/`, `/{country}/{city}` and `/{country}/{city}/{area}/{shop}`. Parsing is
//! lenient: query strings, fragments, empty segments and case are ignored,
//! and a path with only an area segment past the city resolves to the city.

use crate::data::feature::{Location, PointFeature};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Root,
    Location {
        country: String,
        city: String,
    },
    Shop {
        country: String,
        city: String,
        area: String,
        shop: String,
    },
}

impl Route {
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<String> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_lowercase)
            .collect();

        match segments.as_slice() {
            [country, city, area, shop, ..] => Route::Shop {
                country: country.clone(),
                city: city.clone(),
                area: area.clone(),
                shop: shop.clone(),
            },
            [country, city] | [country, city, _] => Route::Location {
                country: country.clone(),
                city: city.clone(),
            },
            _ => Route::Root,
        }
    }

    pub fn for_location(location: &Location) -> Route {
        Route::Location {
            country: location.country_slug.to_lowercase(),
            city: location.slug.to_lowercase(),
        }
    }

    /// Shop route; a shop without an area slug falls back to its location
    pub fn for_shop(location: &Location, shop: &PointFeature) -> Route {
        match shop.metadata.area_slug.as_deref() {
            Some(area) if !area.is_empty() => Route::Shop {
                country: location.country_slug.to_lowercase(),
                city: location.slug.to_lowercase(),
                area: area.to_lowercase(),
                shop: shop.metadata.slug.to_lowercase(),
            },
            _ => Route::for_location(location),
        }
    }

    pub fn to_path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Root => write!(f, "/"),
            Route::Location { country, city } => write!(f, "/{}/{}", country, city),
            Route::Shop {
                country,
                city,
                area,
                shop,
            } => write!(f, "/{}/{}/{}/{}", country, city, area, shop),
        }
    }
}
