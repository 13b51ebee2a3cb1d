use crate::data::feature::{Country, Location, PointFeature};
use crate::prelude::HashMap;
use crate::Result;
use serde::Deserialize;

/// Read-only view of the content collections the engine works against.
///
/// Owned by the engine; replaced wholesale when the content layer delivers
/// a fresh snapshot, never edited field by field.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    shops: Vec<PointFeature>,
    locations: Vec<Location>,
    countries: Vec<Country>,
    shop_index: HashMap<String, usize>,
    location_index: HashMap<String, usize>,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    shops: Vec<PointFeature>,
    #[serde(default)]
    locations: Vec<Location>,
    #[serde(default)]
    countries: Vec<Country>,
}

impl Catalog {
    pub fn new(shops: Vec<PointFeature>, locations: Vec<Location>, countries: Vec<Country>) -> Self {
        let mut catalog = Self {
            shops: Vec::new(),
            locations,
            countries,
            shop_index: HashMap::default(),
            location_index: HashMap::default(),
        };
        catalog.location_index = catalog
            .locations
            .iter()
            .enumerate()
            .map(|(i, location)| (location.id.clone(), i))
            .collect();
        catalog.set_shops(shops);
        catalog
    }

    /// Loads `{ "shops": [...], "locations": [...], "countries": [...] }`
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: CatalogDocument = serde_json::from_str(json)?;
        Ok(Self::new(doc.shops, doc.locations, doc.countries))
    }

    /// Replaces the shop list; later duplicates of an id are dropped
    pub fn set_shops(&mut self, shops: Vec<PointFeature>) {
        self.shop_index.clear();
        self.shops = Vec::with_capacity(shops.len());
        for shop in shops {
            if self.shop_index.contains_key(&shop.id) {
                log::warn!("duplicate shop id {} ignored", shop.id);
                continue;
            }
            self.shop_index.insert(shop.id.clone(), self.shops.len());
            self.shops.push(shop);
        }
    }

    pub fn shops(&self) -> &[PointFeature] {
        &self.shops
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn shop(&self, id: &str) -> Option<&PointFeature> {
        self.shop_index.get(id).map(|&i| &self.shops[i])
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.location_index.get(id).map(|&i| &self.locations[i])
    }

    pub fn shops_in_location<'a, 'b>(
        &'a self,
        location_id: &'b str,
    ) -> impl Iterator<Item = &'a PointFeature> + 'b
    where
        'a: 'b,
    {
        self.shops
            .iter()
            .filter(move |shop| shop.metadata.location_id.as_deref() == Some(location_id))
    }

    pub fn location_by_slugs(&self, country_slug: &str, city_slug: &str) -> Option<&Location> {
        self.locations.iter().find(|location| {
            location.country_slug.eq_ignore_ascii_case(country_slug)
                && location.slug.eq_ignore_ascii_case(city_slug)
        })
    }

    pub fn shop_by_slug(&self, location_id: &str, shop_slug: &str) -> Option<&PointFeature> {
        self.shops_in_location(location_id)
            .find(|shop| shop.metadata.slug.eq_ignore_ascii_case(shop_slug))
    }

    /// A location is supported when flagged or when at least one shop sits in it
    pub fn is_location_supported(&self, location: &Location) -> bool {
        location.supported || self.shops_in_location(&location.id).next().is_some()
    }

    /// Country code of a shop, from its own metadata or from its location
    pub fn shop_country_code<'a>(&'a self, shop: &'a PointFeature) -> Option<&'a str> {
        shop.metadata.country_code.as_deref().or_else(|| {
            shop.metadata
                .location_id
                .as_deref()
                .and_then(|id| self.location(id))
                .and_then(|location| location.country_code.as_deref())
        })
    }

    /// A country is supported when flagged or when at least one shop sits in it
    pub fn is_country_supported(&self, code: &str) -> bool {
        let flagged = self
            .countries
            .iter()
            .any(|country| country.supported && country.code.eq_ignore_ascii_case(code));
        flagged
            || self.shops.iter().any(|shop| {
                self.shop_country_code(shop)
                    .is_some_and(|c| c.eq_ignore_ascii_case(code))
            })
    }

    /// Country codes considered supported, upper-cased and sorted
    pub fn supported_country_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .countries
            .iter()
            .filter(|country| country.supported)
            .map(|country| country.code.to_uppercase())
            .chain(
                self.shops
                    .iter()
                    .filter_map(|shop| self.shop_country_code(shop))
                    .map(str::to_uppercase),
            )
            .collect();
        codes.sort();
        codes.dedup();
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;

    fn sample() -> Catalog {
        Catalog::new(
            vec![
                PointFeature::at("bb", 40.72, -74.0).in_location("new-york", "soho"),
                PointFeature::at("bb", 0.0, 0.0),
                PointFeature::at("ps", 45.52, -122.68).in_location("portland", "pearl"),
            ],
            vec![
                Location::new("new-york", "us", Some(LatLng::new(40.71, -74.0))),
                Location::new("portland", "us", None),
                Location::new("oslo", "no", None),
                Location::new("lisbon", "pt", None).flagged_supported(),
            ],
            vec![Country {
                code: "JP".into(),
                name: "Japan".into(),
                supported: true,
            }],
        )
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let catalog = sample();
        assert_eq!(catalog.shops().len(), 2);
        assert_eq!(catalog.shop("bb").unwrap().position, Some(LatLng::new(40.72, -74.0)));
    }

    #[test]
    fn test_location_support() {
        let catalog = sample();
        assert!(catalog.is_location_supported(catalog.location("new-york").unwrap()));
        assert!(catalog.is_location_supported(catalog.location("lisbon").unwrap()));
        assert!(!catalog.is_location_supported(catalog.location("oslo").unwrap()));
    }

    #[test]
    fn test_country_support() {
        let catalog = sample();
        assert!(catalog.is_country_supported("us"));
        assert!(catalog.is_country_supported("JP"));
        assert!(!catalog.is_country_supported("NO"));
        assert_eq!(catalog.supported_country_codes(), vec!["JP", "US"]);
    }

    #[test]
    fn test_slug_lookup() {
        let catalog = sample();
        let location = catalog.location_by_slugs("US", "new-york").unwrap();
        assert_eq!(location.id, "new-york");
        assert_eq!(catalog.shop_by_slug("new-york", "bb").unwrap().id, "bb");
        assert!(catalog.shop_by_slug("portland", "bb").is_none());
    }

    #[test]
    fn test_lookups_outlive_their_keys() {
        let catalog = sample();
        let shop = {
            let location_id = String::from("new-york");
            catalog.shop_by_slug(&location_id, "BB")
        };
        assert_eq!(shop.map(|shop| shop.id.as_str()), Some("bb"));

        let code = {
            let shop = catalog.shop("bb").unwrap();
            catalog.shop_country_code(shop)
        };
        assert_eq!(code.map(str::to_ascii_uppercase).as_deref(), Some("US"));
    }
}
