pub mod catalog;
pub mod feature;

pub use catalog::Catalog;
pub use feature::{Country, FeatureMetadata, Location, PointFeature};
