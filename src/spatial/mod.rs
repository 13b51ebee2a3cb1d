pub mod clustering;
pub mod geometry;
pub mod index;

pub use clustering::{Cluster, ClusterOutput, Clustering};
pub use geometry::{OverlayPolygon, RingOrientation};
pub use index::{SpatialIndex, SpatialItem};
