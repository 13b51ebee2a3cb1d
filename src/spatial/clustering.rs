use crate::prelude::HashMap;
use crate::{
    core::{
        camera::CameraTarget,
        config::ClusterConfig,
        geo::{LatLng, Point},
        viewport::{project, unproject, Viewport},
    },
    data::feature::PointFeature,
    spatial::index::{SpatialIndex, SpatialItem},
};

/// A zoom-dependent group of nearby features
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Derived from membership, so an unchanged group keeps its id across zooms
    pub id: String,
    /// Pixel-space centroid of the members, unprojected
    pub center: LatLng,
    /// Member feature ids in input order
    pub member_ids: Vec<String>,
    /// Integer zoom the grouping was computed at
    pub zoom: u8,
    member_positions: Vec<LatLng>,
}

impl Cluster {
    /// Get the number of items in the cluster
    pub fn count(&self) -> usize {
        self.member_ids.len()
    }

    pub fn member_positions(&self) -> &[LatLng] {
        &self.member_positions
    }

    fn make_id(member_ids: &[String]) -> String {
        let min = member_ids.iter().min().map(String::as_str).unwrap_or_default();
        format!("cluster:{}:{}", min, member_ids.len())
    }
}

/// Result of one clustering pass
#[derive(Debug, Default)]
pub struct ClusterOutput<'a> {
    pub clusters: Vec<Cluster>,
    pub singles: Vec<&'a PointFeature>,
}

impl ClusterOutput<'_> {
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty() && self.singles.is_empty()
    }
}

/// Pixel-radius clustering of point features.
///
/// Keeps the clusters of the most recent pass so a cluster click can be
/// turned into a camera target.
pub struct Clustering {
    config: ClusterConfig,
    last_clusters: HashMap<String, Cluster>,
}

impl Clustering {
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            config,
            last_clusters: HashMap::default(),
        }
    }

    /// Partitions `features` into clusters and singles at the viewport's zoom.
    ///
    /// Features without valid coordinates are left out. Deterministic for
    /// identical inputs: seeds are visited in input order.
    pub fn cluster<'a, I>(&mut self, features: I, viewport: &Viewport) -> ClusterOutput<'a>
    where
        I: IntoIterator<Item = &'a PointFeature>,
    {
        let located: Vec<(&'a PointFeature, LatLng)> = features
            .into_iter()
            .filter_map(|feature| feature.valid_position().map(|pos| (feature, pos)))
            .collect();

        self.last_clusters.clear();
        let mut output = ClusterOutput::default();

        if viewport.zoom >= self.config.max_zoom {
            output.singles = located.into_iter().map(|(feature, _)| feature).collect();
            return output;
        }

        let zoom = viewport.zoom_level();
        let positions: Vec<LatLng> = located.iter().map(|(_, pos)| *pos).collect();

        for group in group_points(&positions, zoom, self.config.radius_px) {
            if group.len() == 1 {
                output.singles.push(located[group[0]].0);
                continue;
            }

            let member_ids: Vec<String> = group.iter().map(|&i| located[i].0.id.clone()).collect();
            let member_positions: Vec<LatLng> = group.iter().map(|&i| positions[i]).collect();
            let cluster = Cluster {
                id: Cluster::make_id(&member_ids),
                center: pixel_centroid(&member_positions, zoom),
                member_ids,
                zoom,
                member_positions,
            };
            self.last_clusters.insert(cluster.id.clone(), cluster.clone());
            output.clusters.push(cluster);
        }

        output
    }

    /// Minimal zoom at which the cluster splits apart, centred on the cluster.
    ///
    /// Members that never separate (identical coordinates) resolve to
    /// `max_zoom`, where clustering stops.
    pub fn expansion_target(&self, cluster_id: &str) -> Option<CameraTarget> {
        let cluster = self.last_clusters.get(cluster_id)?;
        let max_zoom = self.config.max_zoom.ceil().clamp(0.0, 24.0) as u8;

        let zoom = (cluster.zoom + 1..max_zoom)
            .find(|&z| group_points(&cluster.member_positions, z, self.config.radius_px).len() > 1)
            .unwrap_or(max_zoom);

        Some(CameraTarget::new(cluster.center, zoom as f64))
    }

    /// Clusters produced by the most recent pass
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.last_clusters.values()
    }

    /// Update the clustering configuration
    pub fn set_config(&mut self, config: ClusterConfig) {
        self.config = config;
        self.last_clusters.clear();
    }

    /// Get the current configuration
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }
}

impl Default for Clustering {
    fn default() -> Self {
        Self::new(ClusterConfig::default())
    }
}

/// Greedy radius grouping; returns index groups into `positions`, every
/// index in exactly one group
fn group_points(positions: &[LatLng], zoom: u8, radius_px: f64) -> Vec<Vec<usize>> {
    let projected: Vec<Point> = positions.iter().map(|pos| project(pos, zoom as f64)).collect();
    let index = SpatialIndex::bulk_load(
        projected
            .iter()
            .enumerate()
            .map(|(i, point)| SpatialItem::new(i.to_string(), *point, i))
            .collect(),
    );

    let mut visited = vec![false; positions.len()];
    let mut groups = Vec::new();

    for seed in 0..positions.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;

        let mut neighbours: Vec<usize> = index
            .query_radius(&projected[seed], radius_px)
            .into_iter()
            .map(|item| item.data)
            .filter(|&i| !visited[i])
            .collect();
        neighbours.sort_unstable();

        let mut group = Vec::with_capacity(neighbours.len() + 1);
        group.push(seed);
        for i in neighbours {
            visited[i] = true;
            group.push(i);
        }
        groups.push(group);
    }

    groups
}

fn pixel_centroid(positions: &[LatLng], zoom: u8) -> LatLng {
    let n = positions.len().max(1) as f64;
    let (sx, sy) = positions
        .iter()
        .map(|pos| project(pos, zoom as f64))
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    unproject(&Point::new(sx / n, sy / n), zoom as f64)
}
