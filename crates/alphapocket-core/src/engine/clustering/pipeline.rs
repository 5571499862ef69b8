use super::merge_linked;
use crate::core::alpha_spheres::{AlphaSphereSet, IndexError};
use crate::core::spatial::SpatialIndex;
use crate::core::utils::geometry::centroid;
use crate::engine::config::{ClusteringThresholds, ConfigError};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::Point3;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Three-stage agglomeration of alpha spheres into pockets.
///
/// 1. Neighbor linkage: spheres sharing enough contact points and lying within
///    `max_neighbor_dist` of each other are joined; isolated spheres are dropped.
/// 2. Centroid linkage: clusters whose centroids lie within `max_cluster_dist` merge.
/// 3. Contact-pair linkage: clusters with at least `min_contacts` sphere pairs closer
///    than `max_pair_dist` merge. Clusters smaller than `min_contacts` are never
///    considered, since they cannot contribute that many pairs.
///
/// Finally clusters smaller than `min_spheres_per_pocket` are discarded. The pipeline
/// never modifies the sphere set it runs on.
#[derive(Debug, Clone)]
pub struct PocketClusteringPipeline {
    thresholds: ClusteringThresholds,
}

impl PocketClusteringPipeline {
    pub fn new(thresholds: ClusteringThresholds) -> Result<Self, ConfigError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &ClusteringThresholds {
        &self.thresholds
    }

    /// Runs all stages and returns the pockets as ascending sphere index lists.
    #[instrument(skip_all, name = "three_stage_clustering", fields(spheres = spheres.len()))]
    pub fn run(
        &self,
        spheres: &AlphaSphereSet,
        reporter: &ProgressReporter,
    ) -> Result<Vec<Vec<usize>>, EngineError> {
        let stage_one = self.stage_one(spheres)?;
        reporter.report(Progress::StageComplete {
            stage: "neighbor linkage",
            clusters: stage_one.len(),
        });

        let stage_two = self.stage_two(spheres, stage_one)?;
        reporter.report(Progress::StageComplete {
            stage: "centroid linkage",
            clusters: stage_two.len(),
        });

        let stage_three = self.stage_three(spheres, stage_two)?;
        reporter.report(Progress::StageComplete {
            stage: "contact-pair linkage",
            clusters: stage_three.len(),
        });

        let pockets = self.finalize(stage_three);
        info!(pockets = pockets.len(), "Three-stage clustering complete.");
        Ok(pockets)
    }

    /// Connected components of the neighbor graph restricted to close sphere pairs,
    /// without singleton components.
    pub fn stage_one(&self, spheres: &AlphaSphereSet) -> Result<Vec<Vec<usize>>, EngineError> {
        let graph = spheres.neighbor_graph(self.thresholds.neighbor_criterion);

        let mut links = Vec::new();
        for (&i, neighbors) in &graph {
            for &j in neighbors.iter().filter(|&&j| j > i) {
                if spheres.center_distance(i, j)? <= self.thresholds.max_neighbor_dist {
                    links.push((i, j));
                }
            }
        }

        let singletons = (0..spheres.len()).map(|i| vec![i]).collect();
        let clusters: Vec<Vec<usize>> = merge_linked(singletons, links.iter().copied())
            .into_iter()
            .filter(|cluster| cluster.len() > 1)
            .collect();
        debug!(
            "Stage 1: {} close neighbor pairs formed {} clusters.",
            links.len(),
            clusters.len()
        );
        Ok(clusters)
    }

    /// Merges clusters whose centroids are within `max_cluster_dist`.
    pub fn stage_two(
        &self,
        spheres: &AlphaSphereSet,
        clusters: Vec<Vec<usize>>,
    ) -> Result<Vec<Vec<usize>>, EngineError> {
        let mut centroids = Vec::with_capacity(clusters.len());
        for cluster in &clusters {
            let centers = member_centers(spheres, cluster)?;
            centroids.push(centroid(&centers).ok_or_else(|| {
                EngineError::PhaseFailed {
                    phase: "centroid linkage",
                    reason: "empty cluster".to_string(),
                }
            })?);
        }

        let links = SpatialIndex::new(&centroids).pairs_within(self.thresholds.max_cluster_dist);
        let before = clusters.len();
        let merged = merge_linked(clusters, links);
        debug!("Stage 2: {} clusters merged into {}.", before, merged.len());
        Ok(merged)
    }

    /// Merges clusters connected by at least `min_contacts` close sphere pairs,
    /// evaluating larger clusters first.
    pub fn stage_three(
        &self,
        spheres: &AlphaSphereSet,
        mut clusters: Vec<Vec<usize>>,
    ) -> Result<Vec<Vec<usize>>, EngineError> {
        clusters.sort_by(|a, b| b.len().cmp(&a.len()));

        let min_contacts = self.thresholds.min_contacts;
        let max_pair_dist = self.thresholds.max_pair_dist;
        let centers = clusters
            .iter()
            .map(|cluster| member_centers(spheres, cluster))
            .collect::<Result<Vec<_>, IndexError>>()?;
        let candidates: Vec<usize> = (0..clusters.len())
            .filter(|&c| clusters[c].len() >= min_contacts)
            .collect();

        let (centers, candidates) = (&centers, &candidates);
        let links_from = |rank: usize, a: usize| -> Vec<(usize, usize)> {
            let later = &candidates[rank + 1..];
            if later.is_empty() {
                return Vec::new();
            }
            let index = SpatialIndex::new(&centers[a]);
            later
                .iter()
                .copied()
                .filter(|&b| {
                    let contacts: usize = centers[b]
                        .iter()
                        .map(|center| index.count_within(center, max_pair_dist))
                        .sum();
                    contacts >= min_contacts
                })
                .map(|b| (a, b))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let iterator = candidates.iter().enumerate();

        #[cfg(feature = "parallel")]
        let iterator = candidates.par_iter().enumerate();

        let links: Vec<(usize, usize)> = iterator
            .map(|(rank, &a)| links_from(rank, a))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        let before = clusters.len();
        let merged = merge_linked(clusters, links);
        debug!("Stage 3: {} clusters merged into {}.", before, merged.len());
        Ok(merged)
    }

    /// Drops clusters below `min_spheres_per_pocket` and sorts each survivor.
    pub fn finalize(&self, clusters: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
        clusters
            .into_iter()
            .filter(|cluster| cluster.len() >= self.thresholds.min_spheres_per_pocket)
            .map(|mut cluster| {
                cluster.sort_unstable();
                cluster
            })
            .collect()
    }
}

fn member_centers(
    spheres: &AlphaSphereSet,
    members: &[usize],
) -> Result<Vec<Point3<f64>>, IndexError> {
    members
        .iter()
        .map(|&i| spheres.sphere(i).map(|s| s.center))
        .collect()
}
