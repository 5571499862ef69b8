use crate::core::graph::UnionFind;
use crate::engine::config::{DistanceMetric, HierarchicalConfig, LinkageMethod};
use nalgebra::Point3;
use tracing::{debug, instrument, warn};

/// A single agglomeration step: clusters rooted at leaves `a` and `b` joined at `height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub a: usize,
    pub b: usize,
    pub height: f64,
}

/// Pairwise distances over `n` items stored as the strict upper triangle.
struct CondensedMatrix {
    n: usize,
    values: Vec<f64>,
}

impl CondensedMatrix {
    fn from_points(
        points: &[Point3<f64>],
        distance: impl Fn(&Point3<f64>, &Point3<f64>) -> f64,
    ) -> Self {
        let n = points.len();
        let mut values = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in i + 1..n {
                values.push(distance(&points[i], &points[j]));
            }
        }
        Self { n, values }
    }

    fn slot(&self, i: usize, j: usize) -> usize {
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        i * self.n - i * (i + 1) / 2 + (j - i - 1)
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.values[self.slot(i, j)]
    }

    fn set(&mut self, i: usize, j: usize, value: f64) {
        let slot = self.slot(i, j);
        self.values[slot] = value;
    }
}

/// Agglomerative clustering with Lance–Williams distance updates.
///
/// Returns the `n - 1` merges in the order they were performed. Each merge names a
/// leaf of either joined cluster. Nearest-neighbor candidates are cached per cluster
/// and only recomputed when a merge invalidates them.
pub fn linkage(
    points: &[Point3<f64>],
    method: LinkageMethod,
    metric: DistanceMetric,
) -> Vec<Merge> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }

    // Centroid updates are exact only on squared Euclidean distances.
    let squared = method == LinkageMethod::Centroid;
    let mut dist = CondensedMatrix::from_points(points, |p, q| match (squared, metric) {
        (true, _) => (p - q).norm_squared(),
        (false, DistanceMetric::Euclidean) => (p - q).norm(),
        (false, DistanceMetric::Cityblock) => (p - q).abs().sum(),
    });

    let mut size = vec![1usize; n];
    let mut active = vec![true; n];
    let find_nearest = |dist: &CondensedMatrix, active: &[bool], i: usize| -> (usize, f64) {
        (i + 1..n)
            .filter(|&j| active[j])
            .fold((usize::MAX, f64::INFINITY), |best, j| {
                let d = dist.get(i, j);
                if d < best.1 { (j, d) } else { best }
            })
    };
    let mut nearest: Vec<(usize, f64)> =
        (0..n).map(|i| find_nearest(&dist, &active, i)).collect();

    let mut merges = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let Some(a) = (0..n)
            .filter(|&i| active[i] && nearest[i].0 != usize::MAX)
            .min_by(|&x, &y| nearest[x].1.total_cmp(&nearest[y].1))
        else {
            break;
        };
        let (b, d_ab) = nearest[a];

        let (size_a, size_b) = (size[a] as f64, size[b] as f64);
        let merged_size = size_a + size_b;
        for k in (0..n).filter(|&k| active[k] && k != a && k != b) {
            let (d_ak, d_bk) = (dist.get(a, k), dist.get(b, k));
            let updated = match method {
                LinkageMethod::Single => d_ak.min(d_bk),
                LinkageMethod::Complete => d_ak.max(d_bk),
                LinkageMethod::Average => (size_a * d_ak + size_b * d_bk) / merged_size,
                LinkageMethod::Centroid => {
                    (size_a * d_ak + size_b * d_bk) / merged_size
                        - size_a * size_b * d_ab / (merged_size * merged_size)
                }
            };
            dist.set(a, k, updated);
        }

        active[b] = false;
        size[a] += size[b];
        merges.push(Merge {
            a,
            b,
            height: if squared { d_ab.max(0.0).sqrt() } else { d_ab },
        });

        for k in 0..n {
            if !active[k] || k == a {
                continue;
            }
            if k < a && dist.get(k, a) < nearest[k].1 {
                nearest[k] = (a, dist.get(k, a));
            } else if nearest[k].0 == a || nearest[k].0 == b {
                nearest[k] = find_nearest(&dist, &active, k);
            }
        }
        nearest[a] = find_nearest(&dist, &active, a);
        nearest[b] = (usize::MAX, f64::INFINITY);
    }
    merges
}

/// Flat clusters from a merge sequence: a merge is applied iff no merge in its
/// subtree, itself included, is higher than `cut_distance`.
///
/// Clusters list their members ascending and are ordered by smallest member.
pub fn cut(n: usize, merges: &[Merge], cut_distance: f64) -> Vec<Vec<usize>> {
    let mut components = UnionFind::new();
    for leaf in 0..n {
        components.insert(leaf);
    }

    // Subtree maximum height, tracked on the surviving slot of each cluster.
    let mut subtree_height = vec![0.0_f64; n];
    for merge in merges {
        let height = merge
            .height
            .max(subtree_height[merge.a])
            .max(subtree_height[merge.b]);
        subtree_height[merge.a] = height;
        if height <= cut_distance {
            components.union(merge.a, merge.b);
        }
    }

    let mut clusters = components.groups();
    for cluster in &mut clusters {
        cluster.sort_unstable();
    }
    clusters.sort_by_key(|cluster| cluster[0]);
    clusters
}

/// Clusters sphere centers hierarchically and keeps clusters of sufficient size.
#[instrument(skip_all, name = "hierarchical_clustering", fields(spheres = centers.len()))]
pub fn cluster(centers: &[Point3<f64>], config: &HierarchicalConfig) -> Vec<Vec<usize>> {
    let metric = if config.linkage == LinkageMethod::Centroid
        && config.metric != DistanceMetric::Euclidean
    {
        warn!(
            "Centroid linkage requires the euclidean metric; ignoring '{}'.",
            config.metric
        );
        DistanceMetric::Euclidean
    } else {
        config.metric
    };

    let merges = linkage(centers, config.linkage, metric);
    let clusters: Vec<Vec<usize>> = cut(centers.len(), &merges, config.cut_distance)
        .into_iter()
        .filter(|cluster| cluster.len() >= config.min_spheres_per_pocket)
        .collect();
    debug!(
        "Cut {} merges at {:.3} into {} clusters ({} linkage, {} metric).",
        merges.len(),
        config.cut_distance,
        clusters.len(),
        config.linkage,
        metric
    );
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(xs: &[f64]) -> Vec<Point3<f64>> {
        xs.iter().map(|&x| Point3::new(x, 0.0, 0.0)).collect()
    }

    fn config(cut_distance: f64, linkage: LinkageMethod) -> HierarchicalConfig {
        HierarchicalConfig {
            cut_distance,
            linkage,
            metric: DistanceMetric::Euclidean,
            min_spheres_per_pocket: 1,
        }
    }

    #[test]
    fn linkage_produces_n_minus_one_merges() {
        let points = line(&[0.0, 1.0, 3.0, 7.0]);
        let merges = linkage(&points, LinkageMethod::Single, DistanceMetric::Euclidean);
        let heights: Vec<f64> = merges.iter().map(|m| m.height).collect();
        assert_eq!(heights, vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn linkage_methods_differ_on_a_chain() {
        let points = line(&[0.0, 1.0, 2.0, 3.0, 4.0]);

        assert_eq!(
            cluster(&points, &config(1.5, LinkageMethod::Single)),
            vec![vec![0, 1, 2, 3, 4]]
        );
        assert_eq!(
            cluster(&points, &config(1.5, LinkageMethod::Complete)),
            vec![vec![0, 1], vec![2, 3], vec![4]]
        );
        assert_eq!(
            cluster(&points, &config(1.5, LinkageMethod::Average)),
            vec![vec![0, 1], vec![2, 3, 4]]
        );
        assert_eq!(
            cluster(&points, &config(1.5, LinkageMethod::Centroid)),
            vec![vec![0, 1], vec![2, 3, 4]]
        );
    }

    #[test]
    fn centroid_heights_are_euclidean() {
        let points = line(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let merges = linkage(&points, LinkageMethod::Centroid, DistanceMetric::Euclidean);
        let last = merges.last().unwrap();
        assert!((last.height - 2.5).abs() < 1e-9);
    }

    #[test]
    fn cityblock_metric_separates_diagonal_neighbors() {
        let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)];
        let mut cfg = config(1.5, LinkageMethod::Single);
        assert_eq!(cluster(&points, &cfg), vec![vec![0, 1]]);

        cfg.metric = DistanceMetric::Cityblock;
        assert_eq!(cluster(&points, &cfg), vec![vec![0], vec![1]]);

        cfg.linkage = LinkageMethod::Centroid;
        assert_eq!(cluster(&points, &cfg), vec![vec![0, 1]]);
    }

    #[test]
    fn separated_groups_are_found_and_filtered_by_size() {
        let mut points = line(&[0.0, 1.0, 2.0]);
        points.extend(line(&[20.0, 21.0]));
        points.push(Point3::new(1.0, 0.5, 0.0));

        let mut cfg = config(2.4, LinkageMethod::Single);
        assert_eq!(
            cluster(&points, &cfg),
            vec![vec![0, 1, 2, 5], vec![3, 4]]
        );

        cfg.min_spheres_per_pocket = 3;
        assert_eq!(cluster(&points, &cfg), vec![vec![0, 1, 2, 5]]);
    }

    #[test]
    fn trivial_inputs() {
        let cfg = config(2.4, LinkageMethod::Single);
        assert!(cluster(&[], &cfg).is_empty());
        assert_eq!(cluster(&[Point3::origin()], &cfg), vec![vec![0]]);

        let strict = HierarchicalConfig {
            min_spheres_per_pocket: 2,
            ..cfg
        };
        assert!(cluster(&[Point3::origin()], &strict).is_empty());
    }

    #[test]
    fn cut_ignores_merges_above_an_inverted_subtree() {
        let merges = [
            Merge {
                a: 0,
                b: 1,
                height: 3.0,
            },
            Merge {
                a: 0,
                b: 2,
                height: 1.0,
            },
        ];
        assert_eq!(cut(3, &merges, 2.0), vec![vec![0], vec![1], vec![2]]);
        assert_eq!(cut(3, &merges, 3.0), vec![vec![0, 1, 2]]);
    }
}
