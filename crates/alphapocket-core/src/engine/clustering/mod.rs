//! Clustering of alpha spheres into pockets.
//!
//! Both strategies return clusters as lists of sphere indices into the
//! [`AlphaSphereSet`](crate::core::alpha_spheres::AlphaSphereSet) they were given.

pub mod hierarchical;
pub mod pipeline;

use crate::core::graph::UnionFind;

/// Merges clusters connected by `links`, where links refer to positions in `clusters`.
///
/// Each connected group of clusters becomes one cluster placed at the position of its
/// first member, with members concatenated in cluster order. Clusters without any
/// link pass through unchanged.
pub(crate) fn merge_linked(
    clusters: Vec<Vec<usize>>,
    links: impl IntoIterator<Item = (usize, usize)>,
) -> Vec<Vec<usize>> {
    let mut components = UnionFind::new();
    for position in 0..clusters.len() {
        components.insert(position);
    }
    for (a, b) in links {
        components.union(a, b);
    }

    let mut slots: Vec<Option<Vec<usize>>> = clusters.into_iter().map(Some).collect();
    components
        .groups()
        .into_iter()
        .map(|group| {
            group
                .into_iter()
                .filter_map(|position| slots.get_mut(position).and_then(Option::take))
                .flatten()
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_linked_keeps_unlinked_clusters_in_place() {
        let clusters = vec![vec![0, 1], vec![2], vec![3, 4], vec![5]];
        let merged = merge_linked(clusters, [(3, 1)]);
        assert_eq!(merged, vec![vec![0, 1], vec![2, 5], vec![3, 4]]);
    }

    #[test]
    fn merge_linked_follows_transitive_links() {
        let clusters = vec![vec![7], vec![8], vec![9]];
        let merged = merge_linked(clusters, [(2, 1), (1, 0)]);
        assert_eq!(merged, vec![vec![7, 8, 9]]);
    }

    #[test]
    fn merge_linked_without_links_is_identity() {
        let clusters = vec![vec![1, 2], vec![0]];
        assert_eq!(merge_linked(clusters.clone(), std::iter::empty()), clusters);
    }
}
