use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::Point3;
use std::collections::HashMap;

/// Relative slack added to the squared query radius before exact re-filtering, so
/// that boundary points are never lost to the tree's own comparison.
const QUERY_SLACK: f64 = 1e-9;

/// Range and nearest-neighbor queries over a fixed set of 3-D points.
///
/// Items are identified by their position in the slice the index was built from.
/// Range queries are inclusive: a point at exactly `radius` from the query is
/// reported.
///
/// Bit-identical positions share one tree entry, and the tree is built in one
/// balanced pass, so lattice input with many ties on an axis is handled.
pub struct SpatialIndex {
    tree: Option<ImmutableKdTree<f64, 3>>,
    positions: Vec<[f64; 3]>,
    /// Unique tree entry -> items at that position, ascending.
    members: Vec<Vec<usize>>,
}

impl SpatialIndex {
    pub fn new(points: &[Point3<f64>]) -> Self {
        Self::from_points(points.iter())
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let positions: Vec<[f64; 3]> = points.into_iter().map(|p| [p.x, p.y, p.z]).collect();

        let mut slot_of: HashMap<[u64; 3], usize> = HashMap::with_capacity(positions.len());
        let mut unique: Vec<[f64; 3]> = Vec::new();
        let mut members: Vec<Vec<usize>> = Vec::new();
        for (item, position) in positions.iter().enumerate() {
            // -0.0 and 0.0 compare equal, so normalize before hashing the bits.
            let key = (*position).map(|c| (c + 0.0).to_bits());
            let slot = *slot_of.entry(key).or_insert_with(|| {
                unique.push(*position);
                members.push(Vec::new());
                unique.len() - 1
            });
            members[slot].push(item);
        }

        let tree = (!unique.is_empty()).then(|| ImmutableKdTree::new_from_slice(&unique));
        Self {
            tree,
            positions,
            members,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Indices of all points within `radius` of `query`, in ascending order.
    pub fn within(&self, query: &Point3<f64>, radius: f64) -> Vec<usize> {
        let mut items = self.candidates(query, radius);
        items.sort_unstable();
        items
    }

    /// Number of points within `radius` of `query`.
    pub fn count_within(&self, query: &Point3<f64>, radius: f64) -> usize {
        self.candidates(query, radius).len()
    }

    /// The closest indexed point to `query` and its distance.
    pub fn nearest(&self, query: &Point3<f64>) -> Option<(usize, f64)> {
        let tree = self.tree.as_ref()?;
        let nearest = tree.nearest_one::<SquaredEuclidean>(&[query.x, query.y, query.z]);
        let item = *self.members[nearest.item as usize].first()?;
        Some((item, nearest.distance.sqrt()))
    }

    /// All unordered pairs `(i, j)`, `i < j`, of indexed points at most `radius` apart,
    /// sorted lexicographically.
    pub fn pairs_within(&self, radius: f64) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, position) in self.positions.iter().enumerate() {
            let query = Point3::new(position[0], position[1], position[2]);
            pairs.extend(
                self.within(&query, radius)
                    .into_iter()
                    .filter(|&j| j > i)
                    .map(|j| (i, j)),
            );
        }
        pairs
    }

    fn candidates(&self, query: &Point3<f64>, radius: f64) -> Vec<usize> {
        let Some(tree) = self.tree.as_ref() else {
            return Vec::new();
        };
        if radius < 0.0 {
            return Vec::new();
        }
        let q = [query.x, query.y, query.z];
        let radius_sq = radius * radius;
        let padded = radius_sq * (1.0 + QUERY_SLACK) + f64::EPSILON;

        tree.within_unsorted::<SquaredEuclidean>(&q, padded)
            .into_iter()
            .map(|neighbour| &self.members[neighbour.item as usize])
            .filter(|slot| squared_distance(&self.positions[slot[0]], &q) <= radius_sq)
            .flatten()
            .copied()
            .collect()
    }
}

fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
