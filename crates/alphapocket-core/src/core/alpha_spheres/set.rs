use super::delaunay::{Tetrahedron, tetrahedralize};
use super::error::{GeometryError, IndexError};
use super::neighbors::{SharingCriterion, shared_contact_graph};
use crate::core::graph::UnionFind;
use crate::core::models::ids::SphereId;
use crate::core::models::sphere::AlphaSphere;
use crate::core::spatial::SpatialIndex;
use crate::core::utils::geometry::{bounding_box, centroid, spans_three_dimensions};
use nalgebra::Point3;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Relative tolerance for the coplanarity test of the input.
const FLATNESS_TOLERANCE: f64 = 1e-9;
/// Circumcenters closer than this (relative to the input extent) are one Voronoi vertex.
const COINCIDENT_CENTER_TOLERANCE: f64 = 1e-9;

/// The alpha spheres of a point cloud, with stable storage and a compacted view.
///
/// Spheres live in an arena that is never modified after construction. The public
/// view is an ordered list of active sphere ids; a sphere's *index* is its position
/// in that list. Removing spheres edits only the active list, so surviving spheres
/// are renumbered from zero in their original relative order while their
/// [`SphereId`]s stay resolvable through [`get`](Self::get).
#[derive(Debug, Clone)]
pub struct AlphaSphereSet {
    points: Vec<Point3<f64>>,
    store: SlotMap<SphereId, AlphaSphere>,
    active: Vec<SphereId>,
    positions: SecondaryMap<SphereId, usize>,
}

impl AlphaSphereSet {
    /// Computes one alpha sphere per finite vertex of the Voronoi diagram of `points`.
    ///
    /// Each sphere touches its contact points and has no input point in its
    /// interior. Cospherical configurations, where several Delaunay tetrahedra share a
    /// circumcenter, produce a single sphere whose contacts are the union of those
    /// tetrahedra's vertices. Spheres are ordered by their smallest contributing
    /// vertex tuple.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] for fewer than four points, non-finite coordinates,
    /// or a point set with no finite Voronoi vertex (coplanar, collinear or
    /// coincident points).
    pub fn build(points: &[Point3<f64>]) -> Result<Self, GeometryError> {
        if points.len() < 4 {
            return Err(GeometryError::TooFewPoints {
                found: points.len(),
            });
        }
        if let Some(index) = points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(GeometryError::NonFiniteCoordinate { index });
        }
        if !spans_three_dimensions(points, FLATNESS_TOLERANCE) {
            return Err(GeometryError::Degenerate(
                "all points are coplanar, collinear or coincident".to_string(),
            ));
        }

        let tetrahedra = tetrahedralize(points)?;
        let extent = bounding_box(points)
            .map(|(min, max)| (max - min).max())
            .unwrap_or(0.0);
        let spheres = merge_coincident(points, &tetrahedra, COINCIDENT_CENTER_TOLERANCE * extent);
        if spheres.is_empty() {
            return Err(GeometryError::Degenerate(
                "no finite Voronoi vertex could be computed".to_string(),
            ));
        }

        debug!(
            "Built {} alpha spheres from {} tetrahedra over {} points.",
            spheres.len(),
            tetrahedra.len(),
            points.len()
        );
        Ok(Self::from_spheres(points.to_vec(), spheres))
    }

    /// Wraps precomputed spheres over `points` without any geometric validation.
    pub fn from_spheres(points: Vec<Point3<f64>>, spheres: Vec<AlphaSphere>) -> Self {
        let mut store = SlotMap::with_capacity_and_key(spheres.len());
        let active: Vec<SphereId> = spheres.into_iter().map(|s| store.insert(s)).collect();
        let mut set = Self {
            points,
            store,
            active,
            positions: SecondaryMap::new(),
        };
        set.reindex();
        set
    }

    fn reindex(&mut self) {
        self.positions.clear();
        for (index, &id) in self.active.iter().enumerate() {
            self.positions.insert(id, index);
        }
    }

    fn check(&self, index: usize) -> Result<SphereId, IndexError> {
        self.active.get(index).copied().ok_or(IndexError {
            index,
            len: self.active.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// The input points the spheres were built from.
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    pub fn sphere(&self, index: usize) -> Result<&AlphaSphere, IndexError> {
        let id = self.check(index)?;
        Ok(&self.store[id])
    }

    pub fn id_of(&self, index: usize) -> Result<SphereId, IndexError> {
        self.check(index)
    }

    /// Current index of a sphere, or `None` once it has been removed.
    pub fn index_of(&self, id: SphereId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Resolves a sphere id, including spheres that have since been removed.
    pub fn get(&self, id: SphereId) -> Option<&AlphaSphere> {
        self.store.get(id)
    }

    /// Active spheres in index order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &AlphaSphere> + '_ {
        self.active.iter().map(|&id| &self.store[id])
    }

    pub fn centers(&self) -> Vec<Point3<f64>> {
        self.iter().map(|s| s.center).collect()
    }

    pub fn radii(&self) -> Vec<f64> {
        self.iter().map(|s| s.radius).collect()
    }

    pub fn center_distance(&self, i: usize, j: usize) -> Result<f64, IndexError> {
        Ok(self.sphere(i)?.distance_to(self.sphere(j)?))
    }

    /// Sorted, deduplicated union of the contact points of the given spheres.
    pub fn contact_union(&self, indices: &[usize]) -> Result<Vec<usize>, IndexError> {
        let mut union = BTreeSet::new();
        for &index in indices {
            union.extend(self.sphere(index)?.contact_points.iter().copied());
        }
        Ok(union.into_iter().collect())
    }

    /// Sphere indices sharing at least `criterion` contact points with each sphere.
    ///
    /// Spheres without neighbors are absent from the map. The relation is symmetric
    /// and a stricter criterion always yields a subset of a looser one.
    pub fn neighbor_graph(&self, criterion: SharingCriterion) -> BTreeMap<usize, Vec<usize>> {
        shared_contact_graph(self.iter(), criterion)
    }

    /// Removes the spheres at `indices` and renumbers the survivors.
    ///
    /// Duplicate indices are allowed. All indices are validated before anything is
    /// removed, so on error the set is unchanged. Returns the number of spheres
    /// removed.
    pub fn remove_by_indices(&mut self, indices: &[usize]) -> Result<usize, IndexError> {
        for &index in indices {
            self.check(index)?;
        }
        let doomed: HashSet<usize> = indices.iter().copied().collect();
        if doomed.is_empty() {
            return Ok(0);
        }

        let before = self.active.len();
        let mut position = 0;
        self.active.retain(|_| {
            let keep = !doomed.contains(&position);
            position += 1;
            keep
        });
        self.reindex();
        Ok(before - self.active.len())
    }

    /// Removes every sphere with `radius < min_radius`.
    pub fn remove_smaller_than(&mut self, min_radius: f64) -> usize {
        let doomed = self.indices_where(|s| s.radius < min_radius);
        self.remove_valid(&doomed)
    }

    /// Removes every sphere with `radius > max_radius`.
    pub fn remove_larger_than(&mut self, max_radius: f64) -> usize {
        let doomed = self.indices_where(|s| s.radius > max_radius);
        self.remove_valid(&doomed)
    }

    fn indices_where(&self, predicate: impl Fn(&AlphaSphere) -> bool) -> Vec<usize> {
        self.iter()
            .enumerate()
            .filter(|(_, s)| predicate(s))
            .map(|(i, _)| i)
            .collect()
    }

    fn remove_valid(&mut self, indices: &[usize]) -> usize {
        // Indices come from enumerating the active list and are always in range.
        self.remove_by_indices(indices).unwrap_or_default()
    }
}

/// Groups tetrahedra whose circumcenters coincide and turns each group into one sphere.
fn merge_coincident(
    points: &[Point3<f64>],
    tetrahedra: &[Tetrahedron],
    tolerance: f64,
) -> Vec<AlphaSphere> {
    let centers: Vec<Point3<f64>> = tetrahedra.iter().map(|t| t.circumcenter).collect();
    let index = SpatialIndex::new(&centers);

    let mut groups = UnionFind::new();
    for i in 0..tetrahedra.len() {
        groups.insert(i);
    }
    for (i, j) in index.pairs_within(tolerance) {
        groups.union(i, j);
    }

    groups
        .groups()
        .into_iter()
        .filter_map(|members| {
            let center = centroid(members.iter().map(|&m| &centers[m]))?;
            let contacts: Vec<usize> = members
                .iter()
                .flat_map(|&m| tetrahedra[m].vertices)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            let radius = contacts
                .iter()
                .map(|&c| (points[c] - center).norm())
                .sum::<f64>()
                / contacts.len() as f64;
            Some(AlphaSphere::new(center, radius, contacts))
        })
        .collect()
}
