use super::error::GeometryError;
use crate::core::utils::geometry::{bounding_box, circumcenter, insphere, orient3d};
use itertools::Itertools;
use nalgebra::{Point3, Vector3};
use slotmap::{SlotMap, new_key_type};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Half-width of the enclosing tetrahedron, as a multiple of the input extent.
const SUPER_TETRAHEDRON_SCALE: f64 = 1000.0;
/// Points closer than this (relative to the extent) to an existing vertex are skipped.
const DUPLICATE_TOLERANCE: f64 = 1e-12;

new_key_type! { struct CellKey; }

/// A positively oriented tetrahedron. `neighbors[i]` shares the face opposite
/// `vertices[i]`.
#[derive(Debug, Clone, Copy)]
struct Cell {
    vertices: [usize; 4],
    neighbors: [Option<CellKey>; 4],
}

/// A finite Delaunay tetrahedron of the input points together with its circumcenter.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Tetrahedron {
    /// Input point indices, ascending.
    pub vertices: [usize; 4],
    pub circumcenter: Point3<f64>,
}

struct Triangulation<'a> {
    input: &'a [Point3<f64>],
    super_vertices: [Point3<f64>; 4],
    cells: SlotMap<CellKey, Cell>,
    last: CellKey,
    duplicate_tolerance: f64,
}

impl<'a> Triangulation<'a> {
    fn new(input: &'a [Point3<f64>]) -> Result<Self, GeometryError> {
        let (min, max) = bounding_box(input)
            .ok_or_else(|| GeometryError::Triangulation("empty point set".to_string()))?;
        let center = Point3::from((min.coords + max.coords) / 2.0);
        let extent = (max - min).max().max(1.0);
        let m = extent * SUPER_TETRAHEDRON_SCALE;

        let mut super_vertices = [
            center + Vector3::new(m, m, m),
            center + Vector3::new(m, -m, -m),
            center + Vector3::new(-m, m, -m),
            center + Vector3::new(-m, -m, m),
        ];
        let n = input.len();
        if orient3d(
            &super_vertices[0],
            &super_vertices[1],
            &super_vertices[2],
            &super_vertices[3],
        ) < 0.0
        {
            super_vertices.swap(0, 1);
        }

        let mut cells = SlotMap::with_key();
        let last = cells.insert(Cell {
            vertices: [n, n + 1, n + 2, n + 3],
            neighbors: [None; 4],
        });

        Ok(Self {
            input,
            super_vertices,
            cells,
            last,
            duplicate_tolerance: DUPLICATE_TOLERANCE * extent,
        })
    }

    fn position(&self, vertex: usize) -> &Point3<f64> {
        match vertex.checked_sub(self.input.len()) {
            Some(s) => &self.super_vertices[s],
            None => &self.input[vertex],
        }
    }

    fn corners(&self, cell: &Cell) -> [Point3<f64>; 4] {
        cell.vertices.map(|v| *self.position(v))
    }

    /// Orientation of `cell` with vertex `i` replaced by `p`. Non-negative for every
    /// `i` iff `p` lies in the closed cell.
    fn orient_with(&self, cell: &Cell, i: usize, p: &Point3<f64>) -> f64 {
        let mut corners = self.corners(cell);
        corners[i] = *p;
        orient3d(&corners[0], &corners[1], &corners[2], &corners[3])
    }

    fn contains(&self, cell: &Cell, p: &Point3<f64>) -> bool {
        (0..4).all(|i| self.orient_with(cell, i, p) >= 0.0)
    }

    fn locate(&self, p: &Point3<f64>) -> Result<CellKey, GeometryError> {
        let max_steps = 10 * self.cells.len() + 10;
        let mut current = self.last;
        for _ in 0..max_steps {
            let cell = &self.cells[current];
            let next = (0..4).find_map(|i| {
                cell.neighbors[i].filter(|_| self.orient_with(cell, i, p) < 0.0)
            });
            match next {
                Some(key) => current = key,
                None => return Ok(current),
            }
        }

        debug!("Visibility walk did not terminate, falling back to a linear scan.");
        self.cells
            .iter()
            .find(|(_, cell)| self.contains(cell, p))
            .map(|(key, _)| key)
            .ok_or_else(|| {
                GeometryError::Triangulation("point lies outside every tetrahedron".to_string())
            })
    }

    fn in_circumsphere(&self, cell: &Cell, p: &Point3<f64>) -> bool {
        let [a, b, c, d] = self.corners(cell);
        insphere(&a, &b, &c, &d, p) > 0.0
    }

    /// Cells whose circumsphere contains `p`, grown until every boundary face is
    /// strictly visible from `p`.
    fn cavity(&self, seed: CellKey, p: &Point3<f64>) -> Result<Vec<CellKey>, GeometryError> {
        let mut members: HashSet<CellKey> = HashSet::from([seed]);
        let mut order = vec![seed];
        let mut stack = vec![seed];
        while let Some(key) = stack.pop() {
            for neighbor in self.cells[key].neighbors.into_iter().flatten() {
                if !members.contains(&neighbor) && self.in_circumsphere(&self.cells[neighbor], p)
                {
                    members.insert(neighbor);
                    order.push(neighbor);
                    stack.push(neighbor);
                }
            }
        }

        loop {
            let mut grow = None;
            'search: for &key in &order {
                let cell = &self.cells[key];
                for i in 0..4 {
                    let neighbor = cell.neighbors[i];
                    if neighbor.is_some_and(|n| members.contains(&n)) {
                        continue;
                    }
                    if self.orient_with(cell, i, p) <= 0.0 {
                        grow = Some(neighbor.ok_or_else(|| {
                            GeometryError::Triangulation(
                                "cavity reaches the enclosing tetrahedron".to_string(),
                            )
                        })?);
                        break 'search;
                    }
                }
            }
            match grow {
                Some(key) => {
                    members.insert(key);
                    order.push(key);
                }
                None => return Ok(order),
            }
        }
    }

    fn insert(&mut self, index: usize) -> Result<bool, GeometryError> {
        let p = self.input[index];
        let seed = self.locate(&p)?;
        let is_duplicate = self.cells[seed]
            .vertices
            .iter()
            .any(|&v| (self.position(v) - p).norm() <= self.duplicate_tolerance);
        if is_duplicate {
            return Ok(false);
        }

        let cavity = self.cavity(seed, &p)?;
        let members: HashSet<CellKey> = cavity.iter().copied().collect();
        let mut open_faces: HashMap<(usize, usize), (CellKey, usize)> = HashMap::new();
        let mut first_new = None;

        for &old in &cavity {
            let cell = self.cells[old];
            for i in 0..4 {
                let outer = cell.neighbors[i];
                if outer.is_some_and(|n| members.contains(&n)) {
                    continue;
                }

                let mut vertices = cell.vertices;
                vertices[i] = index;
                let mut neighbors = [None; 4];
                neighbors[i] = outer;
                let new = self.cells.insert(Cell {
                    vertices,
                    neighbors,
                });
                if first_new.is_none() {
                    first_new = Some(new);
                }

                if let Some(outer) = outer {
                    let slot = self.cells[outer]
                        .neighbors
                        .iter_mut()
                        .find(|n| **n == Some(old))
                        .ok_or_else(|| {
                            GeometryError::Triangulation("asymmetric adjacency".to_string())
                        })?;
                    *slot = Some(new);
                }

                // Faces through the new vertex are matched by their opposite edge.
                for j in (0..4).filter(|&j| j != i) {
                    let (a, b) = (0..4)
                        .filter(|&k| k != i && k != j)
                        .map(|k| vertices[k])
                        .collect_tuple()
                        .ok_or_else(|| {
                            GeometryError::Triangulation("malformed face".to_string())
                        })?;
                    let edge = (a.min(b), a.max(b));
                    match open_faces.remove(&edge) {
                        Some((other, other_slot)) => {
                            self.cells[new].neighbors[j] = Some(other);
                            self.cells[other].neighbors[other_slot] = Some(new);
                        }
                        None => {
                            open_faces.insert(edge, (new, j));
                        }
                    }
                }
            }
        }

        if !open_faces.is_empty() {
            return Err(GeometryError::Triangulation(format!(
                "{} unmatched faces after inserting point {index}",
                open_faces.len()
            )));
        }

        for old in cavity {
            self.cells.remove(old);
        }
        self.last = first_new.ok_or_else(|| {
            GeometryError::Triangulation(format!("empty cavity for point {index}"))
        })?;
        Ok(true)
    }

    fn finite_tetrahedra(&self) -> Vec<Tetrahedron> {
        let n = self.input.len();
        let mut tetrahedra: Vec<Tetrahedron> = self
            .cells
            .values()
            .filter(|cell| cell.vertices.iter().all(|&v| v < n))
            .filter_map(|cell| {
                let [a, b, c, d] = self.corners(cell);
                let center = circumcenter(&a, &b, &c, &d)?;
                let mut vertices = cell.vertices;
                vertices.sort_unstable();
                Some(Tetrahedron {
                    vertices,
                    circumcenter: center,
                })
            })
            .collect();
        tetrahedra.sort_by(|a, b| a.vertices.cmp(&b.vertices));
        tetrahedra
    }
}

/// Delaunay tetrahedralization of `points` by incremental Bowyer–Watson insertion.
///
/// Returns the finite, non-flat tetrahedra sorted by their vertex tuples. Points
/// coinciding with an already inserted point are skipped and never appear as a
/// vertex. Callers are expected to have rejected non-finite coordinates.
pub(crate) fn tetrahedralize(points: &[Point3<f64>]) -> Result<Vec<Tetrahedron>, GeometryError> {
    let mut triangulation = Triangulation::new(points)?;
    let mut skipped = 0usize;
    for index in 0..points.len() {
        if !triangulation.insert(index)? {
            skipped += 1;
        }
    }
    if skipped > 0 {
        debug!("Skipped {} duplicate points during tetrahedralization.", skipped);
    }

    let tetrahedra = triangulation.finite_tetrahedra();
    debug!(
        "Tetrahedralized {} points into {} finite cells.",
        points.len(),
        tetrahedra.len()
    );
    Ok(tetrahedra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_empty_circumspheres(points: &[Point3<f64>], tetrahedra: &[Tetrahedron]) {
        for tet in tetrahedra {
            let radius = (points[tet.vertices[0]] - tet.circumcenter).norm();
            for (q, point) in points.iter().enumerate() {
                if tet.vertices.contains(&q) {
                    continue;
                }
                assert!(
                    (point - tet.circumcenter).norm() >= radius - 1e-7,
                    "point {q} lies inside the circumsphere of {:?}",
                    tet.vertices
                );
            }
        }
    }

    fn random_cloud(seed: u64, n: usize) -> Vec<Point3<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                Point3::new(
                    rng.gen_range(0.0..10.0),
                    rng.gen_range(0.0..10.0),
                    rng.gen_range(0.0..10.0),
                )
            })
            .collect()
    }

    #[test]
    fn single_tetrahedron_yields_one_cell() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let tetrahedra = tetrahedralize(&points).unwrap();
        assert_eq!(tetrahedra.len(), 1);
        assert_eq!(tetrahedra[0].vertices, [0, 1, 2, 3]);
        assert!((tetrahedra[0].circumcenter - Point3::new(0.5, 0.5, 0.5)).norm() < 1e-9);
    }

    #[test]
    fn random_clouds_satisfy_the_empty_sphere_property() {
        for seed in 0..5 {
            let points = random_cloud(seed, 60);
            let tetrahedra = tetrahedralize(&points).unwrap();
            assert!(!tetrahedra.is_empty());
            assert_empty_circumspheres(&points, &tetrahedra);

            let used: HashSet<usize> = tetrahedra.iter().flat_map(|t| t.vertices).collect();
            assert_eq!(used.len(), points.len(), "every point is a vertex");
        }
    }

    #[test]
    fn output_is_sorted_by_vertex_tuple() {
        let tetrahedra = tetrahedralize(&random_cloud(11, 30)).unwrap();
        for tet in &tetrahedra {
            assert!(tet.vertices.windows(2).all(|w| w[0] < w[1]));
        }
        assert!(tetrahedra.windows(2).all(|w| w[0].vertices < w[1].vertices));
    }

    #[test]
    fn cube_corners_share_a_single_circumcenter() {
        let points: Vec<_> = (0..8)
            .map(|i| Point3::new((i & 1) as f64, ((i >> 1) & 1) as f64, ((i >> 2) & 1) as f64))
            .collect();
        let tetrahedra = tetrahedralize(&points).unwrap();

        assert!(!tetrahedra.is_empty());
        for tet in &tetrahedra {
            assert!((tet.circumcenter - Point3::new(0.5, 0.5, 0.5)).norm() < 1e-9);
        }
        let used: HashSet<usize> = tetrahedra.iter().flat_map(|t| t.vertices).collect();
        assert_eq!(used.len(), 8);
    }

    #[test]
    fn duplicate_points_are_skipped() {
        let mut points = random_cloud(3, 20);
        points.push(points[4]);
        let tetrahedra = tetrahedralize(&points).unwrap();

        assert!(tetrahedra.iter().all(|t| !t.vertices.contains(&20)));
        assert_empty_circumspheres(&points, &tetrahedra);
    }
}
