use nalgebra::{Matrix3, Point3, Vector3};

/// Relative tolerance below which a tetrahedron is treated as flat.
const FLAT_TETRAHEDRON_TOLERANCE: f64 = 1e-12;

/// Signed volume predicate for four points.
///
/// Returns six times the signed volume of the tetrahedron `(a, b, c, d)`, computed as
/// `det[a - d; b - d; c - d]`. The value is positive when `d` lies below the plane
/// through `a`, `b` and `c` when those appear counterclockwise seen from above.
pub fn orient3d(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    let m = Matrix3::from_rows(&[
        (a - d).transpose(),
        (b - d).transpose(),
        (c - d).transpose(),
    ]);
    m.determinant()
}

/// In-sphere predicate for a positively oriented tetrahedron.
///
/// For `orient3d(a, b, c, d) > 0` the result is positive when `e` lies strictly inside
/// the circumsphere of `(a, b, c, d)`, negative when it lies outside and zero when the
/// five points are cospherical.
pub fn insphere(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
    e: &Point3<f64>,
) -> f64 {
    let [ae, be, ce, de] = [a - e, b - e, c - e, d - e];
    let det3 = |r0: &Vector3<f64>, r1: &Vector3<f64>, r2: &Vector3<f64>| {
        Matrix3::from_rows(&[r0.transpose(), r1.transpose(), r2.transpose()]).determinant()
    };

    // Cofactor expansion of the lifted 4x4 determinant along the lifting column.
    -ae.norm_squared() * det3(&be, &ce, &de) + be.norm_squared() * det3(&ae, &ce, &de)
        - ce.norm_squared() * det3(&ae, &be, &de)
        + de.norm_squared() * det3(&ae, &be, &ce)
}

/// Computes the center of the sphere passing through four points.
///
/// Returns `None` when the points are coplanar (within a tolerance relative to the edge
/// lengths), in which case no finite circumsphere exists.
pub fn circumcenter(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> Option<Point3<f64>> {
    let u = b - a;
    let v = c - a;
    let w = d - a;

    let v_cross_w = v.cross(&w);
    let denominator = 2.0 * u.dot(&v_cross_w);
    let scale = u.norm() * v.norm() * w.norm();
    if !denominator.is_finite() || denominator.abs() <= FLAT_TETRAHEDRON_TOLERANCE * scale {
        return None;
    }

    let numerator: Vector3<f64> = u.norm_squared() * v_cross_w
        + v.norm_squared() * w.cross(&u)
        + w.norm_squared() * u.cross(&v);

    Some(a + numerator / denominator)
}

/// Arithmetic mean of a set of points, or `None` for an empty set.
pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Option<Point3<f64>> {
    let (sum, count) = points
        .into_iter()
        .fold((Vector3::zeros(), 0usize), |(sum, count), p| {
            (sum + p.coords, count + 1)
        });
    if count == 0 {
        None
    } else {
        Some(Point3::from(sum / count as f64))
    }
}

/// Axis-aligned bounding box `(min, max)` of a set of points.
pub fn bounding_box(points: &[Point3<f64>]) -> Option<(Point3<f64>, Point3<f64>)> {
    let first = points.first()?;
    let (min, max) = points.iter().skip(1).fold((*first, *first), |(min, max), p| {
        (min.inf(p), max.sup(p))
    });
    Some((min, max))
}

/// Checks whether a point set is full-dimensional, i.e. not contained in a plane.
///
/// Greedily picks a far pair, the point farthest from their line and the point
/// farthest from the resulting plane; the set spans three dimensions when that last
/// distance exceeds `relative_tolerance` times the diameter estimate.
pub fn spans_three_dimensions(points: &[Point3<f64>], relative_tolerance: f64) -> bool {
    let Some(p0) = points.first() else {
        return false;
    };

    let farthest = |score: &dyn Fn(&Point3<f64>) -> f64| -> Option<(Point3<f64>, f64)> {
        points
            .iter()
            .map(|p| (*p, score(p)))
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
    };

    let Some((p1, diameter)) = farthest(&|p: &Point3<f64>| (p - p0).norm()) else {
        return false;
    };
    if diameter <= 0.0 {
        return false;
    }
    let tolerance = relative_tolerance * diameter;

    let axis = (p1 - p0) / diameter;
    let Some((p2, line_distance)) = farthest(&|p: &Point3<f64>| {
        let offset = p - p0;
        (offset - axis * offset.dot(&axis)).norm()
    }) else {
        return false;
    };
    if line_distance <= tolerance {
        return false;
    }

    let normal = (p1 - p0).cross(&(p2 - p0)).normalize();
    let Some((_, plane_distance)) = farthest(&|p: &Point3<f64>| (p - p0).dot(&normal).abs()) else {
        return false;
    };
    plane_distance > tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn unit_tetrahedron() -> [Point3<f64>; 4] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ]
    }

    #[test]
    fn orient3d_changes_sign_when_two_vertices_swap() {
        let [a, b, c, d] = unit_tetrahedron();
        let forward = orient3d(&a, &b, &c, &d);
        let swapped = orient3d(&b, &a, &c, &d);
        assert!(forward.abs() > EPS);
        assert!((forward + swapped).abs() < EPS);
        assert!((forward.abs() - 1.0).abs() < EPS);
    }

    #[test]
    fn orient3d_is_zero_for_coplanar_points() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let d = Point3::new(1.0, 1.0, 0.0);
        assert!(orient3d(&a, &b, &c, &d).abs() < EPS);
    }

    #[test]
    fn insphere_distinguishes_inside_and_outside_points() {
        let [mut a, mut b, c, d] = unit_tetrahedron();
        if orient3d(&a, &b, &c, &d) < 0.0 {
            std::mem::swap(&mut a, &mut b);
        }
        let center = circumcenter(&a, &b, &c, &d).unwrap();
        let far = Point3::new(5.0, 5.0, 5.0);

        assert!(insphere(&a, &b, &c, &d, &center) > 0.0);
        assert!(insphere(&a, &b, &c, &d, &far) < 0.0);
    }

    #[test]
    fn circumcenter_is_equidistant_from_all_vertices() {
        let [a, b, c, d] = unit_tetrahedron();
        let center = circumcenter(&a, &b, &c, &d).unwrap();

        assert!((center - Point3::new(0.5, 0.5, 0.5)).norm() < EPS);
        let r = (a - center).norm();
        for p in [b, c, d] {
            assert!(((p - center).norm() - r).abs() < EPS);
        }
    }

    #[test]
    fn circumcenter_returns_none_for_flat_tetrahedron() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(2.0, 0.0, 0.0);
        let c = Point3::new(0.0, 2.0, 0.0);
        let d = Point3::new(2.0, 2.0, 0.0);
        assert!(circumcenter(&a, &b, &c, &d).is_none());
    }

    #[test]
    fn centroid_averages_points_and_handles_empty_input() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, -6.0)];
        let c = centroid(&points).unwrap();
        assert!((c - Point3::new(1.0, 2.0, -3.0)).norm() < EPS);
        assert!(centroid(std::iter::empty()).is_none());
    }

    #[test]
    fn bounding_box_covers_all_points() {
        let points = [
            Point3::new(1.0, -2.0, 3.0),
            Point3::new(-1.0, 5.0, 0.0),
            Point3::new(0.5, 0.0, 7.0),
        ];
        let (min, max) = bounding_box(&points).unwrap();
        assert_eq!(min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 5.0, 7.0));
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn spans_three_dimensions_rejects_planar_and_collinear_sets() {
        let planar: Vec<_> = (0..10)
            .map(|i| Point3::new(i as f64, (i * i) as f64 * 0.1, 0.0))
            .collect();
        let collinear: Vec<_> = (0..10).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        let coincident = vec![Point3::new(1.0, 1.0, 1.0); 5];

        assert!(!spans_three_dimensions(&planar, 1e-9));
        assert!(!spans_three_dimensions(&collinear, 1e-9));
        assert!(!spans_three_dimensions(&coincident, 1e-9));
        assert!(spans_three_dimensions(&unit_tetrahedron(), 1e-9));
    }
}
