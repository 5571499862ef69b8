use nalgebra::Point3;

/// A maximal empty sphere centered at a finite Voronoi vertex of a point set.
///
/// The sphere touches every point listed in `contact_points` and contains no input
/// point in its interior.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaSphere {
    /// Center of the sphere (a Voronoi vertex of the input points).
    pub center: Point3<f64>,
    /// Distance from the center to the contact points.
    pub radius: f64,
    /// Sorted indices of the input points lying on the sphere surface.
    pub contact_points: Vec<usize>,
}

impl AlphaSphere {
    pub fn new(center: Point3<f64>, radius: f64, mut contact_points: Vec<usize>) -> Self {
        contact_points.sort_unstable();
        contact_points.dedup();
        Self {
            center,
            radius,
            contact_points,
        }
    }

    /// Number of contact points shared with another sphere.
    ///
    /// Both contact lists are sorted, so this is a linear merge.
    pub fn shared_contacts(&self, other: &AlphaSphere) -> usize {
        let (mut i, mut j, mut shared) = (0, 0, 0);
        let (a, b) = (&self.contact_points, &other.contact_points);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    shared += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        shared
    }

    pub fn distance_to(&self, other: &AlphaSphere) -> f64 {
        (self.center - other.center).norm()
    }
}
