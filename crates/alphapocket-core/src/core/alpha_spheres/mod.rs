//! Alpha spheres: empty spheres centered at the finite Voronoi vertices of a point
//! cloud, computed through a Delaunay tetrahedralization.
//!
//! [`AlphaSphereSet`] owns the spheres of one point cloud and supports radius
//! filtering, contact queries and shared-contact neighbor graphs.

mod delaunay;
pub mod error;
pub mod neighbors;
pub mod set;

pub use error::{GeometryError, IndexError};
pub use neighbors::{ParseSharingCriterionError, SharingCriterion};
pub use set::AlphaSphereSet;
