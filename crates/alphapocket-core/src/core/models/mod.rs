//! # Core Models Module
//!
//! Data structures describing the alpha-sphere decomposition of a point cloud.
//!
//! - [`sphere`] - A single alpha sphere: center, radius and contact points
//! - [`ids`] - Stable identifiers for spheres held in an arena-style store
//!
//! Input points themselves are plain `nalgebra::Point3<f64>` values owned by the
//! caller and referenced by their position in the input slice.

pub mod ids;
pub mod sphere;
