use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("At least 4 points are required to build alpha spheres, found {found}")]
    TooFewPoints { found: usize },

    #[error("Point {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },

    #[error("Degenerate point set: {0}")]
    Degenerate(String),

    #[error("Tetrahedralization failed: {0}")]
    Triangulation(String),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Sphere index {index} is out of range for {len} active spheres")]
pub struct IndexError {
    pub index: usize,
    pub len: usize,
}
