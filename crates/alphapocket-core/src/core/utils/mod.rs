//! Geometric helpers shared by the alpha-sphere construction and the clustering engine.

pub mod geometry;
