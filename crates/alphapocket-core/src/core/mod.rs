//! # Core Module
//!
//! The geometric foundation of alphapocket. Everything in this module is a pure
//! function of its inputs: no configuration, no progress reporting and no logging
//! beyond `debug!`-level diagnostics.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Alpha spheres and their stable identifiers
//! - **Alpha Spheres** ([`alpha_spheres`]) - Voronoi-derived sphere construction, radius
//!   filtering and neighbor graphs
//! - **Spatial Queries** ([`spatial`]) - k-d tree backed range queries over 3-D points
//! - **Graphs** ([`graph`]) - Union-find connected components
//! - **File I/O** ([`io`]) - Reading point clouds from delimited text
//! - **Utilities** ([`utils`]) - Geometric predicates and helpers

pub mod alpha_spheres;
pub mod graph;
pub mod io;
pub mod models;
pub mod spatial;
pub mod utils;
