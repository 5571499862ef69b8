//! # alphapocket Core Library
//!
//! Geometric detection of pockets (concave regions) on the surface of a point cloud,
//! typically the heavy-atom centers of a molecular structure, following the
//! alpha-sphere approach popularized by fpocket.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three-layer split used throughout the project:
//!
//! - **[`core`]: The Foundation.** Stateless data models and geometry: the alpha-sphere
//!   decomposition (`AlphaSphereSet`), the Delaunay tetrahedralization it is built from,
//!   spatial range queries, the disjoint-set structure and point cloud I/O.
//!
//! - **[`engine`]: The Logic Core.** Configuration, error types, progress reporting and the
//!   clustering algorithms that turn alpha spheres into pockets (the three-stage
//!   fpocket pipeline and hierarchical agglomerative clustering).
//!
//! - **[`workflows`]: The Public API.** End-to-end detection: point cloud in, pockets with
//!   their contact atoms out, for a single structure or a batch of frames.

pub mod core;
pub mod engine;
pub mod workflows;
