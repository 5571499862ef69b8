//! # Engine Module
//!
//! Turns an [`AlphaSphereSet`](crate::core::alpha_spheres::AlphaSphereSet) into pockets.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Radius window, clustering thresholds, method
//!   selection and the [`DetectionConfigBuilder`](config::DetectionConfigBuilder)
//! - **Clustering** ([`clustering`]) - The three-stage linkage pipeline and
//!   hierarchical clustering of sphere centers
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - [`EngineError`](error::EngineError), wrapping
//!   geometry, index and configuration failures

pub mod clustering;
pub mod config;
pub mod error;
pub mod progress;
