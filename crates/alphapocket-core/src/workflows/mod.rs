//! # Workflows Module
//!
//! End-to-end entry points that take a point cloud and a
//! [`DetectionConfig`](crate::engine::config::DetectionConfig) and return pockets.
//!
//! - **Detection Workflow** ([`detect`]) - Alpha sphere construction, radius
//!   filtering and clustering for one point cloud, or for many frames at once.

pub mod detect;
