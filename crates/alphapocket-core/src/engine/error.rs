use thiserror::Error;

use super::config::ConfigError;
use crate::core::alpha_spheres::{GeometryError, IndexError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Alpha sphere construction failed: {source}")]
    Geometry {
        #[from]
        source: GeometryError,
    },

    #[error("Invalid sphere index: {source}")]
    Index {
        #[from]
        source: IndexError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Clustering phase '{phase}' failed: {reason}")]
    PhaseFailed { phase: &'static str, reason: String },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
