use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileRadiusConfig {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileThreeStageConfig {
    pub max_neighbor_dist: Option<f64>,
    pub max_cluster_dist: Option<f64>,
    pub max_pair_dist: Option<f64>,
    pub min_contacts: Option<usize>,
    pub neighbor_criterion: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileHierarchicalConfig {
    pub cut_distance: Option<f64>,
    pub linkage: Option<String>,
    pub metric: Option<String>,
}

/// The on-disk configuration. Every field is optional; unset values fall back to
/// command-line overrides and then to the library defaults.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub method: Option<String>,
    pub min_spheres_per_pocket: Option<usize>,
    pub radius: Option<FileRadiusConfig>,
    pub three_stage: Option<FileThreeStageConfig>,
    pub hierarchical: Option<FileHierarchicalConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn full_file_deserializes_into_sections() {
        let config = FileConfig::from_toml(
            r#"
            method = "three-stage"
            min-spheres-per-pocket = 20

            [radius]
            min = 3.2
            max = 6.4

            [three-stage]
            max-neighbor-dist = 1.8
            min-contacts = 3
            neighbor-criterion = "face"

            [hierarchical]
            linkage = "a"
            "#,
        )
        .unwrap();

        assert_eq!(config.method.as_deref(), Some("three-stage"));
        assert_eq!(config.min_spheres_per_pocket, Some(20));
        assert_eq!(
            config.radius,
            Some(FileRadiusConfig {
                min: Some(3.2),
                max: Some(6.4)
            })
        );
        let three_stage = config.three_stage.unwrap();
        assert_eq!(three_stage.max_neighbor_dist, Some(1.8));
        assert_eq!(three_stage.max_cluster_dist, None);
        assert_eq!(three_stage.min_contacts, Some(3));
        assert_eq!(three_stage.neighbor_criterion.as_deref(), Some("face"));
        assert_eq!(config.hierarchical.unwrap().linkage.as_deref(), Some("a"));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(FileConfig::from_toml("").unwrap(), FileConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::from_toml("[radius]\nminimum = 3.0\n").is_err());
        assert!(FileConfig::from_toml("s-factor = 1.1\n").is_err());
    }

    #[test]
    fn parse_failures_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "method = [").unwrap();

        let err = FileConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
