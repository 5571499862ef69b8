use crate::core::alpha_spheres::SharingCriterion;
use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("Unknown {kind} '{code}'")]
    UnknownCode { kind: &'static str, code: String },
}

fn require_distance(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            name,
            reason: format!("expected a finite, non-negative distance, got {value}"),
        })
    }
}

fn require_count(name: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value >= 1 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            name,
            reason: "must be at least 1".to_string(),
        })
    }
}

/// How the distance between two clusters is derived when they are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkageMethod {
    Single,
    Complete,
    Average,
    Centroid,
}

static LINKAGE_CODES: Map<&'static str, LinkageMethod> = phf_map! {
    "s" => LinkageMethod::Single, "single" => LinkageMethod::Single,
    "m" => LinkageMethod::Complete, "complete" => LinkageMethod::Complete,
    "a" => LinkageMethod::Average, "average" => LinkageMethod::Average,
    "c" => LinkageMethod::Centroid, "centroid" => LinkageMethod::Centroid,
};

impl FromStr for LinkageMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LINKAGE_CODES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| ConfigError::UnknownCode {
                kind: "linkage method",
                code: s.to_string(),
            })
    }
}

impl fmt::Display for LinkageMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Single => "single",
            Self::Complete => "complete",
            Self::Average => "average",
            Self::Centroid => "centroid",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceMetric {
    Euclidean,
    Cityblock,
}

static METRIC_CODES: Map<&'static str, DistanceMetric> = phf_map! {
    "e" => DistanceMetric::Euclidean, "euclidean" => DistanceMetric::Euclidean,
    "b" => DistanceMetric::Cityblock, "cityblock" => DistanceMetric::Cityblock,
    "manhattan" => DistanceMetric::Cityblock,
};

impl FromStr for DistanceMetric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        METRIC_CODES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| ConfigError::UnknownCode {
                kind: "distance metric",
                code: s.to_string(),
            })
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Euclidean => "euclidean",
            Self::Cityblock => "cityblock",
        })
    }
}

/// Which clustering strategy turns alpha spheres into pockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DetectionMethod {
    /// Stop after radius filtering; no pockets are produced.
    AlphaSpheresOnly,
    /// Neighbor, centroid and contact-pair linkage.
    #[default]
    ThreeStage,
    /// Agglomerative clustering of sphere centers cut at a fixed height.
    Hierarchical,
}

static METHOD_NAMES: Map<&'static str, DetectionMethod> = phf_map! {
    "alpha-spheres" => DetectionMethod::AlphaSpheresOnly,
    "three-stage" => DetectionMethod::ThreeStage,
    "hierarchical" => DetectionMethod::Hierarchical,
};

impl FromStr for DetectionMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        METHOD_NAMES
            .get(s.trim().to_ascii_lowercase().replace('_', "-").as_str())
            .copied()
            .ok_or_else(|| ConfigError::UnknownCode {
                kind: "detection method",
                code: s.to_string(),
            })
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AlphaSpheresOnly => "alpha-spheres",
            Self::ThreeStage => "three-stage",
            Self::Hierarchical => "hierarchical",
        })
    }
}

/// Inclusive admission window for alpha-sphere radii.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusWindow {
    pub min_radius: f64,
    pub max_radius: f64,
}

impl RadiusWindow {
    pub fn new(min_radius: f64, max_radius: f64) -> Result<Self, ConfigError> {
        let min_radius = require_distance("min_radius", min_radius)?;
        let max_radius = require_distance("max_radius", max_radius)?;
        if min_radius > max_radius {
            return Err(ConfigError::InvalidValue {
                name: "min_radius",
                reason: format!("{min_radius} exceeds max_radius {max_radius}"),
            });
        }
        Ok(Self {
            min_radius,
            max_radius,
        })
    }

    pub fn contains(&self, radius: f64) -> bool {
        (self.min_radius..=self.max_radius).contains(&radius)
    }
}

/// Thresholds of the three-stage pocket clustering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusteringThresholds {
    pub max_neighbor_dist: f64,
    pub max_cluster_dist: f64,
    pub max_pair_dist: f64,
    pub min_contacts: usize,
    pub min_spheres_per_pocket: usize,
    pub neighbor_criterion: SharingCriterion,
}

impl Default for ClusteringThresholds {
    fn default() -> Self {
        Self {
            max_neighbor_dist: 1.73,
            max_cluster_dist: 4.5,
            max_pair_dist: 2.5,
            min_contacts: 2,
            min_spheres_per_pocket: 36,
            neighbor_criterion: SharingCriterion::Edge,
        }
    }
}

impl ClusteringThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_distance("max_neighbor_dist", self.max_neighbor_dist)?;
        require_distance("max_cluster_dist", self.max_cluster_dist)?;
        require_distance("max_pair_dist", self.max_pair_dist)?;
        require_count("min_contacts", self.min_contacts)?;
        require_count("min_spheres_per_pocket", self.min_spheres_per_pocket)?;
        Ok(())
    }
}

/// Parameters of hierarchical sphere clustering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HierarchicalConfig {
    pub cut_distance: f64,
    pub linkage: LinkageMethod,
    pub metric: DistanceMetric,
    pub min_spheres_per_pocket: usize,
}

impl Default for HierarchicalConfig {
    fn default() -> Self {
        Self {
            cut_distance: 2.4,
            linkage: LinkageMethod::Single,
            metric: DistanceMetric::Euclidean,
            min_spheres_per_pocket: 15,
        }
    }
}

impl HierarchicalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_distance("cut_distance", self.cut_distance)?;
        require_count("min_spheres_per_pocket", self.min_spheres_per_pocket)?;
        Ok(())
    }
}

/// Full configuration of one pocket detection run.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    pub method: DetectionMethod,
    pub radius_window: RadiusWindow,
    pub clustering: ClusteringThresholds,
    pub hierarchical: HierarchicalConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            method: DetectionMethod::ThreeStage,
            radius_window: RadiusWindow {
                min_radius: 3.0,
                max_radius: 6.0,
            },
            clustering: ClusteringThresholds::default(),
            hierarchical: HierarchicalConfig::default(),
        }
    }
}

/// Builder for [`DetectionConfig`].
///
/// Unset values fall back to per-method defaults: the radius window defaults to
/// 3.0–6.0 for the three-stage method and 3.4–6.2 for hierarchical clustering.
#[derive(Default)]
pub struct DetectionConfigBuilder {
    method: Option<DetectionMethod>,
    min_radius: Option<f64>,
    max_radius: Option<f64>,
    max_neighbor_dist: Option<f64>,
    max_cluster_dist: Option<f64>,
    max_pair_dist: Option<f64>,
    min_contacts: Option<usize>,
    min_spheres_per_pocket: Option<usize>,
    neighbor_criterion: Option<SharingCriterion>,
    cut_distance: Option<f64>,
    linkage: Option<LinkageMethod>,
    metric: Option<DistanceMetric>,
}

impl DetectionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: DetectionMethod) -> Self {
        self.method = Some(method);
        self
    }
    pub fn min_radius(mut self, radius: f64) -> Self {
        self.min_radius = Some(radius);
        self
    }
    pub fn max_radius(mut self, radius: f64) -> Self {
        self.max_radius = Some(radius);
        self
    }
    pub fn max_neighbor_dist(mut self, dist: f64) -> Self {
        self.max_neighbor_dist = Some(dist);
        self
    }
    pub fn max_cluster_dist(mut self, dist: f64) -> Self {
        self.max_cluster_dist = Some(dist);
        self
    }
    pub fn max_pair_dist(mut self, dist: f64) -> Self {
        self.max_pair_dist = Some(dist);
        self
    }
    pub fn min_contacts(mut self, n: usize) -> Self {
        self.min_contacts = Some(n);
        self
    }
    pub fn min_spheres_per_pocket(mut self, n: usize) -> Self {
        self.min_spheres_per_pocket = Some(n);
        self
    }
    pub fn neighbor_criterion(mut self, criterion: SharingCriterion) -> Self {
        self.neighbor_criterion = Some(criterion);
        self
    }
    pub fn cut_distance(mut self, dist: f64) -> Self {
        self.cut_distance = Some(dist);
        self
    }
    pub fn linkage(mut self, linkage: LinkageMethod) -> Self {
        self.linkage = Some(linkage);
        self
    }
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn build(self) -> Result<DetectionConfig, ConfigError> {
        let method = self.method.unwrap_or_default();
        let (default_min, default_max) = match method {
            DetectionMethod::Hierarchical => (3.4, 6.2),
            _ => (3.0, 6.0),
        };
        let radius_window = RadiusWindow::new(
            self.min_radius.unwrap_or(default_min),
            self.max_radius.unwrap_or(default_max),
        )?;

        let defaults = ClusteringThresholds::default();
        let clustering = ClusteringThresholds {
            max_neighbor_dist: self.max_neighbor_dist.unwrap_or(defaults.max_neighbor_dist),
            max_cluster_dist: self.max_cluster_dist.unwrap_or(defaults.max_cluster_dist),
            max_pair_dist: self.max_pair_dist.unwrap_or(defaults.max_pair_dist),
            min_contacts: self.min_contacts.unwrap_or(defaults.min_contacts),
            min_spheres_per_pocket: self
                .min_spheres_per_pocket
                .unwrap_or(defaults.min_spheres_per_pocket),
            neighbor_criterion: self.neighbor_criterion.unwrap_or(defaults.neighbor_criterion),
        };
        clustering.validate()?;

        let hierarchical_defaults = HierarchicalConfig::default();
        let hierarchical = HierarchicalConfig {
            cut_distance: self
                .cut_distance
                .unwrap_or(hierarchical_defaults.cut_distance),
            linkage: self.linkage.unwrap_or(hierarchical_defaults.linkage),
            metric: self.metric.unwrap_or(hierarchical_defaults.metric),
            min_spheres_per_pocket: self
                .min_spheres_per_pocket
                .unwrap_or(hierarchical_defaults.min_spheres_per_pocket),
        };
        hierarchical.validate()?;

        Ok(DetectionConfig {
            method,
            radius_window,
            clustering,
            hierarchical,
        })
    }
}
