use super::file::FileConfig;
use crate::cli::DetectArgs;
use crate::error::{CliError, Result};
use alphapocket::core::alpha_spheres::SharingCriterion;
use alphapocket::engine::config::{
    DetectionConfig, DetectionConfigBuilder, DetectionMethod, DistanceMetric, LinkageMethod,
};
use std::fmt::Display;
use std::str::FromStr;

/// Merges the config file, `--set` values and explicit flags (in increasing
/// precedence) into a validated [`DetectionConfig`].
pub fn build_config(args: &DetectArgs) -> Result<DetectionConfig> {
    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let file_config = apply_set_values(file_config, &args.set_values)?;

    let radius = file_config.radius.unwrap_or_default();
    let three_stage = file_config.three_stage.unwrap_or_default();
    let hierarchical = file_config.hierarchical.unwrap_or_default();

    let method = match (args.method, file_config.method.as_deref()) {
        (Some(method), _) => Some(method),
        (None, Some(code)) => Some(parse_code::<DetectionMethod>("method", code)?),
        (None, None) => None,
    };
    let criterion = match (args.criterion, three_stage.neighbor_criterion.as_deref()) {
        (Some(criterion), _) => Some(criterion),
        (None, Some(code)) => Some(parse_code::<SharingCriterion>(
            "three-stage.neighbor-criterion",
            code,
        )?),
        (None, None) => None,
    };
    let linkage = match (args.linkage, hierarchical.linkage.as_deref()) {
        (Some(linkage), _) => Some(linkage),
        (None, Some(code)) => Some(parse_code::<LinkageMethod>("hierarchical.linkage", code)?),
        (None, None) => None,
    };
    let metric = match (args.metric, hierarchical.metric.as_deref()) {
        (Some(metric), _) => Some(metric),
        (None, Some(code)) => Some(parse_code::<DistanceMetric>("hierarchical.metric", code)?),
        (None, None) => None,
    };

    let mut builder = DetectionConfigBuilder::new();
    if let Some(method) = method {
        builder = builder.method(method);
    }
    if let Some(r) = args.min_radius.or(radius.min) {
        builder = builder.min_radius(r);
    }
    if let Some(r) = args.max_radius.or(radius.max) {
        builder = builder.max_radius(r);
    }
    if let Some(d) = args.max_neighbor_dist.or(three_stage.max_neighbor_dist) {
        builder = builder.max_neighbor_dist(d);
    }
    if let Some(d) = args.max_cluster_dist.or(three_stage.max_cluster_dist) {
        builder = builder.max_cluster_dist(d);
    }
    if let Some(d) = args.max_pair_dist.or(three_stage.max_pair_dist) {
        builder = builder.max_pair_dist(d);
    }
    if let Some(n) = args.min_contacts.or(three_stage.min_contacts) {
        builder = builder.min_contacts(n);
    }
    if let Some(criterion) = criterion {
        builder = builder.neighbor_criterion(criterion);
    }
    if let Some(n) = args.min_spheres.or(file_config.min_spheres_per_pocket) {
        builder = builder.min_spheres_per_pocket(n);
    }
    if let Some(d) = args.cut_distance.or(hierarchical.cut_distance) {
        builder = builder.cut_distance(d);
    }
    if let Some(linkage) = linkage {
        builder = builder.linkage(linkage);
    }
    if let Some(metric) = metric {
        builder = builder.metric(metric);
    }

    Ok(builder.build()?)
}

fn parse_code<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| CliError::Config(format!("Invalid value for {}: {}", key, e)))
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid numeric value for {}: {}", key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();

        match key {
            "method" => config.method = Some(value.to_string()),
            "min-spheres-per-pocket" => {
                config.min_spheres_per_pocket = Some(parse_number(key, value)?)
            }
            "radius.min" => {
                config.radius.get_or_insert_with(Default::default).min =
                    Some(parse_number(key, value)?)
            }
            "radius.max" => {
                config.radius.get_or_insert_with(Default::default).max =
                    Some(parse_number(key, value)?)
            }
            "three-stage.max-neighbor-dist" => {
                config
                    .three_stage
                    .get_or_insert_with(Default::default)
                    .max_neighbor_dist = Some(parse_number(key, value)?)
            }
            "three-stage.max-cluster-dist" => {
                config
                    .three_stage
                    .get_or_insert_with(Default::default)
                    .max_cluster_dist = Some(parse_number(key, value)?)
            }
            "three-stage.max-pair-dist" => {
                config
                    .three_stage
                    .get_or_insert_with(Default::default)
                    .max_pair_dist = Some(parse_number(key, value)?)
            }
            "three-stage.min-contacts" => {
                config
                    .three_stage
                    .get_or_insert_with(Default::default)
                    .min_contacts = Some(parse_number(key, value)?)
            }
            "three-stage.neighbor-criterion" => {
                config
                    .three_stage
                    .get_or_insert_with(Default::default)
                    .neighbor_criterion = Some(value.to_string())
            }
            "hierarchical.cut-distance" => {
                config
                    .hierarchical
                    .get_or_insert_with(Default::default)
                    .cut_distance = Some(parse_number(key, value)?)
            }
            "hierarchical.linkage" => {
                config
                    .hierarchical
                    .get_or_insert_with(Default::default)
                    .linkage = Some(value.to_string())
            }
            "hierarchical.metric" => {
                config
                    .hierarchical
                    .get_or_insert_with(Default::default)
                    .metric = Some(value.to_string())
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
