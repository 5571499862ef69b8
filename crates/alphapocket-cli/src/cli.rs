use alphapocket::core::alpha_spheres::SharingCriterion;
use alphapocket::engine::config::{DetectionMethod, DistanceMetric, LinkageMethod};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "alphapocket CLI - Detects pockets on molecular surfaces from alpha spheres and fpocket-style geometric clustering.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect pockets in a point cloud (one `x,y,z` row per atom).
    Detect(DetectArgs),
}

/// Arguments for the `detect` subcommand.
#[derive(Args, Debug)]
pub struct DetectArgs {
    // --- Core Arguments ---
    /// Path to the input point cloud in CSV format with an `x,y,z` header.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Pocket detection method: alpha-spheres, three-stage or hierarchical.
    #[arg(short, long, value_name = "METHOD")]
    pub method: Option<DetectionMethod>,

    // --- Alpha Sphere Overrides ---
    /// Minimum alpha sphere radius kept for clustering.
    #[arg(long, value_name = "FLOAT")]
    pub min_radius: Option<f64>,

    /// Maximum alpha sphere radius kept for clustering.
    #[arg(long, value_name = "FLOAT")]
    pub max_radius: Option<f64>,

    // --- Three-Stage Overrides ---
    /// Maximum center distance for linking neighboring spheres (stage 1).
    #[arg(long, value_name = "FLOAT")]
    pub max_neighbor_dist: Option<f64>,

    /// Maximum distance between cluster centroids for merging (stage 2).
    #[arg(long, value_name = "FLOAT")]
    pub max_cluster_dist: Option<f64>,

    /// Maximum sphere pair distance counted as a contact between clusters (stage 3).
    #[arg(long, value_name = "FLOAT")]
    pub max_pair_dist: Option<f64>,

    /// Minimum number of close sphere pairs required to merge two clusters (stage 3).
    #[arg(long, value_name = "INT")]
    pub min_contacts: Option<usize>,

    /// Contact points two spheres must share to be neighbors: point, edge or face.
    #[arg(long, value_name = "CRITERION")]
    pub criterion: Option<SharingCriterion>,

    // --- Shared Overrides ---
    /// Minimum number of alpha spheres for a cluster to be reported as a pocket.
    #[arg(short = 'n', long, value_name = "INT")]
    pub min_spheres: Option<usize>,

    // --- Hierarchical Overrides ---
    /// Height at which the hierarchical dendrogram is cut.
    #[arg(long, value_name = "FLOAT")]
    pub cut_distance: Option<f64>,

    /// Hierarchical linkage: single, complete, average, centroid (or s, m, a, c).
    #[arg(long, value_name = "LINKAGE")]
    pub linkage: Option<LinkageMethod>,

    /// Hierarchical distance metric: euclidean or cityblock (or e, b).
    #[arg(long, value_name = "METRIC")]
    pub metric: Option<DistanceMetric>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S three-stage.min-contacts=3
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,

    /// List the atom indices lining each pocket.
    #[arg(long)]
    pub show_atoms: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_arguments_parse_into_typed_overrides() {
        let cli = Cli::parse_from([
            "alphapocket",
            "-vv",
            "detect",
            "-i",
            "points.csv",
            "--method",
            "hierarchical",
            "--linkage",
            "c",
            "--criterion",
            "face",
            "-n",
            "4",
            "-S",
            "radius.min=2.5",
        ]);

        assert_eq!(cli.verbose, 2);
        let Commands::Detect(args) = cli.command;
        assert_eq!(args.input, PathBuf::from("points.csv"));
        assert!(args.config.is_none());
        assert_eq!(args.method, Some(DetectionMethod::Hierarchical));
        assert_eq!(args.linkage, Some(LinkageMethod::Centroid));
        assert_eq!(args.criterion, Some(SharingCriterion::Face));
        assert_eq!(args.min_spheres, Some(4));
        assert_eq!(args.set_values, vec!["radius.min=2.5".to_string()]);
        assert!(!args.show_atoms);
    }

    #[test]
    fn unknown_codes_are_rejected_by_the_parser() {
        let result = Cli::try_parse_from(["alphapocket", "detect", "-i", "p.csv", "--metric", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["alphapocket", "-q", "-v", "detect", "-i", "p.csv"]);
        assert!(result.is_err());
    }
}
