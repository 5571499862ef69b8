use crate::cli::DetectArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use alphapocket::{
    core::io::points::read_points_csv_path, engine::progress::ProgressReporter,
    workflows::detect::DetectionResult, workflows,
};
use itertools::Itertools;
use tracing::{info, warn};

pub fn run(args: DetectArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let config = build_config(&args)?;
    info!(method = %config.method, "Configuration resolved.");

    info!("Loading point cloud from {:?}", &args.input);
    let points = read_points_csv_path(&args.input)?;
    println!(
        "Loaded {} points from {}.",
        points.len(),
        args.input.display()
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the core detection workflow...");
    let result = workflows::detect::run(&points, &config, &reporter)?;

    if result.pockets.is_empty() {
        warn!("Workflow completed but found no pockets.");
    }
    print!("{}", format_summary(&result, args.show_atoms));
    Ok(())
}

fn format_summary(result: &DetectionResult, show_atoms: bool) -> String {
    let mut out = format!(
        "{} alpha sphere(s) within the radius window, {} pocket(s).\n",
        result.alpha_spheres.len(),
        result.pockets.len()
    );
    if result.pockets.is_empty() {
        return out;
    }

    out.push_str(&format!(
        "{:>6}  {:>7}  {:>5}  {:>10}  {:>10}  {:>10}\n",
        "Pocket", "Spheres", "Atoms", "X", "Y", "Z"
    ));
    for pocket in &result.pockets {
        out.push_str(&format!(
            "{:>6}  {:>7}  {:>5}  {:>10.3}  {:>10.3}  {:>10.3}\n",
            pocket.index + 1,
            pocket.sphere_indices.len(),
            pocket.point_indices.len(),
            pocket.centroid.x,
            pocket.centroid.y,
            pocket.centroid.z
        ));
        if show_atoms {
            out.push_str(&format!(
                "        atoms: {}\n",
                pocket.point_indices.iter().join(" ")
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use alphapocket::core::alpha_spheres::AlphaSphereSet;
    use alphapocket::workflows::detect::Pocket;
    use clap::Parser;
    use nalgebra::Point3;
    use std::fs;

    const CUBE_CORNERS: [(f64, f64, f64); 9] = [
        (0.0, 0.0, 0.0),
        (3.1, 0.2, 0.4),
        (0.3, 2.9, 0.1),
        (0.2, 0.4, 3.2),
        (2.8, 3.1, 0.5),
        (3.3, 0.1, 2.7),
        (0.4, 3.0, 2.9),
        (3.0, 2.7, 3.3),
        (1.6, 1.4, 1.7),
    ];

    fn summary_fixture() -> DetectionResult {
        DetectionResult {
            alpha_spheres: AlphaSphereSet::from_spheres(Vec::new(), Vec::new()),
            pockets: vec![Pocket {
                index: 0,
                sphere_indices: vec![0, 1, 2],
                point_indices: vec![3, 5, 8, 13],
                centroid: Point3::new(1.0, -2.5, 10.125),
            }],
        }
    }

    #[test]
    fn summary_lists_one_row_per_pocket() {
        let text = format_summary(&summary_fixture(), false);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("1 pocket(s)"));
        assert!(lines[1].contains("Spheres"));
        assert!(lines[2].contains("10.125"));
        assert!(lines[2].contains("-2.500"));
        assert!(!text.contains("atoms:"));
    }

    #[test]
    fn summary_can_list_pocket_atoms() {
        let text = format_summary(&summary_fixture(), true);
        assert!(text.contains("atoms: 3 5 8 13"));
    }

    #[test]
    fn summary_table_has_fixed_columns() {
        let mut result = summary_fixture();
        result.pockets.push(Pocket {
            index: 1,
            sphere_indices: vec![3],
            point_indices: vec![0, 1],
            centroid: Point3::new(0.0, 0.0, 0.0),
        });

        let expected = concat!(
            "0 alpha sphere(s) within the radius window, 2 pocket(s).\n",
            "Pocket  Spheres  Atoms           X           Y           Z\n",
            "     1        3      4       1.000      -2.500      10.125\n",
            "        atoms: 3 5 8 13\n",
            "     2        1      2       0.000       0.000       0.000\n",
            "        atoms: 0 1\n",
        );
        assert_eq!(format_summary(&result, true), expected);
    }

    #[test]
    fn empty_results_only_print_the_counts() {
        let mut result = summary_fixture();
        result.pockets.clear();
        assert_eq!(
            format_summary(&result, true),
            "0 alpha sphere(s) within the radius window, 0 pocket(s).\n"
        );
    }

    #[test]
    fn detect_runs_end_to_end_on_a_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.csv");
        let mut csv = String::from("x,y,z,name\n");
        for (i, (x, y, z)) in CUBE_CORNERS.iter().enumerate() {
            csv.push_str(&format!("{x},{y},{z},C{i}\n"));
            csv.push_str(&format!("{},{},{},N{i}\n", x + 100.0, y + 0.5, z - 0.3));
        }
        fs::write(&path, csv).unwrap();

        let cli = Cli::parse_from([
            "alphapocket",
            "detect",
            "-i",
            path.to_str().unwrap(),
            "--min-radius",
            "0",
            "--max-radius",
            "20",
            "--max-neighbor-dist",
            "10",
            "--min-contacts",
            "1",
            "-n",
            "1",
        ]);
        let Commands::Detect(args) = cli.command;
        assert!(run(args).is_ok());
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.csv");
        let cli = Cli::parse_from(["alphapocket", "detect", "-i", missing.to_str().unwrap()]);
        let Commands::Detect(args) = cli.command;
        assert!(matches!(run(args), Err(crate::error::CliError::Points(_))));
    }
}
