use crate::core::alpha_spheres::AlphaSphereSet;
use crate::core::utils::geometry::centroid;
use crate::engine::clustering::hierarchical;
use crate::engine::clustering::pipeline::PocketClusteringPipeline;
use crate::engine::config::{DetectionConfig, DetectionMethod};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::Point3;
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A cavity described by the alpha spheres that fill it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pocket {
    /// Rank of the pocket within its detection result.
    pub index: usize,
    /// Ascending indices into the radius-filtered sphere set.
    pub sphere_indices: Vec<usize>,
    /// Ascending indices of the input points touched by the pocket's spheres.
    pub point_indices: Vec<usize>,
    /// Mean of the sphere centers.
    pub centroid: Point3<f64>,
}

#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub alpha_spheres: AlphaSphereSet,
    pub pockets: Vec<Pocket>,
}

#[instrument(skip_all, name = "detection_workflow", fields(points = points.len()))]
pub fn run(
    points: &[Point3<f64>],
    config: &DetectionConfig,
    reporter: &ProgressReporter,
) -> Result<DetectionResult, EngineError> {
    // === Phase 1: Alpha sphere construction ===
    reporter.report(Progress::PhaseStart {
        name: "Alpha Spheres",
    });
    let mut spheres = AlphaSphereSet::build(points)?;
    info!(spheres = spheres.len(), "Alpha sphere construction complete.");
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Radius window ===
    reporter.report(Progress::PhaseStart {
        name: "Radius Filter",
    });
    let window = config.radius_window;
    let too_small = spheres.remove_smaller_than(window.min_radius);
    let too_large = spheres.remove_larger_than(window.max_radius);
    info!(
        kept = spheres.len(),
        too_small,
        too_large,
        "Applied radius window [{}, {}].",
        window.min_radius,
        window.max_radius
    );
    if spheres.is_empty() {
        warn!("No alpha spheres remain after radius filtering.");
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Clustering ===
    reporter.report(Progress::PhaseStart { name: "Clustering" });
    let clusters = match config.method {
        DetectionMethod::AlphaSpheresOnly => Vec::new(),
        DetectionMethod::ThreeStage => {
            PocketClusteringPipeline::new(config.clustering)?.run(&spheres, reporter)?
        }
        DetectionMethod::Hierarchical => {
            config.hierarchical.validate()?;
            hierarchical::cluster(&spheres.centers(), &config.hierarchical)
        }
    };
    reporter.report(Progress::PhaseFinish);

    let pockets = clusters
        .into_iter()
        .enumerate()
        .map(|(index, sphere_indices)| build_pocket(&spheres, index, sphere_indices))
        .collect::<Result<Vec<_>, _>>()?;
    info!(
        pockets = pockets.len(),
        method = %config.method,
        "Pocket detection complete."
    );

    Ok(DetectionResult {
        alpha_spheres: spheres,
        pockets,
    })
}

/// Runs an independent detection per frame, returning results in frame order.
///
/// With the `parallel` feature frames are processed concurrently. The error of the
/// earliest failing frame is returned.
#[instrument(skip_all, name = "batch_detection_workflow", fields(frames = frames.len()))]
pub fn run_frames(
    frames: &[Vec<Point3<f64>>],
    config: &DetectionConfig,
    reporter: &ProgressReporter,
) -> Result<Vec<DetectionResult>, EngineError> {
    reporter.report(Progress::TaskStart {
        total: frames.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = frames.iter();

    #[cfg(feature = "parallel")]
    let iterator = frames.par_iter();

    let results: Vec<Result<DetectionResult, EngineError>> = iterator
        .map(|frame| {
            let result = run(frame, config, &ProgressReporter::new());
            reporter.report(Progress::TaskIncrement);
            result
        })
        .collect();

    reporter.report(Progress::TaskFinish);
    results.into_iter().collect()
}

fn build_pocket(
    spheres: &AlphaSphereSet,
    index: usize,
    mut sphere_indices: Vec<usize>,
) -> Result<Pocket, EngineError> {
    sphere_indices.sort_unstable();
    let point_indices = spheres.contact_union(&sphere_indices)?;
    let mut centers = Vec::with_capacity(sphere_indices.len());
    for &i in &sphere_indices {
        centers.push(spheres.sphere(i)?.center);
    }
    let centroid = centroid(&centers)
        .ok_or_else(|| EngineError::Internal(format!("pocket {index} has no spheres")))?;

    Ok(Pocket {
        index,
        sphere_indices,
        point_indices,
        centroid,
    })
}
