use crate::core::models::sphere::AlphaSphere;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Minimum number of contact points two alpha spheres must share to be neighbors.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SharingCriterion {
    /// At least one shared contact point.
    Point,
    /// At least two shared contact points (a common Delaunay edge).
    #[default]
    Edge,
    /// At least three shared contact points (a common Delaunay face).
    Face,
}

impl SharingCriterion {
    pub const fn min_shared(self) -> usize {
        match self {
            Self::Point => 1,
            Self::Edge => 2,
            Self::Face => 3,
        }
    }
}

impl fmt::Display for SharingCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Point => "point",
            Self::Edge => "edge",
            Self::Face => "face",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid sharing criterion '{0}': expected point, edge, face or 1, 2, 3")]
pub struct ParseSharingCriterionError(pub String);

impl TryFrom<u8> for SharingCriterion {
    type Error = ParseSharingCriterionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Point),
            2 => Ok(Self::Edge),
            3 => Ok(Self::Face),
            other => Err(ParseSharingCriterionError(other.to_string())),
        }
    }
}

impl FromStr for SharingCriterion {
    type Err = ParseSharingCriterionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "point" | "1" => Ok(Self::Point),
            "edge" | "2" => Ok(Self::Edge),
            "face" | "3" => Ok(Self::Face),
            _ => Err(ParseSharingCriterionError(s.to_string())),
        }
    }
}

/// Builds the shared-contact neighbor graph over a sequence of spheres.
///
/// Spheres are identified by their position in `spheres`. Only spheres with at
/// least one neighbor appear as keys; neighbor lists are ascending.
pub(crate) fn shared_contact_graph<'a>(
    spheres: impl IntoIterator<Item = &'a AlphaSphere>,
    criterion: SharingCriterion,
) -> BTreeMap<usize, Vec<usize>> {
    let contacts: Vec<&[usize]> = spheres
        .into_iter()
        .map(|s| s.contact_points.as_slice())
        .collect();

    let mut spheres_by_point: HashMap<usize, Vec<usize>> = HashMap::new();
    for (sphere, points) in contacts.iter().enumerate() {
        for &point in *points {
            spheres_by_point.entry(point).or_default().push(sphere);
        }
    }

    let threshold = criterion.min_shared();
    let mut graph = BTreeMap::new();
    let mut shared: HashMap<usize, usize> = HashMap::new();
    for (sphere, points) in contacts.iter().enumerate() {
        shared.clear();
        for point in *points {
            for &other in spheres_by_point.get(point).into_iter().flatten() {
                if other != sphere {
                    *shared.entry(other).or_insert(0) += 1;
                }
            }
        }

        let mut neighbors: Vec<usize> = shared
            .iter()
            .filter(|&(_, &count)| count >= threshold)
            .map(|(&other, _)| other)
            .collect();
        if !neighbors.is_empty() {
            neighbors.sort_unstable();
            graph.insert(sphere, neighbors);
        }
    }
    graph
}
