//! Dashboard summary output types.

use serde::Serialize;

use crate::domain::delivery::FurnitureType;

/// Per-region delivered/total record counts. Regions with zero records are
/// excluded from the snapshot.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RegionSummary {
    pub name: String,
    pub delivered: usize,
    /// Derived bucket (total - delivered), not a tally of the InProgress
    /// status.
    #[serde(rename = "enCours")]
    pub in_progress: usize,
    pub total: usize,
}

/// Per-personnel-type furniture-flag counts.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PersonnelSummary {
    pub name: String,
    pub total: usize,
    pub delivered: usize,
    pub percentage: f64,
}

/// Per-furniture-type record counts (a record counts when it carries the
/// flag, regardless of status).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FurnitureSummary {
    pub name: FurnitureType,
    pub delivered: usize,
    #[serde(rename = "enCours")]
    pub in_progress: usize,
    pub total: usize,
}

/// Full derived view of the delivery collection, recomputed from scratch on
/// every store mutation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummarySnapshot {
    /// Monotonic per-session counter, bumped by the store on every publish.
    pub revision: u64,
    /// 0..=100, flag-count weighted.
    #[serde(rename = "overallProgress")]
    pub overall_progress: f64,
    #[serde(rename = "byRegion")]
    pub by_region: Vec<RegionSummary>,
    #[serde(rename = "byPersonnel")]
    pub by_personnel: Vec<PersonnelSummary>,
    #[serde(rename = "byMobilier")]
    pub by_furniture: Vec<FurnitureSummary>,
}

impl Default for SummarySnapshot {
    fn default() -> Self {
        Self {
            revision: 0,
            overall_progress: 0.0,
            by_region: Vec::new(),
            by_personnel: Vec::new(),
            by_furniture: Vec::new(),
        }
    }
}
