//! Planned-vs-delivered reconciliation output types.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::delivery::FurnitureType;

/// Completion state of a region against its planned baseline.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum RegionStatus {
    Completed,
    InProgress,
    NotStarted,
}

impl RegionStatus {
    /// Pure function of the completion percentage.
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            100.. => Self::Completed,
            1..=99 => Self::InProgress,
            0 => Self::NotStarted,
        }
    }
}

/// Per-furniture-type reconciliation line.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FurnitureDetail {
    pub planned: u32,
    pub delivered: u32,
    pub percentage: u32,
}

/// One reconciliation row per region present in the baseline.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegionDeliveryStatus {
    pub region: String,
    #[serde(rename = "totalPlanned")]
    pub total_planned: u32,
    #[serde(rename = "totalDelivered")]
    pub total_delivered: u32,
    pub percentage: u32,
    pub status: RegionStatus,
    #[serde(rename = "detailsByMobilier")]
    pub details: BTreeMap<FurnitureType, FurnitureDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_percentage() {
        assert_eq!(RegionStatus::from_percentage(0), RegionStatus::NotStarted);
        assert_eq!(RegionStatus::from_percentage(1), RegionStatus::InProgress);
        assert_eq!(RegionStatus::from_percentage(99), RegionStatus::InProgress);
        assert_eq!(RegionStatus::from_percentage(100), RegionStatus::Completed);
    }
}
