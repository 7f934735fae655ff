//! Summary engine.
//!
//! Pure functions over the full delivery collection. The store recomputes
//! the whole snapshot from scratch after every mutation; nothing here is
//! incremental, which keeps the derived view consistent with the collection
//! at all times.

use std::collections::BTreeMap;

use crate::domain::catalog::{PERSONNEL_TYPES, REGIONS};
use crate::domain::{
    DeliveryRecord, DeliveryStatus, FurnitureSummary, FurnitureType, PersonnelSummary,
    RegionSummary, SummarySnapshot,
};

/// Furniture-flag counts for one personnel type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemCount {
    pub total: usize,
    pub delivered: usize,
}

/// Per-personnel-type flag counts, used as the unit of "item" for the
/// overall and per-personnel figures.
pub type PersonnelItemCounts = BTreeMap<String, ItemCount>;

/// Derive the four dashboard outputs from the current collection. The
/// snapshot revision is left at 0; the store stamps it when publishing.
///
/// `seed` lets initialization-time callers supply externally planned
/// per-personnel totals; when absent the counts are derived from the
/// records themselves.
pub fn compute_summaries(
    records: &[DeliveryRecord],
    seed: Option<&PersonnelItemCounts>,
) -> SummarySnapshot {
    let derived;
    let item_counts = match seed {
        Some(counts) => counts,
        None => {
            derived = count_items_by_personnel(records);
            &derived
        }
    };

    SummarySnapshot {
        revision: 0,
        overall_progress: overall_progress(item_counts),
        by_region: summarize_by_region(records),
        by_personnel: summarize_by_personnel(item_counts),
        by_furniture: summarize_by_furniture(records),
    }
}

/// Tally furniture flags per personnel type. The unit is the count of true
/// flags on each record, not one-record-one-item. Records whose personnel
/// type is not in the catalog are ignored.
pub fn count_items_by_personnel(records: &[DeliveryRecord]) -> PersonnelItemCounts {
    let mut counts: PersonnelItemCounts = PERSONNEL_TYPES
        .iter()
        .map(|t| (t.to_string(), ItemCount::default()))
        .collect();

    for record in records {
        let flag_count = record.furniture.count_true();
        if let Some(count) = counts.get_mut(&record.personnel_type) {
            count.total += flag_count;
            if record.status == DeliveryStatus::Delivered {
                count.delivered += flag_count;
            }
        }
    }

    counts
}

fn overall_progress(item_counts: &PersonnelItemCounts) -> f64 {
    let total: usize = item_counts.values().map(|c| c.total).sum();
    let delivered: usize = item_counts.values().map(|c| c.delivered).sum();

    if total > 0 {
        (delivered as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

fn summarize_by_region(records: &[DeliveryRecord]) -> Vec<RegionSummary> {
    REGIONS
        .iter()
        .filter_map(|region| {
            let total = records.iter().filter(|r| r.region == *region).count();
            if total == 0 {
                return None;
            }
            let delivered = records
                .iter()
                .filter(|r| r.region == *region && r.status == DeliveryStatus::Delivered)
                .count();
            Some(RegionSummary {
                name: region.to_string(),
                delivered,
                in_progress: total - delivered,
                total,
            })
        })
        .collect()
}

fn summarize_by_personnel(item_counts: &PersonnelItemCounts) -> Vec<PersonnelSummary> {
    PERSONNEL_TYPES
        .iter()
        .map(|personnel_type| {
            let count = item_counts
                .get(*personnel_type)
                .copied()
                .unwrap_or_default();
            let percentage = if count.total > 0 {
                (count.delivered as f64 / count.total as f64) * 100.0
            } else {
                0.0
            };
            PersonnelSummary {
                name: personnel_type.to_string(),
                total: count.total,
                delivered: count.delivered,
                percentage,
            }
        })
        .collect()
}

fn summarize_by_furniture(records: &[DeliveryRecord]) -> Vec<FurnitureSummary> {
    FurnitureType::ALL
        .into_iter()
        .map(|furniture_type| {
            let total = records
                .iter()
                .filter(|r| r.furniture.is_set(furniture_type))
                .count();
            let delivered = records
                .iter()
                .filter(|r| {
                    r.furniture.is_set(furniture_type) && r.status == DeliveryStatus::Delivered
                })
                .count();
            FurnitureSummary {
                name: furniture_type,
                delivered,
                in_progress: total - delivered,
                total,
            }
        })
        .collect()
}
