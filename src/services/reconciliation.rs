//! Reconciliation engine.
//!
//! Cross-references the delivery collection against the planned baseline
//! and the region confirmations to produce per-region completion rows.
//! Fully re-derived on each call; there is no cached reconciliation state
//! that could drift from the collection.

use std::collections::BTreeMap;

use crate::domain::catalog::ALL_REGIONS;
use crate::domain::confirmation::percentage_of;
use crate::domain::{
    DeliveryRecord, DeliveryStatus, FurnitureDetail, RegionConfirmation, RegionDeliveryStatus,
    RegionStatus,
};
use crate::services::inventory::Baseline;

/// Compute one reconciliation row per baseline region, optionally filtered
/// to a single region. The "Toutes" sentinel means no filter, as in the
/// store's region queries.
pub fn region_delivery_status(
    records: &[DeliveryRecord],
    baseline: &Baseline,
    confirmations: &[RegionConfirmation],
    region_filter: Option<&str>,
) -> Vec<RegionDeliveryStatus> {
    let region_filter = region_filter.filter(|f| *f != ALL_REGIONS);
    baseline
        .iter()
        .filter(|(region, _)| region_filter.map_or(true, |f| f == region.as_str()))
        .map(|(region, planned)| {
            let confirmation = confirmations.iter().find(|c| &c.region == region);
            reconcile_region(region, planned, records, confirmation)
        })
        .collect()
}

fn reconcile_region(
    region: &str,
    planned: &BTreeMap<crate::domain::FurnitureType, u32>,
    records: &[DeliveryRecord],
    confirmation: Option<&RegionConfirmation>,
) -> RegionDeliveryStatus {
    let total_planned: u32 = planned.values().sum();

    let mut details = BTreeMap::new();
    for (furniture_type, planned_qty) in planned {
        let raw_delivered = records
            .iter()
            .filter(|r| {
                r.region == region
                    && r.status == DeliveryStatus::Delivered
                    && r.furniture.is_set(*furniture_type)
            })
            .count() as u32;

        // A positive type-level confirmation is authoritative over the raw
        // delivered tally; a confirmation reset to zero falls back to the
        // raw count.
        let delivered = confirmation
            .and_then(|c| c.furniture_confirmation_count(*furniture_type))
            .filter(|c| *c > 0)
            .unwrap_or(raw_delivered);

        details.insert(
            *furniture_type,
            FurnitureDetail {
                planned: *planned_qty,
                delivered,
                percentage: percentage_of(delivered, *planned_qty),
            },
        );
    }

    let total_delivered: u32 = details.values().map(|d| d.delivered).sum();
    let percentage = percentage_of(total_delivered, total_planned);

    RegionDeliveryStatus {
        region: region.to_string(),
        total_planned,
        total_delivered,
        percentage,
        status: RegionStatus::from_percentage(percentage),
        details,
    }
}
