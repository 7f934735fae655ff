//! Region confirmation domain types.
//!
//! A `RegionConfirmation` is a region-level attestation, separate from raw
//! delivery status, that items were physically received and verified by a
//! named responsible party. At most one confirmation exists per region.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::delivery::FurnitureType;

/// Overall confirmation state of a region. Never set independently: always a
/// pure function of confirmed vs total counts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfirmationStatus {
    #[serde(rename = "Confirmé")]
    Confirmed,
    #[serde(rename = "Partiel")]
    Partial,
    #[serde(rename = "Non confirmé")]
    Unconfirmed,
}

impl ConfirmationStatus {
    /// Transition law: Confirmed ⟺ confirmed == total > 0,
    /// Unconfirmed ⟺ confirmed == 0, Partial otherwise.
    pub fn from_counts(confirmed: u32, total: u32) -> Self {
        if confirmed == 0 {
            Self::Unconfirmed
        } else if confirmed >= total && total > 0 {
            Self::Confirmed
        } else {
            Self::Partial
        }
    }
}

/// Planned vs confirmed sub-counts for one furniture type.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EquipmentTypeCount {
    pub total: u32,
    #[serde(rename = "confirmes")]
    pub confirmed: u32,
}

/// Aggregate of equipment received for a region.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EquipmentReceived {
    pub total: u32,
    #[serde(rename = "confirmes")]
    pub confirmed: u32,
    #[serde(rename = "pourcentage")]
    pub percentage: u32,
    #[serde(rename = "detailsParType", default)]
    pub details: BTreeMap<FurnitureType, EquipmentTypeCount>,
}

/// An individually confirmed delivery record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmedDeliveryItem {
    #[serde(rename = "deliveryId")]
    pub delivery_id: u64,
    #[serde(rename = "dateConfirmation")]
    pub date: NaiveDate,
    #[serde(rename = "confirmePar")]
    pub confirmed_by: String,
    #[serde(rename = "commentaire", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A type-level confirmed count, set by a responsible party. Supersedes the
/// items-based tally for the type it covers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FurnitureConfirmation {
    #[serde(rename = "typeMobilier")]
    pub furniture_type: FurnitureType,
    #[serde(rename = "nombreConfirme")]
    pub confirmed_count: u32,
    #[serde(rename = "dateConfirmation")]
    pub date: NaiveDate,
    #[serde(rename = "confirmePar")]
    pub confirmed_by: String,
    #[serde(rename = "commentaire", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Per-region confirmation record. Region name is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionConfirmation {
    pub region: String,
    #[serde(rename = "dateConfirmation")]
    pub date: NaiveDate,
    #[serde(rename = "responsable")]
    pub responsible: String,
    #[serde(rename = "commentaire", default)]
    pub comment: String,
    #[serde(rename = "statut")]
    pub status: ConfirmationStatus,
    #[serde(rename = "equipementsRecus")]
    pub equipment_received: EquipmentReceived,
    #[serde(rename = "confirmedItems", default)]
    pub confirmed_items: Vec<ConfirmedDeliveryItem>,
    #[serde(
        rename = "mobilierConfirmations",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub furniture_confirmations: Option<Vec<FurnitureConfirmation>>,
}

impl RegionConfirmation {
    /// Empty confirmation shell for a region.
    pub fn new(region: impl Into<String>, date: NaiveDate, responsible: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            date,
            responsible: responsible.into(),
            comment: comment.into(),
            status: ConfirmationStatus::Unconfirmed,
            equipment_received: EquipmentReceived::default(),
            confirmed_items: Vec::new(),
            furniture_confirmations: None,
        }
    }

    /// Restore the record invariant after any mutation: the region-level
    /// confirmed count equals the sum of per-type confirmed counts, the
    /// total equals the sum of per-type totals, the percentage is the
    /// rounded ratio, and the status follows the transition law.
    pub fn recompute_totals(&mut self) {
        let total: u32 = self.equipment_received.details.values().map(|d| d.total).sum();
        let confirmed: u32 = self
            .equipment_received
            .details
            .values()
            .map(|d| d.confirmed)
            .sum();

        self.equipment_received.total = total;
        self.equipment_received.confirmed = confirmed;
        self.equipment_received.percentage = percentage_of(confirmed, total);
        self.status = ConfirmationStatus::from_counts(confirmed, total);
    }

    /// Type-level confirmed count if one was recorded.
    pub fn furniture_confirmation_count(&self, furniture_type: FurnitureType) -> Option<u32> {
        self.furniture_confirmations
            .as_ref()?
            .iter()
            .find(|c| c.furniture_type == furniture_type)
            .map(|c| c.confirmed_count)
    }

    pub fn has_confirmed_item(&self, delivery_id: u64) -> bool {
        self.confirmed_items.iter().any(|i| i.delivery_id == delivery_id)
    }
}

/// Rounded percentage in 0..=100, 0 when the denominator is 0.
pub fn percentage_of(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        0
    } else {
        ((part as f64 / whole as f64) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmation_with(details: &[(FurnitureType, u32, u32)]) -> RegionConfirmation {
        let mut c = RegionConfirmation::new(
            "PORO",
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            "Jean",
            "",
        );
        for (t, total, confirmed) in details {
            c.equipment_received.details.insert(
                *t,
                EquipmentTypeCount {
                    total: *total,
                    confirmed: *confirmed,
                },
            );
        }
        c.recompute_totals();
        c
    }

    #[test]
    fn status_transition_law() {
        assert_eq!(
            ConfirmationStatus::from_counts(0, 0),
            ConfirmationStatus::Unconfirmed
        );
        assert_eq!(
            ConfirmationStatus::from_counts(0, 10),
            ConfirmationStatus::Unconfirmed
        );
        assert_eq!(
            ConfirmationStatus::from_counts(3, 10),
            ConfirmationStatus::Partial
        );
        assert_eq!(
            ConfirmationStatus::from_counts(10, 10),
            ConfirmationStatus::Confirmed
        );
    }

    #[test]
    fn recompute_totals_sums_per_type_details() {
        let c = confirmation_with(&[
            (FurnitureType::Bureau, 23, 10),
            (FurnitureType::Armoire, 23, 23),
        ]);

        assert_eq!(c.equipment_received.total, 46);
        assert_eq!(c.equipment_received.confirmed, 33);
        assert_eq!(c.equipment_received.percentage, 72);
        assert_eq!(c.status, ConfirmationStatus::Partial);
    }

    #[test]
    fn fully_confirmed_region_is_confirmed() {
        let c = confirmation_with(&[(FurnitureType::Bureau, 23, 23)]);
        assert_eq!(c.status, ConfirmationStatus::Confirmed);
        assert_eq!(c.equipment_received.percentage, 100);
    }

    #[test]
    fn empty_region_stays_unconfirmed() {
        let c = confirmation_with(&[]);
        assert_eq!(c.status, ConfirmationStatus::Unconfirmed);
        assert_eq!(c.equipment_received.percentage, 0);
    }

    #[test]
    fn percentage_of_zero_denominator_is_zero() {
        assert_eq!(percentage_of(5, 0), 0);
        assert_eq!(percentage_of(1, 3), 33);
        assert_eq!(percentage_of(2, 3), 67);
    }
}
