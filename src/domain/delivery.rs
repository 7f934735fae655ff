//! Delivery record domain types.
//!
//! Wire field names match the JSON produced by the historical tracking app
//! (`localite`, `typePersonnel`, `dateLivraison`, ...) so existing exports
//! import cleanly.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Delivery progress of a single record.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum DeliveryStatus {
    #[serde(rename = "Livré")]
    Delivered,
    #[serde(rename = "En cours")]
    InProgress,
    #[serde(rename = "Non livré")]
    NotDelivered,
}

impl Default for DeliveryStatus {
    fn default() -> Self {
        Self::NotDelivered
    }
}

impl DeliveryStatus {
    /// Normalize an arbitrary wire string. Unknown or empty values fall back
    /// to `NotDelivered`; this runs on every load and import path.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim() {
            "Livré" => Self::Delivered,
            "En cours" => Self::InProgress,
            "Non livré" => Self::NotDelivered,
            _ => Self::NotDelivered,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "Livré",
            Self::InProgress => "En cours",
            Self::NotDelivered => "Non livré",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DeliveryStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Tolerant by design: malformed statuses become NotDelivered rather
        // than rejecting the whole record.
        let raw = String::deserialize(deserializer)?;
        Ok(Self::normalize(&raw))
    }
}

/// Catalog of tracked furniture types. Wire names are the French labels used
/// in the stock files and exports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum FurnitureType {
    Bureau,
    Fauteuil,
    #[serde(rename = "Chaise visiteur")]
    ChaiseVisiteur,
    #[serde(rename = "Chaise plastique")]
    ChaisePlastique,
    Armoire,
    Tableau,
}

impl FurnitureType {
    /// All catalog types, in bookkeeping order.
    pub const ALL: [FurnitureType; 6] = [
        Self::Bureau,
        Self::Fauteuil,
        Self::ChaiseVisiteur,
        Self::ChaisePlastique,
        Self::Armoire,
        Self::Tableau,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bureau => "Bureau",
            Self::Fauteuil => "Fauteuil",
            Self::ChaiseVisiteur => "Chaise visiteur",
            Self::ChaisePlastique => "Chaise plastique",
            Self::Armoire => "Armoire",
            Self::Tableau => "Tableau",
        }
    }
}

impl fmt::Display for FurnitureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FurnitureType {
    type Err = UnknownFurnitureType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownFurnitureType(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown furniture type: {0}")]
pub struct UnknownFurnitureType(pub String);

/// Per-record furniture flags, keyed by catalog type.
///
/// Deserialization drops unknown keys with a warning instead of failing the
/// record; a missing map defaults to empty (no furniture flagged).
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FurnitureFlags(pub BTreeMap<FurnitureType, bool>);

impl FurnitureFlags {
    pub fn single(furniture_type: FurnitureType) -> Self {
        Self(BTreeMap::from([(furniture_type, true)]))
    }

    /// Count of flags set to true.
    pub fn count_true(&self) -> usize {
        self.0.values().filter(|v| **v).count()
    }

    pub fn is_set(&self, furniture_type: FurnitureType) -> bool {
        self.0.get(&furniture_type).copied().unwrap_or(false)
    }

    /// First true flag in catalog order, if any.
    pub fn primary(&self) -> Option<FurnitureType> {
        FurnitureType::ALL.into_iter().find(|t| self.is_set(*t))
    }

    /// True flags in catalog order.
    pub fn set_types(&self) -> Vec<FurnitureType> {
        FurnitureType::ALL
            .into_iter()
            .filter(|t| self.is_set(*t))
            .collect()
    }
}

impl<'de> Deserialize<'de> for FurnitureFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FlagsVisitor;

        impl<'de> Visitor<'de> for FlagsVisitor {
            type Value = FurnitureFlags;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of furniture labels to booleans")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut flags = BTreeMap::new();
                while let Some((key, value)) = map.next_entry::<String, bool>()? {
                    match key.parse::<FurnitureType>() {
                        Ok(furniture_type) => {
                            flags.insert(furniture_type, value);
                        }
                        Err(_) => {
                            tracing::warn!(label = %key, "Dropping unknown furniture label");
                        }
                    }
                }
                Ok(FurnitureFlags(flags))
            }
        }

        deserializer.deserialize_map(FlagsVisitor)
    }
}

/// One tracked delivery slot: a recipient's furniture allocation and its
/// delivery state.
///
/// Invariant: records created through manual entry or stock seeding carry
/// exactly one true furniture flag. Imported records may carry several; the
/// store logs those, and per-type bookkeeping attributes them to the first
/// true flag in catalog order (`FurnitureFlags::primary`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryRecord {
    pub id: u64,
    pub region: String,
    pub localite: String,
    #[serde(rename = "typePersonnel")]
    pub personnel_type: String,
    #[serde(rename = "nomPersonnel")]
    pub personnel_name: String,
    /// None means "not yet delivered"; an empty wire string is tolerated.
    #[serde(
        rename = "dateLivraison",
        default,
        with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub delivery_date: Option<NaiveDate>,
    #[serde(rename = "statut", default)]
    pub status: DeliveryStatus,
    #[serde(rename = "mobiliers", default)]
    pub furniture: FurnitureFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
}

impl DeliveryRecord {
    /// Placeholder labels used when (re)initializing a slot.
    pub fn placeholder_locality(id: u64) -> String {
        format!("Localité {id}")
    }

    pub fn placeholder_personnel(id: u64) -> String {
        format!("Personnel {id}")
    }
}

/// Dates arrive as "YYYY-MM-DD", null, or "" in historical exports.
mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()))
    }
}

/// Request DTO for creating a delivery record. The id is assigned by the
/// store.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDeliveryRequest {
    pub region: String,
    pub localite: String,
    #[serde(rename = "typePersonnel")]
    pub personnel_type: String,
    #[serde(rename = "nomPersonnel")]
    pub personnel_name: String,
    #[serde(rename = "dateLivraison", default, with = "lenient_date")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(rename = "statut", default)]
    pub status: DeliveryStatus,
    #[serde(rename = "mobiliers", default)]
    pub furniture: FurnitureFlags,
    #[serde(default)]
    pub observation: Option<String>,
}

/// Request DTO for a partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDeliveryRequest {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub localite: Option<String>,
    #[serde(rename = "typePersonnel", default)]
    pub personnel_type: Option<String>,
    #[serde(rename = "nomPersonnel", default)]
    pub personnel_name: Option<String>,
    #[serde(rename = "dateLivraison", default, with = "lenient_date")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(rename = "statut", default)]
    pub status: Option<DeliveryStatus>,
    #[serde(rename = "mobiliers", default)]
    pub furniture: Option<FurnitureFlags>,
    #[serde(default)]
    pub observation: Option<String>,
}
