//! Reference catalog: regions, personnel types and furniture label mapping.
//!
//! These lists drive summary iteration order and boundary validation. Wire
//! labels are kept in French to stay compatible with data files produced by
//! the field teams.

/// Sentinel region name meaning "no region filter".
pub const ALL_REGIONS: &str = "Toutes";

/// Administrative regions covered by the deployment.
pub const REGIONS: &[&str] = &[
    "PORO",
    "TCHOLOGO",
    "TONKPI",
    "WORODOUGOU",
    "BAFING",
    "GUEMON",
    "CAVALLY",
    "NAWA",
    "AGNEBY-TIASSA",
    "LÔH-DJIBOUA",
    "MORONOU",
    "N'ZI",
    "SUD-COMOE",
    "INDENIE-DJUABLIN",
    "ME",
    "GONTOUGO",
];

/// Recipient role classifications used for per-role planning.
pub const PERSONNEL_TYPES: &[&str] = &[
    "RR-AFOR",
    "RD-AFOR",
    "CESF",
    "CARTOGRAPHE",
    "INFORMATICIEN",
];

/// Source-label to canonical-label translation applied to raw stock files.
///
/// Labels absent from this table pass through unchanged and must then match
/// a catalog furniture type to be retained.
pub const FURNITURE_LABEL_MAPPING: &[(&str, &str)] = &[
    ("Chaise Visiteur", "Chaise visiteur"),
    ("Chaise Plastique", "Chaise plastique"),
    ("Bureau Agent", "Bureau"),
    ("Fauteuil Agent", "Fauteuil"),
];

pub fn is_known_region(region: &str) -> bool {
    REGIONS.contains(&region)
}

pub fn is_known_personnel_type(personnel_type: &str) -> bool {
    PERSONNEL_TYPES.contains(&personnel_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_mapping_targets_are_catalog_labels() {
        use crate::domain::FurnitureType;
        for (_, canonical) in FURNITURE_LABEL_MAPPING {
            assert!(canonical.parse::<FurnitureType>().is_ok());
        }
    }

    #[test]
    fn sentinel_is_not_a_region() {
        assert!(!is_known_region(ALL_REGIONS));
        assert!(is_known_region("PORO"));
    }
}
