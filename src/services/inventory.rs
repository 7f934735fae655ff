//! Baseline stock provider.
//!
//! Supplies the planned quantity of each furniture type per region. The
//! primary source is a bundled JSON asset; if it cannot be read the
//! embedded fallback table (extracted from the planning spreadsheet) is
//! used. The baseline is built once per load and immutable per session.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::catalog::FURNITURE_LABEL_MAPPING;
use crate::domain::FurnitureType;

/// Raw planned quantities: region -> furniture label -> quantity.
pub type StockData = BTreeMap<String, BTreeMap<String, u32>>;

/// Typed baseline after label mapping: region -> furniture type -> quantity.
pub type Baseline = BTreeMap<String, BTreeMap<FurnitureType, u32>>;

#[derive(Clone, Debug)]
pub struct InventoryService {
    stock_path: PathBuf,
}

impl InventoryService {
    pub fn new(stock_path: impl Into<PathBuf>) -> Self {
        Self {
            stock_path: stock_path.into(),
        }
    }

    /// Load the raw planned stock, falling back to the embedded table when
    /// the asset cannot be read or parsed.
    pub async fn stock_by_region(&self) -> StockData {
        match tokio::fs::read_to_string(&self.stock_path).await {
            Ok(raw) => match serde_json::from_str::<StockData>(&raw) {
                Ok(stock) => {
                    tracing::info!(
                        path = %self.stock_path.display(),
                        regions = stock.len(),
                        "Loaded planned stock"
                    );
                    return stock;
                }
                Err(e) => {
                    tracing::error!(
                        path = %self.stock_path.display(),
                        error = %e,
                        "Failed to parse stock asset, using embedded fallback"
                    );
                }
            },
            Err(e) => {
                tracing::warn!(
                    path = %self.stock_path.display(),
                    error = %e,
                    "Failed to read stock asset, using embedded fallback"
                );
            }
        }

        fallback_stock()
    }

    /// Typed baseline for the reconciliation engine: label mapping applied,
    /// quantities summed when two labels land on the same canonical type,
    /// non-catalog labels dropped with a warning.
    pub async fn baseline(&self) -> Baseline {
        transform_stock_data(self.stock_by_region().await, FURNITURE_LABEL_MAPPING)
    }
}

/// Map raw labels through `mapping` (entries absent from the mapping pass
/// through unchanged) and merge colliding canonical entries.
pub fn transform_stock_data(stock: StockData, mapping: &[(&str, &str)]) -> Baseline {
    let mut baseline = Baseline::new();

    for (region, quantities) in stock {
        let entry = baseline.entry(region.clone()).or_default();
        for (raw_label, quantity) in quantities {
            let canonical = mapping
                .iter()
                .find(|(from, _)| *from == raw_label)
                .map(|(_, to)| *to)
                .unwrap_or(raw_label.as_str());
            match canonical.parse::<FurnitureType>() {
                Ok(furniture_type) => {
                    *entry.entry(furniture_type).or_insert(0) += quantity;
                }
                Err(_) => {
                    tracing::warn!(
                        region = %region,
                        label = %raw_label,
                        "Dropping stock entry with unknown furniture label"
                    );
                }
            }
        }
    }

    baseline
}

/// Planned quantities per region, extracted from the deployment spreadsheet.
pub fn fallback_stock() -> StockData {
    let table: &[(&str, u32)] = &[
        ("PORO", 23),
        ("TCHOLOGO", 9),
        ("TONKPI", 33),
        ("WORODOUGOU", 12),
        ("BAFING", 11),
        ("GUEMON", 19),
        ("CAVALLY", 17),
        ("NAWA", 9),
        ("AGNEBY-TIASSA", 11),
        ("LÔH-DJIBOUA", 13),
        ("MORONOU", 11),
        ("N'ZI", 6),
        ("SUD-COMOE", 9),
        ("INDENIE-DJUABLIN", 9),
        ("ME", 9),
        ("GONTOUGO", 17),
    ];

    // Each region gets one desk set per slot: visitor chairs come in pairs
    // and plastic chairs in fours.
    table
        .iter()
        .map(|(region, base)| {
            let quantities = BTreeMap::from([
                ("Bureau".to_string(), *base),
                ("Fauteuil".to_string(), *base),
                ("Chaise Visiteur".to_string(), base * 2),
                ("Chaise Plastique".to_string(), base * 4),
                ("Armoire".to_string(), *base),
                ("Tableau".to_string(), *base),
            ]);
            (region.to_string(), quantities)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_when_asset_is_missing() {
        let service = InventoryService::new("/nonexistent/stock.json");
        let stock = service.stock_by_region().await;
        assert_eq!(stock.len(), 16);
        assert_eq!(stock["PORO"]["Bureau"], 23);
        assert_eq!(stock["PORO"]["Chaise Plastique"], 92);
    }

    #[tokio::test]
    async fn reads_asset_when_present() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("stock.json");
        tokio::fs::write(&path, r#"{"PORO": {"Bureau": 5}}"#)
            .await
            .unwrap();

        let service = InventoryService::new(&path);
        let stock = service.stock_by_region().await;
        assert_eq!(stock.len(), 1);
        assert_eq!(stock["PORO"]["Bureau"], 5);
    }

    #[test]
    fn transform_maps_labels_and_merges_collisions() {
        let stock: StockData = BTreeMap::from([(
            "PORO".to_string(),
            BTreeMap::from([
                ("Bureau".to_string(), 10),
                // Maps onto Bureau as well and must be summed in.
                ("Bureau Agent".to_string(), 3),
                ("Chaise Visiteur".to_string(), 20),
                ("Hamac".to_string(), 99),
            ]),
        )]);

        let baseline = transform_stock_data(stock, FURNITURE_LABEL_MAPPING);
        let poro = &baseline["PORO"];
        assert_eq!(poro[&FurnitureType::Bureau], 13);
        assert_eq!(poro[&FurnitureType::ChaiseVisiteur], 20);
        assert_eq!(poro.len(), 2);
    }

    #[test]
    fn fallback_matches_published_poro_figures() {
        let baseline = transform_stock_data(fallback_stock(), FURNITURE_LABEL_MAPPING);
        let poro = &baseline["PORO"];
        assert_eq!(poro[&FurnitureType::Bureau], 23);
        assert_eq!(poro[&FurnitureType::ChaiseVisiteur], 46);
        assert_eq!(poro[&FurnitureType::ChaisePlastique], 92);
        assert_eq!(poro[&FurnitureType::Tableau], 23);
    }
}
