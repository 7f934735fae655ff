//! Local persistence driver.
//!
//! Two JSON-document collections (deliveries, region confirmations) live in
//! the data directory, plus a flat serialized-blob backup of the delivery
//! collection used as the fallback read path, and a one-shot flag gating the
//! stock seeding routine.
//!
//! Writes are best-effort: callers log failures and keep serving from the
//! in-memory snapshot; there is no retry.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::{DeliveryRecord, RegionConfirmation};

const DELIVERIES_FILE: &str = "deliveries.json";
const CONFIRMATIONS_FILE: &str = "confirmations.json";
const BACKUP_FILE: &str = "deliveries.backup";
const STOCK_FLAG_FILE: &str = "stock_initialized";

/// Handle over the on-disk data directory.
#[derive(Clone, Debug)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    /// Open (and create if needed) the data directory.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        tracing::info!(data_dir = %data_dir.display(), "Storage opened");
        Ok(Self { data_dir })
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// Load the delivery collection.
    ///
    /// Read chain: primary collection, then the backup blob, then an empty
    /// cold start. Each fallback is logged with its cause. Record
    /// normalization happens during deserialization.
    pub async fn load_deliveries(&self) -> Vec<DeliveryRecord> {
        match self.read_collection::<Vec<DeliveryRecord>>(DELIVERIES_FILE).await {
            Ok(records) => return records,
            Err(e) => {
                tracing::warn!(error = %e, "Primary delivery collection unavailable, trying backup");
            }
        }

        match self.read_backup_blob().await {
            Ok(records) => {
                tracing::info!(count = records.len(), "Recovered deliveries from backup blob");
                records
            }
            Err(e) => {
                tracing::warn!(error = %e, "Backup blob unavailable, starting with empty collection");
                Vec::new()
            }
        }
    }

    /// Persist the full delivery collection to the primary file and mirror
    /// it into the backup blob.
    pub async fn save_deliveries(&self, records: &[DeliveryRecord]) -> Result<()> {
        self.write_collection(DELIVERIES_FILE, &records).await?;

        // The backup is secondary; its failure must not fail the write.
        if let Err(e) = self.write_backup_blob(records).await {
            tracing::warn!(error = %e, "Failed to mirror deliveries into backup blob");
        }
        Ok(())
    }

    pub async fn load_confirmations(&self) -> Vec<RegionConfirmation> {
        match self.read_collection::<Vec<RegionConfirmation>>(CONFIRMATIONS_FILE).await {
            Ok(confirmations) => confirmations,
            Err(e) => {
                tracing::warn!(error = %e, "Confirmation collection unavailable, starting empty");
                Vec::new()
            }
        }
    }

    pub async fn save_confirmations(&self, confirmations: &[RegionConfirmation]) -> Result<()> {
        self.write_collection(CONFIRMATIONS_FILE, &confirmations).await
    }

    pub async fn clear_confirmations(&self) -> Result<()> {
        self.save_confirmations(&[]).await
    }

    /// Whether the one-time stock seeding routine has already run.
    pub async fn stock_initialized(&self) -> bool {
        tokio::fs::try_exists(self.path(STOCK_FLAG_FILE))
            .await
            .unwrap_or(false)
    }

    pub async fn set_stock_initialized(&self) -> Result<()> {
        tokio::fs::write(self.path(STOCK_FLAG_FILE), b"1")
            .await
            .context("Failed to persist stock-initialized flag")
    }

    async fn read_collection<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.path(file);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    async fn write_collection<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.path(file);
        let raw = serde_json::to_string(value).context("Failed to serialize collection")?;

        // Write-then-rename so a crash mid-write never truncates the
        // previous good copy.
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, raw.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    async fn read_backup_blob(&self) -> Result<Vec<DeliveryRecord>> {
        let path = self.path(BACKUP_FILE);
        let blob = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        // The blob holds the collection as one serialized string value.
        let inner: String = serde_json::from_str(&blob).context("Malformed backup envelope")?;
        serde_json::from_str(&inner).context("Malformed backup payload")
    }

    async fn write_backup_blob(&self, records: &[DeliveryRecord]) -> Result<()> {
        let inner = serde_json::to_string(records).context("Failed to serialize backup payload")?;
        let blob = serde_json::to_string(&inner).context("Failed to serialize backup envelope")?;
        tokio::fs::write(self.path(BACKUP_FILE), blob.as_bytes())
            .await
            .context("Failed to write backup blob")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeliveryStatus, FurnitureFlags, FurnitureType};

    fn record(id: u64) -> DeliveryRecord {
        DeliveryRecord {
            id,
            region: "PORO".into(),
            localite: DeliveryRecord::placeholder_locality(id),
            personnel_type: "CESF".into(),
            personnel_name: DeliveryRecord::placeholder_personnel(id),
            delivery_date: None,
            status: DeliveryStatus::NotDelivered,
            furniture: FurnitureFlags::single(FurnitureType::Bureau),
            observation: None,
        }
    }

    #[tokio::test]
    async fn round_trips_delivery_collection() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();

        let records = vec![record(1), record(2)];
        storage.save_deliveries(&records).await.unwrap();

        assert_eq!(storage.load_deliveries().await, records);
    }

    #[tokio::test]
    async fn falls_back_to_backup_blob_when_primary_is_corrupt() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();

        let records = vec![record(7)];
        storage.save_deliveries(&records).await.unwrap();

        // Corrupt the primary file; the backup blob must cover the load.
        tokio::fs::write(dir.path().join(DELIVERIES_FILE), b"{not json")
            .await
            .unwrap();

        assert_eq!(storage.load_deliveries().await, records);
    }

    #[tokio::test]
    async fn cold_start_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();
        assert!(storage.load_deliveries().await.is_empty());
        assert!(storage.load_confirmations().await.is_empty());
    }

    #[tokio::test]
    async fn stock_flag_is_persistent() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();

        assert!(!storage.stock_initialized().await);
        storage.set_stock_initialized().await.unwrap();
        assert!(storage.stock_initialized().await);

        // A fresh handle over the same directory sees the flag.
        let reopened = Storage::open(dir.path()).await.unwrap();
        assert!(reopened.stock_initialized().await);
    }
}
